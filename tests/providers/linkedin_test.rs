//! LinkedIn wire format and local-filter tests.

use crossfeed::providers::linkedin::{build_ugc_body, parse_own_posts, share_url};
use crossfeed::providers::PublishContent;
use serde_json::json;

const AUTHOR_URN: &str = "urn:li:person:x1y2z3";

fn own_posts_body() -> String {
    json!({
        "elements": [
            {
                "id": "urn:li:share:7012345",
                "created": { "time": 1754040000000_i64 },
                "specificContent": {
                    "com.linkedin.ugc.ShareContent": {
                        "shareCommentary": { "text": "We are HIRING Rust engineers" }
                    }
                }
            },
            {
                "id": "urn:li:share:7012999",
                "created": { "time": 1754043600000_i64 },
                "specificContent": {
                    "com.linkedin.ugc.ShareContent": {
                        "shareCommentary": { "text": "Quarterly update, nothing else" }
                    }
                }
            },
            {
                "id": "urn:li:share:7013000",
                "specificContent": {}
            }
        ]
    })
    .to_string()
}

#[test]
fn own_posts_filter_is_case_insensitive() {
    let raw = parse_own_posts(&own_posts_body(), "hiring", "Dana", AUTHOR_URN)
        .expect("should parse");
    assert_eq!(raw.len(), 1);
    assert_eq!(raw[0]["id"], "urn:li:share:7012345");
    assert_eq!(raw[0]["author"], "Dana");
    assert_eq!(raw[0]["handle"], AUTHOR_URN);
}

#[test]
fn own_posts_empty_query_keeps_all_textual_posts() {
    let raw =
        parse_own_posts(&own_posts_body(), "", "Dana", AUTHOR_URN).expect("should parse");
    // The commentary-less element is skipped; the rest stay.
    assert_eq!(raw.len(), 2);
}

#[test]
fn own_posts_convert_epoch_millis_to_rfc3339() {
    let raw =
        parse_own_posts(&own_posts_body(), "hiring", "Dana", AUTHOR_URN).expect("should parse");
    let ts = raw[0]["timestamp"].as_str().expect("timestamp string");
    assert!(ts.starts_with("2025-08-01T"), "unexpected timestamp {ts}");
}

#[test]
fn own_posts_carry_share_urn_in_reply_context() {
    let raw =
        parse_own_posts(&own_posts_body(), "hiring", "Dana", AUTHOR_URN).expect("should parse");
    assert_eq!(raw[0]["reply_context"]["share_urn"], "urn:li:share:7012345");
}

#[test]
fn own_posts_reject_non_list_body() {
    assert!(parse_own_posts("42", "", "Dana", AUTHOR_URN).is_err());
}

#[test]
fn ugc_body_carries_author_and_commentary() {
    let content = PublishContent {
        text: "shipping a new release".to_owned(),
        attachment_url: None,
        reply_context: None,
    };
    let body = build_ugc_body(AUTHOR_URN, &content);
    assert_eq!(body["author"], AUTHOR_URN);
    assert_eq!(body["lifecycleState"], "PUBLISHED");
    assert_eq!(
        body["specificContent"]["com.linkedin.ugc.ShareContent"]["shareCommentary"]["text"],
        "shipping a new release"
    );
}

#[test]
fn ugc_body_appends_attachment_url() {
    let content = PublishContent {
        text: "demo".to_owned(),
        attachment_url: Some("https://media.example/launch.gif".to_owned()),
        reply_context: None,
    };
    let body = build_ugc_body(AUTHOR_URN, &content);
    assert_eq!(
        body["specificContent"]["com.linkedin.ugc.ShareContent"]["shareCommentary"]["text"],
        "demo\n\nhttps://media.example/launch.gif"
    );
}

#[test]
fn share_url_embeds_urn() {
    assert_eq!(
        share_url("urn:li:share:7012345"),
        "https://www.linkedin.com/feed/update/urn:li:share:7012345/"
    );
}
