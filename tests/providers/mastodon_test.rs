//! Mastodon wire format and reply-extraction tests.

use crossfeed::providers::mastodon::{
    build_status_body, extract_status_id, parse_search_response, strip_html,
};
use crossfeed::providers::PublishContent;
use serde_json::json;

fn search_body() -> String {
    json!({
        "statuses": [
            {
                "id": "109372843",
                "content": "<p>Rust is <b>fast</b> &amp; safe</p>",
                "url": "https://mastodon.social/@alice/109372843",
                "created_at": "2026-08-01T10:00:00Z",
                "account": { "display_name": "Alice", "acct": "alice@mastodon.social" }
            },
            {
                "id": "109372901",
                "content": "<p>no display name here</p>",
                "url": "https://mastodon.social/@bob/109372901",
                "created_at": "2026-08-01T11:00:00Z",
                "account": { "display_name": "", "acct": "bob" }
            }
        ]
    })
    .to_string()
}

#[test]
fn parse_search_maps_statuses_to_raw_posts() {
    let raw = parse_search_response(&search_body()).expect("should parse");
    assert_eq!(raw.len(), 2);
    assert_eq!(raw[0]["id"], "109372843");
    assert_eq!(raw[0]["author"], "Alice");
    assert_eq!(raw[0]["handle"], "@alice@mastodon.social");
    assert_eq!(raw[0]["text"], "Rust is fast & safe");
    assert_eq!(raw[0]["timestamp"], "2026-08-01T10:00:00Z");
}

#[test]
fn parse_search_falls_back_to_acct_when_display_name_blank() {
    let raw = parse_search_response(&search_body()).expect("should parse");
    assert_eq!(raw[1]["author"], "bob");
}

#[test]
fn parse_search_preserves_permalink_in_reply_context() {
    let raw = parse_search_response(&search_body()).expect("should parse");
    assert_eq!(
        raw[0]["reply_context"]["url"],
        "https://mastodon.social/@alice/109372843"
    );
}

#[test]
fn parse_search_rejects_non_search_body() {
    assert!(parse_search_response("[]").is_err());
}

#[test]
fn extract_status_id_takes_trailing_digits() {
    assert_eq!(
        extract_status_id("https://mastodon.social/@alice/109372843"),
        Some("109372843".to_owned())
    );
    assert_eq!(
        extract_status_id("https://m.example/@x/42/"),
        Some("42".to_owned())
    );
}

#[test]
fn extract_status_id_fails_on_non_numeric_tail() {
    assert_eq!(extract_status_id("https://mastodon.social/@alice"), None);
    assert_eq!(extract_status_id("https://mastodon.social/@alice/about"), None);
}

#[test]
fn status_body_threads_reply_from_context_url() {
    let content = PublishContent {
        text: "nice post".to_owned(),
        attachment_url: None,
        reply_context: Some(json!({ "url": "https://mastodon.social/@alice/109372843" })),
    };
    let body = build_status_body(&content);
    assert_eq!(body["status"], "nice post");
    assert_eq!(body["in_reply_to_id"], "109372843");
}

#[test]
fn status_body_demotes_to_top_level_when_extraction_fails() {
    let content = PublishContent {
        text: "nice post".to_owned(),
        attachment_url: None,
        reply_context: Some(json!({ "url": "https://mastodon.social/@alice/about" })),
    };
    let body = build_status_body(&content);
    assert!(body.get("in_reply_to_id").is_none());
}

#[test]
fn status_body_appends_attachment_url() {
    let content = PublishContent {
        text: "look".to_owned(),
        attachment_url: Some("https://media.example/cat.gif".to_owned()),
        reply_context: None,
    };
    let body = build_status_body(&content);
    assert_eq!(body["status"], "look\n\nhttps://media.example/cat.gif");
}

#[test]
fn strip_html_removes_tags_and_decodes_entities() {
    assert_eq!(
        strip_html("<p>a &amp; b</p><p>c &lt;d&gt;</p>"),
        "a & b c <d>"
    );
    assert_eq!(strip_html("plain"), "plain");
}
