//! Normalizer field-resolution and relative-time tests.

use chrono::{DateTime, Utc};
use crossfeed::feed::normalizer::{normalize_posts, relative_time};
use crossfeed::providers::ProviderId;
use serde_json::json;

fn at(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .expect("valid timestamp")
        .with_timezone(&Utc)
}

#[test]
fn normalizes_fully_populated_raw_post() {
    let raw = vec![json!({
        "id": "123",
        "author": "Alice",
        "handle": "@alice",
        "text": "hello world",
        "url": "https://example.social/@alice/123",
        "timestamp": "2026-08-01T10:00:00Z",
        "reply_context": { "status_id": "123" },
    })];
    let posts = normalize_posts(&raw, ProviderId::Mastodon, at("2026-08-01T10:05:00Z"));

    assert_eq!(posts.len(), 1);
    let post = &posts[0];
    assert_eq!(post.id, "123");
    assert_eq!(post.author, "Alice");
    assert_eq!(post.handle, "@alice");
    assert_eq!(post.text, "hello world");
    assert_eq!(post.source_url, "https://example.social/@alice/123");
    assert_eq!(post.relative_time, "5m");
    assert_eq!(post.provider, ProviderId::Mastodon);
    assert!(!post.is_demo);
}

#[test]
fn missing_fields_resolve_to_defaults_never_fail() {
    let raw = vec![json!({})];
    let posts = normalize_posts(&raw, ProviderId::Bluesky, Utc::now());

    let post = &posts[0];
    assert_eq!(post.id, "bluesky-0");
    assert_eq!(post.author, "Unknown");
    assert_eq!(post.handle, "");
    assert_eq!(post.text, "");
    assert_eq!(post.source_url, "#");
    assert_eq!(post.relative_time, "just now");
    assert!(post.timestamp.is_none());
    assert!(post.reply_context.is_null());
}

#[test]
fn author_falls_back_through_username_and_user() {
    let by_username = vec![json!({ "username": "bob" })];
    let posts = normalize_posts(&by_username, ProviderId::Threads, Utc::now());
    assert_eq!(posts[0].author, "bob");

    let by_user = vec![json!({ "user": "carol" })];
    let posts = normalize_posts(&by_user, ProviderId::Threads, Utc::now());
    assert_eq!(posts[0].author, "carol");
}

#[test]
fn text_falls_back_to_body() {
    let raw = vec![json!({ "body": "from the body field" })];
    let posts = normalize_posts(&raw, ProviderId::Linkedin, Utc::now());
    assert_eq!(posts[0].text, "from the body field");
}

#[test]
fn numeric_ids_are_rendered_to_decimal() {
    let raw = vec![json!({ "id": 109372843 })];
    let posts = normalize_posts(&raw, ProviderId::Mastodon, Utc::now());
    assert_eq!(posts[0].id, "109372843");
}

#[test]
fn provider_and_reply_context_round_trip_unchanged() {
    let context = json!({ "uri": "at://did:plc:abc/post/1", "cid": "bafy1" });
    let raw = vec![json!({ "id": "x", "reply_context": context })];
    let posts = normalize_posts(&raw, ProviderId::Bluesky, Utc::now());

    assert_eq!(posts[0].provider, ProviderId::Bluesky);
    assert_eq!(posts[0].reply_context, context);
}

#[test]
fn unparsable_timestamp_degrades_to_just_now() {
    let raw = vec![json!({ "timestamp": "yesterday-ish" })];
    let posts = normalize_posts(&raw, ProviderId::Mastodon, Utc::now());
    assert!(posts[0].timestamp.is_none());
    assert_eq!(posts[0].relative_time, "just now");
}

#[test]
fn relative_time_forty_five_seconds_is_just_now() {
    let ts = at("2026-08-01T10:00:00Z");
    assert_eq!(relative_time(ts, at("2026-08-01T10:00:45Z")), "just now");
}

#[test]
fn relative_time_ninety_minutes_floors_to_one_hour() {
    let ts = at("2026-08-01T10:00:00Z");
    assert_eq!(relative_time(ts, at("2026-08-01T11:30:00Z")), "1h");
}

#[test]
fn relative_time_fifty_hours_floors_to_two_days() {
    let ts = at("2026-08-01T10:00:00Z");
    assert_eq!(relative_time(ts, at("2026-08-03T12:00:00Z")), "2d");
}

#[test]
fn relative_time_minutes_and_future_edges() {
    let ts = at("2026-08-01T10:00:00Z");
    assert_eq!(relative_time(ts, at("2026-08-01T10:07:30Z")), "7m");
    assert_eq!(relative_time(ts, at("2026-08-01T23:59:00Z")), "13h");
    // A clock-skewed future timestamp never renders a negative age.
    assert_eq!(relative_time(ts, at("2026-08-01T09:59:00Z")), "just now");
}

#[test]
fn output_is_deterministic_for_a_fixed_now() {
    let raw = vec![json!({ "id": "1", "timestamp": "2026-08-01T08:00:00Z" })];
    let now = at("2026-08-01T10:00:00Z");
    let first = normalize_posts(&raw, ProviderId::Mastodon, now);
    let second = normalize_posts(&raw, ProviderId::Mastodon, now);
    assert_eq!(first, second);
    assert_eq!(first[0].relative_time, "2h");
}
