//! Raw-to-canonical post conversion.
//!
//! A pure function over provider-shaped JSON: each canonical field is
//! resolved by trying several plausible source field names in order and
//! falling back to a fixed default. Normalization never fails — an
//! unexpected shape degrades field by field, it does not abort the post.
//! Provider-specific reply-threading identifiers are carried through
//! untouched.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::feed::Post;
use crate::providers::{ProviderId, RawPost};

/// Source field names tried, in order, for each canonical field.
const ID_FIELDS: &[&str] = &["id", "uri", "guid"];
const AUTHOR_FIELDS: &[&str] = &["author", "display_name", "username", "user"];
const HANDLE_FIELDS: &[&str] = &["handle", "acct", "username", "user"];
const TEXT_FIELDS: &[&str] = &["text", "body", "content"];
const URL_FIELDS: &[&str] = &["url", "permalink", "uri", "link"];
const TIMESTAMP_FIELDS: &[&str] = &["timestamp", "created_at", "indexed_at", "published_at"];

/// Fallback author when no source field resolves.
const DEFAULT_AUTHOR: &str = "Unknown";
/// Fallback permalink when no source field resolves.
const DEFAULT_URL: &str = "#";
/// Fallback age string when no timestamp resolves.
const DEFAULT_AGE: &str = "just now";

/// Convert provider-shaped raw results into canonical posts.
///
/// `now` anchors relative-time rendering so output is deterministic.
pub fn normalize_posts(raw: &[RawPost], provider: ProviderId, now: DateTime<Utc>) -> Vec<Post> {
    raw.iter()
        .enumerate()
        .map(|(index, item)| normalize_one(item, provider, index, now))
        .collect()
}

fn normalize_one(raw: &RawPost, provider: ProviderId, index: usize, now: DateTime<Utc>) -> Post {
    let timestamp = first_string(raw, TIMESTAMP_FIELDS).and_then(|s| parse_timestamp(&s));
    let relative_time = timestamp
        .map(|ts| relative_time(ts, now))
        .unwrap_or_else(|| DEFAULT_AGE.to_owned());

    Post {
        id: first_string(raw, ID_FIELDS).unwrap_or_else(|| format!("{provider}-{index}")),
        author: first_string(raw, AUTHOR_FIELDS).unwrap_or_else(|| DEFAULT_AUTHOR.to_owned()),
        handle: first_string(raw, HANDLE_FIELDS).unwrap_or_default(),
        text: first_string(raw, TEXT_FIELDS).unwrap_or_default(),
        timestamp,
        relative_time,
        source_url: first_string(raw, URL_FIELDS).unwrap_or_else(|| DEFAULT_URL.to_owned()),
        provider,
        is_demo: false,
        reply_context: raw.get("reply_context").cloned().unwrap_or(Value::Null),
    }
}

/// Resolve the first non-empty string among `fields`. String values are
/// taken as-is; numeric values (some networks use numeric ids) are
/// rendered to decimal.
fn first_string(raw: &RawPost, fields: &[&str]) -> Option<String> {
    for field in fields {
        match raw.get(field) {
            Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.clone()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Render elapsed time since `timestamp` as a compact age string.
///
/// Under one minute is "just now"; under an hour, whole minutes ("5m");
/// under a day, whole hours ("2h"); otherwise whole days ("3d"). All
/// values floor. A timestamp in the future renders as "just now".
pub fn relative_time(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(timestamp);
    if elapsed.num_seconds() < 60 {
        return DEFAULT_AGE.to_owned();
    }
    let minutes = elapsed.num_minutes();
    if minutes < 60 {
        return format!("{minutes}m");
    }
    let hours = elapsed.num_hours();
    if hours < 24 {
        return format!("{hours}h");
    }
    format!("{}d", elapsed.num_days())
}
