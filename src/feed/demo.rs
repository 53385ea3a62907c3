//! Deterministic placeholder content.
//!
//! When a provider is unconfigured or its live call fails, the engine
//! substitutes posts from this fixed catalog instead of surfacing an
//! error. Every demo post is tagged `is_demo` and carries no reply
//! context, so it can never be used to thread a live reply.

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use crate::feed::{normalizer, Post};
use crate::providers::{contains_ignore_case, ProviderId};

/// Catalog template texts. `{topic}` is replaced by the search query so
/// demo results stay plausible for any search.
const TEMPLATES: &[&str] = &[
    "Thinking out loud about {topic} today.",
    "Hot take: {topic} is underrated.",
    "Collected some notes on {topic} this week. Thread soon.",
];

/// Fixed sample authors, one per catalog slot.
const AUTHORS: &[(&str, &str)] = &[
    ("Sam Rivera", "@samrivera"),
    ("Priya Patel", "@priyabuilds"),
    ("Jo Lindqvist", "@jolindqvist"),
];

/// Post ages for the catalog slots, oldest last.
const AGES_MINUTES: &[i64] = &[8, 190, 2 * 24 * 60];

/// Sample posts for one provider, filtered by the same case-insensitive
/// substring match used by live search fallbacks.
///
/// `now` anchors the rendered ages so output is deterministic.
pub fn demo_posts(provider: ProviderId, query: &str, now: DateTime<Utc>) -> Vec<Post> {
    let topic = if query.trim().is_empty() {
        "the timeline"
    } else {
        query
    };

    TEMPLATES
        .iter()
        .zip(AUTHORS)
        .zip(AGES_MINUTES)
        .enumerate()
        .map(|(index, ((template, (author, handle)), age))| {
            let text = format!(
                "{} {}",
                template.replace("{topic}", topic),
                flavor_suffix(provider)
            );
            let timestamp = now.checked_sub_signed(Duration::minutes(*age));
            Post {
                id: format!("demo-{provider}-{index}"),
                author: (*author).to_owned(),
                handle: (*handle).to_owned(),
                text,
                timestamp,
                relative_time: timestamp
                    .map(|ts| normalizer::relative_time(ts, now))
                    .unwrap_or_else(|| "just now".to_owned()),
                source_url: "#".to_owned(),
                provider,
                is_demo: true,
                reply_context: Value::Null,
            }
        })
        .filter(|post| contains_ignore_case(&post.text, query))
        .collect()
}

/// Distinct closing line per network, so demo content is recognizable
/// and provider-flavored at a glance.
fn flavor_suffix(provider: ProviderId) -> &'static str {
    match provider {
        ProviderId::Mastodon => "Boosting this across the fediverse.",
        ProviderId::Bluesky => "Skeeting this into the blue.",
        ProviderId::Linkedin => "Agree? Let's connect.",
        ProviderId::Threads => "Drop your take in the thread.",
    }
}
