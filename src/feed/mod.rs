//! Canonical feed model.
//!
//! A feed is an ordered snapshot of [`Post`] values, rebuilt atomically on
//! every search and never mutated incrementally. Within a feed, live posts
//! always precede demo posts.

use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::providers::ProviderId;

pub mod demo;
pub mod normalizer;

/// The canonical, provider-agnostic representation of one social item.
///
/// Immutable once constructed. `id` is unique within one feed snapshot;
/// `reply_context` is an opaque per-provider bag and is always `Null` for
/// demo posts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Snapshot-unique identifier.
    pub id: String,
    /// Display name of the author.
    pub author: String,
    /// Network-specific username, e.g. `@alice@mastodon.social`.
    pub handle: String,
    /// Plain post text; may be empty.
    pub text: String,
    /// Source-supplied creation time, when the network provided one.
    pub timestamp: Option<DateTime<Utc>>,
    /// Deterministic human-readable age ("just now", "5m", "2h", "3d").
    pub relative_time: String,
    /// Permalink to the post, `"#"` when the network supplied none.
    pub source_url: String,
    /// Network the post came from.
    pub provider: ProviderId,
    /// True when produced by the demo fallback rather than a live call.
    pub is_demo: bool,
    /// Opaque provider-specific reply-threading data.
    pub reply_context: Value,
}

/// Summary classification of an aggregated search, derived from the
/// live/demo counts so callers can render a status line without the
/// engine holding mutable status text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedStatus {
    /// No provider was selected for the search; informational, not an error.
    NoProviderSelected,
    /// Providers were queried but nothing matched.
    NoResults,
    /// Every post came from a live provider call.
    LiveOnly,
    /// Every post is demo fallback content.
    DemoOnly,
    /// Both live and demo posts are present.
    Mixed,
}

impl FeedStatus {
    /// Classify a merged feed from its live and demo counts.
    pub fn classify(live: usize, demo: usize) -> Self {
        match (live, demo) {
            (0, 0) => Self::NoResults,
            (_, 0) => Self::LiveOnly,
            (0, _) => Self::DemoOnly,
            _ => Self::Mixed,
        }
    }
}

/// The at-most-one post currently selected in the host UI.
///
/// Owned by the presentation layer; the engine reads it to populate
/// reply-threading context when posting. Cleared on explicit clear or
/// app reset.
#[derive(Debug, Default)]
pub struct SelectionState {
    inner: RwLock<Option<Post>>,
}

impl SelectionState {
    /// Empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the selection.
    pub fn select(&self, post: Post) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *inner = Some(post);
    }

    /// Clear the selection.
    pub fn clear(&self) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *inner = None;
    }

    /// Snapshot of the selected post, if any.
    pub fn selected(&self) -> Option<Post> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.clone()
    }
}
