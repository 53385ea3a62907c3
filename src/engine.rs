//! Aggregation engine: fan-out search and the reply-post pipeline.
//!
//! `search` queries every active provider concurrently and merges the
//! results into one feed. Per-provider failures never surface: an
//! unconfigured adapter, a transport error, or a timed-out call all
//! collapse into demo-tagged posts for that provider, and the merged feed
//! keeps live posts ahead of demo posts. `post` routes a draft to one
//! adapter and reports every failure inside the outcome.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, warn};

use crate::feed::{demo, normalizer, FeedStatus, Post, SelectionState};
use crate::providers::{ProviderId, PublishContent, PublishOutcome};
use crate::registry::ProviderRegistry;

/// Failure message when no adapter is registered for a provider id.
const NO_PROVIDER_CLIENT: &str = "No provider client";

/// Single bounded timeout applied to each provider search call. A
/// timed-out provider is treated exactly like any other failed provider.
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(10);

/// One aggregated search result: an atomically rebuilt feed snapshot plus
/// enough structured information for the caller to render a status line.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    /// Monotonic search number; see [`AggregationEngine::latest_generation`].
    pub generation: u64,
    /// Merged feed, live posts strictly before demo posts.
    pub posts: Vec<Post>,
    /// Count of posts from live provider calls.
    pub live: usize,
    /// Count of demo fallback posts.
    pub demo: usize,
    /// Summary classification of the snapshot.
    pub status: FeedStatus,
}

/// The multi-provider search and post pipeline.
pub struct AggregationEngine {
    registry: Arc<ProviderRegistry>,
    selection: Arc<SelectionState>,
    search_timeout: Duration,
    generation: AtomicU64,
}

impl AggregationEngine {
    /// Create an engine over a registry and the UI selection state.
    pub fn new(registry: Arc<ProviderRegistry>, selection: Arc<SelectionState>) -> Self {
        Self {
            registry,
            selection,
            search_timeout: DEFAULT_SEARCH_TIMEOUT,
            generation: AtomicU64::new(0),
        }
    }

    /// Override the per-provider search timeout.
    #[must_use]
    pub fn with_search_timeout(mut self, timeout: Duration) -> Self {
        self.search_timeout = timeout;
        self
    }

    /// Query all `active` providers concurrently and merge the results.
    ///
    /// The whole fan-out runs on the calling task and resolves only when
    /// every provider has succeeded or failed; partial results are never
    /// streamed. Ids not present in the registry are skipped.
    pub async fn search(&self, query: &str, active: &[ProviderId]) -> SearchOutcome {
        let generation = self.next_generation();

        if active.is_empty() {
            debug!("search with no provider selected");
            return SearchOutcome {
                generation,
                posts: Vec::new(),
                live: 0,
                demo: 0,
                status: FeedStatus::NoProviderSelected,
            };
        }

        let now = Utc::now();
        let calls = active.iter().filter_map(|id| {
            let adapter = self.registry.adapter(*id)?;
            Some(async move {
                if !adapter.is_configured() {
                    debug!(provider = %adapter.id(), "provider unconfigured, serving demo content");
                    return demo::demo_posts(adapter.id(), query, now);
                }
                match tokio::time::timeout(self.search_timeout, adapter.search(query)).await {
                    Ok(Ok(raw)) => normalizer::normalize_posts(&raw, adapter.id(), now),
                    Ok(Err(e)) => {
                        warn!(provider = %adapter.id(), error = %e, "search failed, serving demo content");
                        demo::demo_posts(adapter.id(), query, now)
                    }
                    Err(_) => {
                        warn!(provider = %adapter.id(), "search timed out, serving demo content");
                        demo::demo_posts(adapter.id(), query, now)
                    }
                }
            })
        });

        let mut posts: Vec<Post> = join_all(calls).await.into_iter().flatten().collect();
        // Stable: arrival order is preserved within the live and demo groups.
        posts.sort_by_key(|p| p.is_demo);

        let demo_count = posts.iter().filter(|p| p.is_demo).count();
        let live_count = posts.len().saturating_sub(demo_count);

        SearchOutcome {
            generation,
            posts,
            live: live_count,
            demo: demo_count,
            status: FeedStatus::classify(live_count, demo_count),
        }
    }

    /// Publish a draft through one provider's adapter.
    ///
    /// An unregistered id yields a structured failure; adapter errors are
    /// already folded into the outcome by the adapter itself. When the
    /// draft carries no reply context, the current selection supplies one
    /// if it is a live post of the same provider.
    pub async fn post(&self, provider: ProviderId, content: PublishContent) -> PublishOutcome {
        let Some(adapter) = self.registry.adapter(provider) else {
            return PublishOutcome::failed(NO_PROVIDER_CLIENT);
        };
        let content = self.with_selection_context(provider, content);
        adapter.publish(&content).await
    }

    /// The generation number of the most recently started search.
    ///
    /// A caller holding a [`SearchOutcome`] should apply it only when
    /// `outcome.generation == latest_generation()`; a stale outcome means
    /// a newer search superseded it and its feed must be discarded.
    pub fn latest_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Whether an outcome from `generation` is still the newest search.
    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.latest_generation()
    }

    fn next_generation(&self) -> u64 {
        self.generation
            .fetch_add(1, Ordering::SeqCst)
            .wrapping_add(1)
    }

    fn with_selection_context(
        &self,
        provider: ProviderId,
        mut content: PublishContent,
    ) -> PublishContent {
        if content.reply_context.is_some() {
            return content;
        }
        let Some(selected) = self.selection.selected() else {
            return content;
        };
        // Demo posts never carry threading data usable for posting.
        if selected.is_demo || selected.provider != provider || selected.reply_context.is_null() {
            return content;
        }
        debug!(%provider, post = %selected.id, "threading reply from selected post");
        content.reply_context = Some(selected.reply_context);
        content
    }
}
