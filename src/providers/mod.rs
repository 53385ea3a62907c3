//! Social network provider abstraction layer.
//!
//! Defines the [`SocialProvider`] trait and the shared request/response
//! types used by all provider implementations.
//!
//! Four providers are implemented:
//! - [`mastodon::MastodonProvider`] — bearer-token REST search + status create
//! - [`bluesky::BlueskyProvider`] — session-token XRPC search + record create
//! - [`linkedin::LinkedinProvider`] — OAuth REST feed + UGC post create
//! - [`threads::ThreadsProvider`] — graph-API two-phase container create + publish
//!
//! The [`crate::registry::ProviderRegistry`] tracks which providers are
//! configured and active; the [`crate::engine::AggregationEngine`] only ever
//! talks to the trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod bluesky;
pub mod linkedin;
pub mod mastodon;
pub mod threads;

// ---------------------------------------------------------------------------
// Core types
// ---------------------------------------------------------------------------

/// Identifier for one of the known networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// Mastodon (any instance).
    Mastodon,
    /// Bluesky / AT Protocol.
    Bluesky,
    /// LinkedIn.
    Linkedin,
    /// Threads.
    Threads,
}

impl ProviderId {
    /// All known provider identifiers, in canonical display order.
    pub const ALL: [ProviderId; 4] = [
        ProviderId::Mastodon,
        ProviderId::Bluesky,
        ProviderId::Linkedin,
        ProviderId::Threads,
    ];

    /// Lowercase identifier string, stable across releases.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mastodon => "mastodon",
            Self::Bluesky => "bluesky",
            Self::Linkedin => "linkedin",
            Self::Threads => "threads",
        }
    }

    /// Human-readable network name.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Mastodon => "Mastodon",
            Self::Bluesky => "Bluesky",
            Self::Linkedin => "LinkedIn",
            Self::Threads => "Threads",
        }
    }

    /// Parse a lowercase identifier string.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.as_str() == s)
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A provider-shaped search result before normalization.
///
/// Adapters reshape their wire responses into loosely keyed JSON objects;
/// the normalizer resolves canonical fields from them with ordered
/// fallbacks and carries the `reply_context` object through untouched.
pub type RawPost = Value;

/// Content to publish to a network.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublishContent {
    /// Plain post text.
    pub text: String,
    /// Optional attachment (GIF/image) URL.
    pub attachment_url: Option<String>,
    /// Opaque provider-specific reply-threading data, as produced by the
    /// normalizer for a post of the same provider.
    pub reply_context: Option<Value>,
}

/// Result of a publish attempt. Publishing never raises; failures are
/// reported inside the outcome so the caller can display them verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishOutcome {
    /// Whether the post was published.
    pub ok: bool,
    /// Permalink of the created post, when the network returns one.
    pub url: Option<String>,
    /// Error message on failure.
    pub error: Option<String>,
}

impl PublishOutcome {
    /// Successful publish, optionally with a permalink.
    pub fn published(url: Option<String>) -> Self {
        Self {
            ok: true,
            url,
            error: None,
        }
    }

    /// Failed publish with a display-ready error message.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            url: None,
            error: Some(error.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by provider adapters during search.
///
/// These never reach the caller of the engine: the engine collapses them
/// into demo-tagged posts at its boundary. Publish failures travel inside
/// [`PublishOutcome`] instead.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The adapter lacks required credentials. Checked before any call,
    /// never issued as a network error.
    #[error("{provider} is not configured")]
    Unconfigured {
        /// Provider that is missing credentials.
        provider: ProviderId,
    },
    /// Network or non-success-status failure.
    #[error("{provider} request failed{}: {reason}", fmt_status(.status))]
    Transport {
        /// Provider whose call failed.
        provider: ProviderId,
        /// HTTP status, when the failure was a status rather than transport.
        status: Option<u16>,
        /// Transport reason or response body excerpt.
        reason: String,
    },
    /// Response body did not match the expected shape.
    #[error("{provider} response parse error: {message}")]
    Parse {
        /// Provider whose response was unreadable.
        provider: ProviderId,
        /// Parse failure detail.
        message: String,
    },
}

fn fmt_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" with status {code}"),
        None => String::new(),
    }
}

impl ProviderError {
    /// Transport-level failure from a reqwest error.
    pub fn transport(provider: ProviderId, err: &reqwest::Error) -> Self {
        Self::Transport {
            provider,
            status: err.status().map(|s| s.as_u16()),
            reason: err.to_string(),
        }
    }

    /// The provider this error originated from.
    pub fn provider(&self) -> ProviderId {
        match self {
            Self::Unconfigured { provider }
            | Self::Transport { provider, .. }
            | Self::Parse { provider, .. } => *provider,
        }
    }
}

// ---------------------------------------------------------------------------
// HTTP helpers (shared by all providers)
// ---------------------------------------------------------------------------

/// Check HTTP response status and return body text or a structured error.
///
/// # Errors
///
/// Returns [`ProviderError::Transport`] on transport failure or non-2xx,
/// carrying the status code and a truncated body excerpt.
pub async fn check_http_response(
    provider: ProviderId,
    response: reqwest::Response,
) -> Result<String, ProviderError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::transport(provider, &e))?;
    if !status.is_success() {
        return Err(ProviderError::Transport {
            provider,
            status: Some(status.as_u16()),
            reason: truncate_error_body(&body),
        });
    }
    Ok(body)
}

/// Collapse whitespace and bound the length of an error body excerpt.
fn truncate_error_body(raw: &str) -> String {
    const MAX_ERROR_BODY_CHARS: usize = 256;

    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() > MAX_ERROR_BODY_CHARS {
        let shortened = collapsed
            .chars()
            .take(MAX_ERROR_BODY_CHARS)
            .collect::<String>();
        return format!("{shortened}...[truncated]");
    }
    collapsed
}

/// Case-insensitive substring match, shared by the LinkedIn search
/// fallback and the demo catalog filter.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Uniform capability contract over one network's API.
///
/// All implementations must be `Send + Sync`; the engine fans out
/// concurrent searches over `Arc<dyn SocialProvider>` handles.
#[async_trait]
pub trait SocialProvider: Send + Sync {
    /// The network this adapter talks to.
    fn id(&self) -> ProviderId;

    /// Whether the stored credentials are sufficient to make calls.
    ///
    /// Pure function of the in-memory credential vault; performs no I/O.
    fn is_configured(&self) -> bool;

    /// Fetch recent content matching `query`. One request, or a short
    /// bounded sequence where the protocol requires it (e.g. a session
    /// login before the search call). Never retried.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] on missing credentials, transport or
    /// status failure, or an unreadable response body.
    async fn search(&self, query: &str) -> Result<Vec<RawPost>, ProviderError>;

    /// Publish content, optionally threaded as a reply.
    ///
    /// Never raises: all failures, including multi-step protocol
    /// failures, are reported inside the returned [`PublishOutcome`].
    async fn publish(&self, content: &PublishContent) -> PublishOutcome;
}
