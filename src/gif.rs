//! GIF attachment search over the Tenor v2 API.
//!
//! Used by the drafting flow to offer attachment candidates. The client
//! degrades to an empty result set on any failure or when no API key is
//! configured; attachment search is never load-bearing.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::GifConfig;

const RESULT_LIMIT: u32 = 8;

// ---------------------------------------------------------------------------
// Wire types (pub for integration testing)
// ---------------------------------------------------------------------------

/// Tenor search response body.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct TenorResponse {
    /// Result entries.
    #[serde(default)]
    pub results: Vec<TenorResult>,
}

/// One Tenor result.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct TenorResult {
    /// Media renditions keyed by format name.
    #[serde(default)]
    pub media_formats: serde_json::Value,
    /// Accessibility description.
    pub content_description: Option<String>,
}

/// A GIF candidate ready to attach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GifResult {
    /// Full-size GIF URL (the attachment value).
    pub url: String,
    /// Smaller preview rendition, when available.
    pub preview_url: Option<String>,
    /// Human-readable description.
    pub description: String,
}

/// Parse a Tenor response into attachment candidates. Entries without a
/// full-size GIF rendition are skipped.
#[doc(hidden)]
pub fn parse_gif_response(body: &str) -> Vec<GifResult> {
    let Ok(resp) = serde_json::from_str::<TenorResponse>(body) else {
        warn!("gif response unparsable");
        return Vec::new();
    };
    resp.results
        .into_iter()
        .filter_map(|result| {
            let url = format_url(&result.media_formats, "gif")?;
            Some(GifResult {
                url,
                preview_url: format_url(&result.media_formats, "tinygif"),
                description: result.content_description.unwrap_or_default(),
            })
        })
        .collect()
}

fn format_url(media_formats: &serde_json::Value, format: &str) -> Option<String> {
    media_formats
        .get(format)?
        .get("url")?
        .as_str()
        .map(str::to_owned)
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Tenor search client.
pub struct GifClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for GifClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GifClient")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl GifClient {
    /// Create a client from configuration, resolving the API key from the
    /// environment variable the config names.
    pub fn new(config: &GifConfig) -> Self {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            api_key,
        }
    }

    /// Create a client with an explicit endpoint and key. Intended for
    /// tests.
    pub fn with_endpoint(endpoint: String, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
        }
    }

    /// Search for GIF candidates. Returns an empty list when the client
    /// is unconfigured or the request fails.
    pub async fn search(&self, query: &str) -> Vec<GifResult> {
        let Some(api_key) = &self.api_key else {
            debug!("gif search skipped, no API key configured");
            return Vec::new();
        };

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", query),
                ("key", api_key),
                ("limit", &RESULT_LIMIT.to_string()),
                ("media_filter", "gif,tinygif"),
            ])
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => match resp.text().await {
                Ok(body) => parse_gif_response(&body),
                Err(e) => {
                    warn!(error = %e, "gif response unreadable");
                    Vec::new()
                }
            },
            Ok(resp) => {
                warn!(status = resp.status().as_u16(), "gif search rejected");
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "gif search failed");
                Vec::new()
            }
        }
    }
}
