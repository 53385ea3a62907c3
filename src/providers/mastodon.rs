//! Mastodon provider implementation using the REST search and status APIs.
//!
//! Auth is a static bearer token per instance. Reply threading resolves
//! the target status id from the selected post's URL: the trailing
//! numeric path segment. When extraction fails the post goes out as a
//! top-level status instead of failing.

use std::sync::Arc;

use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};
use url::Url;

use crate::credentials::CredentialVault;

use super::{
    check_http_response, ProviderError, ProviderId, PublishContent, PublishOutcome, RawPost,
    SocialProvider,
};

const SEARCH_LIMIT: u32 = 20;
const DEFAULT_INSTANCE: &str = "https://mastodon.social";

// ---------------------------------------------------------------------------
// Wire types (pub for integration testing)
// ---------------------------------------------------------------------------

/// Mastodon `/api/v2/search` response body (statuses only).
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    /// Matching statuses.
    #[serde(default)]
    pub statuses: Vec<Status>,
}

/// A status in the Mastodon API shape.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct Status {
    /// Status id (decimal string).
    pub id: String,
    /// HTML content.
    #[serde(default)]
    pub content: String,
    /// Public permalink.
    pub url: Option<String>,
    /// RFC 3339 creation time.
    pub created_at: Option<String>,
    /// Author account.
    pub account: Account,
}

/// An account in the Mastodon API shape.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct Account {
    /// Display name; may be empty.
    #[serde(default)]
    pub display_name: String,
    /// Webfinger-style account name.
    #[serde(default)]
    pub acct: String,
}

/// `/api/v1/statuses` create response.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct CreatedStatus {
    /// Permalink of the created status.
    pub url: Option<String>,
}

// ---------------------------------------------------------------------------
// Parsers and builders (pub for integration testing)
// ---------------------------------------------------------------------------

/// Parse a search response into raw posts.
///
/// # Errors
///
/// Returns `ProviderError::Parse` when the body is not the search shape.
#[doc(hidden)]
pub fn parse_search_response(body: &str) -> Result<Vec<RawPost>, ProviderError> {
    let resp: SearchResponse = serde_json::from_str(body).map_err(|e| ProviderError::Parse {
        provider: ProviderId::Mastodon,
        message: e.to_string(),
    })?;

    Ok(resp
        .statuses
        .into_iter()
        .map(|status| {
            let author = if status.account.display_name.trim().is_empty() {
                status.account.acct.clone()
            } else {
                status.account.display_name.clone()
            };
            json!({
                "id": status.id,
                "author": author,
                "handle": format!("@{}", status.account.acct),
                "text": strip_html(&status.content),
                "url": status.url.clone(),
                "timestamp": status.created_at,
                // Reply threading needs only the permalink; the status id
                // is re-derived from it at publish time.
                "reply_context": { "url": status.url },
            })
        })
        .collect())
}

/// Extract the reply-target status id from a status URL.
///
/// Mastodon permalinks end in the numeric status id
/// (`https://an.instance/@user/109372843...`); anything else yields `None`
/// and the post is published as top-level.
#[doc(hidden)]
pub fn extract_status_id(url: &str) -> Option<String> {
    // Compiled per call; publish is a user-paced action.
    let re = Regex::new(r"/(\d+)/?$").ok()?;
    re.captures(url.trim_end_matches('?'))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_owned())
}

/// Build the status-create request body.
#[doc(hidden)]
pub fn build_status_body(content: &PublishContent) -> Value {
    let mut status = content.text.clone();
    if let Some(attachment) = &content.attachment_url {
        status = format!("{status}\n\n{attachment}");
    }

    let reply_id = content
        .reply_context
        .as_ref()
        .and_then(|ctx| ctx.get("url"))
        .and_then(Value::as_str)
        .and_then(extract_status_id);

    match reply_id {
        Some(id) => json!({ "status": status, "in_reply_to_id": id }),
        None => json!({ "status": status }),
    }
}

/// Strip HTML tags and decode the handful of entities Mastodon emits.
#[doc(hidden)]
pub fn strip_html(html: &str) -> String {
    // Paragraph and line breaks become whitespace before tag removal so
    // adjacent paragraphs do not run together.
    let spaced = html
        .replace("</p>", " ")
        .replace("<br>", " ")
        .replace("<br/>", " ")
        .replace("<br />", " ");
    let stripped = match Regex::new(r"<[^>]+>") {
        Ok(re) => re.replace_all(&spaced, "").into_owned(),
        Err(_) => spaced,
    };
    stripped
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Mastodon REST provider.
pub struct MastodonProvider {
    vault: Arc<CredentialVault>,
    client: reqwest::Client,
}

impl MastodonProvider {
    /// Create a Mastodon provider reading credentials from `vault`.
    pub fn new(vault: Arc<CredentialVault>) -> Self {
        Self {
            vault,
            client: reqwest::Client::new(),
        }
    }

    /// The configured instance base URL, validated; malformed values fall
    /// back to the flagship instance rather than producing broken requests.
    fn instance_url(&self) -> String {
        self.vault
            .credential(ProviderId::Mastodon, "instance_url")
            .and_then(|raw| match Url::parse(&raw) {
                Ok(parsed) if parsed.host_str().is_some() => {
                    Some(raw.trim_end_matches('/').to_owned())
                }
                _ => {
                    warn!(instance = %raw, "invalid instance_url credential, using default");
                    None
                }
            })
            .unwrap_or_else(|| DEFAULT_INSTANCE.to_owned())
    }

    fn access_token(&self) -> Result<String, ProviderError> {
        self.vault
            .credential(ProviderId::Mastodon, "access_token")
            .ok_or(ProviderError::Unconfigured {
                provider: ProviderId::Mastodon,
            })
    }

    async fn publish_inner(&self, content: &PublishContent) -> Result<Option<String>, ProviderError> {
        let token = self.access_token()?;
        let url = format!("{}/api/v1/statuses", self.instance_url());
        let body = build_status_body(content);

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::transport(ProviderId::Mastodon, &e))?;
        let payload = check_http_response(ProviderId::Mastodon, response).await?;

        let created: CreatedStatus =
            serde_json::from_str(&payload).map_err(|e| ProviderError::Parse {
                provider: ProviderId::Mastodon,
                message: e.to_string(),
            })?;
        Ok(created.url)
    }
}

#[async_trait::async_trait]
impl SocialProvider for MastodonProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Mastodon
    }

    fn is_configured(&self) -> bool {
        self.vault.has_all(ProviderId::Mastodon, &["access_token"])
    }

    async fn search(&self, query: &str) -> Result<Vec<RawPost>, ProviderError> {
        let token = self.access_token()?;
        let url = format!("{}/api/v2/search", self.instance_url());

        debug!(query, "mastodon search");
        let limit = SEARCH_LIMIT.to_string();
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(&[
                ("q", query),
                ("type", "statuses"),
                ("resolve", "true"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::transport(ProviderId::Mastodon, &e))?;
        let payload = check_http_response(ProviderId::Mastodon, response).await?;
        parse_search_response(&payload)
    }

    async fn publish(&self, content: &PublishContent) -> PublishOutcome {
        match self.publish_inner(content).await {
            Ok(url) => PublishOutcome::published(url),
            Err(e) => {
                warn!(error = %e, "mastodon publish failed");
                PublishOutcome::failed(e.to_string())
            }
        }
    }
}
