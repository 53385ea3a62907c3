//! LinkedIn provider implementation over the OAuth REST API.
//!
//! The public API has no reliable post search, so the adapter tries the
//! search endpoint first and, when that call is rejected, substitutes a
//! fetch of the authenticated member's own recent UGC posts filtered by a
//! local case-insensitive substring match. Publishing is a single UGC
//! post create; replies are not a distinct operation on this network and
//! go out as top-level posts.

use std::sync::Arc;

use chrono::DateTime;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::credentials::CredentialVault;

use super::{
    check_http_response, contains_ignore_case, ProviderError, ProviderId, PublishContent,
    PublishOutcome, RawPost, SocialProvider,
};

const SEARCH_LIMIT: u32 = 20;
const DEFAULT_API_BASE: &str = "https://api.linkedin.com";
const RESTLI_VERSION: &str = "2.0.0";

// ---------------------------------------------------------------------------
// Wire types (pub for integration testing)
// ---------------------------------------------------------------------------

/// `/v2/ugcPosts` list response body.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct UgcPostsResponse {
    /// Returned posts.
    #[serde(default)]
    pub elements: Vec<UgcPost>,
}

/// One UGC post in the LinkedIn API shape.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct UgcPost {
    /// Share URN, e.g. `urn:li:share:70123…`.
    pub id: String,
    /// Creation metadata.
    pub created: Option<UgcCreated>,
    /// Typed content container.
    #[serde(rename = "specificContent", default)]
    pub specific_content: Value,
}

/// UGC creation metadata.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct UgcCreated {
    /// Epoch milliseconds.
    pub time: i64,
}

/// `/v2/ugcPosts` create response body.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct UgcCreateResponse {
    /// URN of the created share.
    pub id: String,
}

// ---------------------------------------------------------------------------
// Parsers and builders (pub for integration testing)
// ---------------------------------------------------------------------------

/// Parse an own-posts response into raw posts, applying the local
/// case-insensitive substring filter for `query`.
///
/// # Errors
///
/// Returns `ProviderError::Parse` when the body is not the list shape.
#[doc(hidden)]
pub fn parse_own_posts(
    body: &str,
    query: &str,
    author: &str,
    author_urn: &str,
) -> Result<Vec<RawPost>, ProviderError> {
    let resp: UgcPostsResponse = serde_json::from_str(body).map_err(|e| ProviderError::Parse {
        provider: ProviderId::Linkedin,
        message: e.to_string(),
    })?;

    Ok(resp
        .elements
        .into_iter()
        .filter_map(|post| {
            let text = commentary_text(&post.specific_content)?;
            if !contains_ignore_case(&text, query) {
                return None;
            }
            let timestamp = post
                .created
                .and_then(|c| DateTime::from_timestamp_millis(c.time))
                .map(|dt| dt.to_rfc3339());
            Some(json!({
                "id": post.id.clone(),
                "author": author,
                "handle": author_urn,
                "text": text,
                "url": share_url(&post.id),
                "timestamp": timestamp,
                "reply_context": { "share_urn": post.id },
            }))
        })
        .collect())
}

/// Pull the share commentary text out of the typed content container.
fn commentary_text(specific_content: &Value) -> Option<String> {
    specific_content
        .get("com.linkedin.ugc.ShareContent")?
        .get("shareCommentary")?
        .get("text")?
        .as_str()
        .map(str::to_owned)
}

/// Build a UGC post create body.
#[doc(hidden)]
pub fn build_ugc_body(author_urn: &str, content: &PublishContent) -> Value {
    let mut text = content.text.clone();
    if let Some(attachment) = &content.attachment_url {
        text = format!("{text}\n\n{attachment}");
    }

    json!({
        "author": author_urn,
        "lifecycleState": "PUBLISHED",
        "specificContent": {
            "com.linkedin.ugc.ShareContent": {
                "shareCommentary": { "text": text },
                "shareMediaCategory": "NONE",
            }
        },
        "visibility": {
            "com.linkedin.ugc.MemberNetworkVisibility": "PUBLIC",
        }
    })
}

/// Public permalink for a share URN.
#[doc(hidden)]
pub fn share_url(urn: &str) -> String {
    format!("https://www.linkedin.com/feed/update/{urn}/")
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// LinkedIn OAuth REST provider.
pub struct LinkedinProvider {
    vault: Arc<CredentialVault>,
    client: reqwest::Client,
}

impl LinkedinProvider {
    /// Create a LinkedIn provider reading credentials from `vault`.
    pub fn new(vault: Arc<CredentialVault>) -> Self {
        Self {
            vault,
            client: reqwest::Client::new(),
        }
    }

    fn api_base(&self) -> String {
        self.vault
            .credential(ProviderId::Linkedin, "api_base")
            .map(|url| url.trim_end_matches('/').to_owned())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_owned())
    }

    fn required(&self, key: &str) -> Result<String, ProviderError> {
        self.vault
            .credential(ProviderId::Linkedin, key)
            .ok_or(ProviderError::Unconfigured {
                provider: ProviderId::Linkedin,
            })
    }

    fn display_name(&self) -> String {
        self.vault
            .credential(ProviderId::Linkedin, "display_name")
            .unwrap_or_else(|| "You".to_owned())
    }

    /// The authentic search path. Rejected on most API tiers; failure
    /// triggers the own-posts fallback.
    async fn search_remote(&self, query: &str, token: &str) -> Result<Vec<RawPost>, ProviderError> {
        let url = format!("{}/v2/search", self.api_base());
        let count = SEARCH_LIMIT.to_string();
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .header("X-Restli-Protocol-Version", RESTLI_VERSION)
            .query(&[("q", "content"), ("keywords", query), ("count", count.as_str())])
            .send()
            .await
            .map_err(|e| ProviderError::transport(ProviderId::Linkedin, &e))?;
        let payload = check_http_response(ProviderId::Linkedin, response).await?;
        // The search response reuses the ugcPosts element shape.
        parse_own_posts(&payload, "", &self.display_name(), &self.required("author_urn")?)
    }

    /// Fallback: the member's own recent posts, filtered locally.
    async fn search_own_posts(
        &self,
        query: &str,
        token: &str,
    ) -> Result<Vec<RawPost>, ProviderError> {
        let author_urn = self.required("author_urn")?;
        let url = format!("{}/v2/ugcPosts", self.api_base());
        let authors = format!("List({author_urn})");
        let count = SEARCH_LIMIT.to_string();
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .header("X-Restli-Protocol-Version", RESTLI_VERSION)
            .query(&[
                ("q", "authors"),
                ("authors", authors.as_str()),
                ("count", count.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::transport(ProviderId::Linkedin, &e))?;
        let payload = check_http_response(ProviderId::Linkedin, response).await?;
        parse_own_posts(&payload, query, &self.display_name(), &author_urn)
    }

    async fn publish_inner(&self, content: &PublishContent) -> Result<Option<String>, ProviderError> {
        let token = self.required("access_token")?;
        let author_urn = self.required("author_urn")?;
        let url = format!("{}/v2/ugcPosts", self.api_base());
        let body = build_ugc_body(&author_urn, content);

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .header("X-Restli-Protocol-Version", RESTLI_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::transport(ProviderId::Linkedin, &e))?;
        let payload = check_http_response(ProviderId::Linkedin, response).await?;

        let created: UgcCreateResponse =
            serde_json::from_str(&payload).map_err(|e| ProviderError::Parse {
                provider: ProviderId::Linkedin,
                message: e.to_string(),
            })?;
        Ok(Some(share_url(&created.id)))
    }
}

#[async_trait::async_trait]
impl SocialProvider for LinkedinProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Linkedin
    }

    fn is_configured(&self) -> bool {
        self.vault
            .has_all(ProviderId::Linkedin, &["access_token", "author_urn"])
    }

    async fn search(&self, query: &str) -> Result<Vec<RawPost>, ProviderError> {
        let token = self.required("access_token")?;

        debug!(query, "linkedin search");
        match self.search_remote(query, &token).await {
            Ok(posts) => Ok(posts),
            Err(e) => {
                warn!(error = %e, "linkedin search endpoint rejected, using own-posts fallback");
                self.search_own_posts(query, &token).await
            }
        }
    }

    async fn publish(&self, content: &PublishContent) -> PublishOutcome {
        match self.publish_inner(content).await {
            Ok(url) => PublishOutcome::published(url),
            Err(e) => {
                warn!(error = %e, "linkedin publish failed");
                PublishOutcome::failed(e.to_string())
            }
        }
    }
}
