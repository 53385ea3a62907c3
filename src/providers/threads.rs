//! Threads provider implementation over the graph API.
//!
//! Publishing is two-phase: create a media container, then publish it by
//! reference. The phases are an explicit `Created -> Published`
//! transition so each failure mode stands alone: a phase-1 failure aborts
//! before phase 2, and a phase-2 failure reports its own error while the
//! created-but-unpublished container is abandoned. Image attachments and
//! the reply target are accepted at creation time only.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::credentials::CredentialVault;

use super::{
    check_http_response, ProviderError, ProviderId, PublishContent, PublishOutcome, RawPost,
    SocialProvider,
};

const SEARCH_LIMIT: u32 = 20;
const DEFAULT_GRAPH_BASE: &str = "https://graph.threads.net/v1.0";
const SEARCH_FIELDS: &str = "id,text,username,permalink,timestamp";

// ---------------------------------------------------------------------------
// Wire types (pub for integration testing)
// ---------------------------------------------------------------------------

/// `keyword_search` response body.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    /// Matching threads.
    #[serde(default)]
    pub data: Vec<ThreadPost>,
}

/// One thread in the graph API shape.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct ThreadPost {
    /// Media id.
    pub id: String,
    /// Post text; absent for media-only posts.
    pub text: Option<String>,
    /// Author username.
    pub username: Option<String>,
    /// Public permalink.
    pub permalink: Option<String>,
    /// Creation time.
    pub timestamp: Option<String>,
}

/// Container create / publish response body — both phases return an id.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct MediaIdResponse {
    /// Container or published-media id.
    pub id: String,
}

/// The two-phase publish state. A value of this type is the proof of how
/// far the protocol advanced; the orphaned `Created` case is accepted and
/// never cleaned up.
#[doc(hidden)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishPhase {
    /// Container created, publish not yet attempted.
    Created {
        /// Container id to publish by reference.
        creation_id: String,
    },
    /// Container published as a live post.
    Published {
        /// Id of the published media.
        post_id: String,
    },
}

// ---------------------------------------------------------------------------
// Parsers and builders (pub for integration testing)
// ---------------------------------------------------------------------------

/// Parse a keyword_search response into raw posts.
///
/// # Errors
///
/// Returns `ProviderError::Parse` when the body is not the search shape.
#[doc(hidden)]
pub fn parse_search_response(body: &str) -> Result<Vec<RawPost>, ProviderError> {
    let resp: SearchResponse = serde_json::from_str(body).map_err(|e| ProviderError::Parse {
        provider: ProviderId::Threads,
        message: e.to_string(),
    })?;

    Ok(resp
        .data
        .into_iter()
        .map(|post| {
            let username = post.username.unwrap_or_default();
            json!({
                "id": post.id.clone(),
                "author": username.clone(),
                "handle": format!("@{username}"),
                "text": post.text,
                "url": post.permalink,
                "timestamp": post.timestamp,
                "reply_context": { "reply_to_id": post.id },
            })
        })
        .collect())
}

/// Build the container-create query parameters. The reply target and the
/// image attachment can only be supplied here, never at publish time.
#[doc(hidden)]
pub fn build_container_params(content: &PublishContent) -> Vec<(String, String)> {
    let mut params = Vec::new();
    match &content.attachment_url {
        Some(image_url) => {
            params.push(("media_type".to_owned(), "IMAGE".to_owned()));
            params.push(("image_url".to_owned(), image_url.clone()));
        }
        None => params.push(("media_type".to_owned(), "TEXT".to_owned())),
    }
    params.push(("text".to_owned(), content.text.clone()));

    let reply_to = content
        .reply_context
        .as_ref()
        .and_then(|ctx| ctx.get("reply_to_id"))
        .and_then(Value::as_str);
    if let Some(id) = reply_to {
        params.push(("reply_to_id".to_owned(), id.to_owned()));
    }
    params
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Threads graph-API provider.
pub struct ThreadsProvider {
    vault: Arc<CredentialVault>,
    client: reqwest::Client,
}

impl ThreadsProvider {
    /// Create a Threads provider reading credentials from `vault`.
    pub fn new(vault: Arc<CredentialVault>) -> Self {
        Self {
            vault,
            client: reqwest::Client::new(),
        }
    }

    fn graph_base(&self) -> String {
        self.vault
            .credential(ProviderId::Threads, "graph_base")
            .map(|url| url.trim_end_matches('/').to_owned())
            .unwrap_or_else(|| DEFAULT_GRAPH_BASE.to_owned())
    }

    fn required(&self, key: &str) -> Result<String, ProviderError> {
        self.vault
            .credential(ProviderId::Threads, key)
            .ok_or(ProviderError::Unconfigured {
                provider: ProviderId::Threads,
            })
    }

    async fn post_for_id(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> Result<MediaIdResponse, ProviderError> {
        let response = self
            .client
            .post(url)
            .query(params)
            .send()
            .await
            .map_err(|e| ProviderError::transport(ProviderId::Threads, &e))?;
        let payload = check_http_response(ProviderId::Threads, response).await?;
        serde_json::from_str(&payload).map_err(|e| ProviderError::Parse {
            provider: ProviderId::Threads,
            message: e.to_string(),
        })
    }

    /// Phase 1: create the media container.
    async fn create_container(
        &self,
        content: &PublishContent,
        token: &str,
        user_id: &str,
    ) -> Result<PublishPhase, ProviderError> {
        let url = format!("{}/{user_id}/threads", self.graph_base());
        let mut params = build_container_params(content);
        params.push(("access_token".to_owned(), token.to_owned()));

        let created = self.post_for_id(&url, &params).await?;
        Ok(PublishPhase::Created {
            creation_id: created.id,
        })
    }

    /// Phase 2: publish a created container by reference.
    async fn publish_container(
        &self,
        phase: PublishPhase,
        token: &str,
        user_id: &str,
    ) -> Result<PublishPhase, ProviderError> {
        let PublishPhase::Created { creation_id } = phase else {
            return Ok(phase);
        };
        let url = format!("{}/{user_id}/threads_publish", self.graph_base());
        let params = vec![
            ("creation_id".to_owned(), creation_id.clone()),
            ("access_token".to_owned(), token.to_owned()),
        ];

        match self.post_for_id(&url, &params).await {
            Ok(published) => Ok(PublishPhase::Published {
                post_id: published.id,
            }),
            Err(e) => {
                // The container stays behind as an accepted orphan.
                warn!(%creation_id, "threads container created but not published");
                Err(e)
            }
        }
    }

    async fn publish_inner(&self, content: &PublishContent) -> Result<Option<String>, ProviderError> {
        let token = self.required("access_token")?;
        let user_id = self.required("user_id")?;

        let created = self.create_container(content, &token, &user_id).await?;
        let published = self.publish_container(created, &token, &user_id).await?;

        match published {
            PublishPhase::Published { post_id } => {
                debug!(%post_id, "threads publish complete");
                Ok(None)
            }
            PublishPhase::Created { .. } => Ok(None),
        }
    }
}

#[async_trait::async_trait]
impl SocialProvider for ThreadsProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Threads
    }

    fn is_configured(&self) -> bool {
        self.vault
            .has_all(ProviderId::Threads, &["access_token", "user_id"])
    }

    async fn search(&self, query: &str) -> Result<Vec<RawPost>, ProviderError> {
        let token = self.required("access_token")?;
        let url = format!("{}/keyword_search", self.graph_base());

        debug!(query, "threads search");
        let limit = SEARCH_LIMIT.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", query),
                ("fields", SEARCH_FIELDS),
                ("limit", limit.as_str()),
                ("access_token", token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::transport(ProviderId::Threads, &e))?;
        let payload = check_http_response(ProviderId::Threads, response).await?;
        parse_search_response(&payload)
    }

    async fn publish(&self, content: &PublishContent) -> PublishOutcome {
        match self.publish_inner(content).await {
            Ok(url) => PublishOutcome::published(url),
            Err(e) => PublishOutcome::failed(e.to_string()),
        }
    }
}
