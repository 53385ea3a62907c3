//! Bluesky provider implementation over the AT Protocol XRPC API.
//!
//! Every authenticated call rides on a short-lived session token obtained
//! from `com.atproto.server.createSession`. The session is cached inside
//! the adapter for one hour from acquisition and re-acquired afterwards;
//! the cache mutex is held across re-login so concurrent expired calls
//! authenticate once instead of racing.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::credentials::CredentialVault;

use super::{
    check_http_response, ProviderError, ProviderId, PublishContent, PublishOutcome, RawPost,
    SocialProvider,
};

const SEARCH_LIMIT: u32 = 20;
const DEFAULT_SERVICE: &str = "https://bsky.social";

/// How long a session token is reused before re-login.
pub const SESSION_TTL: Duration = Duration::from_secs(3600);

// ---------------------------------------------------------------------------
// Session cache
// ---------------------------------------------------------------------------

/// A cached session token, private to one adapter instance.
#[doc(hidden)]
#[derive(Debug, Clone)]
pub struct CachedSession {
    /// Access JWT sent as the bearer credential.
    pub access_jwt: String,
    /// DID of the authenticated account (the record repo).
    pub did: String,
    /// When the session was acquired.
    pub acquired_at: Instant,
}

impl CachedSession {
    /// True once the session has outlived [`SESSION_TTL`].
    pub fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.acquired_at) >= SESSION_TTL
    }
}

// ---------------------------------------------------------------------------
// Wire types (pub for integration testing)
// ---------------------------------------------------------------------------

/// `com.atproto.server.createSession` response body.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct SessionResponse {
    /// Access JWT.
    #[serde(rename = "accessJwt")]
    pub access_jwt: String,
    /// Account DID.
    pub did: String,
}

/// `app.bsky.feed.searchPosts` response body.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    /// Matching posts.
    #[serde(default)]
    pub posts: Vec<PostView>,
}

/// A post view in the Bluesky API shape.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct PostView {
    /// AT URI of the record.
    pub uri: String,
    /// Content-addressed revision marker.
    pub cid: String,
    /// Author profile.
    pub author: ProfileView,
    /// The post record itself.
    pub record: PostRecord,
    /// When the post was indexed.
    #[serde(rename = "indexedAt")]
    pub indexed_at: Option<String>,
}

/// Author profile in the Bluesky API shape.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct ProfileView {
    /// Handle, e.g. `alice.bsky.social`.
    pub handle: String,
    /// Display name; may be absent.
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
}

/// Post record fields used here.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct PostRecord {
    /// Post text.
    #[serde(default)]
    pub text: String,
    /// Record creation time.
    #[serde(rename = "createdAt")]
    pub created_at: Option<String>,
}

/// `com.atproto.repo.createRecord` response body.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct CreateRecordResponse {
    /// AT URI of the created record.
    pub uri: String,
}

// ---------------------------------------------------------------------------
// Parsers and builders (pub for integration testing)
// ---------------------------------------------------------------------------

/// Parse a createSession response.
///
/// # Errors
///
/// Returns `ProviderError::Parse` when the body is not the session shape.
#[doc(hidden)]
pub fn parse_session_response(body: &str) -> Result<SessionResponse, ProviderError> {
    serde_json::from_str(body).map_err(|e| ProviderError::Parse {
        provider: ProviderId::Bluesky,
        message: e.to_string(),
    })
}

/// Parse a searchPosts response into raw posts.
///
/// # Errors
///
/// Returns `ProviderError::Parse` when the body is not the search shape.
#[doc(hidden)]
pub fn parse_search_response(body: &str) -> Result<Vec<RawPost>, ProviderError> {
    let resp: SearchResponse = serde_json::from_str(body).map_err(|e| ProviderError::Parse {
        provider: ProviderId::Bluesky,
        message: e.to_string(),
    })?;

    Ok(resp
        .posts
        .into_iter()
        .map(|post| {
            let author = post
                .author
                .display_name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| post.author.handle.clone());
            json!({
                "id": post.uri.clone(),
                "author": author,
                "handle": format!("@{}", post.author.handle),
                "text": post.record.text,
                "url": web_url(&post.author.handle, &post.uri),
                "timestamp": post.record.created_at.or(post.indexed_at),
                // uri + cid are exactly what a reply ref needs; carried
                // through untouched.
                "reply_context": { "uri": post.uri, "cid": post.cid },
            })
        })
        .collect())
}

/// Build the createRecord request body for a post, threading it as a
/// reply when the context carries `{uri, cid}`.
#[doc(hidden)]
pub fn build_record_body(did: &str, content: &PublishContent, created_at: &str) -> Value {
    let mut text = content.text.clone();
    if let Some(attachment) = &content.attachment_url {
        text = format!("{text}\n\n{attachment}");
    }

    let mut record = json!({
        "$type": "app.bsky.feed.post",
        "text": text,
        "createdAt": created_at,
    });

    let reply_ref = content.reply_context.as_ref().and_then(|ctx| {
        let uri = ctx.get("uri").and_then(Value::as_str)?;
        let cid = ctx.get("cid").and_then(Value::as_str)?;
        Some(json!({ "uri": uri, "cid": cid }))
    });
    if let Some(target) = reply_ref {
        // Single-level threading: the selected post is both root and parent.
        record["reply"] = json!({ "root": target, "parent": target });
    }

    json!({
        "repo": did,
        "collection": "app.bsky.feed.post",
        "record": record,
    })
}

/// Derive the public web permalink from a handle and an AT URI.
///
/// The record key is the final URI path segment.
#[doc(hidden)]
pub fn web_url(handle: &str, uri: &str) -> String {
    match uri.rsplit('/').next() {
        Some(rkey) if !rkey.is_empty() => {
            format!("https://bsky.app/profile/{handle}/post/{rkey}")
        }
        _ => format!("https://bsky.app/profile/{handle}"),
    }
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Bluesky XRPC provider.
pub struct BlueskyProvider {
    vault: Arc<CredentialVault>,
    client: reqwest::Client,
    session: Mutex<Option<CachedSession>>,
}

impl BlueskyProvider {
    /// Create a Bluesky provider reading credentials from `vault`.
    pub fn new(vault: Arc<CredentialVault>) -> Self {
        Self {
            vault,
            client: reqwest::Client::new(),
            session: Mutex::new(None),
        }
    }

    fn service_url(&self) -> String {
        self.vault
            .credential(ProviderId::Bluesky, "service_url")
            .map(|url| url.trim_end_matches('/').to_owned())
            .unwrap_or_else(|| DEFAULT_SERVICE.to_owned())
    }

    /// Return a live session, logging in when none is cached or the
    /// cached one has expired. The lock is held across the login call.
    async fn session(&self) -> Result<CachedSession, ProviderError> {
        let mut guard = self.session.lock().await;
        if let Some(session) = guard.as_ref() {
            if !session.is_expired(Instant::now()) {
                return Ok(session.clone());
            }
            debug!("bluesky session expired, re-authenticating");
        }

        let identifier = self
            .vault
            .credential(ProviderId::Bluesky, "identifier")
            .ok_or(ProviderError::Unconfigured {
                provider: ProviderId::Bluesky,
            })?;
        let app_password = self
            .vault
            .credential(ProviderId::Bluesky, "app_password")
            .ok_or(ProviderError::Unconfigured {
                provider: ProviderId::Bluesky,
            })?;

        let url = format!("{}/xrpc/com.atproto.server.createSession", self.service_url());
        let response = self
            .client
            .post(&url)
            .json(&json!({ "identifier": identifier, "password": app_password }))
            .send()
            .await
            .map_err(|e| ProviderError::transport(ProviderId::Bluesky, &e))?;
        let payload = check_http_response(ProviderId::Bluesky, response).await?;
        let parsed = parse_session_response(&payload)?;

        let session = CachedSession {
            access_jwt: parsed.access_jwt,
            did: parsed.did,
            acquired_at: Instant::now(),
        };
        *guard = Some(session.clone());
        Ok(session)
    }

    async fn publish_inner(&self, content: &PublishContent) -> Result<Option<String>, ProviderError> {
        let session = self.session().await?;
        let url = format!("{}/xrpc/com.atproto.repo.createRecord", self.service_url());
        let created_at = chrono::Utc::now().to_rfc3339();
        let body = build_record_body(&session.did, content, &created_at);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&session.access_jwt)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::transport(ProviderId::Bluesky, &e))?;
        let payload = check_http_response(ProviderId::Bluesky, response).await?;

        let created: CreateRecordResponse =
            serde_json::from_str(&payload).map_err(|e| ProviderError::Parse {
                provider: ProviderId::Bluesky,
                message: e.to_string(),
            })?;

        let handle = self
            .vault
            .credential(ProviderId::Bluesky, "identifier")
            .unwrap_or_default();
        Ok(Some(web_url(&handle, &created.uri)))
    }
}

#[async_trait::async_trait]
impl SocialProvider for BlueskyProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Bluesky
    }

    fn is_configured(&self) -> bool {
        self.vault
            .has_all(ProviderId::Bluesky, &["identifier", "app_password"])
    }

    async fn search(&self, query: &str) -> Result<Vec<RawPost>, ProviderError> {
        let session = self.session().await?;
        let url = format!("{}/xrpc/app.bsky.feed.searchPosts", self.service_url());

        debug!(query, "bluesky search");
        let limit = SEARCH_LIMIT.to_string();
        let response = self
            .client
            .get(&url)
            .bearer_auth(&session.access_jwt)
            .query(&[("q", query), ("limit", limit.as_str())])
            .send()
            .await
            .map_err(|e| ProviderError::transport(ProviderId::Bluesky, &e))?;
        let payload = check_http_response(ProviderId::Bluesky, response).await?;
        parse_search_response(&payload)
    }

    async fn publish(&self, content: &PublishContent) -> PublishOutcome {
        match self.publish_inner(content).await {
            Ok(url) => PublishOutcome::published(url),
            Err(e) => {
                warn!(error = %e, "bluesky publish failed");
                PublishOutcome::failed(e.to_string())
            }
        }
    }
}
