//! AI-assisted reply drafting.
//!
//! One chat-completions call against a configurable endpoint drafts a
//! reply in a requested tone. Drafting never fails: a missing credential,
//! transport failure, non-success status, or empty completion all fall
//! back to a locally synthesized playful reply built from the original
//! post text.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::DraftingConfig;

/// Hard cap applied when echoing the original post in the fallback reply.
const FALLBACK_ECHO_CHARS: usize = 80;

/// System instruction for the generation endpoint.
const SYSTEM_INSTRUCTION: &str = "You draft short, friendly social media replies. \
    Match the requested tone, keep it under 280 characters, plain text, \
    and use no hashtags unless asked.";

/// Closers for the locally synthesized fallback reply.
const FRIENDLY_CLOSERS: &[&str] = &[
    "Love this!",
    "Couldn't agree more.",
    "This made my day.",
    "Great point, thanks for sharing!",
];

// ---------------------------------------------------------------------------
// Wire types (pub for integration testing)
// ---------------------------------------------------------------------------

/// Chat-completions request body.
#[doc(hidden)]
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    /// Model identifier.
    pub model: String,
    /// System + user messages.
    pub messages: Vec<ChatMessage>,
    /// Response length cap.
    pub max_tokens: u32,
}

/// A chat message.
#[doc(hidden)]
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    /// `system` or `user`.
    pub role: String,
    /// Message text.
    pub content: String,
}

/// Chat-completions response body.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    /// Completion choices.
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

/// One completion choice.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    /// Assistant message.
    pub message: ChatResponseMessage,
}

/// Assistant message in a completion choice.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct ChatResponseMessage {
    /// Generated text.
    pub content: Option<String>,
}

// ---------------------------------------------------------------------------
// Prompt
// ---------------------------------------------------------------------------

/// What to draft a reply to.
#[derive(Debug, Clone)]
pub struct DraftPrompt {
    /// Network name, so the model matches local conventions.
    pub provider_name: String,
    /// Requested tone, e.g. "friendly" or "witty".
    pub tone: String,
    /// Text of the post being replied to.
    pub original_text: String,
}

/// Build the chat request for a draft prompt.
#[doc(hidden)]
pub fn build_request(model: &str, prompt: &DraftPrompt) -> ChatRequest {
    let user = format!(
        "Draft a {} reply to this {} post. Reply with the text only.\n\nPost:\n\"{}\"",
        prompt.tone, prompt.provider_name, prompt.original_text,
    );
    ChatRequest {
        model: model.to_owned(),
        messages: vec![
            ChatMessage {
                role: "system".to_owned(),
                content: SYSTEM_INSTRUCTION.to_owned(),
            },
            ChatMessage {
                role: "user".to_owned(),
                content: user,
            },
        ],
        max_tokens: 200,
    }
}

/// Extract the generated reply text, or `None` when the completion is
/// missing or blank.
#[doc(hidden)]
pub fn parse_reply(body: &str) -> Option<String> {
    let resp: ChatResponse = serde_json::from_str(body).ok()?;
    resp.choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}

/// Locally synthesized reply used whenever generation is unavailable:
/// a truncated echo of the original plus a friendly closer.
#[doc(hidden)]
pub fn fallback_reply(original_text: &str) -> String {
    let mut echo: String = original_text
        .trim()
        .chars()
        .take(FALLBACK_ECHO_CHARS)
        .collect();
    if original_text.trim().chars().count() > FALLBACK_ECHO_CHARS {
        echo.push('…');
    }
    let closer = FRIENDLY_CLOSERS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("Love this!");
    if echo.is_empty() {
        closer.to_owned()
    } else {
        format!("\"{echo}\" — {closer}")
    }
}

// ---------------------------------------------------------------------------
// Drafter
// ---------------------------------------------------------------------------

/// Reply drafter over an external chat-completions endpoint.
pub struct ReplyDrafter {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for ReplyDrafter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplyDrafter")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl ReplyDrafter {
    /// Create a drafter from configuration, resolving the bearer
    /// credential from the environment variable the config names.
    pub fn new(config: &DraftingConfig) -> Self {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
        }
    }

    /// Create a drafter with an explicit endpoint and key. Intended for
    /// tests.
    pub fn with_endpoint(endpoint: String, model: String, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            model,
            api_key,
        }
    }

    /// Draft a reply. Never fails; every degradation path yields the
    /// local fallback reply.
    pub async fn draft(&self, prompt: &DraftPrompt) -> String {
        let Some(api_key) = &self.api_key else {
            debug!("drafting credential missing, using local fallback");
            return fallback_reply(&prompt.original_text);
        };

        let request = build_request(&self.model, prompt);
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await;

        let body = match response {
            Ok(resp) if resp.status().is_success() => match resp.text().await {
                Ok(body) => body,
                Err(e) => {
                    warn!(error = %e, "draft response unreadable, using local fallback");
                    return fallback_reply(&prompt.original_text);
                }
            },
            Ok(resp) => {
                warn!(status = resp.status().as_u16(), "draft request rejected, using local fallback");
                return fallback_reply(&prompt.original_text);
            }
            Err(e) => {
                warn!(error = %e, "draft request failed, using local fallback");
                return fallback_reply(&prompt.original_text);
            }
        };

        match parse_reply(&body) {
            Some(reply) => reply,
            None => {
                warn!("draft response empty, using local fallback");
                fallback_reply(&prompt.original_text)
            }
        }
    }
}
