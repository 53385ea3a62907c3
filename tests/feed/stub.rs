//! Scriptable `SocialProvider` stub for engine and registry scenarios.

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use crossfeed::providers::{
    ProviderError, ProviderId, PublishContent, PublishOutcome, RawPost, SocialProvider,
};
use crossfeed::registry::{ProviderDescriptor, ProviderRegistry};

/// What a stub search call does.
#[derive(Clone)]
pub enum SearchBehavior {
    /// Succeed with these raw posts.
    Posts(Vec<RawPost>),
    /// Fail with a transport error.
    Fail,
    /// Never resolve within any reasonable test timeout.
    Hang,
}

pub struct StubProvider {
    pub id: ProviderId,
    pub configured: bool,
    pub behavior: SearchBehavior,
    pub publish_outcome: PublishOutcome,
    /// The content the last `publish` call received.
    pub received: Mutex<Option<PublishContent>>,
}

impl StubProvider {
    pub fn live(id: ProviderId, posts: Vec<RawPost>) -> Self {
        Self {
            id,
            configured: true,
            behavior: SearchBehavior::Posts(posts),
            publish_outcome: PublishOutcome::published(None),
            received: Mutex::new(None),
        }
    }

    pub fn failing(id: ProviderId) -> Self {
        Self {
            behavior: SearchBehavior::Fail,
            ..Self::live(id, Vec::new())
        }
    }

    pub fn hanging(id: ProviderId) -> Self {
        Self {
            behavior: SearchBehavior::Hang,
            ..Self::live(id, Vec::new())
        }
    }

    pub fn unconfigured(id: ProviderId) -> Self {
        Self {
            configured: false,
            ..Self::live(id, Vec::new())
        }
    }

    pub fn with_publish_outcome(mut self, outcome: PublishOutcome) -> Self {
        self.publish_outcome = outcome;
        self
    }
}

#[async_trait]
impl SocialProvider for StubProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn search(&self, _query: &str) -> Result<Vec<RawPost>, ProviderError> {
        match &self.behavior {
            SearchBehavior::Posts(posts) => Ok(posts.clone()),
            SearchBehavior::Fail => Err(ProviderError::Transport {
                provider: self.id,
                status: Some(500),
                reason: "stubbed failure".to_owned(),
            }),
            SearchBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(Vec::new())
            }
        }
    }

    async fn publish(&self, content: &PublishContent) -> PublishOutcome {
        let mut received = self.received.lock().unwrap_or_else(|e| e.into_inner());
        *received = Some(content.clone());
        self.publish_outcome.clone()
    }
}

/// Registry over stub adapters, one descriptor per stub.
pub fn registry_of(stubs: Vec<Arc<StubProvider>>) -> ProviderRegistry {
    ProviderRegistry::new(
        stubs
            .into_iter()
            .map(|stub| ProviderDescriptor {
                id: stub.id(),
                display_name: stub.id().display_name().to_owned(),
                adapter: stub,
            })
            .collect(),
    )
}
