//! Provider registry: the fixed descriptor list and the active set.
//!
//! Descriptors (id, display name, adapter handle) are fixed at
//! construction. The active set starts as exactly the configured subset
//! and changes only through explicit user toggling. No registry
//! operation raises; toggling an unknown id is a no-op.

use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::credentials::CredentialVault;
use crate::providers::bluesky::BlueskyProvider;
use crate::providers::linkedin::LinkedinProvider;
use crate::providers::mastodon::MastodonProvider;
use crate::providers::threads::ThreadsProvider;
use crate::providers::{ProviderId, SocialProvider};

/// One registered provider.
#[derive(Clone)]
pub struct ProviderDescriptor {
    /// Network identifier.
    pub id: ProviderId,
    /// Human-readable network name for the UI.
    pub display_name: String,
    /// The adapter implementing the provider contract.
    pub adapter: Arc<dyn SocialProvider>,
}

impl std::fmt::Debug for ProviderDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderDescriptor")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .finish()
    }
}

/// Registry of known providers and the set currently active for search.
pub struct ProviderRegistry {
    descriptors: Vec<ProviderDescriptor>,
    active: RwLock<BTreeSet<ProviderId>>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("descriptors", &self.descriptors)
            .field("active", &self.list_active())
            .finish()
    }
}

impl ProviderRegistry {
    /// Build a registry from descriptors. The active set is initialized
    /// to the subset whose adapters report themselves configured.
    pub fn new(descriptors: Vec<ProviderDescriptor>) -> Self {
        let active = descriptors
            .iter()
            .filter(|d| d.adapter.is_configured())
            .map(|d| d.id)
            .collect();
        Self {
            descriptors,
            active: RwLock::new(active),
        }
    }

    /// Build the standard four-network registry over a shared vault.
    pub fn with_default_providers(vault: &Arc<CredentialVault>) -> Self {
        let adapters: Vec<Arc<dyn SocialProvider>> = vec![
            Arc::new(MastodonProvider::new(Arc::clone(vault))),
            Arc::new(BlueskyProvider::new(Arc::clone(vault))),
            Arc::new(LinkedinProvider::new(Arc::clone(vault))),
            Arc::new(ThreadsProvider::new(Arc::clone(vault))),
        ];
        Self::new(
            adapters
                .into_iter()
                .map(|adapter| ProviderDescriptor {
                    id: adapter.id(),
                    display_name: adapter.id().display_name().to_owned(),
                    adapter,
                })
                .collect(),
        )
    }

    /// The fixed descriptor list, in display order.
    pub fn descriptors(&self) -> &[ProviderDescriptor] {
        &self.descriptors
    }

    /// Adapter handle for a provider id, when registered.
    pub fn adapter(&self, id: ProviderId) -> Option<Arc<dyn SocialProvider>> {
        self.descriptors
            .iter()
            .find(|d| d.id == id)
            .map(|d| Arc::clone(&d.adapter))
    }

    /// Whether a registered provider currently has sufficient
    /// credentials. Unknown ids report `false`.
    pub fn is_configured(&self, id: ProviderId) -> bool {
        self.adapter(id).is_some_and(|a| a.is_configured())
    }

    /// Whether a provider is in the active search set.
    pub fn is_active(&self, id: ProviderId) -> bool {
        let active = self.active.read().unwrap_or_else(|e| e.into_inner());
        active.contains(&id)
    }

    /// Active provider ids, in canonical order.
    pub fn list_active(&self) -> Vec<ProviderId> {
        let active = self.active.read().unwrap_or_else(|e| e.into_inner());
        active.iter().copied().collect()
    }

    /// Flip a provider in or out of the active set. Unknown ids are
    /// ignored.
    pub fn toggle(&self, id: ProviderId) {
        if !self.descriptors.iter().any(|d| d.id == id) {
            debug!(%id, "toggle ignored for unregistered provider");
            return;
        }
        let mut active = self.active.write().unwrap_or_else(|e| e.into_inner());
        if !active.remove(&id) {
            active.insert(id);
        }
    }
}
