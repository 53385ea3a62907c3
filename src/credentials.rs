//! Per-provider credential storage.
//!
//! Credentials are named secrets (tokens, handles, app passwords) supplied
//! through the host's configuration surface or injected via environment
//! variables before startup. They live in an in-memory vault hydrated from
//! the settings store, so adapters read fresh values on every call without
//! touching disk. The only credential-derived value cached anywhere else
//! is the Bluesky session token, owned by that adapter.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::providers::ProviderId;
use crate::settings::SettingsStore;

/// Settings-store key the vault round-trips through.
const CREDENTIALS_KEY: &str = "credentials";

/// Environment variable prefix recognized by [`load_env_credentials`].
const ENV_PREFIX: &str = "CROSSFEED_";

/// Named secrets for one provider.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCredentials {
    #[serde(flatten)]
    vars: BTreeMap<String, String>,
}

impl std::fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("keys", &self.vars.keys().collect::<Vec<_>>())
            .field("values", &"[REDACTED]")
            .finish()
    }
}

impl ProviderCredentials {
    /// Build credentials from a key-value map.
    pub fn from_map(vars: BTreeMap<String, String>) -> Self {
        Self { vars }
    }

    /// Returns a credential value for a key, if present and non-empty.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// Insert or replace one named secret.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    /// True when every named key resolves to a non-empty value.
    pub fn has_all(&self, keys: &[&str]) -> bool {
        keys.iter().all(|k| self.get(k).is_some())
    }

    /// True when no secrets are stored.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// In-memory credential vault shared by all adapters.
///
/// Hydrated from the settings store at construction; every `store` call
/// re-persists the full map. Reads never perform I/O, so adapter
/// `is_configured` checks stay pure.
pub struct CredentialVault {
    settings: Arc<dyn SettingsStore>,
    creds: RwLock<BTreeMap<ProviderId, ProviderCredentials>>,
}

impl std::fmt::Debug for CredentialVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let creds = self.creds.read().unwrap_or_else(|e| e.into_inner());
        f.debug_struct("CredentialVault")
            .field("providers", &creds.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CredentialVault {
    /// Create a vault hydrated from the settings store, with environment
    /// overrides applied on top.
    pub fn hydrate(settings: Arc<dyn SettingsStore>) -> Self {
        let mut creds: BTreeMap<ProviderId, ProviderCredentials> = settings
            .get(CREDENTIALS_KEY)
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default();

        for (provider, env_creds) in load_env_credentials(std::env::vars()) {
            let entry = creds.entry(provider).or_default();
            for (key, value) in env_creds.vars {
                entry.insert(key, value);
            }
        }

        Self {
            settings,
            creds: RwLock::new(creds),
        }
    }

    /// Create an empty vault over a settings store, ignoring environment
    /// variables. Intended for tests.
    pub fn empty(settings: Arc<dyn SettingsStore>) -> Self {
        Self {
            settings,
            creds: RwLock::new(BTreeMap::new()),
        }
    }

    /// A snapshot of one provider's credentials.
    pub fn get(&self, provider: ProviderId) -> Option<ProviderCredentials> {
        let creds = self.creds.read().unwrap_or_else(|e| e.into_inner());
        creds.get(&provider).cloned()
    }

    /// One named secret for a provider, if present and non-empty.
    pub fn credential(&self, provider: ProviderId, key: &str) -> Option<String> {
        self.get(provider)
            .and_then(|c| c.get(key).map(str::to_owned))
    }

    /// True when every named key resolves to a non-empty value.
    pub fn has_all(&self, provider: ProviderId, keys: &[&str]) -> bool {
        self.get(provider).is_some_and(|c| c.has_all(keys))
    }

    /// Replace one provider's credentials and persist the vault.
    ///
    /// Returns `false` when the settings store could not persist; the
    /// in-memory vault is updated either way.
    pub fn store(&self, provider: ProviderId, credentials: ProviderCredentials) -> bool {
        let snapshot = {
            let mut creds = self.creds.write().unwrap_or_else(|e| e.into_inner());
            creds.insert(provider, credentials);
            creds.clone()
        };
        match serde_json::to_value(&snapshot) {
            Ok(value) => {
                let persisted = self.settings.set(CREDENTIALS_KEY, value);
                if !persisted {
                    warn!(%provider, "credentials updated in memory but not persisted");
                }
                persisted
            }
            Err(e) => {
                warn!(%provider, error = %e, "credentials not serializable");
                false
            }
        }
    }
}

/// Collect `CROSSFEED_<PROVIDER>_<KEY>` environment variables into
/// per-provider credential maps. Keys are lowercased
/// (`CROSSFEED_BLUESKY_APP_PASSWORD` becomes `app_password` for
/// `bluesky`). Unknown providers and empty values are skipped.
pub fn load_env_credentials(
    vars: impl Iterator<Item = (String, String)>,
) -> BTreeMap<ProviderId, ProviderCredentials> {
    let mut out: BTreeMap<ProviderId, ProviderCredentials> = BTreeMap::new();
    for (name, value) in vars {
        if value.trim().is_empty() {
            continue;
        }
        let Some((provider, key)) = parse_env_name(&name) else {
            continue;
        };
        debug!(%provider, key = %key, "credential injected from environment");
        out.entry(provider).or_default().insert(key, value);
    }
    out
}

/// Split an env var name into `(provider, credential_key)`.
fn parse_env_name(name: &str) -> Option<(ProviderId, String)> {
    let rest = name.strip_prefix(ENV_PREFIX)?;
    let (provider_part, key_part) = rest.split_once('_')?;
    let provider = ProviderId::parse(&provider_part.to_lowercase())?;
    if key_part.is_empty() {
        return None;
    }
    Some((provider, key_part.to_lowercase()))
}

/// Load a `.env` file into the process environment before vault hydration.
///
/// Missing files are fine; parse failures are logged and skipped. Values
/// already present in the environment win, matching `dotenvy` semantics.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(error = %e, ".env file could not be loaded"),
    }
}
