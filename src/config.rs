//! Configuration loading and validation.
//!
//! Loads from `./crossfeed.toml` (or `$CROSSFEED_CONFIG_PATH`).
//! Precedence: env vars > config file > defaults. A missing file is the
//! default configuration, so an embedding host works with zero setup.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Search fan-out settings.
    pub search: SearchConfig,
    /// Reply drafting endpoint settings.
    pub drafting: DraftingConfig,
    /// GIF attachment search settings.
    pub gif: GifConfig,
    /// Settings-store location.
    pub settings: SettingsConfig,
}

/// Search fan-out settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Per-provider search timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

/// Reply drafting endpoint settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DraftingConfig {
    /// Chat-completions endpoint URL.
    pub endpoint: String,
    /// Model identifier sent with each request.
    pub model: String,
    /// Environment variable name holding the bearer credential.
    pub api_key_env: String,
}

impl Default for DraftingConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_owned(),
            model: "gpt-4o-mini".to_owned(),
            api_key_env: "CROSSFEED_DRAFT_API_KEY".to_owned(),
        }
    }
}

/// GIF attachment search settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GifConfig {
    /// Tenor-compatible search endpoint URL.
    pub endpoint: String,
    /// Environment variable name holding the API key.
    pub api_key_env: String,
}

impl Default for GifConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://tenor.googleapis.com/v2/search".to_owned(),
            api_key_env: "CROSSFEED_GIF_API_KEY".to_owned(),
        }
    }
}

/// Settings-store location.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SettingsConfig {
    /// Settings file path; platform default when absent.
    pub path: Option<String>,
}

fn default_timeout_seconds() -> u64 {
    10
}

impl Config {
    /// Load configuration with precedence: env vars > TOML file > defaults.
    ///
    /// # Errors
    ///
    /// Returns an error when the config file exists but cannot be read or
    /// parsed. A missing file is not an error.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from_file()?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn load_from_file() -> Result<Self> {
        let path = Self::config_path();
        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                tracing::info!(path = %path.display(), "loading config from file");
                toml::from_str(&contents).context("failed to parse config TOML")
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(anyhow::anyhow!("failed to read config file: {e}")),
        }
    }

    fn config_path() -> PathBuf {
        match std::env::var("CROSSFEED_CONFIG_PATH") {
            Ok(p) if !p.trim().is_empty() => PathBuf::from(p),
            _ => PathBuf::from("crossfeed.toml"),
        }
    }

    /// Apply environment variable overrides.
    ///
    /// Takes a resolver function for testability.
    pub fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(v) = env("CROSSFEED_SEARCH_TIMEOUT_SECS") {
            match v.parse() {
                Ok(n) => self.search.timeout_seconds = n,
                Err(_) => warn!(
                    var = "CROSSFEED_SEARCH_TIMEOUT_SECS",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }
        if let Some(v) = env("CROSSFEED_DRAFT_ENDPOINT") {
            self.drafting.endpoint = v;
        }
        if let Some(v) = env("CROSSFEED_DRAFT_MODEL") {
            self.drafting.model = v;
        }
        if let Some(v) = env("CROSSFEED_GIF_ENDPOINT") {
            self.gif.endpoint = v;
        }
        if let Some(v) = env("CROSSFEED_SETTINGS_PATH") {
            self.settings.path = Some(v);
        }
    }
}
