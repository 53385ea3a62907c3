//! Crossfeed — a multi-network social feed aggregation core.
//!
//! One search fans out to every active network, normalizes whatever comes
//! back into a canonical post shape, and degrades gracefully: a provider
//! that is unconfigured or failing serves clearly marked demo content
//! instead of an error. Replies are drafted with an external generation
//! endpoint (with a local fallback) and published through the same
//! per-network adapters.
//!
//! The crate is a library embedded by a presentation host; it owns no UI
//! and no server. See `DESIGN.md` for architecture notes.
//!
//! # Wiring
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use crossfeed::credentials::CredentialVault;
//! use crossfeed::engine::AggregationEngine;
//! use crossfeed::feed::SelectionState;
//! use crossfeed::registry::ProviderRegistry;
//! use crossfeed::settings::FileSettings;
//!
//! # async fn wire() {
//! let settings = Arc::new(FileSettings::open_default());
//! let vault = Arc::new(CredentialVault::hydrate(settings));
//! let registry = Arc::new(ProviderRegistry::with_default_providers(&vault));
//! let selection = Arc::new(SelectionState::new());
//! let engine = AggregationEngine::new(Arc::clone(&registry), selection);
//!
//! let outcome = engine.search("rust", &registry.list_active()).await;
//! # let _ = outcome;
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod credentials;
pub mod drafting;
pub mod engine;
pub mod feed;
pub mod gif;
pub mod logging;
pub mod providers;
pub mod registry;
pub mod settings;
