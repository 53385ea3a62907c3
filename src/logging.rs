//! Structured logging setup using `tracing-subscriber`.
//!
//! The crate is embedded by a host, so logging stays console-only; the
//! host owns any file routing. Controlled by `RUST_LOG` (default: `info`).

use tracing_subscriber::EnvFilter;

/// Initialise human-readable logging to stderr.
///
/// Safe to call once per process; a second call is a no-op with a
/// warning rather than a panic, so embedding hosts that already
/// installed a subscriber keep theirs.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
    if result.is_err() {
        tracing::warn!("logging already initialised, keeping existing subscriber");
    }
}
