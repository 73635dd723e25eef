//! Logging setup.

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber. Respects `RUST_LOG`; defaults to
/// `info`. Safe to call more than once.
pub fn setup() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = fmt().with_env_filter(filter).try_init();
}
