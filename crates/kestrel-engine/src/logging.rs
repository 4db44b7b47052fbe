//! Tracing subscriber setup for hosts and tests.

use tracing_subscriber::EnvFilter;

/// Install a formatted `tracing` subscriber filtered by `RUST_LOG`
/// (default `info`).
///
/// Returns `false` if a global subscriber was already installed, so it is
/// safe to call from every test.
pub fn init_tracing() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
