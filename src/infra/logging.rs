//! Structured logging init shared by all three binaries.

use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Install a `tracing` subscriber with an RFC3339 UTC timer and a level
/// controlled by `RUST_LOG` (default: `info`). Call once, at the top of
/// each binary's `main`.
pub fn init(bin_name: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        git_hash = option_env!("GIT_HASH").unwrap_or("unknown"),
        bin = bin_name,
        "starting"
    );
}
