//! Tracing subscriber initialization.
//!
//! Logs are emitted as JSON lines. `RUST_LOG` overrides the default filter,
//! e.g. `RUST_LOG=stockroom_infra=debug,info`.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "info";

/// Initialize with [`DEFAULT_FILTER`] unless `RUST_LOG` is set.
pub fn init() {
    init_with_default(DEFAULT_FILTER);
}

/// Initialize with a caller-chosen fallback filter.
///
/// Returns `false` when a global subscriber was already installed.
pub fn init_with_default(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(true)
        .try_init()
        .is_ok()
}
