//! Process-wide logging setup shared by the stockroom binaries.

/// Initialize structured logging with the default `info` filter.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    tracing::init();
}

/// Subscriber configuration (filters, JSON formatting).
pub mod tracing;
