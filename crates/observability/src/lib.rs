//! Process-wide logging setup for courier binaries.

/// Initialize process-wide logging.
///
/// Safe to call multiple times; later calls are no-ops.
pub fn init() {
    tracing::init(tracing::LogFormat::from_env());
}

/// Subscriber configuration (filter, formatter).
pub mod tracing;
