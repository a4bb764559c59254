//! Tracing setup for the command-line front end and tests.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs a stderr subscriber. `RUST_LOG` wins over `level` when set.
/// Calling this twice is harmless; the second call leaves the first
/// subscriber in place.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    if tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .try_init()
        .is_ok()
    {
        tracing::debug!(level, "logging initialized");
    }
}

/// Initialize logging for tests (captured by the test harness)
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
