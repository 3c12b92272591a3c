//! Utilities for logging.
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn env_filter(default: Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(default.into())
        .from_env_lossy()
}

/// Initialize a global subscriber logging at INFO, `RUST_LOG` overrides.
///
/// Only the first call installs a subscriber.
pub fn init() {
    let _ = FmtSubscriber::builder()
        .with_env_filter(env_filter(Level::INFO))
        .with_thread_names(true)
        .try_init();
}

/// Initialize logging for tests at DEBUG, output captured by the test
/// harness.
pub fn init_test() {
    let _ = FmtSubscriber::builder()
        .with_test_writer()
        .with_env_filter(env_filter(Level::DEBUG))
        .with_file(true)
        .with_line_number(true)
        .try_init();
}
