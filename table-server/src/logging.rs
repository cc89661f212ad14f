//! Logging Infrastructure
//!
//! Structured logging setup shared by binaries and integration tests.

use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize the logger with the default level
pub fn init_logger() {
    init_logger_with_level(None);
}

/// Initialize the logger with an optional level override
///
/// `RUST_LOG` wins when set. Safe to call more than once.
pub fn init_logger_with_level(log_level: Option<&str>) {
    let level = log_level.unwrap_or("info").to_string();
    INIT.call_once(move || {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    });
}
