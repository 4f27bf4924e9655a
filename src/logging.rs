//! Logging and tracing utilities.
//!
//! Structured logging via the `tracing` ecosystem. All logs go to **stderr**:
//! in a deployed provider, stdout belongs to the plugin handshake.
//!
//! The `RUST_LOG` environment variable controls filtering, e.g. `info`,
//! `debug`, or `vercel_provider=debug`.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the default logging subscriber.
///
/// Respects `RUST_LOG`, defaulting to `info` when unset.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging() {
    init_logging_with_default("info");
}

/// Like [`init_logging`], but with a custom default level used when
/// `RUST_LOG` is not set (e.g. `"debug"`).
pub fn init_logging_with_default(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false),
        )
        .init();
}

/// Try to initialize logging, returning `false` if a subscriber was already
/// set. Useful in tests, where initialization can race.
pub fn try_init_logging() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false),
        )
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    // The global subscriber can only be set once per process, so
    // initialization itself is not unit-testable here.

    use super::*;

    #[test]
    fn test_env_filter_parsing() {
        assert!(EnvFilter::try_new("info").is_ok());
        assert!(EnvFilter::try_new("debug").is_ok());
        assert!(EnvFilter::try_new("vercel_provider=debug").is_ok());
        assert!(EnvFilter::try_new("warn,vercel_provider=debug").is_ok());
    }
}
