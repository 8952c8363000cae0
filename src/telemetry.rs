//! Logging setup.

use tracing_subscriber::{EnvFilter, prelude::*};

const DEFAULT_LOG_LEVEL: &str = "warn";
const VERBOSE_LOG_LEVEL: &str = "info";
const DEBUG_LOG_LEVEL: &str = "debug";

/// Maps the number of `-v` flags to a filter directive.
pub fn log_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => DEFAULT_LOG_LEVEL,
        1 => VERBOSE_LOG_LEVEL,
        _ => DEBUG_LOG_LEVEL,
    }
}

/// Installs a stderr `fmt` subscriber. `RUST_LOG` wins over `verbosity`.
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init_logging(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level(verbosity)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}
