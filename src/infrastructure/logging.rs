//! Logging configuration
//!
//! Initializes tracing for the dispatcher.

use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable whose filter overrides the configured level.
pub const LOG_ENV: &str = "DISPATCH_LOG";

fn filter_for(level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level))
}

/// Initializes logging with the specified level
///
/// Does nothing if a global subscriber is already installed.
pub fn init_logging(level: &str) {
    let _ = fmt()
        .with_env_filter(filter_for(level))
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging() {
        init_logging("debug");
        // Second install is ignored
        init_logging("trace");
    }
}
