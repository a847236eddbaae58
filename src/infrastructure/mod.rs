//! Infrastructure layer
//!
//! Configuration loading and logging setup.

mod config;
mod logging;

pub use config::{ConfigError, DEFAULT_MAX_STACK_SIZE_KB, DispatcherConfig};
pub use logging::{LOG_ENV, init_logging};
