//! Configuration, paths, and logging for portal sync tools.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{Config, RetryConfig, DEFAULT_API_BASE_URL, DEFAULT_LOG_LEVEL};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level, LogFormat};
pub use paths::Paths;
