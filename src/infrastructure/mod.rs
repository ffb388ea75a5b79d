//! Infrastructure Layer
//!
//! External concerns around the domain core: configuration loading and
//! tracing setup.

pub mod config;
pub mod telemetry;

pub use config::{AppConfig, LoggingConfig};
pub use telemetry::init_tracing;
