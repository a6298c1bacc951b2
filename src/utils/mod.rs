//! Utility modules for configuration and error handling.

pub mod config;
pub mod error;

// Re-export commonly used types for convenience
pub use config::{load_config, BuilderOptions, DisplayTimeUnit, EmptyTracePolicy, SinkConfig};
pub use error::{BuildError, CodecError, ConfigError, OutputError, RecoveryError, SinkError};
