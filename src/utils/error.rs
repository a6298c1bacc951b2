//! Error types for the entire library.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while converting `detail` payloads between wire and structured form
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Invalid detail JSON in event '{name}' at ts {ts}: {source}")]
    Parse {
        name: String,
        ts: u64,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cannot serialize detail of event '{name}' at ts {ts}: {source}")]
    Serialization {
        name: String,
        ts: u64,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors that can occur while assembling a trace file container
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Failed to serialize trace file: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Trace file did not survive a JSON round trip")]
    RoundTrip,

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Errors that can occur while driving a trace sink
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Illegal sink state: {0}")]
    IllegalState(String),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Output(#[from] OutputError),
}

impl SinkError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SinkError::Io {
            path: path.into(),
            source,
        }
    }
}

/// A single log line that could not be turned back into an event
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {reason}")]
pub struct RecoveryError {
    /// 1-based line number in the log file
    pub line: usize,

    /// Raw line content as found on disk
    pub raw: String,

    /// Why the line was rejected
    pub reason: String,
}

/// Errors that can occur while loading sink configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
