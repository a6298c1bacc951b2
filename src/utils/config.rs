//! Configuration and constants for the trace sink.

use crate::utils::error::ConfigError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Extension of the append-only event log
pub const LOG_EXTENSION: &str = "jsonl";

/// Extension of the materialized trace file
pub const TRACE_EXTENSION: &str = "json";

// Normalization constants. Snapshot files depend on these values.
pub const DEFAULT_BASE_TIMESTAMP_US: u64 = 1_700_000_005_000_000;
pub const TIMESTAMP_INCREMENT_US: u64 = 100;
pub const PID_BASE: u64 = 10_000;
pub const TID_BASE: u64 = 0;

/// Multiplier used by `frameTreeNodeId(pid, tid) = pid * 1000 + tid`
pub const FRAME_TREE_NODE_PID_FACTOR: u64 = 1_000;

// Boundary padding defaults
pub const DEFAULT_MARGIN_MS: u64 = 1_000;
pub const DEFAULT_MARGIN_DUR_MS: u64 = 20;

// DevTools names and categories
pub const TRACING_STARTED_NAME: &str = "TracingStartedInBrowser";
pub const TRACING_STARTED_CATEGORY: &str = "devtools.timeline";
pub const RUN_TASK_NAME: &str = "RunTask";
pub const RUN_TASK_CATEGORY: &str = "disabled-by-default-devtools.timeline";
pub const USER_TIMING_CATEGORY: &str = "blink.user_timing";
pub const PADDING_START_NAME: &str = "[trace padding start]";
pub const PADDING_END_NAME: &str = "[trace padding end]";

// Fixed metadata values
pub const METADATA_SOURCE: &str = "DevTools";
pub const METADATA_DATA_ORIGIN: &str = "TraceEvents";
pub const FIXED_METADATA_KEYS: &[&str] =
    &["source", "startTime", "hardwareConcurrency", "dataOrigin"];

/// What `finalize()` does when no event was ever written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmptyTracePolicy {
    /// Do not create `<name>.json` at all
    #[default]
    Skip,

    /// Write a file holding only the synthetic boundary events
    EmitBoundaries,
}

/// Unit the viewer uses to display timestamps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayTimeUnit {
    #[default]
    Ms,
    Ns,
}

/// Options for assembling a trace file container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderOptions {
    /// Offset of the padding events from the first/last event, in milliseconds.
    /// Zero disables padding.
    pub margin_ms: u64,

    /// Duration of padding and RunTask boundary events, in milliseconds
    pub margin_dur_ms: u64,

    pub display_time_unit: DisplayTimeUnit,

    /// Override for the boundary events' pid
    pub pid: Option<u64>,

    /// Override for the boundary events' tid
    pub tid: Option<u64>,

    /// Fixed `startTime`. Defaults to the wall clock.
    pub start_time: Option<DateTime<Utc>>,

    /// Fixed `hardwareConcurrency`. Defaults to the available parallelism.
    pub hardware_concurrency: Option<u64>,

    /// Extra metadata merged after the fixed keys
    pub metadata: Map<String, Value>,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            margin_ms: DEFAULT_MARGIN_MS,
            margin_dur_ms: DEFAULT_MARGIN_DUR_MS,
            display_time_unit: DisplayTimeUnit::Ms,
            pid: None,
            tid: None,
            start_time: None,
            hardware_concurrency: None,
            metadata: Map::new(),
        }
    }
}

/// Complete configuration of one trace sink session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Directory holding `<name>.jsonl` and `<name>.json`
    pub directory: PathBuf,

    /// Base file name, without extension
    pub name: String,

    #[serde(default)]
    pub empty_trace: EmptyTracePolicy,

    #[serde(default)]
    pub builder: BuilderOptions,
}

impl SinkConfig {
    pub fn new(directory: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            name: name.into(),
            empty_trace: EmptyTracePolicy::default(),
            builder: BuilderOptions::default(),
        }
    }

    pub fn with_empty_trace(mut self, policy: EmptyTracePolicy) -> Self {
        self.empty_trace = policy;
        self
    }

    pub fn with_builder(mut self, builder: BuilderOptions) -> Self {
        self.builder = builder;
        self
    }

    /// Path of the append-only log
    pub fn log_path(&self) -> PathBuf {
        self.directory
            .join(format!("{}.{}", self.name, LOG_EXTENSION))
    }

    /// Path of the materialized trace file
    pub fn trace_path(&self) -> PathBuf {
        self.directory
            .join(format!("{}.{}", self.name, TRACE_EXTENSION))
    }
}

/// Load a sink configuration from a TOML file
///
/// # Example
/// ```ignore
/// let config = load_config("trace-sink.toml")?;
/// let mut sink = TraceFileSink::new(config);
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<SinkConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: SinkConfig = toml::from_str(&contents)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_use_name_and_extensions() {
        let config = SinkConfig::new("/tmp/traces", "session");
        assert_eq!(config.log_path(), PathBuf::from("/tmp/traces/session.jsonl"));
        assert_eq!(config.trace_path(), PathBuf::from("/tmp/traces/session.json"));
    }

    #[test]
    fn test_load_config_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sink.toml");
        std::fs::write(
            &path,
            r#"
directory = "out"
name = "profile"
empty_trace = "emit-boundaries"

[builder]
margin_ms = 0
display_time_unit = "ns"

[builder.metadata]
tool = "bench"
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.name, "profile");
        assert_eq!(config.empty_trace, EmptyTracePolicy::EmitBoundaries);
        assert_eq!(config.builder.margin_ms, 0);
        assert_eq!(config.builder.margin_dur_ms, DEFAULT_MARGIN_DUR_MS);
        assert_eq!(config.builder.display_time_unit, DisplayTimeUnit::Ns);
        assert_eq!(config.builder.metadata["tool"], "bench");
    }

    #[test]
    fn test_load_config_rejects_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sink.toml");
        std::fs::write(&path, "directory = ").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }
}
