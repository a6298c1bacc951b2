//! Trace file container definitions.
//!
//! This is the structure of the `<name>.json` files we write to disk,
//! matching the DevTools "JSON Object Format".

use crate::event::TraceEvent;
use crate::utils::config::DisplayTimeUnit;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Top-level trace file structure written to JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceFile {
    /// Events in emission order
    #[serde(rename = "traceEvents")]
    pub trace_events: Vec<TraceEvent>,

    /// Unit the viewer uses for display ("ms" or "ns")
    #[serde(rename = "displayTimeUnit")]
    pub display_time_unit: DisplayTimeUnit,

    pub metadata: TraceMetadata,
}

/// Trace metadata shown by the viewer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceMetadata {
    /// Always "DevTools"
    pub source: String,

    /// ISO-8601 timestamp of the recording start
    pub start_time: String,

    pub hardware_concurrency: u64,

    /// Always "TraceEvents"
    pub data_origin: String,

    /// Caller-supplied keys, never one of the fixed keys above
    #[serde(flatten)]
    pub custom: Map<String, Value>,
}
