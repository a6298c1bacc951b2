//! Deterministic trace normalization for snapshot testing.
//!
//! Process ids, thread ids, timestamps and span ids change on every run.
//! Normalization replaces them with stable values while keeping every event
//! in its original position, so two runs of the same scenario produce
//! byte-identical traces.
//!
//! # Example
//! ```ignore
//! let stable = normalize(&events, &NormalizeOptions::default())?;
//! assert_eq!(serde_json::to_string(&stable)?, snapshot);
//! ```

mod remap;

pub use remap::RemapTables;

use crate::builder::TraceFile;
use crate::event::{codec, frame_name, frame_tree_node_id, TraceEvent};
use crate::utils::config::DEFAULT_BASE_TIMESTAMP_US;
use crate::utils::error::CodecError;
use chrono::{DateTime, SecondsFormat};
use log::debug;

/// Options for `normalize`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Value the earliest timestamp maps to
    pub base_timestamp_us: u64,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            base_timestamp_us: DEFAULT_BASE_TIMESTAMP_US,
        }
    }
}

impl NormalizeOptions {
    pub fn with_base_timestamp(base_timestamp_us: u64) -> Self {
        Self { base_timestamp_us }
    }
}

/// Rewrite pid, tid, ts, `id2.local` and frame fields into deterministic form
///
/// Output order equals input order. Events given in wire form come back in
/// wire form, structured events come back structured.
///
/// # Errors
/// * `CodecError::Parse` - a detail string is not valid JSON
/// * `CodecError::Serialization` - a detail cannot be re-encoded
pub fn normalize(
    events: &[TraceEvent],
    options: &NormalizeOptions,
) -> Result<Vec<TraceEvent>, CodecError> {
    if events.is_empty() {
        return Ok(Vec::new());
    }

    let wire_form: Vec<bool> = events.iter().map(codec::has_encoded_detail).collect();
    let decoded = codec::decode_all(events)?;
    let tables = RemapTables::from_events(&decoded, options.base_timestamp_us);

    debug!("Normalizing {} events", decoded.len());

    decoded
        .into_iter()
        .zip(wire_form)
        .map(|(event, was_encoded)| {
            let remapped = remap_event(event, &tables);
            if was_encoded {
                codec::encode(&remapped)
            } else {
                Ok(remapped)
            }
        })
        .collect()
}

/// Normalize the events of a trace file and pin its start time
///
/// `startTime` becomes the base timestamp so the metadata is stable too.
pub fn normalize_trace_file(
    trace: &TraceFile,
    options: &NormalizeOptions,
) -> Result<TraceFile, CodecError> {
    let mut normalized = trace.clone();
    normalized.trace_events = normalize(&trace.trace_events, options)?;

    let base_us = i64::try_from(options.base_timestamp_us).unwrap_or(i64::MAX);
    if let Some(start) = DateTime::from_timestamp_micros(base_us) {
        normalized.metadata.start_time = start.to_rfc3339_opts(SecondsFormat::Millis, true);
    }

    Ok(normalized)
}

fn remap_event(mut event: TraceEvent, tables: &RemapTables) -> TraceEvent {
    let pid = event.pid().map(|pid| tables.pid(pid));
    let tid = event.tid().map(|tid| tables.tid(tid));

    let core = event.core_mut();
    *core.pid = pid;
    *core.tid = tid;
    *core.ts = tables.ts(*core.ts);
    if let Some(id) = core.span_id {
        *id = tables.span_id(id);
    }

    // Frame fields are derived from the ids, so recompute them from the new ones
    if let Some(data) = event.args_mut().and_then(|args| args.data.as_mut()) {
        if let (Some(pid), Some(tid)) = (pid, tid) {
            if data.frame_tree_node_id.is_some() {
                data.frame_tree_node_id = Some(frame_tree_node_id(pid, tid));
            }
        }
        for frame in data.frames.iter_mut().flatten() {
            if let (Some(process_id), Some(pid)) = (frame.process_id.as_mut(), pid) {
                *process_id = pid;
            }
            if let (Some(name), Some(pid), Some(tid)) = (frame.frame.as_mut(), pid, tid) {
                *name = frame_name(pid, tid);
            }
        }
    }

    event
}
