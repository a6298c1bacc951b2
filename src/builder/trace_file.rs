//! Trace file assembly.
//!
//! Wraps a flat event list with the synthetic events trace viewers need:
//! a `TracingStartedInBrowser` marker and opening `RunTask` before the user
//! events, a closing `RunTask` after them, and optional padding on both
//! sides so boundary events with visual width are not clipped.

use super::schema::{TraceFile, TraceMetadata};
use crate::event::{self, complete_event, run_task_event, tracing_started_event, TraceEvent};
use crate::utils::config::{
    BuilderOptions, FIXED_METADATA_KEYS, METADATA_DATA_ORIGIN, METADATA_SOURCE,
    PADDING_END_NAME, PADDING_START_NAME, RUN_TASK_CATEGORY,
};
use crate::utils::error::BuildError;
use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, warn};
use serde_json::{Map, Value};

const MICROS_PER_MILLI: u64 = 1_000;

/// Assembles trace file containers from flat event lists
#[derive(Debug, Clone, Default)]
pub struct TraceFileBuilder {
    options: BuilderOptions,
}

impl TraceFileBuilder {
    pub fn new(options: BuilderOptions) -> Self {
        Self { options }
    }

    /// Pin `startTime`, mainly for deterministic output
    pub fn with_start_time(mut self, start_time: DateTime<Utc>) -> Self {
        self.options.start_time = Some(start_time);
        self
    }

    pub fn options(&self) -> &BuilderOptions {
        &self.options
    }

    /// Build the container
    ///
    /// Events are emitted in the order supplied and in wire form.
    ///
    /// # Errors
    /// * `BuildError::Codec` - an event detail cannot be encoded
    pub fn build(&self, events: &[TraceEvent]) -> Result<TraceFile, BuildError> {
        let started_at = self.options.start_time.unwrap_or_else(Utc::now);
        let user_events = event::encode_all(events)?;

        let margin_us = self.options.margin_ms.saturating_mul(MICROS_PER_MILLI);
        let dur_us = self.options.margin_dur_ms.saturating_mul(MICROS_PER_MILLI);

        let fallback_pid = u64::from(std::process::id());
        let first = events.first();
        let last = events.last();

        let open_pid = self
            .options
            .pid
            .or_else(|| first.and_then(TraceEvent::pid))
            .unwrap_or(fallback_pid);
        let open_tid = self
            .options
            .tid
            .or_else(|| first.and_then(TraceEvent::tid))
            .unwrap_or(1);
        let close_pid = self
            .options
            .pid
            .or_else(|| last.and_then(TraceEvent::pid))
            .unwrap_or(fallback_pid);
        let close_tid = self
            .options
            .tid
            .or_else(|| last.and_then(TraceEvent::tid))
            .unwrap_or(1);

        // Boundaries follow the first and last events as supplied, nothing is sorted
        let (start_ts, end_ts) = match (first, last) {
            (Some(first), Some(last)) => (
                first.ts().saturating_sub(margin_us),
                last.ts().saturating_add(margin_us),
            ),
            _ => {
                let now_us = u64::try_from(started_at.timestamp_micros()).unwrap_or(0);
                (now_us, now_us)
            }
        };

        let padded = margin_us > 0;
        let mut trace_events = Vec::with_capacity(user_events.len() + 5);

        trace_events.push(tracing_started_event(open_pid, open_tid, start_ts, None));
        trace_events.push(run_task_event(open_pid, open_tid, start_ts, dur_us));
        if padded {
            trace_events.push(complete_event(
                RUN_TASK_CATEGORY,
                PADDING_START_NAME,
                open_pid,
                open_tid,
                start_ts,
                dur_us,
            ));
        }

        trace_events.extend(user_events);

        if padded {
            trace_events.push(complete_event(
                RUN_TASK_CATEGORY,
                PADDING_END_NAME,
                close_pid,
                close_tid,
                end_ts,
                dur_us,
            ));
        }
        trace_events.push(run_task_event(close_pid, close_tid, end_ts, dur_us));

        debug!(
            "Built trace file: {} user events, {} total",
            events.len(),
            trace_events.len()
        );

        Ok(TraceFile {
            trace_events,
            display_time_unit: self.options.display_time_unit,
            metadata: self.build_metadata(started_at),
        })
    }

    /// Build the container and serialize it
    ///
    /// The JSON text is parsed back and compared with the container before
    /// it is returned.
    ///
    /// # Errors
    /// * `BuildError::Serialization` - serialization or reparse failed
    /// * `BuildError::RoundTrip` - reparsed JSON differs from the container
    pub fn build_json(&self, events: &[TraceEvent]) -> Result<String, BuildError> {
        let trace_file = self.build(events)?;
        let json = serde_json::to_string(&trace_file)?;
        validate_round_trip(&trace_file, &json)?;
        Ok(json)
    }

    fn build_metadata(&self, started_at: DateTime<Utc>) -> TraceMetadata {
        let mut custom = Map::new();
        for (key, value) in &self.options.metadata {
            if FIXED_METADATA_KEYS.contains(&key.as_str()) {
                warn!("Ignoring custom metadata key '{}': reserved", key);
                continue;
            }
            custom.insert(key.clone(), value.clone());
        }

        let hardware_concurrency = self.options.hardware_concurrency.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get() as u64)
                .unwrap_or(1)
        });

        TraceMetadata {
            source: METADATA_SOURCE.to_string(),
            start_time: started_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            hardware_concurrency,
            data_origin: METADATA_DATA_ORIGIN.to_string(),
            custom,
        }
    }
}

fn validate_round_trip(trace_file: &TraceFile, json: &str) -> Result<(), BuildError> {
    let expected = serde_json::to_value(trace_file)?;
    let reparsed: Value = serde_json::from_str(json)?;
    if reparsed != expected {
        return Err(BuildError::RoundTrip);
    }
    Ok(())
}
