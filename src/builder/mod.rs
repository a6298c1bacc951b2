//! Trace file container assembly.
//!
//! Turns a flat list of events into the `{ traceEvents, displayTimeUnit,
//! metadata }` object consumed by trace viewers.

pub mod schema;
pub mod trace_file;

pub use schema::{TraceFile, TraceMetadata};
pub use trace_file::TraceFileBuilder;
