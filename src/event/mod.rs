//! Trace event model, factory and detail codec.
//!
//! This module handles:
//! - The tagged event union keyed by `ph`
//! - Encoding/decoding of nested `detail` payloads
//! - Constructors for marks, measures and boundary events

pub mod codec;
pub mod factory;
pub mod schema;

// Re-export main types
pub use codec::{
    attach_detail, decode, decode_all, encode, encode_all, has_encoded_detail, validate,
};
pub use factory::{
    complete_event, frame_name, frame_tree_node_id, instant_event, run_task_event, span_events,
    tracing_started_event, SpanIdGenerator,
};
pub use schema::{
    CompleteEvent, Detail, EventArgs, EventData, FrameInfo, InstantEvent, InstantPhase,
    SpanEvent, SpanId, TraceEvent, TracingStartedEvent,
};
