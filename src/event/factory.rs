//! Event constructors used by the host instrumentation layer and the
//! trace file builder.

use super::schema::{
    CompleteEvent, EventArgs, EventData, FrameInfo, InstantEvent, InstantPhase, SpanEvent,
    SpanId, TraceEvent, TracingStartedEvent,
};
use crate::utils::config::{
    FRAME_TREE_NODE_PID_FACTOR, RUN_TASK_CATEGORY, RUN_TASK_NAME, TRACING_STARTED_CATEGORY,
    TRACING_STARTED_NAME, USER_TIMING_CATEGORY,
};
use serde_json::{Map, Value};

/// Frame URL reported by the tracing-started marker
pub const DEFAULT_FRAME_URL: &str = "about:blank";

/// Issues `id2.local` values for spans
///
/// One generator belongs to one sink session, so ids never collide
/// across sessions or processes that share nothing.
#[derive(Debug, Clone, Default)]
pub struct SpanIdGenerator {
    issued: u64,
}

impl SpanIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id: "0x1", "0x2", ...
    pub fn next_id(&mut self) -> String {
        self.issued += 1;
        format_span_id(self.issued)
    }

    /// Number of ids handed out so far
    pub fn issued(&self) -> u64 {
        self.issued
    }
}

/// Format a 1-based span index as an `id2.local` value
pub fn format_span_id(index: u64) -> String {
    format!("0x{:x}", index)
}

/// `frameTreeNodeId` derived from a pid/tid pair: `pid * 1000 + tid`
pub fn frame_tree_node_id(pid: u64, tid: u64) -> u64 {
    pid.saturating_mul(FRAME_TREE_NODE_PID_FACTOR)
        .saturating_add(tid)
}

/// Frame name derived from a pid/tid pair
pub fn frame_name(pid: u64, tid: u64) -> String {
    format!("FRAME0P{}T{}", pid, tid)
}

/// A user timing mark
pub fn instant_event(name: &str, pid: u64, tid: u64, ts: u64) -> TraceEvent {
    TraceEvent::Instant(InstantEvent {
        phase: InstantPhase::Upper,
        cat: Some(USER_TIMING_CATEGORY.to_string()),
        name: name.to_string(),
        pid: Some(pid),
        tid: Some(tid),
        ts,
        args: None,
        extra: Map::new(),
    })
}

/// A complete event with a known duration
pub fn complete_event(cat: &str, name: &str, pid: u64, tid: u64, ts: u64, dur: u64) -> TraceEvent {
    TraceEvent::Complete(CompleteEvent {
        cat: Some(cat.to_string()),
        name: name.to_string(),
        pid: Some(pid),
        tid: Some(tid),
        ts,
        dur,
        args: None,
        extra: Map::new(),
    })
}

/// A user timing measure as a begin/end span pair sharing a fresh id
pub fn span_events(
    ids: &mut SpanIdGenerator,
    name: &str,
    pid: u64,
    tid: u64,
    start_ts: u64,
    end_ts: u64,
) -> (TraceEvent, TraceEvent) {
    let id = ids.next_id();
    let half = |ts: u64| SpanEvent {
        cat: Some(USER_TIMING_CATEGORY.to_string()),
        name: name.to_string(),
        pid: Some(pid),
        tid: Some(tid),
        ts,
        id2: SpanId { local: id.clone() },
        args: None,
        extra: Map::new(),
    };

    (
        TraceEvent::BeginSpan(half(start_ts)),
        TraceEvent::EndSpan(half(end_ts)),
    )
}

/// The marker every trace file starts with
pub fn tracing_started_event(pid: u64, tid: u64, ts: u64, url: Option<&str>) -> TraceEvent {
    let mut frame_extra = Map::new();
    frame_extra.insert("isInPrimaryMainFrame".to_string(), Value::Bool(true));
    frame_extra.insert("isOutermostMainFrame".to_string(), Value::Bool(true));
    frame_extra.insert("name".to_string(), Value::String(String::new()));
    frame_extra.insert(
        "url".to_string(),
        Value::String(url.unwrap_or(DEFAULT_FRAME_URL).to_string()),
    );

    let mut data_extra = Map::new();
    data_extra.insert("persistentIds".to_string(), Value::Bool(true));

    TraceEvent::TracingStarted(TracingStartedEvent {
        phase: InstantPhase::Upper,
        cat: Some(TRACING_STARTED_CATEGORY.to_string()),
        name: TRACING_STARTED_NAME.to_string(),
        pid: Some(pid),
        tid: Some(tid),
        ts,
        args: Some(EventArgs {
            detail: None,
            data: Some(EventData {
                frame_tree_node_id: Some(frame_tree_node_id(pid, tid)),
                frames: Some(vec![FrameInfo {
                    frame: Some(frame_name(pid, tid)),
                    process_id: Some(pid),
                    extra: frame_extra,
                }]),
                detail: None,
                extra: data_extra,
            }),
            extra: Map::new(),
        }),
        extra: Map::new(),
    })
}

/// A `RunTask` boundary event
pub fn run_task_event(pid: u64, tid: u64, ts: u64, dur: u64) -> TraceEvent {
    complete_event(RUN_TASK_CATEGORY, RUN_TASK_NAME, pid, tid, ts, dur)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_ids_are_sequential_hex() {
        let mut ids = SpanIdGenerator::new();
        let issued: Vec<String> = (0..11).map(|_| ids.next_id()).collect();
        assert_eq!(issued[0], "0x1");
        assert_eq!(issued[9], "0xa");
        assert_eq!(issued[10], "0xb");
        assert_eq!(ids.issued(), 11);
    }

    #[test]
    fn test_generators_are_independent() {
        let mut first = SpanIdGenerator::new();
        let mut second = SpanIdGenerator::new();
        first.next_id();
        assert_eq!(second.next_id(), "0x1");
    }

    #[test]
    fn test_span_pair_shares_id() {
        let mut ids = SpanIdGenerator::new();
        let (begin, end) = span_events(&mut ids, "load", 1, 2, 100, 250);
        assert_eq!(begin.phase(), "b");
        assert_eq!(end.phase(), "e");
        assert_eq!(begin.span_id(), Some("0x1"));
        assert_eq!(end.span_id(), Some("0x1"));
        assert_eq!(end.ts(), 250);
    }

    #[test]
    fn test_frame_helpers() {
        assert_eq!(frame_tree_node_id(10001, 1), 10_001_001);
        assert_eq!(frame_tree_node_id(u64::MAX, 1), u64::MAX);
        assert_eq!(frame_name(10001, 1), "FRAME0P10001T1");
    }

    #[test]
    fn test_tracing_started_shape() {
        let event = tracing_started_event(10001, 1, 0, None);
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["ph"], "I");
        assert_eq!(value["name"], "TracingStartedInBrowser");
        assert_eq!(value["args"]["data"]["frameTreeNodeId"], 10_001_001);
        assert_eq!(value["args"]["data"]["frames"][0]["processId"], 10001);
        assert_eq!(value["args"]["data"]["frames"][0]["frame"], "FRAME0P10001T1");
        assert_eq!(value["args"]["data"]["persistentIds"], true);
    }
}
