use chrono::{TimeZone, Utc};
use devtools_trace_sink::builder::TraceFileBuilder;
use devtools_trace_sink::event::{
    attach_detail, instant_event, span_events, tracing_started_event, Detail, SpanIdGenerator,
    TraceEvent,
};
use devtools_trace_sink::normalizer::{normalize, normalize_trace_file, NormalizeOptions};
use devtools_trace_sink::utils::BuilderOptions;
use pretty_assertions::assert_eq;
use serde_json::json;

const BASE: u64 = 1_700_000_005_000_000;

/// One scenario as two different runs would record it
fn recorded_run(pid: u64, tid: u64, offset: u64, first_span: u64) -> Vec<TraceEvent> {
    let mut ids = SpanIdGenerator::new();
    for _ in 1..first_span {
        ids.next_id();
    }
    let (begin, end) = span_events(&mut ids, "load", pid, tid, offset + 10, offset + 90);
    vec![
        tracing_started_event(pid, tid, offset, None),
        attach_detail(begin, &json!({"devtools": {"track": "Main"}})).unwrap(),
        instant_event("mark", pid, tid, offset + 50),
        end,
    ]
}

#[test]
fn test_timestamps_follow_sorted_order() {
    let events = vec![
        instant_event("a", 1, 1, 300),
        instant_event("b", 1, 1, 100),
        instant_event("c", 1, 1, 200),
    ];

    let normalized = normalize(&events, &NormalizeOptions::with_base_timestamp(BASE)).unwrap();
    let ts: Vec<u64> = normalized.iter().map(TraceEvent::ts).collect();
    assert_eq!(ts, vec![BASE + 200, BASE, BASE + 100]);

    let names: Vec<&str> = normalized.iter().map(TraceEvent::name).collect();
    assert_eq!(names, vec!["a", "b", "c"]);
}

#[test]
fn test_sparse_raw_events_gain_no_fields() {
    let events: Vec<TraceEvent> = [300, 100, 200]
        .iter()
        .map(|ts| {
            serde_json::from_value(json!({"ph": "X", "name": "t", "ts": ts, "dur": 1})).unwrap()
        })
        .collect();

    let normalized = normalize(&events, &NormalizeOptions::with_base_timestamp(BASE)).unwrap();
    let lines: Vec<String> = normalized
        .iter()
        .map(|e| serde_json::to_string(e).unwrap())
        .collect();

    assert_eq!(
        lines,
        vec![
            format!(r#"{{"ph":"X","name":"t","ts":{},"dur":1}}"#, BASE + 200),
            format!(r#"{{"ph":"X","name":"t","ts":{},"dur":1}}"#, BASE),
            format!(r#"{{"ph":"X","name":"t","ts":{},"dur":1}}"#, BASE + 100),
        ]
    );
}

#[test]
fn test_lower_case_instant_phase_survives() {
    let event: TraceEvent =
        serde_json::from_value(json!({"ph": "i", "name": "m", "pid": 7, "ts": 5})).unwrap();

    let normalized = normalize(&[event], &NormalizeOptions::with_base_timestamp(BASE)).unwrap();
    assert_eq!(
        serde_json::to_string(&normalized[0]).unwrap(),
        format!(r#"{{"ph":"i","name":"m","pid":10001,"ts":{}}}"#, BASE)
    );
}

#[test]
fn test_pids_and_tids_numbered_by_value() {
    let events = vec![
        instant_event("a", 200, 55, 1),
        instant_event("b", 100, 44, 2),
        instant_event("c", 200, 44, 3),
    ];

    let normalized = normalize(&events, &NormalizeOptions::default()).unwrap();
    let ids: Vec<(Option<u64>, Option<u64>)> =
        normalized.iter().map(|e| (e.pid(), e.tid())).collect();
    assert_eq!(
        ids,
        vec![
            (Some(10002), Some(2)),
            (Some(10001), Some(1)),
            (Some(10002), Some(1))
        ]
    );
}

#[test]
fn test_different_runs_normalize_identically() {
    let first = recorded_run(4242, 7, 1_000_000, 1);
    let second = recorded_run(9999, 13, 5_000_000, 40);

    let options = NormalizeOptions::default();
    let first = serde_json::to_string(&normalize(&first, &options).unwrap()).unwrap();
    let second = serde_json::to_string(&normalize(&second, &options).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_span_pairs_stay_linked() {
    let events = recorded_run(4242, 7, 1_000_000, 40);
    let normalized = normalize(&events, &NormalizeOptions::default()).unwrap();

    assert_eq!(normalized[1].span_id(), Some("0x1"));
    assert_eq!(normalized[3].span_id(), Some("0x1"));
}

#[test]
fn test_frame_fields_follow_new_ids() {
    let events = vec![tracing_started_event(4242, 7, 10, Some("https://example.com"))];
    let normalized = normalize(&events, &NormalizeOptions::default()).unwrap();

    let data = normalized[0].args().unwrap().data.as_ref().unwrap();
    assert_eq!(data.frame_tree_node_id, Some(10_001_001));
    let frame = &data.frames.as_ref().unwrap()[0];
    assert_eq!(frame.process_id, Some(10_001));
    assert_eq!(frame.frame.as_deref(), Some("FRAME0P10001T1"));
}

#[test]
fn test_detail_form_is_preserved() {
    let structured =
        attach_detail(instant_event("s", 1, 1, 1), &json!({"k": "v"})).unwrap();
    let wire: TraceEvent = serde_json::from_value(json!({
        "ph": "I", "name": "w", "pid": 1, "tid": 1, "ts": 2,
        "args": {"detail": "{\"k\":\"v\"}"}
    }))
    .unwrap();

    let normalized = normalize(&[structured, wire], &NormalizeOptions::default()).unwrap();
    assert_eq!(
        normalized[0].args().unwrap().detail,
        Some(Detail::Decoded(json!({"k": "v"})))
    );
    assert_eq!(
        normalized[1].args().unwrap().detail,
        Some(Detail::Encoded("{\"k\":\"v\"}".to_string()))
    );
}

#[test]
fn test_invalid_detail_fails_normalization() {
    let wire: TraceEvent = serde_json::from_value(json!({
        "ph": "I", "name": "broken", "ts": 2, "args": {"detail": "{"}
    }))
    .unwrap();
    assert!(normalize(&[wire], &NormalizeOptions::default()).is_err());
}

#[test]
fn test_normalized_trace_files_are_byte_identical() {
    let build = |pid, offset, hour| {
        let options = BuilderOptions {
            hardware_concurrency: Some(8),
            ..BuilderOptions::default()
        };
        let trace = TraceFileBuilder::new(options)
            .with_start_time(Utc.with_ymd_and_hms(2025, 5, 1, hour, 0, 0).unwrap())
            .build(&recorded_run(pid, 1, offset, 1))
            .unwrap();
        let normalized = normalize_trace_file(&trace, &NormalizeOptions::default()).unwrap();
        serde_json::to_string(&normalized).unwrap()
    };

    assert_eq!(build(100, 5_000_000, 9), build(321, 8_000_000, 17));
}
