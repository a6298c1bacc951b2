use devtools_trace_sink::event::{
    attach_detail, decode, encode, instant_event, span_events, Detail, SpanIdGenerator, TraceEvent,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn raw(value: serde_json::Value) -> TraceEvent {
    serde_json::from_value(value).unwrap()
}

#[test]
fn test_structured_round_trip() {
    let mut ids = SpanIdGenerator::new();
    let (begin, end) = span_events(&mut ids, "load", 10, 20, 1_000, 2_000);

    let events = vec![
        attach_detail(
            instant_event("mark", 1, 2, 3),
            &json!({"devtools": {"dataType": "marker", "color": "primary"}}),
        )
        .unwrap(),
        attach_detail(begin, &json!({"devtools": {"track": "Network"}})).unwrap(),
        end,
    ];

    for event in events {
        let encoded = encode(&event).unwrap();
        assert_eq!(decode(&encoded).unwrap(), event);
    }
}

#[test]
fn test_raw_round_trip_is_byte_stable() {
    let lines = [
        r#"{"ph":"I","cat":"blink.user_timing","name":"m","pid":1,"tid":2,"ts":3,"args":{"detail":"{\"z\":1,\"a\":[true,null]}"},"s":"t"}"#,
        r#"{"ph":"X","cat":"c","name":"task","pid":1,"tid":2,"ts":3,"dur":40,"args":{"data":{"detail":"{\"b\":\"x\",\"a\":2}","url":"u"}}}"#,
        r#"{"ph":"b","cat":"blink.user_timing","name":"span","pid":1,"tid":2,"ts":3,"id2":{"local":"0x1"},"args":{"detail":"{\"k\":\"v\"}","data":{"detail":"[1,2]"}}}"#,
        r#"{"ph":"I","name":"m","ts":3}"#,
        r#"{"ph":"i","name":"m","tid":9,"ts":3,"args":{"detail":"{\"x\":[]}"}}"#,
        r#"{"ph":"e","name":"span","ts":4,"id2":{"local":"0x1"}}"#,
    ];

    for line in lines {
        let event: TraceEvent = serde_json::from_str(line).unwrap();
        let round_tripped = encode(&decode(&event).unwrap()).unwrap();
        assert_eq!(round_tripped, event);
        assert_eq!(serde_json::to_string(&round_tripped).unwrap(), line);
    }
}

#[test]
fn test_both_detail_fields_decoded_independently() {
    let event = raw(json!({
        "ph": "I", "name": "m", "pid": 1, "tid": 1, "ts": 1,
        "args": {"detail": "{\"top\":1}", "data": {"detail": "{\"nested\":2}"}}
    }));

    let decoded = decode(&event).unwrap();
    let args = decoded.args().unwrap();
    assert_eq!(args.detail, Some(Detail::Decoded(json!({"top": 1}))));
    assert_eq!(
        args.data.as_ref().unwrap().detail,
        Some(Detail::Decoded(json!({"nested": 2})))
    );
}

#[test]
fn test_only_nested_detail() {
    let event = raw(json!({
        "ph": "X", "name": "t", "pid": 1, "tid": 1, "ts": 1, "dur": 2,
        "args": {"data": {"detail": "\"just a string\""}}
    }));

    let decoded = decode(&event).unwrap();
    let args = decoded.args().unwrap();
    assert_eq!(args.detail, None);
    assert_eq!(
        args.data.as_ref().unwrap().detail,
        Some(Detail::Decoded(json!("just a string")))
    );
}

#[test]
fn test_decode_error_is_local_to_event() {
    let good = raw(json!({"ph": "I", "name": "ok", "ts": 1, "args": {"detail": "{}"}}));
    let bad = raw(json!({"ph": "I", "name": "bad", "ts": 2, "args": {"detail": "{"}}));

    assert!(decode(&good).is_ok());
    let err = decode(&bad).unwrap_err();
    assert!(err.to_string().contains("bad"));
}

#[test]
fn test_wire_form_keeps_double_encoding() {
    let event = attach_detail(instant_event("m", 1, 1, 1), &json!({"a": 1})).unwrap();
    let line = serde_json::to_string(&encode(&event).unwrap()).unwrap();
    assert!(line.contains(r#""detail":"{\"a\":1}""#));
}
