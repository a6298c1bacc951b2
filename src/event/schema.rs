//! Trace event schema definitions.
//!
//! Events follow the Chrome DevTools Trace Event Format. The phase field
//! `ph` selects the variant; everything the schema does not name is kept
//! in `extra` maps so raw events survive a decode/encode round trip.

use crate::utils::config::TRACING_STARTED_NAME;
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Phases this crate understands, in wire form
pub const PHASES: &[&str] = &["I", "i", "X", "b", "e"];

/// The nested `detail` payload of an event
///
/// On the wire the payload is a JSON document embedded as a string.
/// Trace viewers expect that double encoding, so it is kept as is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Detail {
    /// Wire form: JSON text inside a JSON string
    Encoded(String),

    /// Structured form: the parsed payload
    Decoded(Value),
}

impl Detail {
    /// Build a structured detail from any serializable host value
    pub fn from_serializable<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Detail::Decoded)
    }

    pub fn is_encoded(&self) -> bool {
        matches!(self, Detail::Encoded(_))
    }
}

/// One entry of `args.data.frames`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_id: Option<u64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `args.data` object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_tree_node_id: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frames: Option<Vec<FrameInfo>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<Detail>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `args` object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventArgs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<Detail>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<EventData>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Span correlation id (`id2.local`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanId {
    pub local: String,
}

/// Letter an instant event was written with
///
/// Both `"I"` and the legacy `"i"` are read; events are written back with
/// the letter they were read with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InstantPhase {
    #[default]
    Upper,
    Lower,
}

impl InstantPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            InstantPhase::Upper => "I",
            InstantPhase::Lower => "i",
        }
    }
}

/// Instant event (`ph: "I"`): a mark
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstantEvent {
    #[serde(skip)]
    pub phase: InstantPhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cat: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tid: Option<u64>,
    pub ts: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<EventArgs>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Complete event (`ph: "X"`): a duration known up front
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cat: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tid: Option<u64>,
    pub ts: u64,
    pub dur: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<EventArgs>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One half of a span (`ph: "b"` or `ph: "e"`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cat: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tid: Option<u64>,
    pub ts: u64,
    pub id2: SpanId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<EventArgs>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `TracingStartedInBrowser` marker opening every trace file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TracingStartedEvent {
    #[serde(skip)]
    pub phase: InstantPhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cat: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tid: Option<u64>,
    pub ts: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<EventArgs>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A trace event, discriminated by its phase
#[derive(Debug, Clone, PartialEq)]
pub enum TraceEvent {
    Instant(InstantEvent),
    Complete(CompleteEvent),
    BeginSpan(SpanEvent),
    EndSpan(SpanEvent),
    TracingStarted(TracingStartedEvent),
}

/// Mutable view of the identity fields the normalizer rewrites
///
/// Absent `pid`/`tid` stay absent.
pub struct EventCoreMut<'a> {
    pub pid: &'a mut Option<u64>,
    pub tid: &'a mut Option<u64>,
    pub ts: &'a mut u64,
    pub span_id: Option<&'a mut String>,
}

impl TraceEvent {
    /// Wire value of `ph`
    pub fn phase(&self) -> &'static str {
        match self {
            TraceEvent::Instant(e) => e.phase.as_str(),
            TraceEvent::TracingStarted(e) => e.phase.as_str(),
            TraceEvent::Complete(_) => "X",
            TraceEvent::BeginSpan(_) => "b",
            TraceEvent::EndSpan(_) => "e",
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TraceEvent::Instant(e) => &e.name,
            TraceEvent::Complete(e) => &e.name,
            TraceEvent::BeginSpan(e) | TraceEvent::EndSpan(e) => &e.name,
            TraceEvent::TracingStarted(e) => &e.name,
        }
    }

    pub fn pid(&self) -> Option<u64> {
        match self {
            TraceEvent::Instant(e) => e.pid,
            TraceEvent::Complete(e) => e.pid,
            TraceEvent::BeginSpan(e) | TraceEvent::EndSpan(e) => e.pid,
            TraceEvent::TracingStarted(e) => e.pid,
        }
    }

    pub fn tid(&self) -> Option<u64> {
        match self {
            TraceEvent::Instant(e) => e.tid,
            TraceEvent::Complete(e) => e.tid,
            TraceEvent::BeginSpan(e) | TraceEvent::EndSpan(e) => e.tid,
            TraceEvent::TracingStarted(e) => e.tid,
        }
    }

    /// Timestamp in microseconds
    pub fn ts(&self) -> u64 {
        match self {
            TraceEvent::Instant(e) => e.ts,
            TraceEvent::Complete(e) => e.ts,
            TraceEvent::BeginSpan(e) | TraceEvent::EndSpan(e) => e.ts,
            TraceEvent::TracingStarted(e) => e.ts,
        }
    }

    /// Duration in microseconds, for complete events
    pub fn dur(&self) -> Option<u64> {
        match self {
            TraceEvent::Complete(e) => Some(e.dur),
            _ => None,
        }
    }

    /// `id2.local` of span events
    pub fn span_id(&self) -> Option<&str> {
        match self {
            TraceEvent::BeginSpan(e) | TraceEvent::EndSpan(e) => Some(&e.id2.local),
            _ => None,
        }
    }

    pub fn args(&self) -> Option<&EventArgs> {
        match self {
            TraceEvent::Instant(e) => e.args.as_ref(),
            TraceEvent::Complete(e) => e.args.as_ref(),
            TraceEvent::BeginSpan(e) | TraceEvent::EndSpan(e) => e.args.as_ref(),
            TraceEvent::TracingStarted(e) => e.args.as_ref(),
        }
    }

    pub fn args_mut(&mut self) -> Option<&mut EventArgs> {
        match self {
            TraceEvent::Instant(e) => e.args.as_mut(),
            TraceEvent::Complete(e) => e.args.as_mut(),
            TraceEvent::BeginSpan(e) | TraceEvent::EndSpan(e) => e.args.as_mut(),
            TraceEvent::TracingStarted(e) => e.args.as_mut(),
        }
    }

    /// `args`, created empty if the event has none yet
    pub fn args_entry(&mut self) -> &mut EventArgs {
        match self {
            TraceEvent::Instant(e) => e.args.get_or_insert_with(EventArgs::default),
            TraceEvent::Complete(e) => e.args.get_or_insert_with(EventArgs::default),
            TraceEvent::BeginSpan(e) | TraceEvent::EndSpan(e) => {
                e.args.get_or_insert_with(EventArgs::default)
            }
            TraceEvent::TracingStarted(e) => e.args.get_or_insert_with(EventArgs::default),
        }
    }

    pub fn core_mut(&mut self) -> EventCoreMut<'_> {
        match self {
            TraceEvent::Instant(e) => EventCoreMut {
                pid: &mut e.pid,
                tid: &mut e.tid,
                ts: &mut e.ts,
                span_id: None,
            },
            TraceEvent::Complete(e) => EventCoreMut {
                pid: &mut e.pid,
                tid: &mut e.tid,
                ts: &mut e.ts,
                span_id: None,
            },
            TraceEvent::BeginSpan(e) | TraceEvent::EndSpan(e) => EventCoreMut {
                pid: &mut e.pid,
                tid: &mut e.tid,
                ts: &mut e.ts,
                span_id: Some(&mut e.id2.local),
            },
            TraceEvent::TracingStarted(e) => EventCoreMut {
                pid: &mut e.pid,
                tid: &mut e.tid,
                ts: &mut e.ts,
                span_id: None,
            },
        }
    }
}

impl Serialize for TraceEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // `ph` goes first, the variant's own fields follow in declaration order
        #[derive(Serialize)]
        struct Tagged<'a, T> {
            ph: &'static str,
            #[serde(flatten)]
            event: &'a T,
        }

        let ph = self.phase();
        match self {
            TraceEvent::Instant(event) => Tagged { ph, event }.serialize(serializer),
            TraceEvent::Complete(event) => Tagged { ph, event }.serialize(serializer),
            TraceEvent::BeginSpan(event) | TraceEvent::EndSpan(event) => {
                Tagged { ph, event }.serialize(serializer)
            }
            TraceEvent::TracingStarted(event) => Tagged { ph, event }.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for TraceEvent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = Map::deserialize(deserializer)?;

        let phase = match fields.shift_remove("ph") {
            Some(Value::String(phase)) => phase,
            Some(other) => {
                return Err(de::Error::invalid_type(
                    de::Unexpected::Other(&other.to_string()),
                    &"a phase string",
                ))
            }
            None => return Err(de::Error::missing_field("ph")),
        };

        let tracing_started =
            fields.get("name").and_then(Value::as_str) == Some(TRACING_STARTED_NAME);
        let value = Value::Object(fields);

        let instant_phase = match phase.as_str() {
            "i" => InstantPhase::Lower,
            _ => InstantPhase::Upper,
        };

        let event = match phase.as_str() {
            "I" | "i" if tracing_started => TracingStartedEvent::deserialize(value).map(|e| {
                TraceEvent::TracingStarted(TracingStartedEvent {
                    phase: instant_phase,
                    ..e
                })
            }),
            "I" | "i" => InstantEvent::deserialize(value).map(|e| {
                TraceEvent::Instant(InstantEvent {
                    phase: instant_phase,
                    ..e
                })
            }),
            "X" => CompleteEvent::deserialize(value).map(TraceEvent::Complete),
            "b" => SpanEvent::deserialize(value).map(TraceEvent::BeginSpan),
            "e" => SpanEvent::deserialize(value).map(TraceEvent::EndSpan),
            other => return Err(de::Error::unknown_variant(other, PHASES)),
        };

        event.map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_phase_selects_variant() {
        let cases = [
            (json!({"ph": "I", "name": "m", "ts": 1}), "I"),
            (json!({"ph": "X", "name": "t", "ts": 1, "dur": 5}), "X"),
            (json!({"ph": "b", "name": "s", "ts": 1, "id2": {"local": "0x1"}}), "b"),
            (json!({"ph": "e", "name": "s", "ts": 2, "id2": {"local": "0x1"}}), "e"),
        ];

        for (raw, phase) in cases {
            let event: TraceEvent = serde_json::from_value(raw).unwrap();
            assert_eq!(event.phase(), phase);
        }
    }

    #[test]
    fn test_tracing_started_recognized_by_name() {
        let raw = json!({
            "ph": "i",
            "cat": "devtools.timeline",
            "name": "TracingStartedInBrowser",
            "pid": 1,
            "tid": 2,
            "ts": 3,
            "args": {"data": {"frameTreeNodeId": 1002}}
        });

        let event: TraceEvent = serde_json::from_value(raw).unwrap();
        assert!(matches!(event, TraceEvent::TracingStarted(_)));
        assert_eq!(
            event.args().and_then(|a| a.data.as_ref()).and_then(|d| d.frame_tree_node_id),
            Some(1002)
        );
    }

    #[test]
    fn test_unknown_phase_rejected() {
        let raw = json!({"ph": "C", "name": "counter", "ts": 1});
        assert!(serde_json::from_value::<TraceEvent>(raw).is_err());
    }

    #[test]
    fn test_missing_phase_rejected() {
        let raw = json!({"name": "m", "ts": 1});
        assert!(serde_json::from_value::<TraceEvent>(raw).is_err());
    }

    #[test]
    fn test_serialize_puts_phase_first_and_keeps_unknown_keys() {
        let raw = r#"{"ph":"I","cat":"blink.user_timing","name":"m","pid":1,"tid":2,"ts":3,"s":"t"}"#;
        let event: TraceEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(serde_json::to_string(&event).unwrap(), raw);
    }

    #[test]
    fn test_sparse_and_lower_case_events_round_trip() {
        let lines = [
            r#"{"ph":"I","name":"m","ts":3}"#,
            r#"{"ph":"i","name":"m","pid":4,"ts":3}"#,
            r#"{"ph":"i","cat":"devtools.timeline","name":"TracingStartedInBrowser","ts":0}"#,
            r#"{"ph":"X","name":"t","ts":1,"dur":2}"#,
        ];

        for line in lines {
            let event: TraceEvent = serde_json::from_str(line).unwrap();
            assert_eq!(serde_json::to_string(&event).unwrap(), line);
        }
    }

    #[test]
    fn test_missing_identity_fields_stay_absent() {
        let event: TraceEvent =
            serde_json::from_value(json!({"ph": "X", "name": "t", "ts": 1, "dur": 1})).unwrap();
        assert_eq!(event.pid(), None);
        assert_eq!(event.tid(), None);
    }

    #[test]
    fn test_detail_untagged_forms() {
        let encoded: Detail = serde_json::from_value(json!("{\"a\":1}")).unwrap();
        assert!(encoded.is_encoded());

        let decoded: Detail = serde_json::from_value(json!({"a": 1})).unwrap();
        assert_eq!(decoded, Detail::Decoded(json!({"a": 1})));
    }
}
