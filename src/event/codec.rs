//! Conversion between wire form and structured form of trace events.
//!
//! In wire form `args.detail` and `args.data.detail` hold JSON text inside a
//! JSON string. In structured form they hold the parsed value. Both fields
//! are handled independently. All functions are pure and return new events.

use super::schema::{Detail, TraceEvent};
use crate::utils::error::CodecError;
use serde::de::IgnoredAny;
use serde::Serialize;

/// Parse string-encoded detail fields into structured values
///
/// # Errors
/// * `CodecError::Parse` - a detail string is not valid JSON
pub fn decode(event: &TraceEvent) -> Result<TraceEvent, CodecError> {
    let mut decoded = event.clone();

    if let Some(args) = decoded.args_mut() {
        decode_detail(&mut args.detail, event)?;
        if let Some(data) = args.data.as_mut() {
            decode_detail(&mut data.detail, event)?;
        }
    }

    Ok(decoded)
}

/// Stringify structured detail fields into wire form
///
/// # Errors
/// * `CodecError::Serialization` - a detail value cannot be serialized
pub fn encode(event: &TraceEvent) -> Result<TraceEvent, CodecError> {
    let mut encoded = event.clone();

    if let Some(args) = encoded.args_mut() {
        encode_detail(&mut args.detail, event)?;
        if let Some(data) = args.data.as_mut() {
            encode_detail(&mut data.detail, event)?;
        }
    }

    Ok(encoded)
}

/// Check that every string-encoded detail field holds valid JSON
///
/// # Errors
/// * `CodecError::Parse` - a detail string is not valid JSON
pub fn validate(event: &TraceEvent) -> Result<(), CodecError> {
    let Some(args) = event.args() else {
        return Ok(());
    };

    validate_detail(args.detail.as_ref(), event)?;
    if let Some(data) = args.data.as_ref() {
        validate_detail(data.detail.as_ref(), event)?;
    }
    Ok(())
}

pub fn decode_all(events: &[TraceEvent]) -> Result<Vec<TraceEvent>, CodecError> {
    events.iter().map(decode).collect()
}

pub fn encode_all(events: &[TraceEvent]) -> Result<Vec<TraceEvent>, CodecError> {
    events.iter().map(encode).collect()
}

/// Whether any detail field of the event is in wire form
pub fn has_encoded_detail(event: &TraceEvent) -> bool {
    let Some(args) = event.args() else {
        return false;
    };

    let top_level = args.detail.as_ref().is_some_and(Detail::is_encoded);
    let nested = args
        .data
        .as_ref()
        .and_then(|data| data.detail.as_ref())
        .is_some_and(Detail::is_encoded);

    top_level || nested
}

/// Attach a host value as the structured `args.detail` of an event
///
/// # Errors
/// * `CodecError::Serialization` - the value cannot be represented as JSON
pub fn attach_detail<T: Serialize + ?Sized>(
    mut event: TraceEvent,
    detail: &T,
) -> Result<TraceEvent, CodecError> {
    let detail = Detail::from_serializable(detail).map_err(|source| CodecError::Serialization {
        name: event.name().to_string(),
        ts: event.ts(),
        source,
    })?;

    event.args_entry().detail = Some(detail);
    Ok(event)
}

fn decode_detail(slot: &mut Option<Detail>, event: &TraceEvent) -> Result<(), CodecError> {
    if let Some(Detail::Encoded(raw)) = slot {
        let value = serde_json::from_str(raw).map_err(|source| CodecError::Parse {
            name: event.name().to_string(),
            ts: event.ts(),
            source,
        })?;
        *slot = Some(Detail::Decoded(value));
    }
    Ok(())
}

fn validate_detail(detail: Option<&Detail>, event: &TraceEvent) -> Result<(), CodecError> {
    if let Some(Detail::Encoded(raw)) = detail {
        serde_json::from_str::<IgnoredAny>(raw).map_err(|source| CodecError::Parse {
            name: event.name().to_string(),
            ts: event.ts(),
            source,
        })?;
    }
    Ok(())
}

fn encode_detail(slot: &mut Option<Detail>, event: &TraceEvent) -> Result<(), CodecError> {
    if let Some(Detail::Decoded(value)) = slot {
        let raw = serde_json::to_string(value).map_err(|source| CodecError::Serialization {
            name: event.name().to_string(),
            ts: event.ts(),
            source,
        })?;
        *slot = Some(Detail::Encoded(raw));
    }
    Ok(())
}
