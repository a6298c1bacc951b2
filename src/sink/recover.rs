//! Crash recovery for the append-only event log.
//!
//! Each line is recovered on its own. A corrupt line becomes a
//! `RecoveryError` and recovery moves on. A last line without a line
//! terminator is what an interrupted write leaves behind; it is reported as
//! the partial tail, never as a record or an error.

use crate::event::{codec, TraceEvent};
use crate::utils::error::{RecoveryError, SinkError};
use log::{debug, warn};
use std::fs;
use std::path::Path;

/// Everything that could be read back from a log
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecoveredLog {
    /// Decoded events, in log order
    pub records: Vec<TraceEvent>,

    /// Lines that could not be decoded
    pub errors: Vec<RecoveryError>,

    /// Unterminated last line, if any
    pub partial_tail: Option<String>,
}

impl RecoveredLog {
    /// True when every line was recovered and nothing was left dangling
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.partial_tail.is_none()
    }
}

/// Recover events from a log file on disk
///
/// # Errors
/// * `SinkError::Io` - the log cannot be read
pub fn recover_log(path: impl AsRef<Path>) -> Result<RecoveredLog, SinkError> {
    let path = path.as_ref();

    debug!("Recovering trace log: {}", path.display());

    let bytes = fs::read(path).map_err(|e| SinkError::io(path, e))?;
    let recovered = recover_bytes(&bytes);

    if !recovered.errors.is_empty() {
        warn!(
            "{} corrupt line(s) in {}",
            recovered.errors.len(),
            path.display()
        );
    }
    if recovered.partial_tail.is_some() {
        warn!("Log {} ends with an incomplete line", path.display());
    }

    debug!("Recovered {} events", recovered.records.len());

    Ok(recovered)
}

/// Recover events from raw log contents
pub fn recover_bytes(bytes: &[u8]) -> RecoveredLog {
    let mut recovered = RecoveredLog::default();

    let (complete, tail) = match bytes.iter().rposition(|b| *b == b'\n') {
        Some(last) => bytes.split_at(last + 1),
        None => bytes.split_at(0),
    };

    if !tail.is_empty() {
        recovered.partial_tail = Some(String::from_utf8_lossy(tail).into_owned());
    }

    for (index, raw) in complete.split(|b| *b == b'\n').enumerate() {
        let line = raw.strip_suffix(b"\r").unwrap_or(raw);
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        match parse_line(line) {
            Ok(event) => recovered.records.push(event),
            Err(reason) => recovered.errors.push(RecoveryError {
                line: index + 1,
                raw: String::from_utf8_lossy(line).into_owned(),
                reason,
            }),
        }
    }

    recovered
}

fn parse_line(line: &[u8]) -> Result<TraceEvent, String> {
    let text = std::str::from_utf8(line).map_err(|e| format!("invalid UTF-8: {}", e))?;
    let event: TraceEvent = serde_json::from_str(text).map_err(|e| e.to_string())?;
    codec::decode(&event).map_err(|e| e.to_string())
}
