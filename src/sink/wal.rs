//! Write-ahead log for trace events.
//!
//! Every `write()` appends one wire-form event as one line of
//! `<name>.jsonl` and flushes it, so a crash loses at most the line being
//! written. `finalize()` turns what was written into `<name>.json`.

use super::recover::{recover_log, RecoveredLog};
use crate::builder::TraceFileBuilder;
use crate::event::{codec, SpanIdGenerator, TraceEvent};
use crate::output::write_trace_file;
use crate::utils::config::{BuilderOptions, EmptyTracePolicy, SinkConfig};
use crate::utils::error::{CodecError, SinkError};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{LineWriter, Write};
use std::path::PathBuf;

/// Lifecycle of a sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkState {
    Unopened,
    Open,
    Closed,
    /// An I/O error made the log unusable
    Failed,
}

impl fmt::Display for SinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SinkState::Unopened => "unopened",
            SinkState::Open => "open",
            SinkState::Closed => "closed",
            SinkState::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Result of the last successful finalize
#[derive(Debug, Clone, PartialEq, Eq)]
enum Finalized {
    Skipped,
    Written(PathBuf),
}

impl Finalized {
    fn path(&self) -> Option<PathBuf> {
        match self {
            Finalized::Skipped => None,
            Finalized::Written(path) => Some(path.clone()),
        }
    }
}

/// Append-only trace event sink for one session
///
/// # Example
/// ```ignore
/// let mut sink = TraceFileSink::new(SinkConfig::new("traces", "session"));
/// sink.open()?;
/// sink.write(&instant_event("ready", pid, tid, ts))?;
/// sink.close()?;
/// ```
#[derive(Debug)]
pub struct TraceFileSink {
    config: SinkConfig,
    state: SinkState,
    writer: Option<LineWriter<File>>,
    written: Vec<TraceEvent>,
    span_ids: SpanIdGenerator,
    started_at: Option<DateTime<Utc>>,
    finalized: Option<Finalized>,
}

impl TraceFileSink {
    pub fn new(config: SinkConfig) -> Self {
        Self {
            config,
            state: SinkState::Unopened,
            writer: None,
            written: Vec::new(),
            span_ids: SpanIdGenerator::new(),
            started_at: None,
            finalized: None,
        }
    }

    pub fn state(&self) -> SinkState {
        self.state
    }

    pub fn config(&self) -> &SinkConfig {
        &self.config
    }

    pub fn log_path(&self) -> PathBuf {
        self.config.log_path()
    }

    pub fn trace_path(&self) -> PathBuf {
        self.config.trace_path()
    }

    /// Number of events written in this session
    pub fn events_written(&self) -> usize {
        self.written.len()
    }

    /// Fresh `id2.local` for a span written through this sink
    pub fn next_span_id(&mut self) -> String {
        self.span_ids.next_id()
    }

    /// Span id generator owned by this session
    pub fn span_ids(&mut self) -> &mut SpanIdGenerator {
        &mut self.span_ids
    }

    /// Create the target directory and open the log for appending
    ///
    /// # Errors
    /// * `SinkError::Io` - directory or file cannot be created
    /// * `SinkError::IllegalState` - the sink was opened before
    pub fn open(&mut self) -> Result<(), SinkError> {
        if self.state != SinkState::Unopened {
            return Err(SinkError::IllegalState(format!(
                "cannot open a sink that is {}",
                self.state
            )));
        }

        let directory = &self.config.directory;
        if !directory.as_os_str().is_empty() && !directory.exists() {
            debug!("Creating trace directory: {}", directory.display());
            fs::create_dir_all(directory).map_err(|e| SinkError::io(directory, e))?;
        }

        let log_path = self.config.log_path();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .map_err(|e| SinkError::io(&log_path, e))?;

        self.writer = Some(LineWriter::new(file));
        self.started_at = Some(self.config.builder.start_time.unwrap_or_else(Utc::now));
        self.state = SinkState::Open;

        info!("Opened trace log: {}", log_path.display());
        Ok(())
    }

    /// Append one event to the log
    ///
    /// # Errors
    /// * `SinkError::IllegalState` - the sink is not open
    /// * `SinkError::Codec` - a detail is invalid JSON text or cannot be encoded;
    ///   nothing is appended and the sink stays usable
    /// * `SinkError::Io` - the line could not be written; the sink becomes unusable
    pub fn write(&mut self, event: &TraceEvent) -> Result<(), SinkError> {
        self.ensure_open("write")?;

        codec::validate(event)?;
        let encoded = codec::encode(event)?;
        let mut line =
            serde_json::to_string(&encoded).map_err(|source| CodecError::Serialization {
                name: event.name().to_string(),
                ts: event.ts(),
                source,
            })?;
        line.push('\n');

        let result = match self.writer.as_mut() {
            Some(writer) => writer
                .write_all(line.as_bytes())
                .and_then(|()| writer.flush()),
            None => {
                return Err(SinkError::IllegalState(
                    "open sink has no log handle".to_string(),
                ))
            }
        };

        if let Err(source) = result {
            self.fail();
            return Err(SinkError::io(self.config.log_path(), source));
        }

        self.written.push(encoded);
        self.finalized = None;
        Ok(())
    }

    /// Flush, finalize once, and release the log handle
    ///
    /// Calling `close()` on a closed sink does nothing once the trace file
    /// is written. If finalizing failed during the first `close()`, the next
    /// call tries again.
    ///
    /// # Errors
    /// * `SinkError::IllegalState` - the sink was never opened or has failed
    /// * `SinkError::Io` - the final flush failed
    /// * any error of `finalize()`; the handle is released regardless
    pub fn close(&mut self) -> Result<(), SinkError> {
        match self.state {
            SinkState::Closed if self.finalized.is_some() => return Ok(()),
            SinkState::Closed => {
                debug!("Retrying finalize of closed sink");
                return self.finalize().map(|_| ());
            }
            SinkState::Open => {}
            other => {
                return Err(SinkError::IllegalState(format!(
                    "cannot close a sink that is {}",
                    other
                )))
            }
        }

        let flushed = match self.writer.take() {
            Some(mut writer) => writer.flush(),
            None => Ok(()),
        };
        self.state = SinkState::Closed;
        flushed.map_err(|e| SinkError::io(self.config.log_path(), e))?;

        self.finalize()?;

        info!(
            "Closed trace log: {} ({} events)",
            self.config.log_path().display(),
            self.written.len()
        );
        Ok(())
    }

    /// Materialize the events written so far into `<name>.json`
    ///
    /// Returns the trace file path, or `None` when nothing was written and
    /// the empty-trace policy is `Skip`. Repeat calls without new writes
    /// return the previous result and do not touch the disk.
    ///
    /// # Errors
    /// * `SinkError::IllegalState` - the sink was never opened or has failed
    /// * `SinkError::Codec` / `SinkError::Build` - the container cannot be built
    /// * `SinkError::Output` - the trace file cannot be written
    pub fn finalize(&mut self) -> Result<Option<PathBuf>, SinkError> {
        match self.state {
            SinkState::Open | SinkState::Closed => {}
            other => {
                return Err(SinkError::IllegalState(format!(
                    "cannot finalize a sink that is {}",
                    other
                )))
            }
        }

        if let Some(finalized) = &self.finalized {
            debug!("Trace already finalized, nothing to do");
            return Ok(finalized.path());
        }

        let events = codec::decode_all(&self.written)?;

        let mut options = self.config.builder.clone();
        options.start_time = self.started_at;

        let finalized = write_container(&self.config, options, &events)?;
        let path = finalized.path();
        self.finalized = Some(finalized);
        Ok(path)
    }

    /// Read the log back from disk, independent of `finalize()`
    ///
    /// # Errors
    /// * `SinkError::Io` - the log cannot be read
    pub fn recover(&mut self) -> Result<RecoveredLog, SinkError> {
        if let Some(writer) = self.writer.as_mut() {
            if let Err(source) = writer.flush() {
                self.fail();
                return Err(SinkError::io(self.config.log_path(), source));
            }
        }
        recover_log(self.config.log_path())
    }

    fn ensure_open(&self, operation: &str) -> Result<(), SinkError> {
        match self.state {
            SinkState::Open => Ok(()),
            other => Err(SinkError::IllegalState(format!(
                "{} called on a sink that is {}",
                operation, other
            ))),
        }
    }

    fn fail(&mut self) {
        warn!(
            "Trace log {} is no longer usable",
            self.config.log_path().display()
        );
        self.writer = None;
        self.state = SinkState::Failed;
    }
}

/// Finalize a log left behind by an earlier session
///
/// Reads `<name>.jsonl` instead of an in-memory buffer. Corrupt lines and an
/// incomplete last line are skipped with a warning.
///
/// # Errors
/// * `SinkError::Io` - the log cannot be read
/// * `SinkError::Build` / `SinkError::Output` - the trace file cannot be produced
pub fn materialize(config: &SinkConfig) -> Result<Option<PathBuf>, SinkError> {
    let recovered = recover_log(config.log_path())?;

    for error in &recovered.errors {
        warn!("Skipping corrupt log line: {}", error);
    }
    if let Some(tail) = &recovered.partial_tail {
        warn!("Skipping incomplete last line ({} bytes)", tail.len());
    }

    let finalized = write_container(config, config.builder.clone(), &recovered.records)?;
    Ok(finalized.path())
}

fn write_container(
    config: &SinkConfig,
    options: BuilderOptions,
    events: &[TraceEvent],
) -> Result<Finalized, SinkError> {
    if events.is_empty() && config.empty_trace == EmptyTracePolicy::Skip {
        info!("No events written, skipping {}", config.trace_path().display());
        return Ok(Finalized::Skipped);
    }

    let json = TraceFileBuilder::new(options).build_json(events)?;
    let path = config.trace_path();
    write_trace_file(&json, &path)?;

    Ok(Finalized::Written(path))
}

/// Whether a log exists for the given configuration
pub fn log_exists(config: &SinkConfig) -> bool {
    config.log_path().is_file()
}
