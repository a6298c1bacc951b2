//! DevTools Trace Sink
//!
//! Durable persistence for profiler events in the Chrome DevTools Trace
//! Event Format.
//!
//! Events are appended to a newline-delimited log (`<name>.jsonl`) one
//! flushed line at a time, then materialized into a trace file
//! (`<name>.json`) that DevTools and Perfetto can open. A log left behind by
//! a crashed process can be recovered line by line.
//!
//! ## Getting Started
//!
//! ```ignore
//! use devtools_trace_sink::event::instant_event;
//! use devtools_trace_sink::sink::TraceFileSink;
//! use devtools_trace_sink::utils::SinkConfig;
//!
//! let mut sink = TraceFileSink::new(SinkConfig::new("traces", "session"));
//! sink.open()?;
//! sink.write(&instant_event("ready", pid, tid, ts))?;
//! sink.close()?; // writes traces/session.json
//! ```

pub mod builder;
pub mod commands;
pub mod event;
pub mod normalizer;
pub mod output;
pub mod sink;
pub mod utils;
