//! Durable event sink.
//!
//! This module handles:
//! - Appending events to `<name>.jsonl` one flushed line at a time
//! - Materializing the log into `<name>.json`
//! - Recovering events from a log after a crash

pub mod recover;
pub mod wal;

pub use recover::{recover_bytes, recover_log, RecoveredLog};
pub use wal::{log_exists, materialize, SinkState, TraceFileSink};
