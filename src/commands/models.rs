use std::path::PathBuf;

/// Arguments for the finalize command
#[derive(Debug, Clone)]
pub struct FinalizeArgs {
    /// Directory holding the log
    pub directory: PathBuf,

    /// Session name (log is `<name>.jsonl`)
    pub name: String,

    /// Optional TOML sink configuration
    pub config: Option<PathBuf>,

    /// Padding offset override, in milliseconds
    pub margin_ms: Option<u64>,

    /// Write a boundary-only trace when the log is empty
    pub emit_empty: bool,
}

/// Arguments for the recover command
#[derive(Debug, Clone)]
pub struct RecoverArgs {
    /// Log file to recover
    pub log: PathBuf,

    /// Where to write recovered records as a JSON array
    pub output: Option<PathBuf>,
}

/// Arguments for the normalize command
#[derive(Debug, Clone)]
pub struct NormalizeArgs {
    /// Trace file (`.json`) or log (`.jsonl`) to normalize
    pub input: PathBuf,

    /// Output path; defaults to `<input stem>.normalized.json`
    pub output: Option<PathBuf>,

    /// Value the earliest timestamp maps to
    pub base_timestamp_us: Option<u64>,
}
