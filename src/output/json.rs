//! JSON trace file writer.
//!
//! Trace files are written to a temporary file in the target directory and
//! renamed into place, so a reader never sees a half-written file.

use crate::builder::TraceFile;
use crate::utils::error::OutputError;
use log::{debug, info};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically write serialized trace JSON to a file
///
/// # Arguments
/// * `contents` - Serialized trace file
/// * `output_path` - Path to output JSON file
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write or rename
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
///
/// # Example
/// ```ignore
/// let json = TraceFileBuilder::new(options).build_json(&events)?;
/// write_trace_file(&json, "trace.json")?;
/// ```
pub fn write_trace_file(contents: &str, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing trace file to: {}", output_path.display());

    super::validate_path(output_path)?;

    let parent = match output_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    // Create parent directories if needed
    if !parent.exists() {
        debug!("Creating parent directories: {}", parent.display());
        std::fs::create_dir_all(parent).map_err(|e| {
            OutputError::InvalidPath(format!(
                "Cannot create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    // Same directory as the target, so the rename stays on one filesystem
    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(contents.as_bytes())?;
    temp.as_file().sync_all()?;
    temp.persist(output_path)
        .map_err(|e| OutputError::WriteFailed(e.error))?;

    info!(
        "Trace file written successfully ({} bytes)",
        calculate_file_size(output_path)
    );

    Ok(())
}

/// Calculate file size in bytes
fn calculate_file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Read a trace file from disk
///
/// # Errors
/// * `OutputError::WriteFailed` - File read error (reusing WriteFailed for I/O)
/// * `OutputError::SerializationFailed` - JSON parse error
pub fn read_trace_file(input_path: impl AsRef<Path>) -> Result<TraceFile, OutputError> {
    let input_path = input_path.as_ref();

    debug!("Reading trace file from: {}", input_path.display());

    let file = File::open(input_path).map_err(OutputError::WriteFailed)?;

    let trace: TraceFile = serde_json::from_reader(BufReader::new(file))
        .map_err(OutputError::SerializationFailed)?;

    debug!(
        "Trace file loaded: {} events, started {}",
        trace.trace_events.len(),
        trace.metadata.start_time
    );

    Ok(trace)
}
