//! Output writers for trace files.
//!
//! This module handles writing data to disk:
//! - Atomic trace file writes (temp file + rename)
//! - Reading trace files back for validation and normalization

pub mod json;

// Re-export main functions
pub use json::{read_trace_file, write_trace_file};

use crate::utils::error::OutputError;
use std::path::Path;

/// Common path validation for output files
pub fn validate_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    if path.exists() && path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}
