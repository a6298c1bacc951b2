//! Normalize command implementation.
//!
//! Accepts either a trace file or a raw log and writes a deterministic
//! version of it, ready to be committed as a snapshot.

use crate::commands::models::NormalizeArgs;
use crate::normalizer::{normalize, normalize_trace_file, NormalizeOptions};
use crate::output::{read_trace_file, write_trace_file};
use crate::sink::recover_log;
use crate::utils::config::LOG_EXTENSION;
use anyhow::{Context, Result};
use log::{info, warn};
use std::path::{Path, PathBuf};

/// Execute the normalize command, returning the output path
pub fn execute_normalize(args: NormalizeArgs) -> Result<PathBuf> {
    let options = args
        .base_timestamp_us
        .map(NormalizeOptions::with_base_timestamp)
        .unwrap_or_default();
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input));

    let json = if is_log(&args.input) {
        info!("Normalizing log: {}", args.input.display());
        let recovered = recover_log(&args.input)?;
        if !recovered.is_clean() {
            warn!("Log has corrupt or incomplete lines; they are left out");
        }
        let normalized = normalize(&recovered.records, &options)?;
        serde_json::to_string_pretty(&normalized)?
    } else {
        info!("Normalizing trace file: {}", args.input.display());
        let trace = read_trace_file(&args.input)
            .with_context(|| format!("Failed to read {}", args.input.display()))?;
        let normalized = normalize_trace_file(&trace, &options)?;
        serde_json::to_string_pretty(&normalized)?
    };

    write_trace_file(&json, &output)?;
    println!("✓ Normalized trace written: {}", output.display());

    Ok(output)
}

fn is_log(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(LOG_EXTENSION)
}

fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("trace");
    input.with_file_name(format!("{}.normalized.json", stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("out/session.jsonl")),
            PathBuf::from("out/session.normalized.json")
        );
    }

    #[test]
    fn test_is_log() {
        assert!(is_log(Path::new("a.jsonl")));
        assert!(!is_log(Path::new("a.json")));
    }
}
