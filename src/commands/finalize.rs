//! Finalize command implementation.
//!
//! Turns a log left behind by a session into a trace file.

use crate::commands::models::FinalizeArgs;
use crate::sink::{log_exists, materialize};
use crate::utils::config::{load_config, EmptyTracePolicy, SinkConfig};
use anyhow::{bail, Context, Result};
use log::info;
use std::path::PathBuf;

/// Execute the finalize command
///
/// Returns the written trace file, or `None` when the log was empty and the
/// empty-trace policy skipped it.
pub fn execute_finalize(args: FinalizeArgs) -> Result<Option<PathBuf>> {
    let config = resolve_config(&args)?;

    if !log_exists(&config) {
        bail!("No trace log at {}", config.log_path().display());
    }

    info!("Finalizing {}", config.log_path().display());

    let written = materialize(&config)
        .with_context(|| format!("Failed to finalize {}", config.log_path().display()))?;

    match &written {
        Some(path) => println!("✓ Trace file written: {}", path.display()),
        None => println!("Log is empty, no trace file written"),
    }

    Ok(written)
}

fn resolve_config(args: &FinalizeArgs) -> Result<SinkConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SinkConfig::new(&args.directory, &args.name),
    };

    // Command-line values win over the file
    config.directory = args.directory.clone();
    config.name = args.name.clone();
    if let Some(margin_ms) = args.margin_ms {
        config.builder.margin_ms = margin_ms;
    }
    if args.emit_empty {
        config.empty_trace = EmptyTracePolicy::EmitBoundaries;
    }

    Ok(config)
}
