//! Recover command implementation.

use crate::commands::models::RecoverArgs;
use crate::event::encode_all;
use crate::sink::{recover_log, RecoveredLog};
use anyhow::{Context, Result};
use log::info;
use std::fs;

/// Execute the recover command
///
/// Prints a summary and optionally writes the recovered records, in wire
/// form, as a JSON array.
pub fn execute_recover(args: RecoverArgs) -> Result<RecoveredLog> {
    let recovered = recover_log(&args.log)
        .with_context(|| format!("Failed to read log {}", args.log.display()))?;

    println!("Recovered log: {}", args.log.display());
    println!("  Records: {}", recovered.records.len());
    println!("  Corrupt lines: {}", recovered.errors.len());
    for error in &recovered.errors {
        println!("    {}", error);
    }
    match &recovered.partial_tail {
        Some(tail) => println!("  Incomplete tail: {} bytes", tail.len()),
        None => println!("  Incomplete tail: none"),
    }

    if let Some(output) = &args.output {
        let records = encode_all(&recovered.records)?;
        let json = serde_json::to_string_pretty(&records)?;
        fs::write(output, json)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        info!("Recovered records written to {}", output.display());
    }

    Ok(recovered)
}
