//! DevTools Trace CLI
//!
//! Finalizes, recovers and normalizes trace logs written by a
//! `TraceFileSink`.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use devtools_trace_sink::commands::{
    execute_finalize, execute_normalize, execute_recover, FinalizeArgs, NormalizeArgs,
    RecoverArgs,
};

/// DevTools Trace - crash-safe trace logs for profiler events
#[derive(Parser, Debug)]
#[command(name = "devtools-trace")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Materialize a trace log into a trace file
    Finalize {
        /// Directory holding the log
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Session name (log file is <NAME>.jsonl)
        #[arg(short, long)]
        name: String,

        /// TOML sink configuration
        #[arg(short, long, env = "DEVTOOLS_TRACE_CONFIG")]
        config: Option<PathBuf>,

        /// Padding offset in milliseconds (0 disables padding)
        #[arg(long)]
        margin_ms: Option<u64>,

        /// Write a boundary-only trace file when the log is empty
        #[arg(long)]
        emit_empty: bool,
    },

    /// Recover events from a possibly damaged log
    Recover {
        /// Log file to read
        #[arg(short, long)]
        log: PathBuf,

        /// Write recovered records to this JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Rewrite a trace into deterministic form for snapshots
    Normalize {
        /// Trace file (.json) or log (.jsonl)
        #[arg(short, long)]
        input: PathBuf,

        /// Output path (defaults to <input>.normalized.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Timestamp, in microseconds, the earliest event maps to
        #[arg(long)]
        base_ts: Option<u64>,
    },
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Finalize {
            dir,
            name,
            config,
            margin_ms,
            emit_empty,
        } => {
            execute_finalize(FinalizeArgs {
                directory: dir,
                name,
                config,
                margin_ms,
                emit_empty,
            })?;
        }

        Commands::Recover { log, output } => {
            let recovered = execute_recover(RecoverArgs { log, output })?;
            if !recovered.errors.is_empty() {
                std::process::exit(2);
            }
        }

        Commands::Normalize {
            input,
            output,
            base_ts,
        } => {
            execute_normalize(NormalizeArgs {
                input,
                output,
                base_timestamp_us: base_ts,
            })?;
        }
    }

    Ok(())
}
