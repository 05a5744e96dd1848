//! Memsnap Studio CLI
//!
//! Diffs a series of engine memory-snapshot logs into per-group
//! statistics and evaluates allocator bucket layouts against the
//! observed allocation histograms.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

mod commands;

use commands::{execute_recast, execute_report, validate_report_args, RecastArgs, ReportArgs};
use memsnap_studio::output::read_report;
use memsnap_studio::utils::config::SCHEMA_VERSION;

/// Memsnap Studio - memory snapshot diffing for engine log dumps
#[derive(Parser, Debug)]
#[command(name = "memsnap")]
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
    /// Aggregate a series of snapshot logs into a group report
    Report {
        /// Snapshot log files, in series order
        #[arg(required = true)]
        logs: Vec<PathBuf>,

        /// Grouping rule file
        #[arg(short, long)]
        groups: Option<PathBuf>,

        /// Output path for the JSON report
        #[arg(short, long, default_value = "report.json")]
        output: PathBuf,

        /// Exclude filterable groups below this size in KB
        #[arg(long)]
        min_size: Option<f64>,

        /// Pool-size correction folded into free-memory figures, in KB
        #[arg(long, default_value = "0")]
        reduce_pool_kb: i32,
    },

    /// Evaluate candidate allocator layouts against observed histograms
    Recast {
        /// Snapshot log files, in series order
        #[arg(required = true)]
        logs: Vec<PathBuf>,

        /// TOML file of candidate layouts
        #[arg(short, long)]
        layouts: PathBuf,

        /// Output path for the JSON comparison report
        #[arg(short, long, default_value = "recast.json")]
        output: PathBuf,
    },

    /// Validate a report JSON file
    Validate {
        /// Path to report JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Report {
            logs,
            groups,
            output,
            min_size,
            reduce_pool_kb,
        } => {
            let args = ReportArgs {
                logs,
                groups,
                output,
                min_size_kb: min_size,
                reduce_pool_size_kb: reduce_pool_kb,
            };
            validate_report_args(&args)?;
            execute_report(args)?;
        }

        Commands::Recast {
            logs,
            layouts,
            output,
        } => {
            execute_recast(RecastArgs {
                logs,
                layouts,
                output,
            })?;
        }

        Commands::Validate { file } => {
            validate_report_file(file)?;
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}

/// Validate a report JSON file
fn validate_report_file(file_path: PathBuf) -> Result<()> {
    println!("Validating report: {}", file_path.display());

    let report = read_report(&file_path)?;

    println!("Valid report JSON");
    println!("  Version: {}", report.version);
    println!("  Files: {}", report.files.len());
    println!("  Groups: {}", report.summaries.len());

    Ok(())
}

/// Display version information
fn display_version() {
    println!("Memsnap Studio v{}", env!("CARGO_PKG_VERSION"));
    println!("Report Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Memory snapshot diffing for engine log dumps.");
}
