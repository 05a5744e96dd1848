//! Report command implementation.
//!
//! The report command:
//! 1. Loads the grouping rules
//! 2. Reads and parses every snapshot log
//! 3. Aggregates the batch through the group tracker
//! 4. Writes the JSON report

use anyhow::{bail, Context, Result};
use log::{info, warn};
use std::path::PathBuf;
use std::time::Instant;

use memsnap_studio::grouping::{GroupRules, GroupTracker};
use memsnap_studio::output::write_report;
use memsnap_studio::parser::{parse_batch, BatchControl, SectionGrammar, SnapshotInput};
use memsnap_studio::reporter::{aggregate, ReportOptions};

/// Arguments for the report command
#[derive(Debug, Clone)]
pub struct ReportArgs {
    /// Snapshot log files, in series order
    pub logs: Vec<PathBuf>,

    /// Grouping rule file (optional; everything auto-groups without it)
    pub groups: Option<PathBuf>,

    /// Output path for the JSON report
    pub output: PathBuf,

    /// Minimum overview size in KB for filterable groups
    pub min_size_kb: Option<f64>,

    /// Pool-size correction folded into the free-memory figures, in KB
    pub reduce_pool_size_kb: i32,
}

/// Validate report arguments before doing any work
pub fn validate_report_args(args: &ReportArgs) -> Result<()> {
    if args.logs.is_empty() {
        bail!("No snapshot logs given");
    }
    for log in &args.logs {
        if !log.exists() {
            bail!("Snapshot log not found: {}", log.display());
        }
    }
    Ok(())
}

/// Execute the report command
pub fn execute_report(args: ReportArgs) -> Result<()> {
    let start_time = Instant::now();

    info!("Aggregating {} snapshot logs", args.logs.len());

    // Step 1: Grouping rules (absent file degrades to auto-groups only)
    let rules = match &args.groups {
        Some(path) => GroupRules::load(path),
        None => GroupRules::default(),
    };

    // Step 2: Read and parse the batch
    let inputs = read_inputs(&args.logs);
    let grammar = SectionGrammar::standard();
    let snapshots = parse_batch(
        &inputs,
        &grammar,
        args.reduce_pool_size_kb,
        Some(&|percent, status| {
            info!("[{:>5.1}%] {}", percent, status);
            BatchControl::Continue
        }),
    );
    if snapshots.is_empty() {
        bail!("No snapshot parsed successfully");
    }

    // Step 3: Aggregate
    let mut tracker = GroupTracker::from_rules(&rules, snapshots.len());
    let options = ReportOptions {
        min_size_kb: args.min_size_kb,
    };
    let report = aggregate(&snapshots, &mut tracker, &options);

    // Step 4: Write output
    write_report(&report, &args.output)
        .with_context(|| format!("Failed to write report to {}", args.output.display()))?;

    println!(
        "Report written to {} ({} groups, {} files, {:.2}s)",
        args.output.display(),
        report.summaries.len(),
        report.files.len(),
        start_time.elapsed().as_secs_f64()
    );

    Ok(())
}

/// Read every log file, skipping unreadable ones with a diagnostic
pub fn read_inputs(logs: &[PathBuf]) -> Vec<SnapshotInput> {
    logs.iter()
        .filter_map(|path| match std::fs::read_to_string(path) {
            Ok(text) => Some(SnapshotInput {
                name: path.display().to_string(),
                text,
            }),
            Err(err) => {
                warn!("Cannot read {}: {}", path.display(), err);
                None
            }
        })
        .collect()
}
