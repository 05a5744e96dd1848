//! Recast command implementation.
//!
//! Parses the snapshot batch, extracts every observed pool histogram,
//! runs each candidate layout from the TOML file against the series,
//! and writes the waste comparison report.

use anyhow::{bail, Context, Result};
use log::info;
use std::path::PathBuf;

use memsnap_studio::output::write_recast_report;
use memsnap_studio::parser::{parse_batch, SectionGrammar};
use memsnap_studio::simulator::{load_layouts, run_experiments};

use super::report::read_inputs;

/// Arguments for the recast command
#[derive(Debug, Clone)]
pub struct RecastArgs {
    /// Snapshot log files, in series order
    pub logs: Vec<PathBuf>,

    /// TOML file of candidate layouts
    pub layouts: PathBuf,

    /// Output path for the JSON comparison report
    pub output: PathBuf,
}

/// Execute the recast command
pub fn execute_recast(args: RecastArgs) -> Result<()> {
    if args.logs.is_empty() {
        bail!("No snapshot logs given");
    }

    let candidates = load_layouts(&args.layouts)
        .with_context(|| format!("Failed to load layouts from {}", args.layouts.display()))?;
    if candidates.is_empty() {
        bail!("Layout file {} defines no layouts", args.layouts.display());
    }

    let inputs = read_inputs(&args.logs);
    let grammar = SectionGrammar::standard();
    let snapshots = parse_batch(&inputs, &grammar, 0, None);

    let observed: Vec<_> = snapshots
        .iter()
        .filter_map(|s| s.pool_stats())
        .map(|p| p.pools.clone())
        .collect();
    if observed.is_empty() {
        bail!("No snapshot carries a pool histogram");
    }

    info!(
        "Running {} candidate layouts against {} snapshots",
        candidates.len(),
        observed.len()
    );
    let report = run_experiments(&observed, &candidates);

    write_recast_report(&report, &args.output)
        .with_context(|| format!("Failed to write report to {}", args.output.display()))?;

    println!(
        "Recast report written to {} ({} experiments, {} failures)",
        args.output.display(),
        report.results.len(),
        report.failures.len()
    );

    Ok(())
}
