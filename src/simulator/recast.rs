//! Recast experiment driver.
//!
//! Runs each candidate layout against every observed snapshot's pool
//! histogram and accumulates a waste distribution per (layout, pool
//! kind) for comparison against the baseline (the observed layout
//! itself). A recast failure kills that experiment only; the others
//! continue.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{CandidateLayout, PoolSet};
use crate::reporter::Distribution;

/// Name given to the observed layout in the comparison report
pub const BASELINE_LAYOUT: &str = "observed";

/// Waste accounting for one (layout, pool kind) pair across the series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentResult {
    pub layout_name: String,
    pub kind_name: String,

    /// Wasted KB per snapshot, in batch order
    pub wasted_kb_per_snapshot: Vec<f64>,

    /// Distribution over the per-snapshot wasted KB
    pub waste: Distribution,
}

/// A layout that could not be evaluated for a pool kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentFailure {
    pub layout_name: String,
    pub kind_name: String,
    pub reason: String,
}

/// Full comparison report across layouts and pool kinds
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecastReport {
    pub results: Vec<ExperimentResult>,
    pub failures: Vec<ExperimentFailure>,
}

impl RecastReport {
    /// Result for a (layout, kind) pair, if that experiment succeeded
    pub fn result_for(&self, layout_name: &str, kind_name: &str) -> Option<&ExperimentResult> {
        self.results
            .iter()
            .find(|r| r.layout_name == layout_name && r.kind_name == kind_name)
    }
}

/// Run every candidate layout against every observed snapshot histogram.
///
/// `observed` is one Vec of pool sets per snapshot, in batch order. The
/// baseline entry is the observed layout's own waste, included so
/// candidates have something to beat.
pub fn run_experiments(observed: &[Vec<PoolSet>], candidates: &[CandidateLayout]) -> RecastReport {
    let mut report = RecastReport::default();

    let kinds: BTreeSet<&str> = observed
        .iter()
        .flatten()
        .map(|p| p.kind_name.as_str())
        .collect();

    for &kind in &kinds {
        // Baseline: the observed pools as captured
        let baseline: Vec<f64> = pools_of_kind(observed, kind)
            .map(|pool| wasted_kb(pool.calculate().wasted_bytes))
            .collect();
        report.results.push(ExperimentResult {
            layout_name: BASELINE_LAYOUT.to_string(),
            kind_name: kind.to_string(),
            waste: Distribution::from_samples(&baseline),
            wasted_kb_per_snapshot: baseline,
        });

        for candidate in candidates {
            let Some(layout_pool) = candidate.pool_for(kind) else {
                continue;
            };

            let mut samples = Vec::new();
            let mut failed = None;
            for pool in pools_of_kind(observed, kind) {
                match layout_pool.recast(pool) {
                    Ok(recast) => samples.push(wasted_kb(recast.calculate().wasted_bytes)),
                    Err(err) => {
                        failed = Some(err.to_string());
                        break;
                    }
                }
            }

            match failed {
                Some(reason) => {
                    warn!("Layout '{}' failed for kind '{}': {}", candidate.name, kind, reason);
                    report.failures.push(ExperimentFailure {
                        layout_name: candidate.name.clone(),
                        kind_name: kind.to_string(),
                        reason,
                    });
                }
                None => {
                    info!(
                        "Layout '{}' / kind '{}': {} snapshots evaluated",
                        candidate.name,
                        kind,
                        samples.len()
                    );
                    report.results.push(ExperimentResult {
                        layout_name: candidate.name.clone(),
                        kind_name: kind.to_string(),
                        waste: Distribution::from_samples(&samples),
                        wasted_kb_per_snapshot: samples,
                    });
                }
            }
        }
    }

    report
}

fn pools_of_kind<'a>(
    observed: &'a [Vec<PoolSet>],
    kind: &'a str,
) -> impl Iterator<Item = &'a PoolSet> {
    observed
        .iter()
        .filter_map(move |pools| pools.iter().find(|p| p.kind_name == kind))
}

fn wasted_kb(bytes: u64) -> f64 {
    bytes as f64 / 1024.0
}
