//! Aggregation engine: drives a batch of snapshots through the group
//! tracker and produces the report.
//!
//! One pass per snapshot populates sample arrays from every section
//! kind; a second pass over the populated groups synthesizes the
//! whole-series totals; the summary pass sorts, filters, and attaches
//! distributions.

use chrono::Utc;
use log::{debug, info};
use std::collections::HashMap;

use super::distribution::Distribution;
use super::schema::{AggregationReport, GroupSummary};
use crate::grouping::GroupTracker;
use crate::parser::{SampleUnit, Snapshot};
use crate::utils::config::{IMPORTANT_PRIORITY, INVALID_SAMPLE, SCHEMA_VERSION};

/// Names of the synthesized whole-series totals
pub const SUM_OF_ALL_OBJECTS: &str = "SumOfAllObjects";
pub const SUM_OF_ALL_OBJECTS_EXCEPT_IGNORES: &str = "SumOfAllObjects_ExceptIgnores";
pub const SUM_OF_OTHER_BUCKETS: &str = "SumOfOtherBuckets";
pub const SUM_OF_OTHER_BUCKETS_EXCEPT_IGNORES: &str = "SumOfOtherBuckets_ExceptIgnores";

const ELAPSED_TIME_GROUP: &str = "ElapsedTime";
const REDUCE_POOL_GROUP: &str = "ReducePoolSizeKB";

/// Report-shaping options
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    /// Exclude size-filterable groups whose overview statistic falls
    /// below this many KB
    pub min_size_kb: Option<f64>,
}

/// Aggregate an ordered batch of snapshots.
///
/// The tracker must be sized to the batch (`from_rules(rules,
/// snapshots.len())`); each snapshot writes its own disjoint sample
/// index.
pub fn aggregate(
    snapshots: &[Snapshot],
    tracker: &mut GroupTracker,
    options: &ReportOptions,
) -> AggregationReport {
    let mut loaded_levels = Vec::with_capacity(snapshots.len());
    let mut capture_locations = Vec::with_capacity(snapshots.len());

    let first_capture_time = snapshots.iter().find_map(|s| s.capture_time);

    for (index, snapshot) in snapshots.iter().enumerate() {
        record_snapshot(tracker, snapshot, index, first_capture_time);

        loaded_levels.push(
            snapshot
                .level_streaming()
                .map(|l| l.loaded_level_names())
                .unwrap_or_default(),
        );
        capture_locations.push(snapshot.capture_location().map(|c| c.command.clone()));
    }

    build_series_totals(tracker);

    let summaries = build_summaries(tracker, options);
    info!(
        "Aggregated {} snapshots into {} groups, {} reported",
        snapshots.len(),
        tracker.len(),
        summaries.len()
    );

    AggregationReport {
        version: SCHEMA_VERSION.to_string(),
        generated_at: Utc::now().to_rfc3339(),
        files: snapshots.iter().map(|s| s.source_name.clone()).collect(),
        summaries,
        loaded_levels,
        capture_locations,
        system_mem_bar_kb: tracker.system_mem_bar_kb,
        system_mem_bar_color: tracker.system_mem_bar_color,
    }
}

/// Populate every group the given snapshot contributes to
fn record_snapshot(
    tracker: &mut GroupTracker,
    snapshot: &Snapshot,
    index: usize,
    first_capture_time: Option<chrono::NaiveDateTime>,
) {
    debug!("Recording '{}' at index {}", snapshot.source_name, index);

    // Elapsed seconds since the series start
    if let (Some(first), Some(current)) = (first_capture_time, snapshot.capture_time) {
        let group = tracker.create_meta_group(ELAPSED_TIME_GROUP);
        tracker.group_mut(group).sample_unit = SampleUnit::Seconds;
        tracker.group_mut(group).priority = IMPORTANT_PRIORITY;
        tracker.set_sample(group, index, (current - first).num_seconds() as f64);
    }

    // The correction folded into this snapshot's free-memory figures
    if snapshot.reduce_pool_size_kb != 0 {
        let group = tracker.create_meta_group(REDUCE_POOL_GROUP);
        tracker.set_sample(group, index, f64::from(snapshot.reduce_pool_size_kb));
    }

    // Object-list classes resolve through the rules, auto-creating
    // single-member groups for anything unmapped
    if let Some(objects) = snapshot.object_list() {
        for row in &objects.classes {
            tracker.register_size(&row.class_name, index, row.approx_total_kb);
        }
    }

    // Pool histogram: four synthesized series per bucket
    if let Some(pool_stats) = snapshot.pool_stats() {
        for pool in &pool_stats.pools {
            for bucket in &pool.buckets {
                let used_kb = bucket.used_bytes() as f64 / 1024.0;
                let total_kb = bucket.committed_bytes() as f64 / 1024.0;
                let unused_kb = (total_kb - used_kb).max(0.0);
                let pct_good = if total_kb > 0.0 {
                    (used_kb / total_kb) * 100.0
                } else {
                    0.0
                };

                let series = [
                    ("UsedKB", used_kb),
                    ("UnusedKB", unused_kb),
                    ("TotalKB", total_kb),
                    ("PctGood", pct_good),
                ];
                for (metric, value) in series {
                    let name =
                        format!("Pool {} {} {}", pool.kind_name, bucket.element_size, metric);
                    let group = tracker.create_meta_group(&name);
                    tracker.set_sample(group, index, value);
                }
            }
        }
    }

    // Key/value records from every key/value-kind section; priority and
    // overview stat are inherited from the record
    for section in &snapshot.sections {
        let Some(key_values) = section.key_value_entries() else {
            continue;
        };
        for (name, record) in &key_values.entries {
            let group = tracker.create_meta_group(name);
            {
                let group = tracker.group_mut(group);
                group.priority = record.priority;
                group.overview_stat = record.stat_kind;
                group.sample_unit = record.unit;
            }
            tracker.set_sample(group, index, record.value);
        }
    }
}

/// Synthesize the whole-series totals from the populated object groups.
///
/// Two total/subtotal pairs: everything, and everything except groups
/// flagged `ignored_in_totals`; each restricted once to priority > 0
/// ("other buckets" - what no Important group called out explicitly).
fn build_series_totals(tracker: &mut GroupTracker) {
    let num_samples = tracker.num_samples();
    let mut all = vec![INVALID_SAMPLE; num_samples];
    let mut except_ignores = vec![INVALID_SAMPLE; num_samples];
    let mut other = vec![INVALID_SAMPLE; num_samples];
    let mut other_except_ignores = vec![INVALID_SAMPLE; num_samples];

    let add_to = |total: &mut Vec<f64>, index: usize, value: f64| {
        if total[index] == INVALID_SAMPLE {
            total[index] = 0.0;
        }
        total[index] += value;
    };

    for group in tracker.groups().iter().filter(|g| g.tracks_objects) {
        for (index, sample) in group.samples.iter().enumerate() {
            if *sample == INVALID_SAMPLE {
                continue;
            }
            add_to(&mut all, index, *sample);
            if !group.ignored_in_totals {
                add_to(&mut except_ignores, index, *sample);
            }
            if group.priority > IMPORTANT_PRIORITY {
                add_to(&mut other, index, *sample);
                if !group.ignored_in_totals {
                    add_to(&mut other_except_ignores, index, *sample);
                }
            }
        }
    }

    let totals = [
        (SUM_OF_ALL_OBJECTS, all),
        (SUM_OF_ALL_OBJECTS_EXCEPT_IGNORES, except_ignores),
        (SUM_OF_OTHER_BUCKETS, other),
        (SUM_OF_OTHER_BUCKETS_EXCEPT_IGNORES, other_except_ignores),
    ];
    for (name, samples) in totals {
        let group = tracker.create_meta_group(name);
        tracker.group_mut(group).priority = IMPORTANT_PRIORITY;
        for (index, value) in samples.into_iter().enumerate() {
            if value != INVALID_SAMPLE {
                tracker.set_sample(group, index, value);
            }
        }
    }
}

/// Sort, filter, and summarize every reportable group
fn build_summaries(tracker: &GroupTracker, options: &ReportOptions) -> Vec<GroupSummary> {
    let mut summaries = Vec::new();

    for index in tracker.sorted_indices() {
        let group = tracker.group(index);
        if group.excluded_from_standard_report {
            continue;
        }

        let distribution = Distribution::from_samples(&group.samples);

        // All-sentinel means no data: excluded regardless of flags
        if !distribution.has_data() {
            continue;
        }

        let overview_value = distribution.value_for(group.overview_stat);
        if let Some(threshold) = options.min_size_kb {
            if group.filterable_by_size && overview_value < threshold {
                continue;
            }
        }

        summaries.push(GroupSummary {
            name: group.name.clone(),
            priority: group.priority,
            sample_unit: group.sample_unit,
            overview_stat: group.overview_stat,
            overview_value,
            excluded_from_summary: group.excluded_from_summary,
            ignored_in_totals: group.ignored_in_totals,
            samples: group.samples.clone(),
            distribution,
        });
    }

    summaries
}

/// Merge multiple runs' summaries into one global series, keyed by
/// group name.
///
/// Sample sets are recombined and the distribution recomputed from the
/// union; metadata comes from the first run that mentions a group. The
/// result is re-sorted by (priority, name).
pub fn merge_summaries(runs: &[Vec<GroupSummary>]) -> Vec<GroupSummary> {
    let mut order: Vec<String> = Vec::new();
    let mut merged: HashMap<String, GroupSummary> = HashMap::new();

    for run in runs {
        for summary in run {
            match merged.get_mut(&summary.name) {
                Some(existing) => {
                    existing.samples.extend_from_slice(&summary.samples);
                    existing.distribution = existing.distribution.merge(&summary.distribution);
                    existing.overview_value =
                        existing.distribution.value_for(existing.overview_stat);
                }
                None => {
                    order.push(summary.name.clone());
                    merged.insert(summary.name.clone(), summary.clone());
                }
            }
        }
    }

    let mut result: Vec<GroupSummary> = order
        .into_iter()
        .filter_map(|name| merged.remove(&name))
        .collect();
    result.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(&b.name)));
    result
}
