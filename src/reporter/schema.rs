//! Report schema produced by the aggregation engine.
//!
//! These structures are what the external report writer consumes; CSV
//! and chart formatting happen outside this crate. Sample arrays keep
//! the invalid sentinel in unwritten slots so per-file columns stay
//! aligned with the file index table.

use serde::{Deserialize, Serialize};

use super::distribution::Distribution;
use crate::parser::{SampleUnit, StatKind};

/// One reportable group: its metadata plus the computed distribution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSummary {
    /// Group name (unique within a report)
    pub name: String,

    /// Presentation priority; lower sorts first
    pub priority: i32,

    pub sample_unit: SampleUnit,

    /// Which statistic represents this group in overview rows
    pub overview_stat: StatKind,

    /// The overview statistic's value, precomputed for filters
    pub overview_value: f64,

    pub excluded_from_summary: bool,
    pub ignored_in_totals: bool,

    /// Per-snapshot samples in batch order, sentinel where unwritten
    pub samples: Vec<f64>,

    /// Statistics over the valid samples
    pub distribution: Distribution,
}

/// Complete aggregation output for one batch of snapshots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationReport {
    /// Schema version for compatibility checking
    pub version: String,

    /// Timestamp when the report was generated
    pub generated_at: String,

    /// File-index-to-filename mapping table
    pub files: Vec<String>,

    /// Filtered, sorted group summaries
    pub summaries: Vec<GroupSummary>,

    /// Loaded level names per snapshot, in batch order
    pub loaded_levels: Vec<Vec<String>>,

    /// Capture-coordinate command per snapshot, where present
    pub capture_locations: Vec<Option<String>>,

    /// Reference bar for the system memory chart, from the rule file
    pub system_mem_bar_kb: i32,

    /// Reference bar color, r/g/b
    pub system_mem_bar_color: (u8, u8, u8),
}
