//! Cross-snapshot diffing and aggregation.
//!
//! Drives a batch of parsed snapshots through the grouping tracker,
//! synthesizes the derived meta-series, and produces per-group
//! statistical summaries the external report writer renders.

pub mod distribution;
pub mod engine;
pub mod schema;

// Re-export main types and functions
pub use distribution::Distribution;
pub use engine::{aggregate, merge_summaries, ReportOptions};
pub use schema::{AggregationReport, GroupSummary};
