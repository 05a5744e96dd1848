//! User-configurable grouping of raw class and key names.
//!
//! A rule file maps class names into named, prioritized groups; names
//! no rule covers resolve to auto-created single-member groups. The
//! tracker owns one fixed-width sample array per group, one slot per
//! snapshot in the active series.

pub mod rules;
pub mod tracker;

// Re-export main types
pub use rules::{GroupRule, GroupRules};
pub use tracker::{Group, GroupTracker};
