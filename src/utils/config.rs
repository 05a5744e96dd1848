//! Configuration and constants for the snapshot engine.

/// Current output schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Sentinel marking a sample slot that was never written.
/// Statistics skip sentinel slots; a group whose every slot is the
/// sentinel carries no data and is excluded from reports.
pub const INVALID_SAMPLE: f64 = f64::MIN;

/// Priority assigned to groups without an explicit Priority tag,
/// including auto-created single-member groups. Must stay > 0 so these
/// groups land in the "other buckets" subtotals.
pub const DEFAULT_GROUP_PRIORITY: i32 = 1;

/// Priority of groups tagged `Important` and of headline meta-groups.
pub const IMPORTANT_PRIORITY: i32 = 0;

/// Optional per-line prefix emitted by some engine builds, stripped
/// before prefix matching.
pub const LOG_LINE_PREFIX: &str = "Log:";

// The filename timestamp fallback carries only -DD-HH.MM.SS, so the year
// and month are pinned. Legacy behavior, kept for sort stability.
pub const FALLBACK_EPOCH_YEAR: i32 = 2000;
pub const FALLBACK_EPOCH_MONTH: u32 = 1;

// Object-list column names vary across engine versions
pub const OBJ_CLASS_COLUMNS: &[&str] = &["Class", "Object", "ObjectName"];
pub const OBJ_COUNT_COLUMNS: &[&str] = &["Count", "Num", "NumObjects"];
pub const OBJ_NUM_KB_COLUMNS: &[&str] = &["NumKB", "NumKBytes"];
pub const OBJ_MAX_KB_COLUMNS: &[&str] = &["MaxKB", "MaxKBytes"];
pub const OBJ_RES_KB_COLUMNS: &[&str] = &["ResKB", "ResExcKB", "ResKBytes"];
