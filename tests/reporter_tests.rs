use memsnap_studio::grouping::{GroupRules, GroupTracker};
use memsnap_studio::parser::{SectionGrammar, Snapshot, StatKind};
use memsnap_studio::reporter::{aggregate, merge_summaries, GroupSummary, ReportOptions};
use pretty_assertions::assert_eq;

fn parse(name: &str, text: &str) -> Snapshot {
    Snapshot::parse(name, text, &SectionGrammar::standard(), 0).unwrap()
}

fn find<'a>(summaries: &'a [GroupSummary], name: &str) -> &'a GroupSummary {
    summaries
        .iter()
        .find(|s| s.name == name)
        .unwrap_or_else(|| panic!("no summary named '{name}'"))
}

const OBJ_DUMP: &str = "\
Obj List: -all
Class Count NumKB MaxKB ResKB
StaticMesh 10 100 100 50
";

#[test]
fn test_rule_group_accumulates_across_two_snapshots() {
    let snapshots = vec![parse("a.txt", OBJ_DUMP), parse("b.txt", OBJ_DUMP)];

    let rules = GroupRules::parse("[Group] Meshes\nStaticMesh\nSkeletalMesh\n");
    let mut tracker = GroupTracker::from_rules(&rules, snapshots.len());
    let report = aggregate(&snapshots, &mut tracker, &ReportOptions::default());

    let meshes = find(&report.summaries, "Meshes");
    assert_eq!(meshes.samples, vec![150.0, 150.0]);
    assert_eq!(meshes.distribution.min, 150.0);
    assert_eq!(meshes.distribution.max, 150.0);
    assert_eq!(report.files, vec!["a.txt", "b.txt"]);
}

#[test]
fn test_series_totals_cover_all_object_groups() {
    let text = "\
Obj List: -all
Class Count NumKB MaxKB ResKB
StaticMesh 10 100 100 50
Texture2D 5 40 60 20
";
    let snapshots = vec![parse("a.txt", text)];
    let mut tracker = GroupTracker::from_rules(&GroupRules::default(), 1);
    let report = aggregate(&snapshots, &mut tracker, &ReportOptions::default());

    // 150 + 80, every group auto-created at default priority
    let all = find(&report.summaries, "SumOfAllObjects");
    assert_eq!(all.samples, vec![230.0]);

    // default priority is > 0, so the "other buckets" subtotal matches
    let other = find(&report.summaries, "SumOfOtherBuckets");
    assert_eq!(other.samples, vec![230.0]);
}

#[test]
fn test_ignored_groups_stay_out_of_interesting_totals() {
    let text = "\
Obj List: -all
Class Count NumKB MaxKB ResKB
StaticMesh 10 100 100 50
DebugDraw 1 30 30 0
";
    let snapshots = vec![parse("a.txt", text)];
    let rules = GroupRules::parse("[Group] Debug?IgnoreSize\nDebugDraw\n");
    let mut tracker = GroupTracker::from_rules(&rules, 1);
    let report = aggregate(&snapshots, &mut tracker, &ReportOptions::default());

    assert_eq!(find(&report.summaries, "SumOfAllObjects").samples, vec![180.0]);
    assert_eq!(
        find(&report.summaries, "SumOfAllObjects_ExceptIgnores").samples,
        vec![150.0]
    );
}

#[test]
fn test_group_with_no_data_is_excluded() {
    let snapshots = vec![parse("a.txt", OBJ_DUMP)];

    // Ghosts has a member class the snapshots never mention
    let rules = GroupRules::parse("[Group] Ghosts?Important\nGhostClass\n");
    let mut tracker = GroupTracker::from_rules(&rules, 1);
    let report = aggregate(&snapshots, &mut tracker, &ReportOptions::default());

    assert!(report.summaries.iter().all(|s| s.name != "Ghosts"));
}

#[test]
fn test_min_size_filter_spares_unfilterable_groups() {
    let text = "\
Obj List: -all
Class Count NumKB MaxKB ResKB
StaticMesh 10 100 100 50
Pebble 1 1 1 0
";
    let snapshots = vec![parse("a.txt", text)];
    let mut tracker = GroupTracker::from_rules(&GroupRules::default(), 1);
    let options = ReportOptions {
        min_size_kb: Some(100.0),
    };
    let report = aggregate(&snapshots, &mut tracker, &options);

    assert!(report.summaries.iter().any(|s| s.name == "StaticMesh"));
    assert!(report.summaries.iter().all(|s| s.name != "Pebble"));
    // meta totals are not size-filterable and survive
    assert!(report.summaries.iter().any(|s| s.name == "SumOfAllObjects"));
}

#[test]
fn test_elapsed_time_series_from_capture_times() {
    let first = "\
Log file open, 04/05/13 14:30:00

Obj List: -all
Class Count NumKB MaxKB ResKB
StaticMesh 10 100 100 50
";
    let second = "\
Log file open, 04/05/13 14:31:30

Obj List: -all
Class Count NumKB MaxKB ResKB
StaticMesh 10 100 100 50
";
    let snapshots = vec![parse("a.txt", first), parse("b.txt", second)];
    let mut tracker = GroupTracker::from_rules(&GroupRules::default(), 2);
    let report = aggregate(&snapshots, &mut tracker, &ReportOptions::default());

    let elapsed = find(&report.summaries, "ElapsedTime");
    assert_eq!(elapsed.samples, vec![0.0, 90.0]);
}

#[test]
fn test_key_value_records_inherit_priority_and_stat() {
    let text = "\
DmQueryTitleMemoryStatistics
TitleFreeKB = 32768
";
    let snapshots = vec![parse("a.txt", text)];
    let mut tracker = GroupTracker::from_rules(&GroupRules::default(), 1);
    let report = aggregate(&snapshots, &mut tracker, &ReportOptions::default());

    let free = find(&report.summaries, "MemStats TitleFreeKB");
    assert_eq!(free.priority, 0);
    assert_eq!(free.overview_stat, StatKind::Min);
    assert_eq!(free.samples, vec![32768.0]);
}

#[test]
fn test_pool_meta_series_per_bucket() {
    let text = "\
Memory pool stats
Kind ElementSize BlockSize NumBlocks CurAllocs
Normal 16 65536 2 5000
";
    let snapshots = vec![parse("a.txt", text)];
    let mut tracker = GroupTracker::from_rules(&GroupRules::default(), 1);
    let report = aggregate(&snapshots, &mut tracker, &ReportOptions::default());

    // used = 5000 * 16 / 1024 KB, total = 2 * 65536 / 1024 KB
    assert_eq!(find(&report.summaries, "Pool Normal 16 UsedKB").samples, vec![78.125]);
    assert_eq!(find(&report.summaries, "Pool Normal 16 TotalKB").samples, vec![128.0]);
    assert_eq!(
        find(&report.summaries, "Pool Normal 16 UnusedKB").samples,
        vec![128.0 - 78.125]
    );
}

#[test]
fn test_loaded_levels_and_capture_locations_collected() {
    let text = "\
Level Streaming:
Level city_block_01 - LOADED
Level city_block_02 - UNLOADED

BugItGo 1.0 2.0 3.0 0 0 0
";
    let snapshots = vec![parse("a.txt", text), parse("b.txt", OBJ_DUMP)];
    let mut tracker = GroupTracker::from_rules(&GroupRules::default(), 2);
    let report = aggregate(&snapshots, &mut tracker, &ReportOptions::default());

    assert_eq!(report.loaded_levels[0], vec!["city_block_01"]);
    assert!(report.loaded_levels[1].is_empty());
    assert_eq!(
        report.capture_locations[0].as_deref(),
        Some("BugItGo 1.0 2.0 3.0 0 0 0")
    );
    assert_eq!(report.capture_locations[1], None);
}

#[test]
fn test_merge_recombines_sample_sets() {
    let snapshots_a = vec![parse("a.txt", OBJ_DUMP)];
    let snapshots_b = vec![parse("b.txt", "\
Obj List: -all
Class Count NumKB MaxKB ResKB
StaticMesh 10 200 300 0
")];

    let mut tracker_a = GroupTracker::from_rules(&GroupRules::default(), 1);
    let run_a = aggregate(&snapshots_a, &mut tracker_a, &ReportOptions::default());
    let mut tracker_b = GroupTracker::from_rules(&GroupRules::default(), 1);
    let run_b = aggregate(&snapshots_b, &mut tracker_b, &ReportOptions::default());

    let merged = merge_summaries(&[run_a.summaries, run_b.summaries]);
    let mesh = find(&merged, "StaticMesh");

    assert_eq!(mesh.distribution.sample_count(), 2);
    assert_eq!(mesh.distribution.min, 150.0);
    assert_eq!(mesh.distribution.max, 300.0);
    // exact mean over the union of samples
    assert_eq!(mesh.distribution.average, 225.0);
}
