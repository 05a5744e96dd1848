use memsnap_studio::simulator::{
    load_layouts, run_experiments, PoolBucket, PoolSet, RecastError,
};
use pretty_assertions::assert_eq;
use std::io::Write;

fn bucket(element_size: u64, block_size: u64, num_blocks: u64, allocs: u64) -> PoolBucket {
    PoolBucket {
        block_size,
        element_size,
        num_blocks,
        current_allocations: allocs,
    }
}

fn observed_normal() -> PoolSet {
    PoolSet {
        kind_name: "Normal".to_string(),
        buckets: vec![
            bucket(16, 65536, 2, 5000),
            bucket(48, 65536, 3, 2000),
            bucket(128, 65536, 1, 300),
        ],
    }
}

const LAYOUT_TOML: &str = r#"
[[layout]]
name = "wider-small-buckets"

[[layout.pool]]
kind = "Normal"
block_size = 65536
element_sizes = [32, 64, 128]

[[layout]]
name = "tiny-only"

[[layout.pool]]
kind = "Normal"
block_size = 65536
element_sizes = [16, 32]
"#;

#[test]
fn test_layouts_load_from_toml() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{LAYOUT_TOML}").unwrap();

    let layouts = load_layouts(file.path()).unwrap();
    assert_eq!(layouts.len(), 2);
    assert_eq!(layouts[0].name, "wider-small-buckets");

    let pool = layouts[0].pool_for("Normal").unwrap();
    let sizes: Vec<u64> = pool.buckets.iter().map(|b| b.element_size).collect();
    assert_eq!(sizes, vec![32, 64, 128]);
}

#[test]
fn test_layout_parse_failure_is_an_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "[[layout]\nname = broken").unwrap();
    assert!(load_layouts(file.path()).is_err());
}

#[test]
fn test_recast_moves_every_allocation_upward() {
    let candidate = PoolSet {
        kind_name: "Normal".to_string(),
        buckets: vec![bucket(32, 65536, 0, 0), bucket(64, 65536, 0, 0), bucket(128, 65536, 0, 0)],
    };
    let observed = observed_normal();

    let recast = candidate.recast(&observed).unwrap();
    assert_eq!(recast.total_allocations(), observed.total_allocations());
    assert_eq!(recast.buckets[0].current_allocations, 5000); // 16 -> 32
    assert_eq!(recast.buckets[1].current_allocations, 2000); // 48 -> 64
    assert_eq!(recast.buckets[2].current_allocations, 300); // 128 -> 128
}

#[test]
fn test_recast_accounting_identity_holds() {
    let candidate = PoolSet {
        kind_name: "Normal".to_string(),
        buckets: vec![bucket(32, 65536, 0, 0), bucket(64, 65536, 0, 0), bucket(128, 65536, 0, 0)],
    };
    let recast = candidate.recast(&observed_normal()).unwrap();

    let usage = recast.calculate();
    let committed: u64 = recast
        .buckets
        .iter()
        .map(|b| b.num_blocks * b.block_size)
        .sum();
    assert_eq!(usage.good_bytes + usage.wasted_bytes, committed);
}

#[test]
fn test_recast_without_covering_bucket_fails() {
    let candidate = PoolSet {
        kind_name: "Normal".to_string(),
        buckets: vec![bucket(16, 65536, 0, 0), bucket(32, 65536, 0, 0)],
    };

    let err = candidate.recast(&observed_normal()).unwrap_err();
    assert!(matches!(
        err,
        RecastError::NoCoveringBucket {
            element_size: 48,
            ..
        }
    ));
}

#[test]
fn test_experiments_isolate_failures_per_layout() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{LAYOUT_TOML}").unwrap();
    let layouts = load_layouts(file.path()).unwrap();

    let observed = vec![vec![observed_normal()], vec![observed_normal()]];
    let report = run_experiments(&observed, &layouts);

    // baseline + the covering candidate succeed
    assert!(report.result_for("observed", "Normal").is_some());
    let wider = report.result_for("wider-small-buckets", "Normal").unwrap();
    assert_eq!(wider.wasted_kb_per_snapshot.len(), 2);
    assert_eq!(wider.waste.sample_count(), 2);

    // "tiny-only" cannot hold the 48- and 128-byte allocations
    assert!(report.result_for("tiny-only", "Normal").is_none());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].layout_name, "tiny-only");
}

#[test]
fn test_baseline_waste_matches_direct_calculation() {
    let observed = vec![vec![observed_normal()]];
    let report = run_experiments(&observed, &[]);

    let baseline = report.result_for("observed", "Normal").unwrap();
    let direct = observed_normal().calculate();
    assert_eq!(
        baseline.wasted_kb_per_snapshot[0],
        direct.wasted_bytes as f64 / 1024.0
    );
}
