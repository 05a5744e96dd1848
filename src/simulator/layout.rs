//! Candidate layout configuration.
//!
//! Layouts to evaluate are described in a TOML file:
//!
//! ```toml
//! [[layout]]
//! name = "wider-small-buckets"
//!
//! [[layout.pool]]
//! kind = "Normal"
//! block_size = 65536
//! element_sizes = [16, 32, 48, 64, 96, 128]
//! ```

use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::{LayoutError, PoolBucket, PoolSet};

/// Complete layout configuration file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LayoutConfig {
    /// Candidate layouts to evaluate
    #[serde(default)]
    pub layout: Vec<LayoutSpec>,
}

/// One named candidate layout
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LayoutSpec {
    /// Layout name, used in the comparison report
    pub name: String,

    /// Pool configurations, one per pool kind
    #[serde(default)]
    pub pool: Vec<PoolSpec>,
}

/// Bucket sizes for one pool kind
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PoolSpec {
    /// Pool kind this applies to (Normal / WriteCombine / Virtual)
    pub kind: String,

    /// Bytes per backing block, shared by every bucket
    pub block_size: u64,

    /// Element sizes, one bucket each
    pub element_sizes: Vec<u64>,
}

/// A candidate layout ready to run: empty pool sets per kind
#[derive(Debug, Clone)]
pub struct CandidateLayout {
    pub name: String,
    pub pools: Vec<PoolSet>,
}

impl LayoutSpec {
    /// Build the empty pool sets this spec describes, buckets sorted
    /// ascending by element size
    pub fn to_candidate(&self) -> CandidateLayout {
        let pools = self
            .pool
            .iter()
            .map(|spec| {
                let mut element_sizes = spec.element_sizes.clone();
                element_sizes.sort_unstable();
                element_sizes.dedup();

                PoolSet {
                    kind_name: spec.kind.clone(),
                    buckets: element_sizes
                        .into_iter()
                        .map(|element_size| PoolBucket {
                            block_size: spec.block_size,
                            element_size,
                            num_blocks: 0,
                            current_allocations: 0,
                        })
                        .collect(),
                }
            })
            .collect();

        CandidateLayout {
            name: self.name.clone(),
            pools,
        }
    }
}

impl CandidateLayout {
    /// Pool set for a kind, if this layout configures one
    pub fn pool_for(&self, kind_name: &str) -> Option<&PoolSet> {
        self.pools.iter().find(|p| p.kind_name == kind_name)
    }
}

/// Load candidate layouts from a TOML file
///
/// # Errors
/// * `LayoutError::IoError` - file cannot be read
/// * `LayoutError::ParseFailed` - TOML is invalid
/// * `LayoutError::EmptyLayout` - a layout defines no pools
pub fn load_layouts(path: impl AsRef<Path>) -> Result<Vec<CandidateLayout>, LayoutError> {
    let contents = fs::read_to_string(path)?;
    let config: LayoutConfig = toml::from_str(&contents)?;

    let mut candidates = Vec::with_capacity(config.layout.len());
    for spec in &config.layout {
        if spec.pool.is_empty() {
            return Err(LayoutError::EmptyLayout(spec.name.clone()));
        }
        debug!("Loaded layout '{}' with {} pools", spec.name, spec.pool.len());
        candidates.push(spec.to_candidate());
    }

    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_buckets_sorted_and_deduped() {
        let spec = LayoutSpec {
            name: "test".to_string(),
            pool: vec![PoolSpec {
                kind: "Normal".to_string(),
                block_size: 65536,
                element_sizes: vec![64, 16, 32, 16],
            }],
        };

        let candidate = spec.to_candidate();
        let sizes: Vec<u64> = candidate.pools[0]
            .buckets
            .iter()
            .map(|b| b.element_size)
            .collect();
        assert_eq!(sizes, vec![16, 32, 64]);
    }
}
