//! Allocator bucket simulation.
//!
//! An observed pool histogram (from a real snapshot) can be "recast"
//! onto a candidate bucket-size layout to evaluate allocator tuning
//! alternatives: every observed allocation is moved into the smallest
//! candidate bucket that fits it, and the used-vs-wasted byte totals of
//! the result are compared against the baseline.

mod layout;
mod recast;

// Public API exports
pub use layout::{load_layouts, CandidateLayout, LayoutConfig, LayoutSpec, PoolSpec};
pub use recast::{run_experiments, ExperimentFailure, ExperimentResult, RecastReport};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the recast experiment itself
#[derive(Error, Debug)]
pub enum RecastError {
    #[error("No bucket in layout '{layout}' covers element size {element_size}")]
    NoCoveringBucket { layout: String, element_size: u64 },

    #[error("Bucket with element size {element_size} larger than its block size {block_size}")]
    ElementLargerThanBlock { element_size: u64, block_size: u64 },
}

/// Errors loading candidate layout configuration
#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Layout TOML parse error: {0}")]
    ParseFailed(#[from] toml::de::Error),

    #[error("Layout '{0}' defines no pools")]
    EmptyLayout(String),
}

/// One fixed-size allocation bucket and its observed occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolBucket {
    /// Bytes per backing block
    pub block_size: u64,

    /// Bytes per element slot
    pub element_size: u64,

    /// Blocks currently committed
    pub num_blocks: u64,

    /// Live allocations in this bucket
    pub current_allocations: u64,
}

impl PoolBucket {
    /// Element slots one block holds (floor division)
    pub fn slots_per_block(&self) -> u64 {
        if self.element_size == 0 {
            0
        } else {
            self.block_size / self.element_size
        }
    }

    /// Bytes actually serving allocations
    pub fn used_bytes(&self) -> u64 {
        self.current_allocations * self.element_size
    }

    /// Bytes committed by this bucket's blocks
    pub fn committed_bytes(&self) -> u64 {
        self.num_blocks * self.block_size
    }
}

/// Used-vs-wasted accounting for a pool or pool set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolUsage {
    /// Bytes serving live allocations
    pub good_bytes: u64,

    /// Committed bytes not serving allocations
    pub wasted_bytes: u64,
}

impl PoolUsage {
    /// Total committed bytes: good + wasted, exact for integer pools
    pub fn committed_bytes(&self) -> u64 {
        self.good_bytes + self.wasted_bytes
    }
}

/// A named allocator configuration: buckets strictly ascending by
/// element size, plus the observed (or simulated) occupancy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoolSet {
    /// Pool kind, e.g. Normal / WriteCombine / Virtual
    pub kind_name: String,

    /// Buckets ascending by element size
    pub buckets: Vec<PoolBucket>,
}

impl PoolSet {
    /// Total live allocations across all buckets
    pub fn total_allocations(&self) -> u64 {
        self.buckets.iter().map(|b| b.current_allocations).sum()
    }

    /// Index of the smallest bucket whose element size covers `size`
    fn covering_bucket(&self, size: u64) -> Option<usize> {
        // buckets are ascending by element_size
        let index = self.buckets.partition_point(|b| b.element_size < size);
        (index < self.buckets.len()).then_some(index)
    }

    /// Recast an observed histogram onto this layout.
    ///
    /// Every source bucket's allocations move into the smallest bucket
    /// here with `element_size >= source.element_size`; block counts are
    /// then recomputed from the resulting occupancy. The source and this
    /// layout are left untouched, so one layout can be replayed against
    /// every snapshot in a series.
    ///
    /// # Errors
    /// * `RecastError::NoCoveringBucket` - a source allocation is too
    ///   large for any bucket in this layout; fatal for this experiment
    ///   run only
    pub fn recast(&self, source: &PoolSet) -> Result<PoolSet, RecastError> {
        let mut result = PoolSet {
            kind_name: self.kind_name.clone(),
            buckets: self
                .buckets
                .iter()
                .map(|b| PoolBucket {
                    num_blocks: 0,
                    current_allocations: 0,
                    ..*b
                })
                .collect(),
        };

        for bucket in &result.buckets {
            if bucket.slots_per_block() == 0 {
                return Err(RecastError::ElementLargerThanBlock {
                    element_size: bucket.element_size,
                    block_size: bucket.block_size,
                });
            }
        }

        for source_bucket in &source.buckets {
            let index = result.covering_bucket(source_bucket.element_size).ok_or(
                RecastError::NoCoveringBucket {
                    layout: self.kind_name.clone(),
                    element_size: source_bucket.element_size,
                },
            )?;
            result.buckets[index].current_allocations += source_bucket.current_allocations;
        }

        for bucket in &mut result.buckets {
            bucket.num_blocks = bucket.current_allocations.div_ceil(bucket.slots_per_block());
        }

        Ok(result)
    }

    /// Used-vs-wasted byte accounting for this pool's occupancy.
    ///
    /// `good` is the bytes serving allocations at each bucket's element
    /// size; `wasted` is everything else the committed blocks hold, so
    /// `good + wasted` equals the committed total exactly.
    pub fn calculate(&self) -> PoolUsage {
        let good_bytes: u64 = self.buckets.iter().map(PoolBucket::used_bytes).sum();
        let committed: u64 = self.buckets.iter().map(PoolBucket::committed_bytes).sum();

        PoolUsage {
            good_bytes,
            wasted_bytes: committed.saturating_sub(good_bytes),
        }
    }
}
