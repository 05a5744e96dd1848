//! Cross-snapshot statistical distributions.
//!
//! A distribution is derived from a group's sample array, never stored
//! independently of it: merging two distributions recombines the
//! underlying sample sets rather than averaging the summary statistics,
//! which keeps directory-level merges exact.

use serde::{Deserialize, Serialize};

use crate::parser::StatKind;
use crate::utils::config::INVALID_SAMPLE;

/// Summary statistics over the valid samples of a series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    /// The valid (non-sentinel) samples, retained for merging
    samples: Vec<f64>,

    pub min: f64,
    pub max: f64,
    pub average: f64,
    pub median: f64,
    pub std_dev: f64,
}

impl Default for Distribution {
    fn default() -> Self {
        Self::from_samples(&[])
    }
}

impl Distribution {
    /// Compute a distribution, skipping sentinel slots entirely.
    ///
    /// With no valid samples, min and max are the sentinel and the
    /// distribution reports no data.
    pub fn from_samples(samples: &[f64]) -> Self {
        let valid: Vec<f64> = samples
            .iter()
            .copied()
            .filter(|s| *s != INVALID_SAMPLE)
            .collect();

        if valid.is_empty() {
            return Self {
                samples: valid,
                min: INVALID_SAMPLE,
                max: INVALID_SAMPLE,
                average: 0.0,
                median: 0.0,
                std_dev: 0.0,
            };
        }

        let count = valid.len() as f64;
        let min = valid.iter().copied().fold(f64::INFINITY, f64::min);
        let max = valid.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let average = valid.iter().sum::<f64>() / count;

        let mut sorted = valid.clone();
        sorted.sort_by(f64::total_cmp);
        let median = sorted[sorted.len() / 2];

        let std_dev = if valid.len() > 1 {
            let variance = valid
                .iter()
                .map(|s| (s - average).powi(2))
                .sum::<f64>()
                / (count - 1.0);
            variance.sqrt()
        } else {
            0.0
        };

        Self {
            samples: valid,
            min,
            max,
            average,
            median,
            std_dev,
        }
    }

    /// Whether any valid sample was recorded
    pub fn has_data(&self) -> bool {
        !self.samples.is_empty()
    }

    /// Number of valid samples
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// The statistic chosen to represent this distribution in summaries
    pub fn value_for(&self, stat: StatKind) -> f64 {
        match stat {
            StatKind::Min => self.min,
            StatKind::Max => self.max,
            StatKind::Average => self.average,
            StatKind::Median => self.median,
        }
    }

    /// Merge by recombining the underlying sample sets.
    ///
    /// Used when combining multiple directory-level runs into a global
    /// summary; statistics are recomputed from the union, never averaged.
    pub fn merge(&self, other: &Distribution) -> Distribution {
        let mut combined = self.samples.clone();
        combined.extend_from_slice(&other.samples);
        Distribution::from_samples(&combined)
    }
}
