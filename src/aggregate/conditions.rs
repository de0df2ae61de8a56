//! Counting pooled spike events per epoch condition.

use crate::data::{Condition, SpikeCounts, LIGHT_COLUMN, REWARD_COLUMN};
use crate::error::{Result, SpikeError};

/// The three boolean epoch marker columns of a recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpochMarkers {
    trial: Vec<bool>,
    reward: Vec<bool>,
    light: Vec<bool>,
}

impl EpochMarkers {
    /// Create from three marker columns of equal length.
    pub fn new(trial: Vec<bool>, reward: Vec<bool>, light: Vec<bool>) -> Result<Self> {
        for (name, column) in [(REWARD_COLUMN, &reward), (LIGHT_COLUMN, &light)] {
            if column.len() != trial.len() {
                return Err(SpikeError::DimensionMismatch {
                    column: name.to_string(),
                    expected: trial.len(),
                    actual: column.len(),
                });
            }
        }
        Ok(Self {
            trial,
            reward,
            light,
        })
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.trial.len()
    }

    /// Check if there are no samples.
    pub fn is_empty(&self) -> bool {
        self.trial.is_empty()
    }

    /// Per-sample mask of where a condition holds.
    pub fn mask(&self, condition: Condition) -> Vec<bool> {
        (0..self.len())
            .map(|i| condition.is_active(self.trial[i], self.reward[i], self.light[i]))
            .collect()
    }

    /// Sample indices where a condition holds, ascending.
    pub fn active_positions(&self, condition: Condition) -> Vec<usize> {
        (0..self.len())
            .filter(|&i| condition.is_active(self.trial[i], self.reward[i], self.light[i]))
            .collect()
    }
}

/// Count pooled spike indices falling inside each condition's active samples.
///
/// `spike_indices` is the concatenation of every neuron's spike indices.
/// Repeated indices are counted once per occurrence, so two neurons firing
/// on the same sample add two. Indices outside the recording are ignored.
pub fn count_by_condition(epochs: &EpochMarkers, spike_indices: &[usize]) -> SpikeCounts {
    SpikeCounts::from_fn(|condition| {
        let mask = epochs.mask(condition);
        spike_indices
            .iter()
            .filter(|&&idx| mask.get(idx).copied().unwrap_or(false))
            .count() as u64
    })
}
