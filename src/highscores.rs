//! Per-profile score history
//!
//! Best score reached on each cleared level. Stored inside the profile's
//! `scores` object in the progress file, keyed by level number.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Best cleared score per level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct ScoreHistory {
    best: BTreeMap<u32, f64>,
}

impl ScoreHistory {
    /// Create empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a score would improve the record for `level`
    pub fn qualifies(&self, level: u32, score: f64) -> bool {
        if score <= 0.0 {
            return false;
        }
        self.best.get(&level).is_none_or(|&best| score > best)
    }

    /// Record a cleared level. Returns true if it set a new best.
    pub fn record(&mut self, level: u32, score: f64) -> bool {
        if !self.qualifies(level, score) {
            return false;
        }
        self.best.insert(level, score);
        true
    }

    /// Best score on a level, if it was ever cleared with points
    pub fn best_for(&self, level: u32) -> Option<f64> {
        self.best.get(&level).copied()
    }

    /// Sum of per-level bests
    pub fn total(&self) -> f64 {
        self.best.values().sum()
    }

    /// Highest level with a recorded score
    pub fn highest_level(&self) -> Option<u32> {
        self.best.keys().next_back().copied()
    }

    /// Check if nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.best.is_empty()
    }
}
