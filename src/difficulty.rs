//! Difficulty tiers
//!
//! Data-driven balance table. The built-in table covers all four tiers; a
//! custom table loaded from JSON may omit tiers, in which case lookups fail
//! with `UnknownTier`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::DifficultyError;

/// Difficulty tier, ordered by ascending difficulty
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum Tier {
    Easy,
    #[default]
    Normal,
    Hard,
    Extreme,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Easy, Tier::Normal, Tier::Hard, Tier::Extreme];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Easy => "Easy",
            Tier::Normal => "Normal",
            Tier::Hard => "Hard",
            Tier::Extreme => "Extreme",
        }
    }

    /// Parse a tier label (case-insensitive)
    pub fn parse(s: &str) -> Result<Self, DifficultyError> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Tier::Easy),
            "normal" => Ok(Tier::Normal),
            "hard" => Ok(Tier::Hard),
            "extreme" => Ok(Tier::Extreme),
            _ => Err(DifficultyError::UnknownTier(s.to_string())),
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tunable parameters bundled by a tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierParams {
    /// Obstacle fall speed on level 1 (px/tick)
    pub fall_speed: f32,
    /// Level-1 spawn chance is 1 in this many ticks
    pub spawn_denominator: u32,
    pub score_multiplier: f64,
    /// Obstacles per level number in a level's quota
    pub quota_factor: u32,
    pub boss_max_health: i32,
}

impl TierParams {
    /// Fall speed for a level: 10% faster per level above the first
    pub fn obstacle_speed(&self, level: u32) -> f32 {
        self.fall_speed * (1.0 + (level.saturating_sub(1)) as f32 * 0.1)
    }

    /// Spawn denominator for a level: 2 tighter per level, floored at 5
    pub fn spawn_frequency(&self, level: u32) -> u32 {
        let reduction = level.saturating_sub(1).saturating_mul(2);
        self.spawn_denominator
            .saturating_sub(reduction)
            .max(MIN_SPAWN_FREQUENCY)
    }

    /// Number of ordinary obstacles scheduled for a level
    pub fn obstacle_quota(&self, level: u32) -> u32 {
        self.quota_factor.saturating_mul(level)
    }

    fn validate(&self) -> Result<(), &'static str> {
        if !self.fall_speed.is_finite() || self.fall_speed < 0.0 {
            return Err("fall_speed must be finite and non-negative");
        }
        if !self.score_multiplier.is_finite() || self.score_multiplier < 0.0 {
            return Err("score_multiplier must be finite and non-negative");
        }
        if self.spawn_denominator == 0 {
            return Err("spawn_denominator must be positive");
        }
        if self.quota_factor > u32::MAX / MAX_LEVEL {
            return Err("quota_factor overflows the level quota");
        }
        if self.boss_max_health <= 0 {
            return Err("boss_max_health must be positive");
        }
        Ok(())
    }
}

/// Mapping from tier to parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DifficultyTable {
    tiers: BTreeMap<Tier, TierParams>,
}

impl Default for DifficultyTable {
    fn default() -> Self {
        let tiers = [
            (Tier::Easy, TierParams {
                fall_speed: 3.0,
                spawn_denominator: 30,
                score_multiplier: 1.0,
                quota_factor: 10,
                boss_max_health: 2000,
            }),
            (Tier::Normal, TierParams {
                fall_speed: 4.0,
                spawn_denominator: 25,
                score_multiplier: 1.2,
                quota_factor: 15,
                boss_max_health: 5000,
            }),
            (Tier::Hard, TierParams {
                fall_speed: 5.0,
                spawn_denominator: 20,
                score_multiplier: 1.5,
                quota_factor: 25,
                boss_max_health: 10000,
            }),
            (Tier::Extreme, TierParams {
                fall_speed: 7.0,
                spawn_denominator: 15,
                score_multiplier: 2.0,
                quota_factor: 50,
                boss_max_health: 40000,
            }),
        ];
        Self {
            tiers: tiers.into_iter().collect(),
        }
    }
}

impl DifficultyTable {
    /// Parse a custom table, e.g. `{"Easy": {...}, "Hard": {...}}`
    pub fn from_json(json: &str) -> Result<Self, DifficultyError> {
        let table: Self = serde_json::from_str(json)
            .map_err(|e| DifficultyError::MalformedTable(e.to_string()))?;
        for (tier, params) in &table.tiers {
            params
                .validate()
                .map_err(|problem| DifficultyError::MalformedTable(format!("{tier}: {problem}")))?;
        }
        Ok(table)
    }

    /// Look up the parameters for a tier
    pub fn parameters(&self, tier: Tier) -> Result<TierParams, DifficultyError> {
        self.tiers
            .get(&tier)
            .copied()
            .ok_or_else(|| DifficultyError::UnknownTier(tier.as_str().to_string()))
    }

    /// Tiers present in this table, easiest first
    pub fn tiers(&self) -> impl Iterator<Item = Tier> + '_ {
        self.tiers.keys().copied()
    }
}
