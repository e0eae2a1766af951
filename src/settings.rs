//! Game settings and preferences
//!
//! Persisted separately from player progress.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::difficulty::Tier;
use crate::persistence::{read_optional, write_atomic};

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Difficulty used for new sessions
    #[serde(default)]
    pub difficulty: Tier,
    /// Fixed master seed for replayable runs; `None` seeds from the clock
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

impl Settings {
    /// Load settings from `path`, falling back to defaults
    pub fn load(path: &Path) -> Self {
        match read_optional(path) {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    log::warn!("Ignoring malformed settings at {}: {e}", path.display());
                    Self::default()
                }
            },
            Ok(None) => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("Failed to read settings at {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Save settings to `path`
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_vec_pretty(self)?;
        write_atomic(path, &json)?;
        log::info!("Settings saved");
        Ok(())
    }
}
