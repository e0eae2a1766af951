//! Profile roster and unlock watermark
//!
//! Up to five named profiles, most recently used first, plus one
//! `max_unlocked_level` shared by every profile. Every mutation is applied to
//! a copy, written to disk, and only then committed in memory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{read_optional, write_atomic};
use crate::consts::*;
use crate::error::{CorruptProgressFile, ProfileError};
use crate::highscores::ScoreHistory;

/// One roster entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    #[serde(default)]
    pub scores: ScoreHistory,
}

impl Profile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scores: ScoreHistory::new(),
        }
    }
}

fn first_level() -> u32 {
    1
}

/// On-disk progress document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    #[serde(default)]
    pub users: Vec<Profile>,
    #[serde(default = "first_level")]
    pub max_unlocked_level: u32,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            users: Vec::new(),
            max_unlocked_level: first_level(),
        }
    }
}

impl Progress {
    /// Decode a progress document. An out-of-range watermark is clamped into
    /// `1..=MAX_LEVEL` and the roster is kept.
    pub fn decode(json: &str) -> Result<Self, CorruptProgressFile> {
        let mut progress: Progress = serde_json::from_str(json)?;
        let watermark = progress.max_unlocked_level.clamp(1, MAX_LEVEL);
        if watermark != progress.max_unlocked_level {
            log::warn!(
                "max_unlocked_level {} out of range, using {watermark}",
                progress.max_unlocked_level
            );
            progress.max_unlocked_level = watermark;
        }
        progress.users.truncate(MAX_PROFILES);
        Ok(progress)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.users.iter().position(|u| u.name == name)
    }
}

/// Process-wide profile store
#[derive(Debug, Clone)]
pub struct ProgressStore {
    /// Backing file; `None` keeps everything in memory
    path: Option<PathBuf>,
    progress: Progress,
    /// Active profile name (process state, not persisted)
    active: Option<String>,
}

impl ProgressStore {
    /// Store that never touches disk
    pub fn in_memory() -> Self {
        Self {
            path: None,
            progress: Progress::default(),
            active: None,
        }
    }

    /// Load from `path`. A missing, unreadable or corrupt file yields an empty
    /// roster; the next mutation overwrites it.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let progress = match read_optional(&path) {
            Ok(Some(json)) => match Progress::decode(&json) {
                Ok(progress) => {
                    log::info!(
                        "Loaded {} profiles (unlocked up to level {}) from {}",
                        progress.users.len(),
                        progress.max_unlocked_level,
                        path.display()
                    );
                    progress
                }
                Err(e) => {
                    log::warn!("{e} at {}, starting with an empty roster", path.display());
                    Progress::default()
                }
            },
            Ok(None) => {
                log::info!("No progress file at {}, starting fresh", path.display());
                Progress::default()
            }
            Err(e) => {
                log::warn!("Failed to read {}: {e}, starting fresh", path.display());
                Progress::default()
            }
        };
        let active = progress.users.first().map(|u| u.name.clone());
        Self {
            path: Some(path),
            progress,
            active,
        }
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    /// Roster, most recently used first
    pub fn profiles(&self) -> &[Profile] {
        &self.progress.users
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active_profile(&self) -> Option<&Profile> {
        let name = self.active.as_deref()?;
        self.progress.users.iter().find(|u| u.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.progress.position(name).is_some()
    }

    pub fn max_unlocked_level(&self) -> u32 {
        self.progress.max_unlocked_level
    }

    pub fn is_unlocked(&self, level: u32) -> bool {
        crate::is_valid_level(level) && level <= self.progress.max_unlocked_level
    }

    /// Persist `next`, then make it current
    fn commit(&mut self, next: Progress) -> Result<(), ProfileError> {
        if let Some(path) = &self.path {
            let bytes = serde_json::to_vec_pretty(&next)?;
            write_atomic(path, &bytes)?;
            log::debug!("Progress saved to {}", path.display());
        }
        self.progress = next;
        Ok(())
    }

    /// Add a profile at the roster head and make it active. The oldest entry
    /// beyond the cap is evicted.
    pub fn create_profile(&mut self, name: &str) -> Result<(), ProfileError> {
        if name.trim().is_empty() || self.contains(name) {
            return Err(ProfileError::DuplicateName(name.to_string()));
        }

        let mut next = self.progress.clone();
        next.users.insert(0, Profile::new(name));
        for evicted in next.users.drain(MAX_PROFILES.min(next.users.len())..) {
            log::info!("Roster full, evicting profile {:?}", evicted.name);
        }
        self.commit(next)?;

        log::info!("Created profile {name:?}");
        self.active = Some(name.to_string());
        Ok(())
    }

    /// Rename a profile in place (roster order unchanged)
    pub fn rename_profile(&mut self, old: &str, new: &str) -> Result<(), ProfileError> {
        let Some(index) = self.progress.position(old) else {
            return Err(ProfileError::NotFound(old.to_string()));
        };
        if old == new {
            return Ok(());
        }
        if new.trim().is_empty() || self.contains(new) {
            return Err(ProfileError::DuplicateName(new.to_string()));
        }

        let mut next = self.progress.clone();
        next.users[index].name = new.to_string();
        self.commit(next)?;

        log::info!("Renamed profile {old:?} to {new:?}");
        if self.active.as_deref() == Some(old) {
            self.active = Some(new.to_string());
        }
        Ok(())
    }

    /// Remove a profile. Returns the active profile afterwards: unchanged if
    /// another profile was active, else the new roster head, or `None` when the
    /// roster is empty.
    pub fn delete_profile(&mut self, name: &str) -> Result<Option<&str>, ProfileError> {
        let Some(index) = self.progress.position(name) else {
            return Err(ProfileError::NotFound(name.to_string()));
        };

        let mut next = self.progress.clone();
        next.users.remove(index);
        self.commit(next)?;

        log::info!("Deleted profile {name:?}");
        if self.active.as_deref() == Some(name) {
            self.active = self.progress.users.first().map(|u| u.name.clone());
        }
        Ok(self.active.as_deref())
    }

    /// Make a profile active and move it to the roster head
    pub fn select_profile(&mut self, name: &str) -> Result<(), ProfileError> {
        let Some(index) = self.progress.position(name) else {
            return Err(ProfileError::NotFound(name.to_string()));
        };

        if index != 0 {
            let mut next = self.progress.clone();
            let profile = next.users.remove(index);
            next.users.insert(0, profile);
            self.commit(next)?;
        }
        self.active = Some(name.to_string());
        Ok(())
    }

    /// Raise the shared watermark when the highest unlocked level is cleared.
    /// Returns true if the watermark moved.
    pub fn record_level_cleared(&mut self, level: u32) -> Result<bool, ProfileError> {
        let watermark = self.progress.max_unlocked_level;
        if level != watermark || level >= MAX_LEVEL {
            return Ok(false);
        }

        let mut next = self.progress.clone();
        next.max_unlocked_level = level + 1;
        self.commit(next)?;

        log::info!("Unlocked level {}", level + 1);
        Ok(true)
    }

    /// Record a cleared level's score for the active profile. Returns true if
    /// it set a new best.
    pub fn record_score(&mut self, level: u32, score: f64) -> Result<bool, ProfileError> {
        let Some(index) = self.active.as_deref().and_then(|a| self.progress.position(a)) else {
            return Ok(false);
        };
        if !self.progress.users[index].scores.qualifies(level, score) {
            return Ok(false);
        }

        let mut next = self.progress.clone();
        next.users[index].scores.record(level, score);
        self.commit(next)?;
        Ok(true)
    }
}
