//! Error types for the game core
//!
//! Profile and resume failures are recoverable and surface as rejected
//! commands at the controller boundary. Simulation invariant violations are
//! not represented here; they panic.

use thiserror::Error;

use crate::controller::View;

/// Difficulty lookup failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DifficultyError {
    #[error("unknown difficulty tier: {0:?}")]
    UnknownTier(String),
    #[error("malformed difficulty table: {0}")]
    MalformedTable(String),
}

/// Profile roster failures
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile name {0:?} is empty or already in use")]
    DuplicateName(String),
    #[error("no profile named {0:?}")]
    NotFound(String),
    #[error("failed to write progress file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode progress file: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Progress file could not be decoded. Never fatal: the store falls back to an
/// empty roster.
#[derive(Debug, Error)]
#[error("corrupt progress file: {0}")]
pub struct CorruptProgressFile(#[from] pub serde_json::Error);

/// Save slot failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResumeError {
    #[error("no saved session for profile {0:?}")]
    InvalidResume(String),
    #[error("session cannot be captured while it is {0}")]
    NotCapturable(&'static str),
}

/// A command rejected by the controller. The controller state is unchanged.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Resume(#[from] ResumeError),
    #[error(transparent)]
    Difficulty(#[from] DifficultyError),
    #[error("level {level} is locked (unlocked up to {unlocked})")]
    LevelLocked { level: u32, unlocked: u32 },
    #[error("{command} is not available in the {view:?} view")]
    InvalidTransition { command: &'static str, view: View },
    #[error("no active profile")]
    NoProfile,
}
