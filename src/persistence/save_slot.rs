//! Single-slot suspend/resume snapshot
//!
//! Holds at most one deep copy of a session, tagged with the profile that
//! owns it. Restoring does not consume the snapshot.

use serde::{Deserialize, Serialize};

use crate::error::ResumeError;
use crate::sim::{SessionPhase, SessionState};

/// A captured session and its owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSession {
    pub profile: String,
    pub session: SessionState,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveSlot {
    saved: Option<SavedSession>,
}

impl SaveSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a copy of `session` for `profile`, replacing any previous
    /// snapshot. Only running or paused sessions can be captured.
    pub fn capture(&mut self, session: &SessionState, profile: &str) -> Result<(), ResumeError> {
        match session.phase {
            SessionPhase::Active | SessionPhase::Paused => {}
            other => return Err(ResumeError::NotCapturable(other.as_str())),
        }
        log::info!(
            "Saved level {} session for profile {profile:?}",
            session.level
        );
        self.saved = Some(SavedSession {
            profile: profile.to_string(),
            session: session.clone(),
        });
        Ok(())
    }

    /// Rebuild the captured session for `profile`. The restored session is
    /// `Active`; the snapshot stays in the slot.
    pub fn restore(&self, profile: &str) -> Result<SessionState, ResumeError> {
        match &self.saved {
            Some(saved) if saved.profile == profile => {
                let mut session = saved.session.clone();
                session.phase = SessionPhase::Active;
                Ok(session)
            }
            _ => Err(ResumeError::InvalidResume(profile.to_string())),
        }
    }

    /// Whether `profile` has a session to resume
    pub fn matches(&self, profile: &str) -> bool {
        self.owner() == Some(profile)
    }

    pub fn owner(&self) -> Option<&str> {
        self.saved.as_ref().map(|s| s.profile.as_str())
    }

    /// Follow a profile rename
    pub fn retag(&mut self, old: &str, new: &str) {
        if let Some(saved) = self.saved.as_mut().filter(|s| s.profile == old) {
            saved.profile = new.to_string();
        }
    }

    /// Drop the snapshot if `profile` owns it
    pub fn discard_for(&mut self, profile: &str) {
        if self.matches(profile) {
            self.saved = None;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.saved.is_none()
    }
}
