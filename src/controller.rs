//! Top-level game state machine
//!
//! Routes commands from the input/UI layer to the active session or the
//! profile store and decides view transitions. A rejected command returns an
//! error and leaves every piece of controller state as it was.

use std::path::{Path, PathBuf};

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::difficulty::{DifficultyTable, Tier};
use crate::error::{CommandError, DifficultyError};
use crate::persistence::{ProgressStore, SaveSlot};
use crate::settings::Settings;
use crate::sim::{Direction, GameEvent, SessionPhase, SessionState, TickInput, tick};
use crate::snapshot::{SessionSnapshot, Snapshot};

pub const PROGRESS_FILE: &str = "progress.json";
pub const SETTINGS_FILE: &str = "settings.json";

/// Current screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum View {
    /// No profile yet: name entry
    ProfileCreation,
    MainMenu,
    LevelSelect,
    Settings,
    Playing,
    Paused,
    /// A saved session exists for the active profile
    ContinuePrompt,
    AccountManagement,
}

/// Commands accepted from the input/UI layer
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Move(Direction),
    Fire,
    Pause,
    Resume,
    SelectLevel(u32),
    SetDifficulty(Tier),
    Reset,
    AdvanceLevel,
    ReturnToMenu,
    Play,
    OpenSettings,
    OpenAccounts,
    Back,
    Continue,
    DeclineContinue,
    CreateProfile(String),
    RenameProfile { old: String, new: String },
    DeleteProfile(String),
    SelectProfile(String),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Move(_) => "move",
            Command::Fire => "fire",
            Command::Pause => "pause",
            Command::Resume => "resume",
            Command::SelectLevel(_) => "select_level",
            Command::SetDifficulty(_) => "set_difficulty",
            Command::Reset => "reset",
            Command::AdvanceLevel => "advance_level",
            Command::ReturnToMenu => "return_to_menu",
            Command::Play => "play",
            Command::OpenSettings => "open_settings",
            Command::OpenAccounts => "open_accounts",
            Command::Back => "back",
            Command::Continue => "continue",
            Command::DeclineContinue => "decline_continue",
            Command::CreateProfile(_) => "create_profile",
            Command::RenameProfile { .. } => "rename_profile",
            Command::DeleteProfile(_) => "delete_profile",
            Command::SelectProfile(_) => "select_profile",
        }
    }
}

/// Everything the game core owns, passed explicitly instead of living in
/// globals
#[derive(Debug)]
pub struct GameContext {
    pub table: DifficultyTable,
    pub store: ProgressStore,
    pub settings: Settings,
    settings_path: Option<PathBuf>,
    /// Active playthrough, if any
    pub session: Option<SessionState>,
    pub save_slot: SaveSlot,
    /// Hands out a seed per session
    rng: Pcg32,
}

impl GameContext {
    /// Context with no settings file. `settings.rng_seed` overrides `seed`.
    pub fn new(table: DifficultyTable, store: ProgressStore, settings: Settings, seed: u64) -> Self {
        let seed = settings.rng_seed.unwrap_or(seed);
        Self {
            table,
            store,
            settings,
            settings_path: None,
            session: None,
            save_slot: SaveSlot::new(),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Load progress and settings from a data directory
    pub fn open(data_dir: &Path, seed: u64) -> Self {
        let settings_path = data_dir.join(SETTINGS_FILE);
        let settings = Settings::load(&settings_path);
        let store = ProgressStore::open(data_dir.join(PROGRESS_FILE));
        let mut ctx = Self::new(DifficultyTable::default(), store, settings, seed);
        ctx.settings_path = Some(settings_path);
        ctx
    }

    /// Replace the built-in difficulty table
    pub fn with_table(mut self, table: DifficultyTable) -> Self {
        self.table = table;
        self
    }

    /// Start a fresh session on `level` with the configured difficulty
    pub fn start_session(&mut self, level: u32) -> Result<(), DifficultyError> {
        let seed = self.rng.next_u64();
        let mut session = SessionState::new(level, self.settings.difficulty, &self.table, seed)?;
        session.reset_game(&self.table)?;
        log::info!(
            "Starting level {level} on {} (seed {seed:#x})",
            self.settings.difficulty
        );
        self.session = Some(session);
        Ok(())
    }

    fn save_settings(&self) {
        if let Some(path) = &self.settings_path {
            if let Err(e) = self.settings.save(path) {
                log::warn!("Failed to save settings to {}: {e}", path.display());
            }
        }
    }
}

/// View state machine over a `GameContext`
#[derive(Debug)]
pub struct GameController {
    ctx: GameContext,
    view: View,
    /// Held direction and pending fire request for the next frame
    input: TickInput,
}

impl GameController {
    pub fn new(ctx: GameContext) -> Self {
        let view = if ctx.store.active().is_some() {
            View::MainMenu
        } else {
            View::ProfileCreation
        };
        Self {
            ctx,
            view,
            input: TickInput::default(),
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn context(&self) -> &GameContext {
        &self.ctx
    }

    pub fn session(&self) -> Option<&SessionState> {
        self.ctx.session.as_ref()
    }

    /// Direct access for tools and tests
    pub fn session_mut(&mut self) -> Option<&mut SessionState> {
        self.ctx.session.as_mut()
    }

    fn active_profile(&self) -> Result<String, CommandError> {
        self.ctx
            .store
            .active()
            .map(str::to_string)
            .ok_or(CommandError::NoProfile)
    }

    /// Apply one command
    pub fn apply(&mut self, command: Command) -> Result<(), CommandError> {
        let result = self.dispatch(&command);
        if let Err(e) = &result {
            log::debug!("Rejected {}: {e}", command.name());
        }
        result
    }

    fn dispatch(&mut self, command: &Command) -> Result<(), CommandError> {
        let view = self.view;
        let reject = || CommandError::InvalidTransition {
            command: command.name(),
            view,
        };
        match (command, view) {
            (Command::Move(direction), View::Playing | View::Paused) => {
                self.input.direction = *direction;
            }
            (Command::Fire, View::Playing) => {
                self.input.fire = true;
            }

            (Command::Pause, View::Playing) => {
                let session = self.ctx.session.as_mut().ok_or_else(reject)?;
                if session.phase != SessionPhase::Active {
                    return Err(reject());
                }
                session.phase = SessionPhase::Paused;
                self.view = View::Paused;
            }
            (Command::Resume, View::Paused) => {
                if let Some(session) = self.ctx.session.as_mut() {
                    session.phase = SessionPhase::Active;
                }
                self.view = View::Playing;
            }

            (Command::SelectLevel(level), View::LevelSelect) => {
                let level = *level;
                if !self.ctx.store.is_unlocked(level) {
                    return Err(CommandError::LevelLocked {
                        level,
                        unlocked: self.ctx.store.max_unlocked_level(),
                    });
                }
                self.ctx.start_session(level)?;
                self.input = TickInput::default();
                self.view = View::Playing;
            }

            (Command::SetDifficulty(tier), View::Settings) => {
                self.ctx.table.parameters(*tier)?;
                self.ctx.settings.difficulty = *tier;
                log::info!("Difficulty set to {tier}");
                self.ctx.save_settings();
            }

            (Command::Reset, View::Playing | View::Paused) => {
                let session = self.ctx.session.as_mut().ok_or_else(reject)?;
                session.reset_game(&self.ctx.table)?;
                self.input = TickInput::default();
                self.view = View::Playing;
            }

            (Command::AdvanceLevel, View::Playing) => {
                let session = self.ctx.session.as_mut().ok_or_else(reject)?;
                if !session.cleared() || session.level >= MAX_LEVEL {
                    return Err(reject());
                }
                let mut next = session.clone();
                next.level += 1;
                next.reset_game(&self.ctx.table)?;
                log::info!("Advancing to level {}", next.level);
                *session = next;
                self.input = TickInput::default();
            }

            (Command::ReturnToMenu, View::Playing | View::Paused) => {
                if let (Some(session), Some(profile)) =
                    (self.ctx.session.take(), self.ctx.store.active())
                {
                    if matches!(session.phase, SessionPhase::Active | SessionPhase::Paused) {
                        self.ctx.save_slot.capture(&session, profile)?;
                    }
                }
                self.input = TickInput::default();
                self.view = View::MainMenu;
            }
            (
                Command::ReturnToMenu | Command::Back,
                View::LevelSelect | View::Settings | View::AccountManagement | View::ContinuePrompt,
            ) => {
                self.view = View::MainMenu;
            }

            (Command::Play, View::MainMenu) => {
                let profile = self.active_profile()?;
                self.view = if self.ctx.save_slot.matches(&profile) {
                    View::ContinuePrompt
                } else {
                    View::LevelSelect
                };
            }
            (Command::OpenSettings, View::MainMenu) => self.view = View::Settings,
            (Command::OpenAccounts, View::MainMenu) => self.view = View::AccountManagement,

            (Command::Continue, View::ContinuePrompt) => {
                let profile = self.active_profile()?;
                let session = self.ctx.save_slot.restore(&profile)?;
                log::info!("Resuming level {} for {profile:?}", session.level);
                self.ctx.session = Some(session);
                self.input = TickInput::default();
                self.view = View::Playing;
            }
            (Command::DeclineContinue, View::ContinuePrompt) => {
                self.view = View::LevelSelect;
            }

            (Command::CreateProfile(name), View::ProfileCreation | View::AccountManagement) => {
                self.ctx.store.create_profile(name)?;
                if self.view == View::ProfileCreation {
                    self.view = View::MainMenu;
                }
            }
            (Command::SelectProfile(name), View::ProfileCreation | View::AccountManagement) => {
                self.ctx.store.select_profile(name)?;
                if self.view == View::ProfileCreation {
                    self.view = View::MainMenu;
                }
            }
            (Command::RenameProfile { old, new }, View::AccountManagement) => {
                self.ctx.store.rename_profile(old, new)?;
                self.ctx.save_slot.retag(old, new);
            }
            (Command::DeleteProfile(name), View::AccountManagement) => {
                let remaining = self.ctx.store.delete_profile(name)?.is_some();
                self.ctx.save_slot.discard_for(name);
                if !remaining {
                    self.view = View::ProfileCreation;
                }
            }

            _ => return Err(reject()),
        }
        Ok(())
    }

    /// Advance the session by one tick if a level is being played. A level
    /// clear raises the unlock watermark and records the score.
    pub fn frame(&mut self) -> Vec<GameEvent> {
        if self.view != View::Playing {
            return Vec::new();
        }
        let Some(session) = self.ctx.session.as_mut() else {
            return Vec::new();
        };

        let events = tick(session, &self.input);
        self.input.fire = false;

        let (level, score) = (session.level, session.score);
        if events.contains(&GameEvent::LevelCleared { level }) {
            if let Err(e) = self.ctx.store.record_level_cleared(level) {
                log::warn!("Failed to record level {level} clear: {e}");
            }
            if let Err(e) = self.ctx.store.record_score(level, score) {
                log::warn!("Failed to record score for level {level}: {e}");
            }
        }
        events
    }

    /// Read-only view for rendering
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            view: self.view,
            profile: self.ctx.store.active().map(str::to_string),
            max_unlocked_level: self.ctx.store.max_unlocked_level(),
            difficulty: self.ctx.settings.difficulty.to_string(),
            session: self.ctx.session.as_ref().map(SessionSnapshot::of),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ProfileError, ResumeError};

    fn controller_with(names: &[&str]) -> GameController {
        let mut store = ProgressStore::in_memory();
        for name in names {
            store.create_profile(name).unwrap();
        }
        let ctx = GameContext::new(DifficultyTable::default(), store, Settings::default(), 1);
        GameController::new(ctx)
    }

    fn start_level(controller: &mut GameController, level: u32) {
        controller.apply(Command::Play).unwrap();
        controller.apply(Command::SelectLevel(level)).unwrap();
        assert_eq!(controller.view(), View::Playing);
    }

    #[test]
    fn test_initial_view_depends_on_roster() {
        assert_eq!(controller_with(&[]).view(), View::ProfileCreation);
        assert_eq!(controller_with(&["ann"]).view(), View::MainMenu);
    }

    #[test]
    fn test_profile_creation_flow() {
        let mut controller = controller_with(&[]);
        assert!(matches!(
            controller.apply(Command::CreateProfile(String::new())),
            Err(CommandError::Profile(ProfileError::DuplicateName(_)))
        ));
        assert_eq!(controller.view(), View::ProfileCreation);

        controller.apply(Command::CreateProfile("ann".into())).unwrap();
        assert_eq!(controller.view(), View::MainMenu);
        assert_eq!(controller.snapshot().profile.as_deref(), Some("ann"));
    }

    #[test]
    fn test_locked_levels_rejected() {
        let mut controller = controller_with(&["ann"]);
        controller.apply(Command::Play).unwrap();
        assert!(matches!(
            controller.apply(Command::SelectLevel(2)),
            Err(CommandError::LevelLocked { level: 2, unlocked: 1 })
        ));
        assert_eq!(controller.view(), View::LevelSelect);
        assert!(controller.session().is_none());
    }

    #[test]
    fn test_pause_resume() {
        let mut controller = controller_with(&["ann"]);
        start_level(&mut controller, 1);
        controller.frame();
        controller.apply(Command::Pause).unwrap();
        assert_eq!(controller.view(), View::Paused);

        let before = controller.session().unwrap().clone();
        assert!(controller.frame().is_empty());
        assert_eq!(controller.session().unwrap(), &before);
        assert!(controller.apply(Command::Fire).is_err());

        controller.apply(Command::Resume).unwrap();
        assert_eq!(controller.view(), View::Playing);
        controller.frame();
        assert_eq!(controller.session().unwrap().time_ticks, before.time_ticks + 1);
    }

    #[test]
    fn test_fire_is_one_shot() {
        let mut controller = controller_with(&["ann"]);
        start_level(&mut controller, 1);
        controller.apply(Command::Fire).unwrap();
        assert!(controller.frame().contains(&GameEvent::ShotFired));
        for _ in 0..20 {
            assert!(!controller.frame().contains(&GameEvent::ShotFired));
        }
    }

    #[test]
    fn test_move_is_held() {
        let mut controller = controller_with(&["ann"]);
        start_level(&mut controller, 1);
        controller.apply(Command::Move(Direction::Left)).unwrap();
        controller.frame();
        controller.frame();
        let snap = controller.snapshot();
        assert_eq!(snap.session.unwrap().player.pos.x, 400.0 - 2.0 * PLAYER_SPEED);
    }

    #[test]
    fn test_clear_unlocks_next_level_and_advances() {
        let mut controller = controller_with(&["ann"]);
        start_level(&mut controller, 1);
        assert!(controller.apply(Command::AdvanceLevel).is_err());

        {
            let session = controller.ctx.session.as_mut().unwrap();
            session.obstacles_generated = session.tuning.obstacles_target;
            session.score = 9.0;
        }
        let events = controller.frame();
        assert!(events.contains(&GameEvent::LevelCleared { level: 1 }));
        assert_eq!(controller.context().store.max_unlocked_level(), 2);
        let best = controller.context().store.active_profile().unwrap().scores.best_for(1);
        assert_eq!(best, Some(9.0));

        controller.apply(Command::AdvanceLevel).unwrap();
        let session = controller.session().unwrap();
        assert_eq!(session.level, 2);
        assert_eq!(session.phase, SessionPhase::Active);
        assert_eq!(session.tuning.obstacles_target, 30);
    }

    #[test]
    fn test_menu_from_pause_saves_and_continue_restores() {
        let mut controller = controller_with(&["ann"]);
        start_level(&mut controller, 1);
        for _ in 0..30 {
            controller.frame();
        }
        controller.apply(Command::Pause).unwrap();
        let saved = controller.session().unwrap().clone();
        controller.apply(Command::ReturnToMenu).unwrap();
        assert_eq!(controller.view(), View::MainMenu);
        assert!(controller.session().is_none());

        controller.apply(Command::Play).unwrap();
        assert_eq!(controller.view(), View::ContinuePrompt);
        controller.apply(Command::Continue).unwrap();
        assert_eq!(controller.view(), View::Playing);

        let restored = controller.session().unwrap();
        assert_eq!(restored.phase, SessionPhase::Active);
        assert_eq!(restored.time_ticks, saved.time_ticks);
        assert_eq!(restored.obstacles, saved.obstacles);
    }

    #[test]
    fn test_other_profile_cannot_resume() {
        let mut controller = controller_with(&["ann", "bob"]);
        start_level(&mut controller, 1);
        controller.apply(Command::ReturnToMenu).unwrap();

        controller.apply(Command::OpenAccounts).unwrap();
        controller.apply(Command::SelectProfile("ann".into())).unwrap();
        controller.apply(Command::Back).unwrap();
        controller.apply(Command::Play).unwrap();
        assert_eq!(controller.view(), View::LevelSelect);

        controller.view = View::ContinuePrompt;
        assert!(matches!(
            controller.apply(Command::Continue),
            Err(CommandError::Resume(ResumeError::InvalidResume(_)))
        ));
        assert_eq!(controller.view(), View::ContinuePrompt);
    }

    #[test]
    fn test_game_over_not_saved() {
        let mut controller = controller_with(&["ann"]);
        start_level(&mut controller, 1);
        controller.ctx.session.as_mut().unwrap().phase = SessionPhase::GameOver;
        assert!(controller.snapshot().session.unwrap().game_over);

        controller.apply(Command::ReturnToMenu).unwrap();
        assert!(controller.context().save_slot.is_empty());
    }

    #[test]
    fn test_retry_after_game_over() {
        let mut controller = controller_with(&["ann"]);
        start_level(&mut controller, 1);
        controller.ctx.session.as_mut().unwrap().phase = SessionPhase::GameOver;
        controller.apply(Command::Reset).unwrap();
        let session = controller.session().unwrap();
        assert_eq!(session.phase, SessionPhase::Active);
        assert_eq!(session.player.immunity, IMMUNITY_CHARGES);
    }

    #[test]
    fn test_set_difficulty_applies_to_next_session() {
        let mut controller = controller_with(&["ann"]);
        assert!(controller.apply(Command::SetDifficulty(Tier::Hard)).is_err());
        controller.apply(Command::OpenSettings).unwrap();
        controller.apply(Command::SetDifficulty(Tier::Hard)).unwrap();
        controller.apply(Command::Back).unwrap();
        start_level(&mut controller, 1);
        let snap = controller.snapshot();
        assert_eq!(snap.difficulty, "Hard");
        assert_eq!(snap.session.unwrap().obstacles_target, 25);
    }

    #[test]
    fn test_set_difficulty_rejects_tier_missing_from_table() {
        let table = DifficultyTable::from_json(
            r#"{"Easy": {"fall_speed": 3.0, "spawn_denominator": 30,
                "score_multiplier": 1.0, "quota_factor": 10, "boss_max_health": 2000}}"#,
        )
        .unwrap();
        let mut store = ProgressStore::in_memory();
        store.create_profile("ann").unwrap();
        let ctx = GameContext::new(DifficultyTable::default(), store, Settings::default(), 1)
            .with_table(table);
        let mut controller = GameController::new(ctx);
        controller.apply(Command::OpenSettings).unwrap();
        assert!(matches!(
            controller.apply(Command::SetDifficulty(Tier::Hard)),
            Err(CommandError::Difficulty(DifficultyError::UnknownTier(_)))
        ));
        controller.apply(Command::SetDifficulty(Tier::Easy)).unwrap();
    }

    #[test]
    fn test_account_management() {
        let mut controller = controller_with(&["ann", "bob"]);
        start_level(&mut controller, 1);
        controller.apply(Command::ReturnToMenu).unwrap();
        controller.apply(Command::OpenAccounts).unwrap();

        assert!(matches!(
            controller.apply(Command::RenameProfile {
                old: "zed".into(),
                new: "x".into()
            }),
            Err(CommandError::Profile(ProfileError::NotFound(_)))
        ));
        controller
            .apply(Command::RenameProfile {
                old: "bob".into(),
                new: "rob".into(),
            })
            .unwrap();
        assert!(controller.context().save_slot.matches("rob"));

        controller.apply(Command::DeleteProfile("rob".into())).unwrap();
        assert!(controller.context().save_slot.is_empty());
        assert_eq!(controller.view(), View::AccountManagement);
        assert_eq!(controller.snapshot().profile.as_deref(), Some("ann"));

        controller.apply(Command::DeleteProfile("ann".into())).unwrap();
        assert_eq!(controller.view(), View::ProfileCreation);
        assert!(matches!(
            controller.apply(Command::Play),
            Err(CommandError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_decline_continue_goes_to_level_select() {
        let mut controller = controller_with(&["ann"]);
        start_level(&mut controller, 1);
        controller.apply(Command::ReturnToMenu).unwrap();
        controller.apply(Command::Play).unwrap();
        controller.apply(Command::DeclineContinue).unwrap();
        assert_eq!(controller.view(), View::LevelSelect);
        assert!(controller.context().save_slot.matches("ann"));
    }
}
