//! Block Dodge - simulation core of a 22-level obstacle-dodging arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (movement, spawning, collisions, session state)
//! - `difficulty`: Data-driven difficulty tiers
//! - `persistence`: Profile roster, unlock watermark and the resume slot
//! - `controller`: Top-level view state machine and command surface
//! - `snapshot`: Read-only view handed to a rendering layer

pub mod controller;
pub mod difficulty;
pub mod error;
pub mod highscores;
pub mod persistence;
pub mod settings;
pub mod sim;
pub mod snapshot;

pub use controller::{Command, GameContext, GameController, View};
pub use difficulty::{DifficultyTable, Tier, TierParams};
pub use error::{CommandError, DifficultyError, ProfileError, ResumeError};
pub use highscores::ScoreHistory;
pub use persistence::{ProgressStore, SaveSlot};
pub use settings::Settings;
pub use snapshot::Snapshot;

/// Game configuration constants
pub mod consts {
    /// Simulation rate (ticks per second)
    pub const TICK_RATE: u32 = 60;

    /// Play field dimensions
    pub const FIELD_WIDTH: f32 = 800.0;
    pub const FIELD_HEIGHT: f32 = 600.0;

    /// Player defaults - a square near the bottom edge
    pub const PLAYER_SIZE: f32 = 30.0;
    pub const PLAYER_SPEED: f32 = 5.0;
    pub const PLAYER_BOTTOM_MARGIN: f32 = 10.0;
    /// Collisions absorbed per level before game over
    pub const IMMUNITY_CHARGES: u8 = 2;
    /// Collisions within this many ticks of the last registered hit are ignored (1 s)
    pub const COLLISION_DEBOUNCE_TICKS: u64 = TICK_RATE as u64;

    /// Obstacle defaults
    pub const OBSTACLE_WIDTH: f32 = 70.0;
    pub const OBSTACLE_HEIGHT: f32 = 30.0;
    pub const OBSTACLE_HEALTH: i32 = 25;

    /// Bullet defaults
    pub const BULLET_WIDTH: f32 = 15.0;
    pub const BULLET_HEIGHT: f32 = 30.0;
    pub const BULLET_SPEED: f32 = 10.0;
    pub const BULLET_DAMAGE: i32 = 5;
    /// Ticks between shots (0.2 s)
    pub const WEAPON_COOLDOWN_TICKS: i32 = 12;

    /// Special block (boss) defaults
    pub const SPECIAL_BLOCK_SIZE: f32 = 100.0;
    /// Ticks between child obstacles dropped by a special block
    pub const SPECIAL_BLOCK_SPAWN_TICKS: u32 = 60;
    /// Horizontal jitter for child obstacles, relative to the boss's left edge
    pub const SPECIAL_BLOCK_CHILD_JITTER: i32 = 50;
    pub const SPECIAL_BLOCK_REWARD: f64 = 100.0;
    pub const OBSTACLE_REWARD: f64 = 1.0;

    /// Level layout
    pub const MAX_LEVEL: u32 = 22;
    pub const BOSS_LEVEL: u32 = 21;
    pub const ENDLESS_LEVEL: u32 = 22;
    /// Endless level spawns one obstacle with probability 1 in this many per tick
    pub const ENDLESS_SPAWN_DENOMINATOR: u32 = 10;
    /// Floor for the level-scaled spawn denominator
    pub const MIN_SPAWN_FREQUENCY: u32 = 5;

    /// Maximum number of profiles kept in the roster
    pub const MAX_PROFILES: usize = 5;
}

/// Starting y coordinate for the player (fixed for the whole session)
#[inline]
pub fn player_rest_y() -> f32 {
    consts::FIELD_HEIGHT - consts::PLAYER_SIZE - consts::PLAYER_BOTTOM_MARGIN
}

/// Whether `level` is a playable level number
#[inline]
pub fn is_valid_level(level: u32) -> bool {
    (1..=consts::MAX_LEVEL).contains(&level)
}
