//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

mod boss;
pub mod collision;
pub mod state;
pub mod tick;

pub use collision::{Aabb, Collider, first_overlap};
pub use state::{
    Bullet, LevelTuning, Obstacle, Player, SPECIAL_BLOCK_COLORS, SessionPhase, SessionState,
    SpecialBlock,
};
pub use tick::{Direction, GameEvent, TickInput, advance, check_level_complete, tick};
