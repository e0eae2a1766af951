//! Session state and core simulation types
//!
//! All state that must be captured for Continue/determinism lives here.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use crate::consts::*;
use crate::difficulty::{DifficultyTable, Tier, TierParams};
use crate::error::DifficultyError;
use crate::{is_valid_level, player_rest_y};

/// Lifecycle of one playthrough
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Created but never reset into play
    Fresh,
    /// Ticking
    Active,
    /// Tick advancement suspended, state retained
    Paused,
    /// Level completion detected
    Cleared,
    /// Immunity exhausted
    GameOver,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Fresh => "fresh",
            SessionPhase::Active => "active",
            SessionPhase::Paused => "paused",
            SessionPhase::Cleared => "cleared",
            SessionPhase::GameOver => "game over",
        }
    }
}

/// Palette for special blocks (cosmetic)
pub const SPECIAL_BLOCK_COLORS: [[u8; 3]; 6] = [
    [255, 0, 0],
    [0, 255, 0],
    [0, 0, 255],
    [255, 255, 0],
    [255, 0, 255],
    [0, 255, 255],
];

/// The player's block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Top-left corner
    pub pos: Vec2,
    pub size: f32,
    pub speed: f32,
    /// Collisions that can still be absorbed this level
    pub immunity: u8,
    /// Tick of the last registered collision
    pub last_collision_tick: Option<u64>,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            pos: Vec2::new(FIELD_WIDTH / 2.0, player_rest_y()),
            size: PLAYER_SIZE,
            speed: PLAYER_SPEED,
            immunity: IMMUNITY_CHARGES,
            last_collision_tick: None,
        }
    }
}

impl Player {
    pub fn rect(&self) -> Aabb {
        Aabb::new(self.pos, Vec2::splat(self.size))
    }

    /// Shift horizontally, clamped to the play field
    pub fn move_by(&mut self, dx: f32) {
        self.pos.x = (self.pos.x + dx).clamp(0.0, FIELD_WIDTH - self.size);
    }

    /// Horizontal center of the player
    pub fn center_x(&self) -> f32 {
        self.pos.x + self.size / 2.0
    }
}

/// A falling obstacle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    pub pos: Vec2,
    pub health: i32,
}

impl Obstacle {
    pub fn new(id: u32, pos: Vec2, health: i32) -> Self {
        assert!(health > 0, "obstacle health must be positive, got {health}");
        Self { id, pos, health }
    }

    pub fn rect(&self) -> Aabb {
        Aabb::new(self.pos, Vec2::new(OBSTACLE_WIDTH, OBSTACLE_HEIGHT))
    }

    /// Apply bullet damage; returns true when destroyed
    pub fn damage(&mut self, amount: i32) -> bool {
        assert!(amount >= 0, "negative damage {amount}");
        self.health -= amount;
        self.health <= 0
    }

    pub fn health_fraction(&self) -> f32 {
        (self.health.max(0) as f32 / OBSTACLE_HEALTH as f32).min(1.0)
    }
}

/// A player bullet travelling upward
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bullet {
    pub id: u32,
    pub pos: Vec2,
}

impl Bullet {
    pub fn rect(&self) -> Aabb {
        Aabb::new(self.pos, Vec2::new(BULLET_WIDTH, BULLET_HEIGHT))
    }
}

/// The boss block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialBlock {
    pub id: u32,
    pub pos: Vec2,
    pub color: [u8; 3],
    pub health: i32,
    pub max_health: i32,
    /// Ticks since the last child obstacle
    pub spawn_timer: u32,
}

impl SpecialBlock {
    pub fn new(id: u32, pos: Vec2, color: [u8; 3], max_health: i32) -> Self {
        assert!(max_health > 0, "boss health must be positive, got {max_health}");
        Self {
            id,
            pos,
            color,
            health: max_health,
            max_health,
            spawn_timer: 0,
        }
    }

    pub fn rect(&self) -> Aabb {
        Aabb::new(self.pos, Vec2::splat(SPECIAL_BLOCK_SIZE))
    }

    /// Apply bullet damage; returns true when destroyed
    pub fn damage(&mut self, amount: i32) -> bool {
        assert!(amount >= 0, "negative damage {amount}");
        self.health -= amount;
        self.health <= 0
    }

    pub fn health_fraction(&self) -> f32 {
        self.health.max(0) as f32 / self.max_health as f32
    }
}

/// Per-level values derived from the tier and level number
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelTuning {
    pub obstacle_speed: f32,
    /// Ordinary spawn chance is 1 in this many ticks
    pub spawn_frequency: u32,
    pub obstacles_target: u32,
    pub score_multiplier: f64,
    pub boss_max_health: i32,
}

impl LevelTuning {
    pub fn derive(params: &TierParams, level: u32) -> Self {
        let spawn_frequency = if level == ENDLESS_LEVEL {
            MIN_SPAWN_FREQUENCY
        } else {
            params.spawn_frequency(level)
        };
        Self {
            obstacle_speed: params.obstacle_speed(level),
            spawn_frequency,
            obstacles_target: params.obstacle_quota(level),
            score_multiplier: params.score_multiplier,
            boss_max_health: params.boss_max_health,
        }
    }
}

/// One in-progress playthrough (deterministic, serializable)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// Seed the session RNG was created from
    pub seed: u64,
    rng: Pcg32,
    /// Current level (1..=22)
    pub level: u32,
    pub tier: Tier,
    pub tuning: LevelTuning,
    /// Score (never decreases within a session)
    pub score: f64,
    pub phase: SessionPhase,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Ordinary obstacles spawned this level (never decreases within a level)
    pub obstacles_generated: u32,
    /// Ticks until the weapon may fire again
    pub weapon_cooldown: i32,
    /// Set once this level's boss has been destroyed
    pub boss_defeated: bool,
    pub player: Player,
    /// Live obstacles (ascending id)
    pub obstacles: Vec<Obstacle>,
    /// Live bullets (ascending id)
    pub bullets: Vec<Bullet>,
    /// Live special blocks (ascending id)
    pub special_blocks: Vec<SpecialBlock>,
    next_id: u32,
}

impl SessionState {
    /// Create a session for `level` on `tier`. The session starts `Fresh`;
    /// call `reset_game` to enter play.
    pub fn new(
        level: u32,
        tier: Tier,
        table: &DifficultyTable,
        seed: u64,
    ) -> Result<Self, DifficultyError> {
        assert!(is_valid_level(level), "level {level} out of range");
        let params = table.parameters(tier)?;
        Ok(Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            level,
            tier,
            tuning: LevelTuning::derive(&params, level),
            score: 0.0,
            phase: SessionPhase::Fresh,
            time_ticks: 0,
            obstacles_generated: 0,
            weapon_cooldown: 0,
            boss_defeated: false,
            player: Player::default(),
            obstacles: Vec::new(),
            bullets: Vec::new(),
            special_blocks: Vec::new(),
            next_id: 1,
        })
    }

    /// (Re-)enter `Active` for the current level: clears entities and counters,
    /// restores immunity and recomputes derived tuning.
    pub fn reset_game(&mut self, table: &DifficultyTable) -> Result<(), DifficultyError> {
        assert!(is_valid_level(self.level), "level {} out of range", self.level);
        let params = table.parameters(self.tier)?;

        self.tuning = LevelTuning::derive(&params, self.level);
        self.score = 0.0;
        self.time_ticks = 0;
        self.obstacles_generated = 0;
        self.weapon_cooldown = 0;
        self.boss_defeated = false;
        self.player = Player::default();
        self.obstacles.clear();
        self.bullets.clear();
        self.special_blocks.clear();
        self.phase = SessionPhase::Active;

        if self.is_boss_level() {
            self.spawn_special_block();
        }
        Ok(())
    }

    pub fn is_boss_level(&self) -> bool {
        self.level == BOSS_LEVEL
    }

    pub fn is_endless_level(&self) -> bool {
        self.level == ENDLESS_LEVEL
    }

    pub fn game_over(&self) -> bool {
        self.phase == SessionPhase::GameOver
    }

    pub fn cleared(&self) -> bool {
        self.phase == SessionPhase::Cleared
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Add points (scaled by the tier multiplier)
    pub fn award(&mut self, base: f64) {
        debug_assert!(base >= 0.0);
        self.score += base * self.tuning.score_multiplier;
    }

    /// Uniform draw in `1..=denominator`; true on 1
    pub(crate) fn roll_one_in(&mut self, denominator: u32) -> bool {
        self.rng.random_range(1..=denominator.max(1)) == 1
    }

    /// Spawn an ordinary obstacle above the field and count it toward the quota
    pub fn spawn_obstacle(&mut self) {
        let max_x = (FIELD_WIDTH - OBSTACLE_WIDTH) as i32;
        let x = self.rng.random_range(0..=max_x) as f32;
        let id = self.next_entity_id();
        self.obstacles
            .push(Obstacle::new(id, Vec2::new(x, -OBSTACLE_HEIGHT), OBSTACLE_HEALTH));
        self.obstacles_generated += 1;
    }

    /// Spawn a child obstacle beneath a special block (not counted toward the quota)
    pub fn spawn_child_obstacle(&mut self, boss_pos: Vec2) {
        let jitter = self.rng.random_range(0..=SPECIAL_BLOCK_CHILD_JITTER) as f32;
        let id = self.next_entity_id();
        let pos = Vec2::new(boss_pos.x + jitter, boss_pos.y + SPECIAL_BLOCK_SIZE);
        self.obstacles.push(Obstacle::new(id, pos, OBSTACLE_HEALTH));
    }

    /// Spawn a special block above the field
    pub fn spawn_special_block(&mut self) {
        let max_x = (FIELD_WIDTH - SPECIAL_BLOCK_SIZE) as i32;
        let x = self.rng.random_range(0..=max_x) as f32;
        let color = SPECIAL_BLOCK_COLORS[self.rng.random_range(0..SPECIAL_BLOCK_COLORS.len())];
        let id = self.next_entity_id();
        log::debug!("Special block {id} spawned at x={x} on level {}", self.level);
        self.special_blocks.push(SpecialBlock::new(
            id,
            Vec2::new(x, -SPECIAL_BLOCK_SIZE),
            color,
            self.tuning.boss_max_health,
        ));
    }

    /// Fire a bullet from the player's horizontal center
    pub fn spawn_bullet(&mut self) {
        let id = self.next_entity_id();
        let pos = Vec2::new(self.player.center_x() - BULLET_WIDTH / 2.0, self.player.pos.y);
        self.bullets.push(Bullet { id, pos });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(level: u32, tier: Tier) -> SessionState {
        let table = DifficultyTable::default();
        let mut state = SessionState::new(level, tier, &table, 7).unwrap();
        state.reset_game(&table).unwrap();
        state
    }

    #[test]
    fn test_new_session_is_fresh() {
        let state = SessionState::new(1, Tier::Normal, &DifficultyTable::default(), 1).unwrap();
        assert_eq!(state.phase, SessionPhase::Fresh);
        assert!(state.obstacles.is_empty());
    }

    #[test]
    fn test_reset_derives_tuning() {
        let state = session(3, Tier::Hard);
        assert_eq!(state.phase, SessionPhase::Active);
        assert_eq!(state.tuning.obstacles_target, 75);
        assert_eq!(state.tuning.spawn_frequency, 16);
        assert!((state.tuning.obstacle_speed - 6.0).abs() < 1e-5);
        assert_eq!(state.player.immunity, IMMUNITY_CHARGES);
        assert_eq!(state.player.pos, Vec2::new(400.0, 560.0));
    }

    #[test]
    fn test_reset_clears_everything() {
        let table = DifficultyTable::default();
        let mut state = session(2, Tier::Easy);
        state.spawn_obstacle();
        state.spawn_bullet();
        state.score = 12.0;
        state.player.immunity = 0;
        state.player.move_by(-1000.0);

        state.reset_game(&table).unwrap();
        assert!(state.obstacles.is_empty());
        assert!(state.bullets.is_empty());
        assert_eq!(state.obstacles_generated, 0);
        assert_eq!(state.score, 0.0);
        assert_eq!(state.player.immunity, 2);
        assert_eq!(state.player.pos.x, 400.0);
    }

    #[test]
    fn test_boss_level_reset_spawns_boss() {
        let state = session(BOSS_LEVEL, Tier::Easy);
        assert_eq!(state.special_blocks.len(), 1);
        let boss = &state.special_blocks[0];
        assert_eq!(boss.health, 2000);
        assert_eq!(boss.max_health, 2000);
        assert_eq!(boss.pos.y, -SPECIAL_BLOCK_SIZE);
        assert!(boss.pos.x >= 0.0 && boss.pos.x <= FIELD_WIDTH - SPECIAL_BLOCK_SIZE);
    }

    #[test]
    fn test_endless_level_pins_frequency() {
        let state = session(ENDLESS_LEVEL, Tier::Extreme);
        assert_eq!(state.tuning.spawn_frequency, 5);
        assert!(state.special_blocks.is_empty());
    }

    #[test]
    fn test_bullet_spawns_at_player_center() {
        let mut state = session(1, Tier::Normal);
        state.spawn_bullet();
        let bullet = &state.bullets[0];
        assert_eq!(bullet.rect().center().x, state.player.center_x());
        assert_eq!(bullet.pos.y, state.player.pos.y);
    }

    #[test]
    fn test_obstacle_spawn_counts_toward_quota() {
        let mut state = session(1, Tier::Normal);
        state.spawn_obstacle();
        state.spawn_child_obstacle(Vec2::new(100.0, 0.0));
        assert_eq!(state.obstacles.len(), 2);
        assert_eq!(state.obstacles_generated, 1);
        assert_eq!(state.obstacles[0].pos.y, -OBSTACLE_HEIGHT);
        assert_eq!(state.obstacles[1].pos.y, SPECIAL_BLOCK_SIZE);
    }

    #[test]
    #[should_panic]
    fn test_negative_health_is_fatal() {
        Obstacle::new(1, Vec2::ZERO, -5);
    }

    #[test]
    fn test_player_move_clamped() {
        let mut player = Player::default();
        player.move_by(10_000.0);
        assert_eq!(player.pos.x, FIELD_WIDTH - PLAYER_SIZE);
        player.move_by(-10_000.0);
        assert_eq!(player.pos.x, 0.0);
    }
}
