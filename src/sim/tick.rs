//! Fixed timestep simulation tick
//!
//! Core game loop that advances a session deterministically, one tick per
//! rendered frame at 60 Hz.

use serde::{Deserialize, Serialize};

use super::boss;
use super::collision::{Collider, first_overlap};
use super::state::{SessionPhase, SessionState};
use crate::consts::*;

/// Held horizontal direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    None,
    Left,
    Right,
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickInput {
    /// Held movement direction
    pub direction: Direction,
    /// Fire request (honoured when the weapon is off cooldown)
    pub fire: bool,
}

/// Something notable that happened during a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    ShotFired,
    ObstacleDestroyed { id: u32 },
    SpecialBlockDestroyed { id: u32 },
    SpecialBlockEscaped { id: u32 },
    /// Collision absorbed by an immunity charge
    CollisionAbsorbed { collider: u32, remaining: u8 },
    GameOver,
    LevelCleared { level: u32 },
}

/// Advance the session by one fixed timestep. Only `Active` sessions move.
pub fn tick(state: &mut SessionState, input: &TickInput) -> Vec<GameEvent> {
    let mut events = Vec::new();
    if state.phase != SessionPhase::Active {
        return events;
    }

    state.time_ticks += 1;

    move_player(state, input);
    update_weapon(state, input, &mut events);
    spawn_obstacles(state);
    advance_obstacles(state);
    resolve_bullets(state, &mut events);

    if state.is_boss_level() {
        boss::update(state, &mut events);
    }

    check_collision(state, &mut events);

    if state.phase == SessionPhase::Active && check_level_complete(state) {
        state.phase = SessionPhase::Cleared;
        log::info!(
            "Level {} cleared with score {:.1}",
            state.level,
            state.score
        );
        events.push(GameEvent::LevelCleared { level: state.level });
    }

    events
}

/// Pure form of `tick`: returns the successor state, leaving `state` untouched
pub fn advance(state: &SessionState, input: &TickInput) -> SessionState {
    let mut next = state.clone();
    tick(&mut next, input);
    next
}

/// Completion rule for the session's level
pub fn check_level_complete(state: &SessionState) -> bool {
    if state.is_endless_level() {
        return false;
    }
    if state.is_boss_level() {
        return state.special_blocks.is_empty() && state.obstacles.is_empty();
    }
    state.obstacles_generated >= state.tuning.obstacles_target && state.obstacles.is_empty()
}

fn move_player(state: &mut SessionState, input: &TickInput) {
    let speed = state.player.speed;
    match input.direction {
        Direction::Left => state.player.move_by(-speed),
        Direction::Right => state.player.move_by(speed),
        Direction::None => {}
    }
}

fn update_weapon(state: &mut SessionState, input: &TickInput, events: &mut Vec<GameEvent>) {
    if input.fire && state.weapon_cooldown <= 0 {
        state.spawn_bullet();
        state.weapon_cooldown = WEAPON_COOLDOWN_TICKS;
        events.push(GameEvent::ShotFired);
    }
    if state.weapon_cooldown > 0 {
        state.weapon_cooldown -= 1;
    }
}

fn spawn_obstacles(state: &mut SessionState) {
    if state.is_endless_level() {
        if state.roll_one_in(ENDLESS_SPAWN_DENOMINATOR) {
            state.spawn_obstacle();
        }
    } else if state.obstacles_generated < state.tuning.obstacles_target
        && state.roll_one_in(state.tuning.spawn_frequency)
    {
        state.spawn_obstacle();
    }
}

/// Fall, and drop obstacles that left the bottom of the field (no penalty)
fn advance_obstacles(state: &mut SessionState) {
    let speed = state.tuning.obstacle_speed;
    for obstacle in &mut state.obstacles {
        obstacle.pos.y += speed;
    }
    state
        .obstacles
        .retain(|o| !o.rect().is_below(FIELD_HEIGHT));
}

/// Move bullets and apply hits against obstacles. Each bullet damages at most
/// one obstacle; obstacles already destroyed this tick are not hit again.
fn resolve_bullets(state: &mut SessionState, events: &mut Vec<GameEvent>) {
    for bullet in &mut state.bullets {
        bullet.pos.y -= BULLET_SPEED;
    }

    let mut spent = Vec::new();
    let mut destroyed = Vec::new();
    for bullet in &state.bullets {
        let rect = bullet.rect();
        if let Some(obstacle) = state
            .obstacles
            .iter_mut()
            .find(|o| o.health > 0 && o.rect().overlaps(&rect))
        {
            spent.push(bullet.id);
            if obstacle.damage(BULLET_DAMAGE) {
                destroyed.push(obstacle.id);
            }
        }
    }

    state.obstacles.retain(|o| o.health > 0);
    state
        .bullets
        .retain(|b| !spent.contains(&b.id) && !b.rect().is_above_top());

    for id in destroyed {
        state.award(OBSTACLE_REWARD);
        events.push(GameEvent::ObstacleDestroyed { id });
    }
}

/// Player vs obstacles and special blocks, debounced to one registered hit per
/// second
fn check_collision(state: &mut SessionState, events: &mut Vec<GameEvent>) {
    if let Some(last) = state.player.last_collision_tick {
        if state.time_ticks.saturating_sub(last) < COLLISION_DEBOUNCE_TICKS {
            return;
        }
    }

    let hit = first_overlap(
        &state.player.rect(),
        state.obstacles.iter().map(|o| (o.id, o.rect())),
        state.special_blocks.iter().map(|b| (b.id, b.rect())),
    );
    let Some(collider) = hit else {
        return;
    };
    let collider_id = match collider {
        Collider::Obstacle(id) | Collider::SpecialBlock(id) => id,
    };

    state.player.last_collision_tick = Some(state.time_ticks);
    if state.player.immunity > 0 {
        state.player.immunity -= 1;
        log::debug!(
            "Collision with {collider:?} absorbed, {} charges left",
            state.player.immunity
        );
        events.push(GameEvent::CollisionAbsorbed {
            collider: collider_id,
            remaining: state.player.immunity,
        });
    } else {
        state.phase = SessionPhase::GameOver;
        log::info!("Game over on level {} ({collider:?})", state.level);
        events.push(GameEvent::GameOver);
    }
}
