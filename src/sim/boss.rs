//! Boss lane
//!
//! Special blocks descend at half obstacle speed, drop a child obstacle every
//! second and soak bullets until destroyed. Active only on the boss level.

use super::state::SessionState;
use super::tick::GameEvent;
use crate::consts::*;

/// Run the boss lane for one tick
pub(super) fn update(state: &mut SessionState, events: &mut Vec<GameEvent>) {
    advance_special_blocks(state);
    resolve_bullet_hits(state, events);
    remove_escaped(state, events);
    ensure_boss(state);
}

/// Descend and tick the child-spawn timers
fn advance_special_blocks(state: &mut SessionState) {
    let speed = state.tuning.obstacle_speed * 0.5;
    let mut drops = Vec::new();
    for block in &mut state.special_blocks {
        block.pos.y += speed;
        block.spawn_timer += 1;
        if block.spawn_timer >= SPECIAL_BLOCK_SPAWN_TICKS {
            block.spawn_timer = 0;
            drops.push(block.pos);
        }
    }
    for pos in drops {
        state.spawn_child_obstacle(pos);
    }
}

/// Bullets overlapping a special block deal damage and are consumed.
/// Returns the number of blocks destroyed.
pub(super) fn resolve_bullet_hits(state: &mut SessionState, events: &mut Vec<GameEvent>) -> u32 {
    let mut spent = Vec::new();
    for bullet in &state.bullets {
        let rect = bullet.rect();
        if let Some(block) = state
            .special_blocks
            .iter_mut()
            .find(|b| b.health > 0 && b.rect().overlaps(&rect))
        {
            block.damage(BULLET_DAMAGE);
            spent.push(bullet.id);
        }
    }
    state.bullets.retain(|b| !spent.contains(&b.id));

    let destroyed: Vec<u32> = state
        .special_blocks
        .iter()
        .filter(|b| b.health <= 0)
        .map(|b| b.id)
        .collect();
    if destroyed.is_empty() {
        return 0;
    }

    state.special_blocks.retain(|b| b.health > 0);
    for &id in &destroyed {
        state.award(SPECIAL_BLOCK_REWARD);
        state.boss_defeated = true;
        log::info!("Special block {id} destroyed on level {}", state.level);
        events.push(GameEvent::SpecialBlockDestroyed { id });
    }
    destroyed.len() as u32
}

/// Special blocks below the field leave without reward
fn remove_escaped(state: &mut SessionState, events: &mut Vec<GameEvent>) {
    state.special_blocks.retain(|b| {
        let escaped = b.rect().is_below(FIELD_HEIGHT);
        if escaped {
            events.push(GameEvent::SpecialBlockEscaped { id: b.id });
        }
        !escaped
    });
}

/// Replace an escaped boss; a destroyed boss stays gone
fn ensure_boss(state: &mut SessionState) {
    if state.special_blocks.is_empty() && !state.boss_defeated {
        state.spawn_special_block();
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::difficulty::{DifficultyTable, Tier};
    use crate::sim::state::Bullet;

    fn boss_session(tier: Tier) -> SessionState {
        let table = DifficultyTable::default();
        let mut state = SessionState::new(BOSS_LEVEL, tier, &table, 21).unwrap();
        state.reset_game(&table).unwrap();
        state.special_blocks[0].pos = Vec2::new(300.0, 100.0);
        state
    }

    fn bullet_into_boss(state: &mut SessionState) {
        let id = state.next_entity_id();
        state.bullets.push(Bullet {
            id,
            pos: Vec2::new(340.0, 150.0),
        });
    }

    #[test]
    fn test_boss_takes_400_hits() {
        let mut state = boss_session(Tier::Easy);
        let mut events = Vec::new();
        for _ in 0..399 {
            bullet_into_boss(&mut state);
            assert_eq!(resolve_bullet_hits(&mut state, &mut events), 0);
            assert!(state.bullets.is_empty());
        }
        assert_eq!(state.special_blocks[0].health, 5);
        assert_eq!(state.score, 0.0);

        bullet_into_boss(&mut state);
        assert_eq!(resolve_bullet_hits(&mut state, &mut events), 1);
        assert!(state.special_blocks.is_empty());
        assert_eq!(state.score, 100.0);
        assert!(state.boss_defeated);
    }

    #[test]
    fn test_boss_reward_scales_with_multiplier() {
        let mut state = boss_session(Tier::Extreme);
        state.special_blocks[0].health = 5;
        bullet_into_boss(&mut state);
        resolve_bullet_hits(&mut state, &mut Vec::new());
        assert_eq!(state.score, 200.0);
    }

    #[test]
    fn test_boss_drops_child_every_second() {
        let mut state = boss_session(Tier::Normal);
        let mut events = Vec::new();
        for _ in 0..59 {
            update(&mut state, &mut events);
        }
        assert!(state.obstacles.is_empty());
        update(&mut state, &mut events);
        assert_eq!(state.obstacles.len(), 1);
        assert_eq!(state.obstacles[0].health, OBSTACLE_HEALTH);
        assert_eq!(state.obstacles_generated, 0);

        let boss = &state.special_blocks[0];
        let child = &state.obstacles[0];
        assert!(child.pos.x >= boss.pos.x && child.pos.x <= boss.pos.x + 50.0);
    }

    #[test]
    fn test_boss_descends_at_half_speed() {
        let mut state = boss_session(Tier::Normal);
        let before = state.special_blocks[0].pos.y;
        update(&mut state, &mut Vec::new());
        let expected = before + state.tuning.obstacle_speed * 0.5;
        assert!((state.special_blocks[0].pos.y - expected).abs() < 1e-4);
    }

    #[test]
    fn test_escaped_boss_is_replaced_without_reward() {
        let mut state = boss_session(Tier::Normal);
        let old_id = state.special_blocks[0].id;
        state.special_blocks[0].pos.y = FIELD_HEIGHT;
        let mut events = Vec::new();
        update(&mut state, &mut events);

        assert!(events.contains(&GameEvent::SpecialBlockEscaped { id: old_id }));
        assert_eq!(state.special_blocks.len(), 1);
        assert_ne!(state.special_blocks[0].id, old_id);
        assert_eq!(state.score, 0.0);
    }

    #[test]
    fn test_destroyed_boss_not_replaced() {
        let mut state = boss_session(Tier::Normal);
        state.special_blocks[0].health = 5;
        bullet_into_boss(&mut state);
        update(&mut state, &mut Vec::new());
        assert!(state.special_blocks.is_empty());
        update(&mut state, &mut Vec::new());
        assert!(state.special_blocks.is_empty());
    }
}
