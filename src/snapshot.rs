//! Read-only view for the rendering layer
//!
//! An owned copy of everything a renderer or HUD needs for one frame. Holding
//! a snapshot never borrows simulation state.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::controller::View;
use crate::sim::{Aabb, SessionState};

/// Kind of a drawable entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Obstacle,
    Bullet,
    SpecialBlock,
}

/// One drawable entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityView {
    pub id: u32,
    pub kind: EntityKind,
    pub pos: Vec2,
    pub size: Vec2,
    /// Remaining health in [0, 1] (bullets are always 1)
    pub health_fraction: f32,
    /// Special blocks only
    pub color: Option<[u8; 3]>,
}

impl EntityView {
    fn from_rect(id: u32, kind: EntityKind, rect: Aabb, health_fraction: f32) -> Self {
        Self {
            id,
            kind,
            pos: rect.pos,
            size: rect.size,
            health_fraction,
            color: None,
        }
    }
}

/// Frame snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub view: View,
    pub profile: Option<String>,
    pub max_unlocked_level: u32,
    pub difficulty: String,
    pub session: Option<SessionSnapshot>,
}

/// Session part of a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub level: u32,
    pub difficulty: String,
    pub score: f64,
    pub player: Aabb,
    pub immunity: u8,
    pub obstacles_generated: u32,
    pub obstacles_target: u32,
    /// Obstacles, then bullets, then special blocks, each in id order
    pub entities: Vec<EntityView>,
    pub paused: bool,
    pub game_over: bool,
    pub cleared: bool,
}

impl SessionSnapshot {
    pub fn of(session: &SessionState) -> Self {
        let obstacles = session.obstacles.iter().map(|o| {
            EntityView::from_rect(o.id, EntityKind::Obstacle, o.rect(), o.health_fraction())
        });
        let bullets = session
            .bullets
            .iter()
            .map(|b| EntityView::from_rect(b.id, EntityKind::Bullet, b.rect(), 1.0));
        let blocks = session.special_blocks.iter().map(|b| EntityView {
            color: Some(b.color),
            ..EntityView::from_rect(b.id, EntityKind::SpecialBlock, b.rect(), b.health_fraction())
        });

        Self {
            level: session.level,
            difficulty: session.tier.to_string(),
            score: session.score,
            player: session.player.rect(),
            immunity: session.player.immunity,
            obstacles_generated: session.obstacles_generated,
            obstacles_target: session.tuning.obstacles_target,
            entities: obstacles.chain(bullets).chain(blocks).collect(),
            paused: session.phase == crate::sim::SessionPhase::Paused,
            game_over: session.game_over(),
            cleared: session.cleared(),
        }
    }

    /// Entities of one kind
    pub fn of_kind(&self, kind: EntityKind) -> impl Iterator<Item = &EntityView> {
        self.entities.iter().filter(move |e| e.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::difficulty::{DifficultyTable, Tier};

    #[test]
    fn test_session_snapshot_lists_entities() {
        let table = DifficultyTable::default();
        let mut session = SessionState::new(BOSS_LEVEL, Tier::Easy, &table, 3).unwrap();
        session.reset_game(&table).unwrap();
        session.spawn_obstacle();
        session.spawn_bullet();
        session.special_blocks[0].health = 500;

        let snap = SessionSnapshot::of(&session);
        assert_eq!(snap.level, BOSS_LEVEL);
        assert_eq!(snap.difficulty, "Easy");
        assert_eq!(snap.immunity, 2);
        assert_eq!(snap.entities.len(), 3);
        assert_eq!(snap.of_kind(EntityKind::Bullet).count(), 1);

        let boss = snap.of_kind(EntityKind::SpecialBlock).next().unwrap();
        assert_eq!(boss.health_fraction, 0.25);
        assert!(boss.color.is_some());
        assert_eq!(boss.size, Vec2::splat(SPECIAL_BLOCK_SIZE));

        let obstacle = snap.of_kind(EntityKind::Obstacle).next().unwrap();
        assert_eq!(obstacle.health_fraction, 1.0);
        assert!(!snap.paused && !snap.game_over && !snap.cleared);
    }
}
