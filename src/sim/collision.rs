//! Axis-aligned bounding box collision
//!
//! Every entity in the play field is an upright rectangle, so overlap tests
//! are strict interval checks on both axes. Touching edges do not collide.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle anchored at its top-left corner (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Aabb {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self { pos, size }
    }

    pub fn min(&self) -> Vec2 {
        self.pos
    }

    pub fn max(&self) -> Vec2 {
        self.pos + self.size
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    /// Strict overlap test (shared edges do not count)
    pub fn overlaps(&self, other: &Aabb) -> bool {
        let (a_min, a_max) = (self.min(), self.max());
        let (b_min, b_max) = (other.min(), other.max());
        a_min.x < b_max.x && a_max.x > b_min.x && a_min.y < b_max.y && a_max.y > b_min.y
    }

    /// Entirely below the bottom edge of a field of the given height
    pub fn is_below(&self, height: f32) -> bool {
        self.pos.y > height
    }

    /// Entirely above the top edge of the field
    pub fn is_above_top(&self) -> bool {
        self.max().y < 0.0
    }
}

/// Which live entity the player ran into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collider {
    Obstacle(u32),
    SpecialBlock(u32),
}

/// First entity (obstacles first, then special blocks) overlapping `player`
pub fn first_overlap(
    player: &Aabb,
    obstacles: impl IntoIterator<Item = (u32, Aabb)>,
    special_blocks: impl IntoIterator<Item = (u32, Aabb)>,
) -> Option<Collider> {
    obstacles
        .into_iter()
        .find(|(_, rect)| player.overlaps(rect))
        .map(|(id, _)| Collider::Obstacle(id))
        .or_else(|| {
            special_blocks
                .into_iter()
                .find(|(_, rect)| player.overlaps(rect))
                .map(|(id, _)| Collider::SpecialBlock(id))
        })
}
