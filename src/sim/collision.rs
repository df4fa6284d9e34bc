//! Collision primitives
//!
//! Everything in the game collides as circles; the only rectangle is the
//! screen, used to decide when an entity has drifted away for good.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// A circle in screen space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

impl Circle {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Point lies inside or on the edge
    #[inline]
    pub fn contains(&self, point: Vec2) -> bool {
        self.center.distance_squared(point) <= self.radius * self.radius
    }

    /// Circles touch or overlap
    #[inline]
    pub fn intersects(&self, other: &Circle) -> bool {
        let reach = self.radius + other.radius;
        self.center.distance_squared(other.center) <= reach * reach
    }

    /// Circle touches or overlaps an axis-aligned rectangle
    pub fn intersects_rect(&self, rect: &Rect) -> bool {
        let closest = self.center.clamp(rect.min, rect.max);
        self.contains(closest)
    }
}

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            max: Vec2::new(x + w, y + h),
        }
    }

    /// Grow (or shrink, with negative amounts) on every side
    pub fn stretched(&self, dx: f32, dy: f32) -> Self {
        Self {
            min: self.min - Vec2::new(dx, dy),
            max: self.max + Vec2::new(dx, dy),
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }
}
