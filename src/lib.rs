//! Meteorite Protection System - a single-screen arcade avoid game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, collisions, scoring, round state)
//! - `renderer`: Draw-command generation and the terminal rasterizer
//! - `easing`: Easing curves and periodic waveforms
//! - `settings`: JSON configuration

pub mod easing;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use settings::Settings;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, the pace all velocities are tuned for)
    pub const FRAME_DT: f32 = 1.0 / 60.0;
    /// Maximum steps per host frame to prevent spiral of death
    pub const MAX_STEPS_PER_FRAME: u32 = 8;

    /// Default play area
    pub const SCREEN_WIDTH: f32 = 800.0;
    pub const SCREEN_HEIGHT: f32 = 600.0;
    /// Margin added around the screen before entities count as off-screen
    pub const OFFSCREEN_MARGIN: f32 = 32.0;
    /// Entities are never culled during this many seconds after spawning
    pub const SPAWN_GRACE: f32 = 1.0;

    /// Player
    pub const PLAYER_START_X: f32 = 32.0;
    pub const PLAYER_RADIUS: f32 = 16.0;
    pub const PLAYER_EDGE_INSET: f32 = 24.0;
    /// Pointer catch-up speed, units per 1/60 s
    pub const PLAYER_MAX_SPEED: f32 = 12.0;

    /// Meteorites
    pub const METEORITE_SLOWDOWN: f32 = 0.2;
    pub const METEORITE_FLASH_SECS: f32 = 0.2;
    pub const RETURN_ACCELERATION: f32 = 2.5;
    pub const RETURN_SIZE: f32 = 10.0;
    /// Damage dealt to a meteorite that rams the player (per second)
    pub const RAM_DAMAGE: f32 = 9999.0;

    /// Barriers
    pub const BARRIER_DAMAGE: f32 = 60.0;
    pub const BARRIER_DECEL_SECS: f32 = 0.8;
    pub const BARRIER_MIN_SPEED_FACTOR: f32 = 0.15;
    pub const BARRIER_ACTIVATION_SLOWDOWN: f32 = 0.3;
    pub const BARRIER_GROWTH: f32 = 0.7;
    pub const BARRIER_GROWTH_SECS: f32 = 0.2;
    pub const BARRIER_LIFETIME: f32 = 3.5;

    /// Scoring
    pub const RATIO_MIN: f32 = 1.0;
    pub const RATIO_MAX: f32 = 8.0;
    pub const RATIO_DECAY: f32 = 0.1;
    pub const RETURN_FIRE_CHANCE: f32 = 0.30;
    /// Return fire is suppressed this close to the player
    pub const RETURN_FIRE_MIN_DISTANCE: f32 = 60.0;

    /// Round timing
    pub const RANK_RAMP_SECS: f32 = 120.0;
    pub const DEAD_DELAY_SECS: f32 = 2.0;
    pub const FADE_IN_SECS: f32 = 0.3;
}

/// Velocity in polar form: speed `r` and heading `theta`.
///
/// Heading 0 points up and angles grow clockwise, so 90° is right and
/// 270° is left (screen y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Circular {
    pub r: f32,
    pub theta: f32,
}

impl Circular {
    pub fn new(r: f32, theta: f32) -> Self {
        Self { r, theta }
    }

    /// Screen-space vector
    #[inline]
    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(self.r * self.theta.sin(), -self.r * self.theta.cos())
    }
}

/// Heading (in `Circular` convention) of the vector from `from` to `to`
#[inline]
pub fn heading(from: Vec2, to: Vec2) -> f32 {
    (to.x - from.x).atan2(from.y - to.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_circular_directions() {
        let right = Circular::new(2.0, FRAC_PI_2).to_vec2();
        assert!((right.x - 2.0).abs() < 1e-5 && right.y.abs() < 1e-5);

        let left = Circular::new(1.0, 3.0 * FRAC_PI_2).to_vec2();
        assert!((left.x + 1.0).abs() < 1e-5 && left.y.abs() < 1e-5);

        let down = Circular::new(1.0, PI).to_vec2();
        assert!(down.x.abs() < 1e-5 && (down.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_heading_points_at_target() {
        let from = Vec2::new(100.0, 100.0);
        let to = Vec2::new(40.0, 180.0);
        let dir = Circular::new(1.0, heading(from, to)).to_vec2();
        let expected = (to - from).normalize();
        assert!((dir - expected).length() < 1e-5);
    }
}
