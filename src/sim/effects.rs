//! Short-lived visual effects
//!
//! Each effect is a finite task that owns copies of everything it needs to
//! draw itself. The tick advances them once per frame and drops the ones
//! that report they are finished. Nothing in the simulation reads them back.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::Circular;
use crate::easing::ease_out_cubic;

/// How long a ratio popup stays on screen
pub const RATIO_POPUP_SECS: f32 = 0.5;
/// Distance the ratio popup drifts to the right
pub const RATIO_POPUP_DRIFT: f32 = 16.0;
/// Number of debris pieces thrown per destruction
pub const EXPLODE_PIECES: usize = 8;
/// Stars disappear once this far past the left edge
pub const STAR_EXIT_X: f32 = -16.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    /// A spinning square of debris flying out from a destroyed meteorite
    Explode {
        origin: Vec2,
        offset: Vec2,
        size: f32,
        lifetime: f32,
        elapsed: f32,
    },
    /// Multiplier popup shown where a meteorite was destroyed
    Ratio { origin: Vec2, ratio: f32, elapsed: f32 },
    /// Background star scrolling left
    Star { pos: Vec2, speed: f32 },
}

impl Effect {
    pub fn explode(origin: Vec2, rng: &mut impl Rng) -> Self {
        let offset = Circular::new(
            rng.random_range(8.0..48.0),
            rng.random_range(0.0..std::f32::consts::TAU),
        )
        .to_vec2();
        Effect::Explode {
            origin,
            offset,
            size: rng.random_range(4.0..12.0),
            lifetime: rng.random_range(0.15..0.4),
            elapsed: 0.0,
        }
    }

    pub fn ratio(origin: Vec2, ratio: f32) -> Self {
        Effect::Ratio {
            origin,
            ratio,
            elapsed: 0.0,
        }
    }

    /// A star at horizontal position `x` with random height and speed
    pub fn star(x: f32, height: f32, rng: &mut impl Rng) -> Self {
        let y = if height > 32.0 {
            rng.random_range(16.0..height - 16.0)
        } else {
            height / 2.0
        };
        Effect::Star {
            pos: Vec2::new(x, y),
            speed: rng.random_range(0.5..8.0),
        }
    }

    /// Advance by `dt` seconds. Returns false once the effect is finished.
    pub fn update(&mut self, dt: f32) -> bool {
        match self {
            Effect::Explode {
                lifetime, elapsed, ..
            } => {
                *elapsed += dt;
                *elapsed < *lifetime
            }
            Effect::Ratio { elapsed, .. } => {
                *elapsed += dt;
                *elapsed < RATIO_POPUP_SECS
            }
            Effect::Star { pos, speed } => {
                pos.x -= *speed * 60.0 * dt;
                pos.x > STAR_EXIT_X
            }
        }
    }

    /// Where the effect is drawn right now
    pub fn position(&self) -> Vec2 {
        match self {
            Effect::Explode {
                origin,
                offset,
                lifetime,
                elapsed,
                ..
            } => {
                let t = (*elapsed / *lifetime).clamp(0.0, 1.0);
                *origin + *offset * ease_out_cubic(t)
            }
            Effect::Ratio { origin, elapsed, .. } => {
                let t = (*elapsed / RATIO_POPUP_SECS).clamp(0.0, 1.0);
                *origin + Vec2::new(ease_out_cubic(t) * RATIO_POPUP_DRIFT, 0.0)
            }
            Effect::Star { pos, .. } => *pos,
        }
    }

    /// Remaining fraction of the effect's life, 1 → 0
    pub fn fade(&self) -> f32 {
        match self {
            Effect::Explode {
                lifetime, elapsed, ..
            } => (1.0 - *elapsed / *lifetime).clamp(0.0, 1.0),
            Effect::Ratio { elapsed, .. } => (1.0 - *elapsed / RATIO_POPUP_SECS).clamp(0.0, 1.0),
            Effect::Star { .. } => 1.0,
        }
    }
}

/// Advance every effect and drop the finished ones
pub fn update_effects(effects: &mut Vec<Effect>, dt: f32) {
    effects.retain_mut(|e| e.update(dt));
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_explode_expires_after_lifetime() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut effect = Effect::explode(Vec2::new(100.0, 100.0), &mut rng);
        let Effect::Explode { lifetime, offset, .. } = effect.clone() else {
            panic!("expected explode");
        };
        assert!((0.15..0.4).contains(&lifetime));
        assert!((8.0..48.0).contains(&offset.length()));

        let mut steps = 0;
        while effect.update(0.01) {
            steps += 1;
            assert!(steps < 100, "explode never finished");
        }
        // Fully travelled at the end
        let end = effect.position();
        assert!((end - (Vec2::new(100.0, 100.0) + offset)).length() < 1e-3);
    }

    #[test]
    fn test_ratio_popup_drifts_right() {
        let mut effect = Effect::ratio(Vec2::new(50.0, 50.0), 2.5);
        assert!(effect.update(0.25));
        let mid = effect.position();
        assert!(mid.x > 50.0 && mid.x < 50.0 + RATIO_POPUP_DRIFT);
        assert_eq!(mid.y, 50.0);
        assert!(!effect.update(0.25));
    }

    #[test]
    fn test_star_leaves_left_edge() {
        let mut star = Effect::Star {
            pos: Vec2::new(0.0, 10.0),
            speed: 1.0,
        };
        // 1 unit per 1/60 s: 16 frames to reach -16
        for _ in 0..15 {
            assert!(star.update(1.0 / 60.0));
        }
        assert!(!star.update(1.0 / 60.0 + 1e-3));
    }

    #[test]
    fn test_update_effects_prunes() {
        let mut effects = vec![
            Effect::ratio(Vec2::ZERO, 1.0),
            Effect::Ratio {
                origin: Vec2::ZERO,
                ratio: 1.0,
                elapsed: 0.45,
            },
        ];
        update_effects(&mut effects, 0.1);
        assert_eq!(effects.len(), 1);
    }
}
