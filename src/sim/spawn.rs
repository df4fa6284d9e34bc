//! Entity spawners
//!
//! Meteorites pour in from the right edge, barriers from the left. Spawn
//! ranges widen with rank so later waves are denser, faster and bigger.

use glam::Vec2;
use rand::Rng;
use std::f32::consts::{FRAC_PI_2, PI};

use super::effects::Effect;
use super::state::{Barrier, GameState, Meteorite, MeteoriteKind};
use crate::consts::*;
use crate::{Circular, heading};

/// Seconds between meteorite waves
pub const METEORITE_INTERVAL: f32 = 0.2;
/// Seconds between background stars
pub const STAR_INTERVAL: f32 = 0.05;
/// Depth of the off-screen spawn strips
const SPAWN_STRIP: f32 = 16.0;
/// Angular spread of meteorite headings
const METEORITE_SPREAD: f32 = 20.0 * PI / 180.0;
/// Angular spread of barrier headings (toward the vertical centre)
const BARRIER_SPREAD: f32 = 20.0 * PI / 180.0;
/// Angular jitter applied to return fire aim
const RETURN_AIM_JITTER: f32 = 5.0 * PI / 180.0;
/// Positional jitter applied to return fire
const RETURN_POS_JITTER: f32 = 8.0;

fn random_rotation(rng: &mut impl Rng) -> f32 {
    let sign = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
    sign * rng.random_range(1.2..2.5)
}

/// Uniform sample over `[lo, hi]`, tolerating a collapsed range
fn sample(rng: &mut impl Rng, lo: f32, hi: f32) -> f32 {
    if hi > lo { rng.random_range(lo..=hi) } else { lo }
}

/// Spawn one wave of destroyable meteorites just past the right edge
pub fn spawn_meteorite_wave(state: &mut GameState) -> usize {
    let rank = state.rank;
    let bounds = state.bounds;
    let rng = &mut state.rng;

    let min_count = (1.0 + 2.0 * rank) as u32;
    let max_count = (6.0 + 4.0 * rank) as u32;
    let count = rng.random_range(min_count..=max_count);

    for _ in 0..count {
        let pos = Vec2::new(
            sample(rng, bounds.width, bounds.width + SPAWN_STRIP),
            sample(rng, SPAWN_STRIP, bounds.height - SPAWN_STRIP),
        );
        let velocity = Circular::new(
            sample(rng, 0.75 - 0.3 * rank, 3.0 + 5.0 * rank),
            3.0 * FRAC_PI_2 + sample(rng, -METEORITE_SPREAD, METEORITE_SPREAD),
        );
        let size = 16.0 + sample(rng, -8.0, 8.0 + 10.0 * rank);
        let rotation = random_rotation(rng);
        state.meteorites.push(Meteorite::new(
            pos,
            velocity,
            size,
            MeteoriteKind::Destroyable,
            rotation,
        ));
    }

    count as usize
}

/// Spawn a barrier at the left edge. Returns the delay until the next one.
pub fn spawn_barrier(state: &mut GameState) -> f32 {
    let rank = state.rank;
    let bounds = state.bounds;
    let rng = &mut state.rng;

    let margin = 48.0;
    let pos = Vec2::new(
        sample(rng, 0.0, SPAWN_STRIP),
        sample(rng, margin, bounds.height - margin),
    );
    let lean = barrier_lean(pos.y, bounds.height);
    let velocity = Circular::new(
        sample(rng, 5.0, 15.0),
        FRAC_PI_2 + lean * sample(rng, 0.0, BARRIER_SPREAD),
    );
    let size = 20.0 + sample(rng, 0.0, 60.0);
    log::debug!("Barrier spawned at {pos} (size {size:.1})");
    state.barriers.push(Barrier::new(pos, velocity, size));

    sample(rng, 0.75 - 0.2 * rank, 1.5 - 0.3 * rank)
}

/// Heading bias toward the vertical centre: +1 below it, -1 above, 0 on it
fn barrier_lean(y: f32, height: f32) -> f32 {
    let dy = height / 2.0 - y;
    if dy > 0.0 {
        1.0
    } else if dy < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Whether a meteorite destroyed at `origin` may fire back at the player.
///
/// Shots from behind the player or from point-blank range cannot be dodged.
pub fn return_fire_allowed(origin: Vec2, player_pos: Vec2) -> bool {
    origin.x > player_pos.x && origin.distance(player_pos) >= RETURN_FIRE_MIN_DISTANCE
}

/// Spawn return-fire meteorites from the given destruction points
pub fn spawn_return_fire(state: &mut GameState, origins: &[Vec2]) {
    let player_pos = state.player.pos;
    let rng = &mut state.rng;

    for &origin in origins {
        if !return_fire_allowed(origin, player_pos) {
            continue;
        }

        let jitter = Circular::new(RETURN_POS_JITTER, rng.random_range(0.0..std::f32::consts::TAU));
        let aim = heading(origin, player_pos) + sample(rng, -RETURN_AIM_JITTER, RETURN_AIM_JITTER);
        // Starts drifting away and accelerates back toward the player
        let velocity = Circular::new(sample(rng, -1.0, 0.0), aim);
        let rotation = random_rotation(rng);
        log::debug!("Return fire from {origin}");
        state.meteorites.push(Meteorite::new(
            origin + jitter.to_vec2(),
            velocity,
            RETURN_SIZE,
            MeteoriteKind::Return,
            rotation,
        ));
    }
}

/// Add a star at the right edge unless the field is full
pub fn spawn_star(state: &mut GameState) {
    if state.stars.len() >= state.max_stars {
        return;
    }
    let x = state.bounds.width + sample(&mut state.rng, 0.0, SPAWN_STRIP);
    let star = Effect::star(x, state.bounds.height, &mut state.rng);
    state.stars.push(star);
}

/// Debris burst at `pos`
pub fn spawn_explosion(state: &mut GameState, pos: Vec2) {
    for _ in 0..super::effects::EXPLODE_PIECES {
        let piece = Effect::explode(pos, &mut state.rng);
        state.effects.push(piece);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Bounds;

    #[test]
    fn test_barrier_lean_is_three_way() {
        assert_eq!(barrier_lean(100.0, 600.0), 1.0);
        assert_eq!(barrier_lean(500.0, 600.0), -1.0);
        // Exactly on the centre line the barrier heads straight right
        assert_eq!(barrier_lean(300.0, 600.0), 0.0);
    }

    #[test]
    fn test_meteorite_wave_ranges() {
        let mut state = GameState::new(42, Bounds::default());
        for _ in 0..50 {
            let n = spawn_meteorite_wave(&mut state);
            assert!((1..=6).contains(&n));
        }
        for m in &state.meteorites {
            assert_eq!(m.kind, MeteoriteKind::Destroyable);
            assert!(m.pos.x >= 800.0 && m.pos.x <= 816.0);
            assert!(m.pos.y >= 16.0 && m.pos.y <= 584.0);
            assert!(m.size >= 8.0 && m.size <= 24.0);
            assert!(m.velocity.r >= 0.75 && m.velocity.r <= 3.0);
            // Heading leftward
            assert!(m.velocity.to_vec2().x < 0.0);
            assert_eq!(m.life(), m.size);
        }
    }

    #[test]
    fn test_max_rank_wave_is_denser() {
        let mut state = GameState::new(42, Bounds::default());
        state.rank = 1.0;
        for _ in 0..50 {
            let before = state.meteorites.len();
            let n = spawn_meteorite_wave(&mut state);
            assert!((3..=10).contains(&n));
            assert_eq!(state.meteorites.len() - before, n);
        }
        assert!(state.meteorites.iter().all(|m| m.size <= 34.0));
    }

    #[test]
    fn test_barrier_spawn() {
        let mut state = GameState::new(3, Bounds::default());
        for _ in 0..50 {
            let next = spawn_barrier(&mut state);
            assert!((0.75..=1.5).contains(&next));
        }
        for b in &state.barriers {
            assert!(b.pos.x >= 0.0 && b.pos.x <= 16.0);
            assert!(b.pos.y >= 48.0 && b.pos.y <= 552.0);
            assert!(b.size >= 20.0 && b.size <= 80.0);
            assert!(!b.is_activated());
            let v = b.velocity.to_vec2();
            assert!(v.x > 0.0);
            // Drifts toward the middle (or straight)
            if b.pos.y < 300.0 {
                assert!(v.y >= -1e-4);
            } else {
                assert!(v.y <= 1e-4);
            }
        }
    }

    #[test]
    fn test_return_fire_rules() {
        let player = Vec2::new(200.0, 300.0);
        assert!(return_fire_allowed(Vec2::new(400.0, 300.0), player));
        // Behind or level with the player
        assert!(!return_fire_allowed(Vec2::new(200.0, 100.0), player));
        assert!(!return_fire_allowed(Vec2::new(150.0, 300.0), player));
        // Point blank
        assert!(!return_fire_allowed(Vec2::new(250.0, 300.0), player));
    }

    #[test]
    fn test_return_fire_spawns_immune_meteorites() {
        let mut state = GameState::new(9, Bounds::default());
        state.player.pos = Vec2::new(100.0, 300.0);
        let origins = [
            Vec2::new(500.0, 300.0),
            Vec2::new(50.0, 300.0),
            Vec2::new(130.0, 300.0),
        ];
        spawn_return_fire(&mut state, &origins);
        assert_eq!(state.meteorites.len(), 1);

        let shot = &state.meteorites[0];
        assert_eq!(shot.kind, MeteoriteKind::Return);
        assert_eq!(shot.size, 10.0);
        assert!((shot.pos.distance(origins[0]) - 8.0).abs() < 1e-3);
        assert!(shot.velocity.r <= 0.0 && shot.velocity.r >= -1.0);

        // Once speed turns positive it heads toward the player (x decreasing)
        let aim = Circular::new(1.0, shot.velocity.theta).to_vec2();
        assert!(aim.x < -0.99);
    }

    #[test]
    fn test_star_cap() {
        let mut state = GameState::new(5, Bounds::default());
        state.max_stars = 34;
        for _ in 0..10 {
            spawn_star(&mut state);
        }
        assert_eq!(state.stars.len(), 34);
    }
}
