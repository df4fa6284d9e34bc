//! Frame-stepped simulation tick
//!
//! Core game loop that advances the round by one frame. Pass order matters:
//! barriers move and activate, barriers damage meteorites, meteorites move
//! and are culled, then meteorites hit the player. A meteorite destroyed by
//! a barrier is scored before it can reach the player in the same frame.

use glam::Vec2;
use rand::Rng;
use std::fmt;

use super::effects::{Effect, update_effects};
use super::spawn::{
    METEORITE_INTERVAL, STAR_INTERVAL, spawn_barrier, spawn_explosion, spawn_meteorite_wave,
    spawn_return_fire, spawn_star,
};
use super::state::{GamePhase, GameState, MeteoriteKind};
use crate::consts::*;
use crate::easing::ease_in_out_sine;

/// Input for a single frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Pointer position in screen space, if known
    pub pointer: Option<Vec2>,
    /// Primary button went down since the last tick (edge, not level)
    pub primary_pressed: bool,
}

/// Rejected tick preconditions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickError {
    NegativeDelta(f32),
    NonFiniteDelta(f32),
}

impl fmt::Display for TickError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TickError::NegativeDelta(dt) => write!(f, "negative frame delta: {dt}"),
            TickError::NonFiniteDelta(dt) => write!(f, "non-finite frame delta: {dt}"),
        }
    }
}

impl std::error::Error for TickError {}

/// Points for destroying a meteorite of `size` at multiplier `ratio`.
///
/// Each step truncates, so the multiplier only counts in tenths.
pub fn destruction_score(size: f32, ratio: f32) -> u64 {
    let base = (100.0 + 10.0 * size * 5.0) as i64;
    let tenths = (ratio * 10.0) as i64;
    ((base * tenths) / 100 * 10).max(0) as u64
}

/// Difficulty after `round_time` seconds
pub fn rank_at(round_time: f32) -> f32 {
    ease_in_out_sine((round_time / RANK_RAMP_SECS).clamp(0.0, 1.0))
}

/// Ratio growth per second for a player at `x` on a screen `width` wide
pub fn ratio_bonus(x: f32, width: f32, inside_barrier: bool) -> f32 {
    if inside_barrier || width <= 0.0 {
        return 0.0;
    }
    let t = ((x - width * 0.2) / (width * 0.8)).clamp(0.0, 1.0);
    ease_in_out_sine(t)
}

/// New ratio after one frame
pub fn next_ratio(ratio: f32, bonus: f32, dt: f32) -> f32 {
    let mut ratio = ratio + bonus * dt;
    if bonus <= 1e-3 {
        ratio -= RATIO_DECAY * dt;
    }
    ratio.clamp(RATIO_MIN, RATIO_MAX)
}

/// Advance the game by one frame of `dt` seconds
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) -> Result<(), TickError> {
    if !dt.is_finite() {
        return Err(TickError::NonFiniteDelta(dt));
    }
    if dt < 0.0 {
        return Err(TickError::NegativeDelta(dt));
    }

    state.time += dt;
    update_stars(state, dt);

    match state.phase {
        GamePhase::Title => {
            if input.primary_pressed {
                state.start_round();
            }
        }
        GamePhase::Playing => {
            step_round(state, input, dt);
            if !state.player.is_alive() {
                log::info!("Player destroyed (score {})", state.score);
                state.phase = GamePhase::PlayerDead { elapsed: 0.0 };
            }
        }
        GamePhase::PlayerDead { elapsed } => {
            let elapsed = elapsed + dt;
            if elapsed >= DEAD_DELAY_SECS {
                state.reset_round();
            } else {
                state.phase = GamePhase::PlayerDead { elapsed };
                step_round(state, input, dt);
            }
        }
    }

    Ok(())
}

fn update_stars(state: &mut GameState, dt: f32) {
    state.star_timer -= dt;
    if state.star_timer <= 0.0 {
        state.star_timer = STAR_INTERVAL;
        spawn_star(state);
    }
    update_effects(&mut state.stars, dt);
}

/// One frame of the running round (also runs while the player is dead)
fn step_round(state: &mut GameState, input: &TickInput, dt: f32) {
    state.round_time += dt;
    state.rank = rank_at(state.round_time);

    // Ratio uses the inside flags from the previous barrier update
    let bonus = ratio_bonus(
        state.player.pos.x,
        state.bounds.width,
        state.is_player_inside_barriers(),
    );
    state.ratio = next_ratio(state.ratio, bonus, dt);

    run_spawners(state, dt);
    update_barriers(state, dt);
    let returns = barrier_damage_pass(state, dt);
    spawn_return_fire(state, &returns);
    update_meteorites(state, dt);
    player_collision_pass(state, dt);

    update_effects(&mut state.effects, dt);

    let bounds = state.bounds;
    state.player.update(input.pointer, &bounds, dt);
}

fn run_spawners(state: &mut GameState, dt: f32) {
    state.meteorite_timer -= dt;
    if state.meteorite_timer <= 0.0 {
        state.meteorite_timer = METEORITE_INTERVAL;
        let count = spawn_meteorite_wave(state);
        log::debug!("Meteorite wave of {count} (rank {:.2})", state.rank);
    }

    state.barrier_timer -= dt;
    if state.barrier_timer <= 0.0 {
        state.barrier_timer = spawn_barrier(state);
    }
}

fn update_barriers(state: &mut GameState, dt: f32) {
    let player_pos = state.player.pos;
    for barrier in &mut state.barriers {
        barrier.update(player_pos, dt);
    }
    let bounds = state.bounds;
    state.barriers.retain(|b| b.is_alive(&bounds));
}

/// Activated barriers wear down overlapping meteorites. Returns the
/// positions that qualified for return fire.
fn barrier_damage_pass(state: &mut GameState, dt: f32) -> Vec<Vec2> {
    let mut returns = Vec::new();
    let mut destroyed = Vec::new();
    let ratio = state.ratio;
    let rank = state.rank;

    for barrier in state.barriers.iter().filter(|b| b.is_activated()) {
        let field = barrier.collision();
        for meteorite in &mut state.meteorites {
            if meteorite.life() < 0.0 || !field.intersects(&meteorite.collision()) {
                continue;
            }

            let before = meteorite.life();
            meteorite.damage(BARRIER_DAMAGE * dt);

            if before > 0.0 && meteorite.life() <= 0.0 {
                state.score += destruction_score(meteorite.size, ratio);
                if state.rng.random_bool((RETURN_FIRE_CHANCE * rank).clamp(0.0, 1.0) as f64) {
                    returns.push(meteorite.pos);
                }
                destroyed.push(meteorite.pos);
            }
        }
    }

    for pos in destroyed {
        spawn_explosion(state, pos);
        state.effects.push(Effect::ratio(pos, ratio));
    }

    returns
}

fn update_meteorites(state: &mut GameState, dt: f32) {
    for meteorite in &mut state.meteorites {
        meteorite.update(dt);
    }
    let bounds = state.bounds;
    state.meteorites.retain(|m| m.is_alive(&bounds));
}

fn player_collision_pass(state: &mut GameState, dt: f32) {
    if !state.player.is_alive() {
        return;
    }

    // Every touching meteorite costs a life, even several in one frame
    let mut impacts = Vec::new();
    for meteorite in &mut state.meteorites {
        if meteorite.collision().contains(state.player.pos) {
            meteorite.damage(RAM_DAMAGE * dt);
            impacts.push(meteorite.pos);
            if meteorite.kind == MeteoriteKind::Return {
                log::debug!("Hit by return fire");
            }
        }
    }

    for pos in impacts {
        state.player.damage();
        spawn_explosion(state, pos);
    }

    let bounds = state.bounds;
    state.meteorites.retain(|m| m.is_alive(&bounds));
}
