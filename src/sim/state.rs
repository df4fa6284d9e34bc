//! Game state and core simulation types
//!
//! The round state owns every entity. Nothing outside `tick` mutates it.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::{Circle, Rect};
use super::effects::Effect;
use crate::Circular;
use crate::consts::*;
use crate::easing::ease_out_cubic;

/// Current phase of the round
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for the player to click
    Title,
    /// Active gameplay
    Playing,
    /// Player is out of life; the round resets once the delay runs out
    PlayerDead { elapsed: f32 },
}

/// Play area size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            width: SCREEN_WIDTH,
            height: SCREEN_HEIGHT,
        }
    }
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    /// Anything not touching this rectangle has left the play area
    pub fn culling_rect(&self) -> Rect {
        self.rect().stretched(OFFSCREEN_MARGIN, OFFSCREEN_MARGIN)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Meteorite variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeteoriteKind {
    /// Regular meteorite; barriers can wear it down
    Destroyable,
    /// Return fire: immune to damage, speeds up over time
    Return,
}

/// A meteorite entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meteorite {
    pub pos: Vec2,
    pub velocity: Circular,
    /// Radius, also the starting life and the score weight
    pub size: f32,
    pub kind: MeteoriteKind,
    /// Visual spin in radians per second
    pub rotation_speed: f32,
    /// Seconds since spawn
    pub(crate) age: f32,
    life: f32,
    damaged: bool,
    /// Seconds left on the hit flash (0 = not flashing)
    flash: f32,
}

impl Meteorite {
    pub fn new(
        pos: Vec2,
        velocity: Circular,
        size: f32,
        kind: MeteoriteKind,
        rotation_speed: f32,
    ) -> Self {
        Self {
            pos,
            velocity,
            size,
            kind,
            rotation_speed,
            age: 0.0,
            life: size,
            damaged: false,
            flash: 0.0,
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.age += dt;
        self.flash = (self.flash - dt).max(0.0);

        if self.kind == MeteoriteKind::Return {
            self.velocity.r += RETURN_ACCELERATION * dt;
        }

        self.pos += self.velocity.to_vec2() * dt * 60.0;
    }

    /// Wear the meteorite down. The first hit also staggers it to a crawl.
    pub fn damage(&mut self, amount: f32) {
        if self.kind != MeteoriteKind::Destroyable {
            return;
        }

        self.life -= amount;
        self.flash = METEORITE_FLASH_SECS;

        if !self.damaged {
            self.damaged = true;
            self.velocity.r *= METEORITE_SLOWDOWN;
        }
    }

    pub fn is_alive(&self, bounds: &Bounds) -> bool {
        if self.life < 0.0 {
            return false;
        }
        if self.age < SPAWN_GRACE {
            return true;
        }
        self.collision().intersects_rect(&bounds.culling_rect())
    }

    pub fn collision(&self) -> Circle {
        Circle::new(self.pos, self.size)
    }

    pub fn life(&self) -> f32 {
        self.life
    }

    pub fn age(&self) -> f32 {
        self.age
    }

    pub fn is_flashing(&self) -> bool {
        self.flash > 0.0
    }
}

/// The player's satellite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    life: i32,
}

impl Player {
    pub fn new(bounds: &Bounds) -> Self {
        Self {
            pos: Vec2::new(PLAYER_START_X, bounds.height / 2.0),
            life: 1,
        }
    }

    /// Chase the pointer at a capped speed, staying inside the screen
    pub fn update(&mut self, target: Option<Vec2>, bounds: &Bounds, dt: f32) {
        if !self.is_alive() {
            return;
        }

        if let Some(target) = target {
            let max_step = PLAYER_MAX_SPEED * 60.0 * dt;
            self.pos += (target - self.pos).clamp_length_max(max_step);
        }

        let max_x = (bounds.width - PLAYER_EDGE_INSET).max(PLAYER_EDGE_INSET);
        let max_y = (bounds.height - PLAYER_EDGE_INSET).max(PLAYER_EDGE_INSET);
        self.pos.x = self.pos.x.clamp(PLAYER_EDGE_INSET, max_x);
        self.pos.y = self.pos.y.clamp(PLAYER_EDGE_INSET, max_y);
    }

    pub fn damage(&mut self) {
        self.life -= 1;
    }

    pub fn life(&self) -> i32 {
        self.life
    }

    pub fn is_alive(&self) -> bool {
        self.life > 0
    }
}

/// A drifting shield zone. Entering it once turns it into a damage field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Barrier {
    pub pos: Vec2,
    pub velocity: Circular,
    /// Radius before activation growth
    pub size: f32,
    /// Seconds since spawn
    pub(crate) age: f32,
    /// Seconds since activation; never goes back to `None`
    activated_for: Option<f32>,
    player_inside: bool,
}

impl Barrier {
    pub fn new(pos: Vec2, velocity: Circular, size: f32) -> Self {
        Self {
            pos,
            velocity,
            size,
            age: 0.0,
            activated_for: None,
            player_inside: false,
        }
    }

    pub fn update(&mut self, player_pos: Vec2, dt: f32) {
        self.age += dt;
        if let Some(t) = self.activated_for.as_mut() {
            *t += dt;
        }

        let decel = ease_out_cubic((self.age / BARRIER_DECEL_SECS).clamp(0.0, 1.0));
        let vel = self.velocity.to_vec2() * (1.0 - (1.0 - BARRIER_MIN_SPEED_FACTOR) * decel);
        self.pos += vel * dt * 60.0;

        self.player_inside = self.collision().contains(player_pos);

        if self.activated_for.is_none() && self.player_inside {
            self.activated_for = Some(0.0);
            self.velocity.r *= BARRIER_ACTIVATION_SLOWDOWN;
        }
    }

    /// Current radius, including activation growth
    pub fn radius(&self) -> f32 {
        match self.activated_for {
            Some(t) => {
                let growth = ease_out_cubic((t / BARRIER_GROWTH_SECS).clamp(0.0, 1.0));
                self.size + self.size * BARRIER_GROWTH * growth
            }
            None => self.size,
        }
    }

    pub fn collision(&self) -> Circle {
        Circle::new(self.pos, self.radius())
    }

    pub fn is_alive(&self, bounds: &Bounds) -> bool {
        if self.age < SPAWN_GRACE {
            return true;
        }
        if self.activated_for.is_some_and(|t| t > BARRIER_LIFETIME) {
            return false;
        }
        self.collision().intersects_rect(&bounds.culling_rect())
    }

    pub fn is_activated(&self) -> bool {
        self.activated_for.is_some()
    }

    pub fn activated_for(&self) -> Option<f32> {
        self.activated_for
    }

    pub fn is_player_inside(&self) -> bool {
        self.player_inside
    }
}

fn default_rng() -> Pcg32 {
    Pcg32::seed_from_u64(0)
}

/// Number of stars scattered across the screen at startup
pub const INITIAL_STARS: usize = 32;
/// Default cap on background stars
pub const DEFAULT_MAX_STARS: usize = 150;

/// Complete game state: the round plus everything that outlives it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Seed for reproducibility
    pub seed: u64,
    #[serde(skip, default = "default_rng")]
    pub(crate) rng: Pcg32,
    pub bounds: Bounds,
    pub phase: GamePhase,
    /// Score of the current round
    pub score: u64,
    /// Best score since the process started
    pub high_score: u64,
    /// Score multiplier, 1.0 ..= 8.0
    pub ratio: f32,
    /// Difficulty, 0.0 ..= 1.0
    pub rank: f32,
    /// Seconds since the round started
    pub round_time: f32,
    /// Seconds since the game was created (drives animation)
    pub time: f32,
    pub player: Player,
    pub meteorites: Vec<Meteorite>,
    pub barriers: Vec<Barrier>,
    /// Gameplay effects, cleared with the round
    #[serde(skip)]
    pub effects: Vec<Effect>,
    /// Background stars, never cleared
    #[serde(skip)]
    pub stars: Vec<Effect>,
    pub max_stars: usize,
    /// Seconds until the next spawner fire
    pub(crate) meteorite_timer: f32,
    pub(crate) barrier_timer: f32,
    pub(crate) star_timer: f32,
}

impl GameState {
    pub fn new(seed: u64, bounds: Bounds) -> Self {
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            bounds,
            phase: GamePhase::Title,
            score: 0,
            high_score: 0,
            ratio: RATIO_MIN,
            rank: 0.0,
            round_time: 0.0,
            time: 0.0,
            player: Player::new(&bounds),
            meteorites: Vec::new(),
            barriers: Vec::new(),
            effects: Vec::new(),
            stars: Vec::new(),
            max_stars: DEFAULT_MAX_STARS,
            meteorite_timer: 0.0,
            barrier_timer: 0.0,
            star_timer: 0.0,
        };

        for _ in 0..INITIAL_STARS {
            let x = state.rng.random_range(0.0..bounds.width.max(1.0));
            let star = Effect::star(x, bounds.height, &mut state.rng);
            state.stars.push(star);
        }

        state
    }

    /// Leave the title screen
    pub fn start_round(&mut self) {
        self.phase = GamePhase::Playing;
        self.round_time = 0.0;
        log::info!("Round started (high score {})", self.high_score);
    }

    /// Tear the round down and go back to the title screen
    pub fn reset_round(&mut self) {
        log::info!("Round over with score {}", self.score);
        if self.score > self.high_score {
            self.high_score = self.score;
            log::info!("New high score: {}", self.high_score);
        }

        self.meteorites.clear();
        self.barriers.clear();
        self.effects.clear();
        self.player = Player::new(&self.bounds);
        self.score = 0;
        self.ratio = RATIO_MIN;
        self.rank = 0.0;
        self.round_time = 0.0;
        self.meteorite_timer = 0.0;
        self.barrier_timer = 0.0;
        self.phase = GamePhase::Title;
    }

    /// Cap the star field, dropping any stars beyond the new limit
    pub fn set_max_stars(&mut self, max_stars: usize) {
        self.max_stars = max_stars;
        self.stars.truncate(max_stars);
    }

    /// True if the player sat inside any barrier during the last barrier update
    pub fn is_player_inside_barriers(&self) -> bool {
        self.barriers.iter().any(|b| b.is_player_inside())
    }
}
