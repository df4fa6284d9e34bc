//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time only advances through `tick`
//! - Seeded RNG only
//! - Stable iteration order (insertion order of the entity vectors)
//! - No rendering or platform dependencies

pub mod collision;
pub mod effects;
pub mod spawn;
pub mod state;
pub mod tick;

pub use collision::{Circle, Rect};
pub use effects::Effect;
pub use state::{Barrier, Bounds, GamePhase, GameState, Meteorite, MeteoriteKind, Player};
pub use tick::{TickError, TickInput, destruction_score, tick};
