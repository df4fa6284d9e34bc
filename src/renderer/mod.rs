//! Rendering
//!
//! The simulation never talks to the screen. `scene` turns a `GameState`
//! into a flat list of draw commands; a backend (the terminal canvas here)
//! consumes that list and is never queried by the game.

pub mod scene;
pub mod terminal;

pub use scene::{RenderOptions, build_frame};
pub use terminal::TerminalCanvas;

use glam::Vec2;

use crate::sim::{Circle, Rect};

/// Linear RGBA color, components in 0..=1
pub type Rgba = [f32; 4];

pub mod palette {
    use super::Rgba;

    pub const BLACK: Rgba = [0.0, 0.0, 0.0, 1.0];
    pub const WHITE: Rgba = [1.0, 1.0, 1.0, 1.0];
    pub const RED: Rgba = [1.0, 0.0, 0.0, 1.0];
    pub const BLUE: Rgba = [0.0, 0.0, 1.0, 1.0];
    pub const LIME: Rgba = [0.0, 1.0, 0.0, 1.0];
    pub const GREEN: Rgba = [0.0, 0.5, 0.0, 1.0];
    pub const YELLOW: Rgba = [1.0, 1.0, 0.0, 1.0];
    pub const ORANGE: Rgba = [1.0, 0.647, 0.0, 1.0];
    pub const ORANGERED: Rgba = [1.0, 0.271, 0.0, 1.0];
    pub const SADDLEBROWN: Rgba = [0.545, 0.271, 0.075, 1.0];
    pub const MAGENTA: Rgba = [1.0, 0.0, 1.0, 1.0];
    pub const CYAN: Rgba = [0.0, 1.0, 1.0, 1.0];
    pub const PINK: Rgba = [1.0, 0.753, 0.796, 1.0];
    /// Player tint while sheltering inside a barrier
    pub const SHELTERED: Rgba = [100.0 / 255.0, 1.0, 100.0 / 255.0, 1.0];
}

/// Same color with a new alpha
#[inline]
pub fn with_alpha(color: Rgba, alpha: f32) -> Rgba {
    [color[0], color[1], color[2], alpha.clamp(0.0, 1.0)]
}

/// Componentwise blend from `a` to `b`
#[inline]
pub fn lerp_color(a: Rgba, b: Rgba, t: f32) -> Rgba {
    let t = t.clamp(0.0, 1.0);
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
        a[3] + (b[3] - a[3]) * t,
    ]
}

/// Textured sprites the game draws
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sprite {
    Meteorite,
    ReturnBullet,
    Player,
}

/// One draw request
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Vertical gradient over a rectangle
    Gradient { rect: Rect, top: Rgba, bottom: Rgba },
    /// Solid (possibly translucent) rectangle
    FillRect { rect: Rect, color: Rgba },
    /// Circle with optional fill and outline (thickness, color)
    Circle {
        circle: Circle,
        fill: Option<Rgba>,
        outline: Option<(f32, Rgba)>,
    },
    Sprite {
        sprite: Sprite,
        center: Vec2,
        /// Diameter in screen units
        size: f32,
        rotation: f32,
        tint: Rgba,
    },
    /// Rotated square (debris)
    Square {
        center: Vec2,
        size: f32,
        rotation: f32,
        fill: Rgba,
        outline: (f32, Rgba),
    },
    /// Four-pointed star
    Star { center: Vec2, radius: f32, color: Rgba },
    /// Text centered on `center`
    Text {
        text: String,
        center: Vec2,
        size: f32,
        color: Rgba,
        outlined: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_color_clamps() {
        let mid = lerp_color(palette::BLACK, palette::WHITE, 0.5);
        assert_eq!(mid, [0.5, 0.5, 0.5, 1.0]);
        assert_eq!(lerp_color(palette::BLACK, palette::WHITE, 2.0), palette::WHITE);
    }

    #[test]
    fn test_with_alpha() {
        assert_eq!(with_alpha(palette::LIME, 0.25), [0.0, 1.0, 0.0, 0.25]);
        assert_eq!(with_alpha(palette::LIME, -1.0)[3], 0.0);
    }
}
