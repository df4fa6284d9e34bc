//! Frame composition
//!
//! Walks the game state back to front and emits draw commands. Animation is
//! driven by `GameState::time` through the periodic waveforms, so the same
//! state always produces the same frame.

use glam::Vec2;

use super::palette::*;
use super::{DrawCommand, Rgba, Sprite, lerp_color, with_alpha};
use crate::consts::{DEAD_DELAY_SECS, FADE_IN_SECS, PLAYER_RADIUS};
use crate::easing::{ease_out_cubic, jump0_1, sawtooth0_1, sine0_1, square0_1};
use crate::settings::Settings;
use crate::sim::{
    Barrier, Circle, Effect, GamePhase, GameState, Meteorite, MeteoriteKind, Player, Rect,
};

/// Barriers start blinking this long after activation
const BARRIER_WARN_SECS: f32 = 2.0;
/// Red fade covers the last part of the death delay
const DEATH_FADE_SECS: f32 = 0.5;

/// Presentation switches taken from the settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    /// Draw debris and ratio popups
    pub effects: bool,
    /// No death shake, no blinking
    pub reduced_motion: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            effects: true,
            reduced_motion: false,
        }
    }
}

impl From<&Settings> for RenderOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            effects: settings.quality.effects_enabled(),
            reduced_motion: settings.reduced_motion,
        }
    }
}

/// Build the complete draw list for one frame
pub fn build_frame(state: &GameState, options: &RenderOptions) -> Vec<DrawCommand> {
    let mut frame = Vec::with_capacity(
        state.stars.len() + state.meteorites.len() * 2 + state.barriers.len() * 3 + 16,
    );

    background(&mut frame, state);

    match state.phase {
        GamePhase::Title => title(&mut frame, state),
        GamePhase::Playing | GamePhase::PlayerDead { .. } => {
            let t = state.time;
            let blink = !options.reduced_motion;
            for barrier in &state.barriers {
                frame.extend(barrier_shapes(barrier, t, blink));
            }
            for meteorite in &state.meteorites {
                frame.push(meteorite_sprite(meteorite, t));
            }
            if options.effects {
                frame.extend(state.effects.iter().filter_map(|e| effect_shape(e, t)));
            }
            frame.extend(player_shapes(
                &state.player,
                state.is_player_inside_barriers(),
                t,
                !options.reduced_motion,
            ));
            overlays(&mut frame, state);
            hud(&mut frame, state);
        }
    }

    frame
}

fn background(frame: &mut Vec<DrawCommand>, state: &GameState) {
    let w = state.bounds.width;
    let h = state.bounds.height;
    let band = (h - 440.0).max(0.0);
    if band > 0.0 {
        frame.push(DrawCommand::Gradient {
            rect: Rect::new(0.0, 0.0, w, band),
            top: with_alpha(BLUE, 0.2),
            bottom: with_alpha(BLUE, 0.0),
        });
        frame.push(DrawCommand::Gradient {
            rect: Rect::new(0.0, h - band, w, band),
            top: with_alpha(BLUE, 0.0),
            bottom: with_alpha(BLUE, 0.2),
        });
    }

    for (i, star) in state.stars.iter().enumerate() {
        // Per-star phase offsets give each one its own twinkle
        let offset = i as f32 * 0.37;
        let color = lerp_color(CYAN, PINK, jump0_1(0.08, state.time + offset));
        let alpha = 0.1 + 0.75 * sine0_1(0.45 + (i % 5) as f32 * 0.1, state.time + offset);
        frame.push(DrawCommand::Star {
            center: star.position(),
            radius: 2.0 + 6.0 * sine0_1(0.3, state.time + offset * 2.0),
            color: with_alpha(color, alpha),
        });
    }
}

fn title(frame: &mut Vec<DrawCommand>, state: &GameState) {
    let center = state.bounds.center();
    frame.push(text("HISCORE", center + Vec2::new(0.0, -64.0), 16.0, WHITE, false));
    frame.push(text(
        &format!("{:08}", state.high_score),
        center + Vec2::new(0.0, -24.0),
        48.0,
        WHITE,
        true,
    ));
    frame.push(text(
        "CLICK TO START MISSION",
        center + Vec2::new(0.0, 112.0),
        18.0,
        WHITE,
        false,
    ));
}

fn text(s: &str, center: Vec2, size: f32, color: Rgba, outlined: bool) -> DrawCommand {
    DrawCommand::Text {
        text: s.to_string(),
        center,
        size,
        color,
        outlined,
    }
}

pub fn barrier_shapes(barrier: &Barrier, t: f32, blink: bool) -> Vec<DrawCommand> {
    let circle = barrier.collision();
    match barrier.activated_for() {
        Some(active) => {
            let alpha = if blink && active > BARRIER_WARN_SECS {
                0.8 * jump0_1(0.15, t)
            } else {
                1.0
            };
            let pulse = sawtooth0_1(0.4, t);
            vec![
                DrawCommand::Circle {
                    circle,
                    fill: Some(with_alpha(LIME, 0.08 + 0.04 * sine0_1(0.1, t) * alpha)),
                    outline: Some((2.0, with_alpha(LIME, alpha))),
                },
                DrawCommand::Circle {
                    circle: Circle::new(circle.center, circle.radius * ease_out_cubic(pulse)),
                    fill: None,
                    outline: Some((1.0, with_alpha(LIME, 0.5 * (1.0 - pulse)))),
                },
            ]
        }
        None => vec![
            DrawCommand::Circle {
                circle,
                fill: None,
                outline: Some((2.0, with_alpha(LIME, 0.5))),
            },
            text("NOT ACTIVATED", barrier.pos, 12.0, with_alpha(LIME, 0.8), false),
        ],
    }
}

pub fn meteorite_sprite(meteorite: &Meteorite, t: f32) -> DrawCommand {
    let (sprite, base) = match meteorite.kind {
        MeteoriteKind::Destroyable => (Sprite::Meteorite, WHITE),
        MeteoriteKind::Return => (
            Sprite::ReturnBullet,
            lerp_color(ORANGE, MAGENTA, jump0_1(0.3, t)),
        ),
    };
    let tint = if meteorite.is_flashing() {
        let fx = square0_1(0.1 / 8.0, t);
        [1.0 - 0.2 * fx, fx, fx, 1.0]
    } else {
        base
    };
    DrawCommand::Sprite {
        sprite,
        center: meteorite.pos,
        size: meteorite.size * 2.5,
        rotation: meteorite.age() * meteorite.rotation_speed,
        tint,
    }
}

fn effect_shape(effect: &Effect, t: f32) -> Option<DrawCommand> {
    match effect {
        Effect::Explode { size, .. } => {
            let fade = effect.fade();
            Some(DrawCommand::Square {
                center: effect.position(),
                size: *size,
                rotation: t * *size,
                fill: with_alpha(YELLOW, fade),
                outline: (4.0 * fade, YELLOW),
            })
        }
        Effect::Ratio { ratio, .. } => Some(ratio_text(effect.position(), *ratio, None, t)),
        Effect::Star { .. } => None,
    }
}

/// Multiplier readout; color and size step up with the ratio
pub fn ratio_text(center: Vec2, ratio: f32, fixed_size: Option<f32>, t: f32) -> DrawCommand {
    let flicker = jump0_1(0.2, t);
    let (color, size) = if ratio < 4.0 {
        (lerp_color(LIME, GREEN, flicker), 14.0)
    } else if ratio < 7.0 {
        (lerp_color(ORANGE, SADDLEBROWN, flicker), 18.0)
    } else {
        (lerp_color(ORANGERED, YELLOW, flicker), 22.0)
    };
    text(
        &format!("x{ratio:.1}"),
        center,
        fixed_size.unwrap_or(size),
        color,
        false,
    )
}

pub fn player_shapes(player: &Player, sheltered: bool, t: f32, shake: bool) -> Vec<DrawCommand> {
    let mut pos = player.pos;
    if !player.is_alive() && shake {
        // Figure-eight wobble
        pos += Vec2::new((t * 97.0).sin(), (t * 131.0).cos()) * 16.0;
    }
    let ring = sawtooth0_1(0.7, t);
    vec![
        DrawCommand::Sprite {
            sprite: Sprite::Player,
            center: pos,
            size: 50.0,
            rotation: 0.0,
            tint: if sheltered { SHELTERED } else { WHITE },
        },
        DrawCommand::Circle {
            circle: Circle::new(pos, 4.0 * PLAYER_RADIUS * ring),
            fill: None,
            outline: Some((1.0, with_alpha(LIME, 0.8 - 0.8 * ring))),
        },
    ]
}

fn overlays(frame: &mut Vec<DrawCommand>, state: &GameState) {
    let screen = state.bounds.rect();

    if let GamePhase::PlayerDead { elapsed } = state.phase {
        let start = DEAD_DELAY_SECS - DEATH_FADE_SECS;
        let alpha = ease_out_cubic(((elapsed - start) / DEATH_FADE_SECS).clamp(0.0, 1.0));
        if alpha > 0.0 {
            frame.push(DrawCommand::FillRect {
                rect: screen,
                color: with_alpha(RED, alpha * 0.4),
            });
        }
    }

    if state.round_time < FADE_IN_SECS {
        let alpha = ease_out_cubic(((FADE_IN_SECS - state.round_time) / FADE_IN_SECS).clamp(0.0, 1.0));
        frame.push(DrawCommand::FillRect {
            rect: screen,
            color: with_alpha(BLACK, alpha),
        });
    }
}

fn hud(frame: &mut Vec<DrawCommand>, state: &GameState) {
    frame.push(text(
        &format!("{:08}", state.score),
        Vec2::new(state.bounds.width / 2.0, 32.0),
        32.0,
        WHITE,
        true,
    ));
    frame.push(ratio_text(Vec2::new(48.0, 32.0), state.ratio, Some(32.0), state.time));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Circular;
    use crate::sim::{Bounds, TickInput, tick};

    fn texts(frame: &[DrawCommand]) -> Vec<String> {
        frame
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_title_frame() {
        let mut state = GameState::new(1, Bounds::default());
        state.high_score = 1234;
        let frame = build_frame(&state, &RenderOptions::default());
        let texts = texts(&frame);
        assert!(texts.contains(&"HISCORE".to_string()));
        assert!(texts.contains(&"00001234".to_string()));
        assert!(texts.contains(&"CLICK TO START MISSION".to_string()));
        let stars = frame
            .iter()
            .filter(|c| matches!(c, DrawCommand::Star { .. }))
            .count();
        assert_eq!(stars, state.stars.len());
    }

    #[test]
    fn test_playing_frame_has_hud_and_entities() {
        let mut state = GameState::new(1, Bounds::default());
        tick(
            &mut state,
            &TickInput {
                primary_pressed: true,
                ..Default::default()
            },
            1.0 / 60.0,
        )
        .unwrap();
        state.score = 2200;
        state.ratio = 7.5;
        state.meteorites.push(Meteorite::new(
            Vec2::new(400.0, 300.0),
            Circular::new(1.0, 0.0),
            20.0,
            MeteoriteKind::Return,
            1.0,
        ));

        let frame = build_frame(&state, &RenderOptions::default());
        let texts = texts(&frame);
        assert!(texts.contains(&"00002200".to_string()));
        assert!(texts.contains(&"x7.5".to_string()));
        assert!(frame.iter().any(|c| matches!(
            c,
            DrawCommand::Sprite {
                sprite: Sprite::ReturnBullet,
                size,
                ..
            } if *size == 50.0
        )));
        assert!(frame.iter().any(|c| matches!(
            c,
            DrawCommand::Sprite {
                sprite: Sprite::Player,
                ..
            }
        )));
        // Round just started: black fade-in on top
        assert!(frame.iter().any(|c| matches!(
            c,
            DrawCommand::FillRect { color, .. } if color[0] == 0.0 && color[3] > 0.0
        )));
    }

    #[test]
    fn test_inactive_barrier_label() {
        let barrier = Barrier::new(Vec2::new(100.0, 100.0), Circular::new(0.0, 0.0), 30.0);
        let shapes = barrier_shapes(&barrier, 0.0, true);
        assert!(texts(&shapes).contains(&"NOT ACTIVATED".to_string()));
    }

    #[test]
    fn test_active_barrier_outline_full_alpha_before_warning() {
        let mut barrier = Barrier::new(Vec2::new(100.0, 100.0), Circular::new(0.0, 0.0), 30.0);
        barrier.update(Vec2::new(100.0, 100.0), 0.1);
        let shapes = barrier_shapes(&barrier, 0.0, true);
        assert!(texts(&shapes).is_empty());
        assert!(matches!(
            shapes[0],
            DrawCommand::Circle {
                outline: Some((_, color)),
                ..
            } if color[3] == 1.0
        ));
    }

    #[test]
    fn test_ratio_color_tiers() {
        let low = ratio_text(Vec2::ZERO, 1.0, None, 0.0);
        let high = ratio_text(Vec2::ZERO, 7.0, None, 0.0);
        let DrawCommand::Text { size: low_size, .. } = low else {
            panic!("expected text");
        };
        let DrawCommand::Text { size: high_size, .. } = high else {
            panic!("expected text");
        };
        assert_eq!(low_size, 14.0);
        assert_eq!(high_size, 22.0);
    }

    #[test]
    fn test_death_fade_only_at_the_end() {
        let mut state = GameState::new(1, Bounds::default());
        state.round_time = 10.0;
        state.phase = GamePhase::PlayerDead { elapsed: 1.0 };
        let red = |frame: &[DrawCommand]| {
            frame.iter().any(|c| matches!(
                c,
                DrawCommand::FillRect { color, .. } if color[0] == 1.0
            ))
        };
        assert!(!red(&build_frame(&state, &RenderOptions::default())));
        state.phase = GamePhase::PlayerDead { elapsed: 1.9 };
        assert!(red(&build_frame(&state, &RenderOptions::default())));
    }
}
