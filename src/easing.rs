//! Easing curves and periodic waveforms
//!
//! Waveforms are keyed by absolute time so every caller sampling the same
//! period at the same instant sees the same phase.

use std::f32::consts::PI;

/// Cubic ease-out: fast start, gentle stop
#[inline]
pub fn ease_out_cubic(t: f32) -> f32 {
    let u = 1.0 - t;
    1.0 - u * u * u
}

/// Sine ease-in-out
#[inline]
pub fn ease_in_out_sine(t: f32) -> f32 {
    -((PI * t).cos() - 1.0) / 2.0
}

#[inline]
fn phase(period: f32, time: f32) -> f32 {
    if period <= 0.0 {
        return 0.0;
    }
    (time / period).rem_euclid(1.0)
}

/// 0 → 1 → 0 following a sine wave
pub fn sine0_1(period: f32, time: f32) -> f32 {
    0.5 - 0.5 * (phase(period, time) * 2.0 * PI).cos()
}

/// Linear ramp 0 → 1, then snap back
pub fn sawtooth0_1(period: f32, time: f32) -> f32 {
    phase(period, time)
}

/// 1 for the first half of the period, 0 for the second
pub fn square0_1(period: f32, time: f32) -> f32 {
    if phase(period, time) < 0.5 { 1.0 } else { 0.0 }
}

/// Linear 0 → 1 → 0
pub fn triangle0_1(period: f32, time: f32) -> f32 {
    let p = phase(period, time);
    if p < 0.5 { p * 2.0 } else { 2.0 - p * 2.0 }
}

/// A bouncing curve: rises quickly, falls back like a jump
pub fn jump0_1(period: f32, time: f32) -> f32 {
    let x = triangle0_1(period, time);
    1.0 - (1.0 - x) * (1.0 - x)
}
