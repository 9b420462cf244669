#![forbid(unsafe_code)]

//! Animation primitives: easing curves, clamped interpolation, tweens, and
//! springs.
//!
//! Every animated value on the page is an explicit function of elapsed time
//! or of an input such as scroll offset:
//!
//! - Scroll-driven values use [`lerp_clamped`] (linear, clamped domain/range).
//! - One-shot entrances use a [`Tween`] (duration-based, eased, optional delay).
//! - Pointer following uses a [`Spring`] (damped oscillator with mass).
//!
//! # Invariants
//!
//! 1. Easing functions map `[0, 1]` into `[0, 1]` with `f(0) = 0`, `f(1) = 1`.
//! 2. [`lerp_clamped`] never extrapolates outside its output range.
//! 3. A degenerate (zero-width) domain resolves to the range start.

pub mod spring;
pub mod tween;

pub use spring::Spring;
pub use tween::Tween;

/// Signature shared by all easing curves.
pub type EasingFn = fn(f32) -> f32;

/// Identity easing.
#[inline]
#[must_use]
pub fn linear(t: f32) -> f32 {
    t.clamp(0.0, 1.0)
}

/// Quadratic ease-out: fast start, slow finish.
#[inline]
#[must_use]
pub fn ease_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t) * (1.0 - t)
}

/// Quadratic ease-in-out.
#[inline]
#[must_use]
pub fn ease_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// Map `x` from `domain` onto `range` linearly, clamping to the range.
///
/// Works for inverted ranges (`[1, 0]`) and inverted domains. A domain whose
/// endpoints coincide (or a NaN input) yields `range.0`.
#[must_use]
pub fn lerp_clamped(x: f64, domain: (f64, f64), range: (f64, f64)) -> f64 {
    let (d0, d1) = domain;
    let (r0, r1) = range;
    let span = d1 - d0;
    if span == 0.0 || !span.is_finite() || x.is_nan() {
        return r0;
    }
    let t = ((x - d0) / span).clamp(0.0, 1.0);
    r0 + (r1 - r0) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn easing_endpoints() {
        for easing in [linear, ease_out, ease_in_out] {
            assert!(easing(0.0).abs() < 1e-6);
            assert!((easing(1.0) - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn ease_in_out_is_symmetric() {
        assert!((ease_in_out(0.5) - 0.5).abs() < 1e-6);
        assert!((ease_in_out(0.25) + ease_in_out(0.75) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn lerp_clamped_inverted_range() {
        assert_eq!(lerp_clamped(0.0, (0.0, 200.0), (1.0, 0.0)), 1.0);
        assert_eq!(lerp_clamped(100.0, (0.0, 200.0), (1.0, 0.0)), 0.5);
        assert_eq!(lerp_clamped(200.0, (0.0, 200.0), (1.0, 0.0)), 0.0);
        assert_eq!(lerp_clamped(5000.0, (0.0, 200.0), (1.0, 0.0)), 0.0);
        assert_eq!(lerp_clamped(-40.0, (0.0, 200.0), (1.0, 0.0)), 1.0);
    }

    #[test]
    fn lerp_clamped_degenerate_domain() {
        assert_eq!(lerp_clamped(10.0, (0.0, 0.0), (1.0, 0.0)), 1.0);
        assert_eq!(lerp_clamped(f64::NAN, (0.0, 200.0), (1.0, 0.0)), 1.0);
    }
}
