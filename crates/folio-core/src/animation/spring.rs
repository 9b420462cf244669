#![forbid(unsafe_code)]

//! Damped harmonic oscillator (spring) with mass.
//!
//! Used to make the cursor overlay trail the pointer:
//!
//!   a = (-stiffness × (position - target) - damping × velocity) / mass
//!
//! # Parameters
//!
//! - **stiffness** (k): restoring force strength.
//! - **damping** (c): velocity drag.
//! - **mass** (m): inertia. Light masses respond almost instantly.
//!
//! # Integration
//!
//! Semi-implicit Euler, subdivided into steps of at most 1ms. Light, stiff
//! springs (the cursor preset has `k/m = 7500`) need the small step to stay
//! stable.
//!
//! # Invariants
//!
//! 1. A spring at rest does not move until [`Spring::set_target`] is called
//!    with a target outside the rest threshold.
//! 2. Stiffness and mass are always positive (clamped on construction).
//! 3. A single [`Spring::advance`] longer than two seconds lands on the
//!    target.

use web_time::Duration;

const MAX_STEP_SECS: f64 = 0.001;

/// Longer steps settle the spring outright instead of integrating.
const MAX_ADVANCE_SECS: f64 = 2.0;

/// Position delta below which the spring is "at rest".
const DEFAULT_REST_THRESHOLD: f64 = 0.01;

/// Velocity below which (combined with position) the spring is at rest.
const DEFAULT_VELOCITY_THRESHOLD: f64 = 0.05;

const MIN_STIFFNESS: f64 = 0.1;
const MIN_MASS: f64 = 0.001;

/// A damped spring tracking a movable target.
#[derive(Debug, Clone)]
pub struct Spring {
    position: f64,
    velocity: f64,
    target: f64,
    stiffness: f64,
    damping: f64,
    mass: f64,
    at_rest: bool,
}

impl Spring {
    /// Create a spring starting at `initial` and targeting `target`.
    ///
    /// Default parameters: stiffness 170, damping 26, mass 1.
    #[must_use]
    pub fn new(initial: f64, target: f64) -> Self {
        Self {
            position: initial,
            velocity: 0.0,
            target,
            stiffness: 170.0,
            damping: 26.0,
            mass: 1.0,
            at_rest: (initial - target).abs() < DEFAULT_REST_THRESHOLD,
        }
    }

    /// Snappy, light spring used for the cursor overlay
    /// (stiffness 600, damping 32, mass 0.08). Starts at rest at `at`.
    #[must_use]
    pub fn cursor(at: f64) -> Self {
        Self::new(at, at)
            .with_stiffness(600.0)
            .with_damping(32.0)
            .with_mass(0.08)
    }

    /// Set stiffness (builder pattern). Clamped to minimum 0.1.
    #[must_use]
    pub fn with_stiffness(mut self, k: f64) -> Self {
        self.stiffness = k.max(MIN_STIFFNESS);
        self
    }

    /// Set damping (builder pattern). Clamped to minimum 0.0.
    #[must_use]
    pub fn with_damping(mut self, c: f64) -> Self {
        self.damping = c.max(0.0);
        self
    }

    /// Set mass (builder pattern). Clamped to minimum 0.001.
    #[must_use]
    pub fn with_mass(mut self, m: f64) -> Self {
        self.mass = m.max(MIN_MASS);
        self
    }

    /// Current position.
    #[inline]
    #[must_use]
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Current velocity.
    #[inline]
    #[must_use]
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    /// Whether the spring has settled at the target.
    #[inline]
    #[must_use]
    pub fn is_at_rest(&self) -> bool {
        self.at_rest
    }

    /// Change the target. Wakes the spring if it was at rest.
    pub fn set_target(&mut self, target: f64) {
        if (self.target - target).abs() > DEFAULT_REST_THRESHOLD {
            self.target = target;
            self.at_rest = false;
        }
    }

    /// Teleport to `position` and stop (used for the first pointer sample).
    pub fn snap_to(&mut self, position: f64) {
        self.position = position;
        self.target = position;
        self.velocity = 0.0;
        self.at_rest = true;
    }

    fn step(&mut self, dt: f64) {
        let displacement = self.position - self.target;
        let force = -self.stiffness * displacement - self.damping * self.velocity;
        self.velocity += force / self.mass * dt;
        self.position += self.velocity * dt;
    }

    /// Advance the spring by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        if self.at_rest {
            return;
        }
        let mut remaining = dt.as_secs_f64();
        if remaining > MAX_ADVANCE_SECS {
            let target = self.target;
            self.snap_to(target);
            return;
        }
        while remaining > 0.0 {
            let step_dt = remaining.min(MAX_STEP_SECS);
            self.step(step_dt);
            remaining -= step_dt;
        }
        if (self.position - self.target).abs() < DEFAULT_REST_THRESHOLD
            && self.velocity.abs() < DEFAULT_VELOCITY_THRESHOLD
        {
            self.position = self.target;
            self.velocity = 0.0;
            self.at_rest = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_millis(16);

    #[test]
    fn starts_at_rest_when_on_target() {
        let spring = Spring::cursor(-200.0);
        assert!(spring.is_at_rest());
        assert_eq!(spring.position(), -200.0);
    }

    #[test]
    fn cursor_preset_converges_quickly() {
        let mut spring = Spring::cursor(0.0);
        spring.set_target(500.0);
        for _ in 0..60 {
            spring.advance(FRAME);
        }
        assert!(spring.is_at_rest(), "position {}", spring.position());
        assert_eq!(spring.position(), 500.0);
    }

    #[test]
    fn moves_toward_target_after_one_frame() {
        let mut spring = Spring::cursor(0.0);
        spring.set_target(100.0);
        spring.advance(FRAME);
        // Overdamped: moves a visible amount without overshooting.
        assert!(spring.position() > 10.0);
        assert!(spring.position() < 100.0);
    }

    #[test]
    fn tiny_target_change_stays_at_rest() {
        let mut spring = Spring::cursor(10.0);
        spring.set_target(10.001);
        assert!(spring.is_at_rest());
    }

    #[test]
    fn snap_to_stops_motion() {
        let mut spring = Spring::cursor(0.0);
        spring.set_target(300.0);
        spring.advance(FRAME);
        spring.snap_to(42.0);
        assert!(spring.is_at_rest());
        assert_eq!(spring.position(), 42.0);
        assert_eq!(spring.velocity(), 0.0);
    }

    #[test]
    fn zero_dt_is_noop() {
        let mut spring = Spring::new(0.0, 1.0);
        spring.advance(Duration::ZERO);
        assert_eq!(spring.position(), 0.0);
    }

    #[test]
    fn mass_is_clamped_positive() {
        let mut spring = Spring::new(0.0, 1.0).with_mass(0.0);
        spring.advance(FRAME);
        assert!(spring.position().is_finite());
    }

    #[test]
    fn huge_step_lands_on_target() {
        let mut spring = Spring::cursor(0.0);
        spring.set_target(640.0);
        spring.advance(Duration::MAX);
        assert!(spring.is_at_rest());
        assert_eq!(spring.position(), 640.0);
    }
}
