#![forbid(unsafe_code)]

//! Duration-based eased tween with an optional start delay.
//!
//! A [`Tween`] is the one-shot counterpart to a [`Spring`](super::Spring):
//! it runs from 0.0 to 1.0 over a fixed duration, shaped by an easing curve.
//! [`Tween::sample`] is a pure function of elapsed time, so controllers that
//! only remember *when* something started can compute the current frame
//! without owning mutable animation state.
//!
//! # Failure Modes
//!
//! - Zero duration: the tween jumps to 1.0 as soon as the delay has elapsed.

use web_time::Duration;

use super::{EasingFn, linear};

/// A one-shot eased transition from 0.0 to 1.0.
#[derive(Debug, Clone, Copy)]
pub struct Tween {
    delay: Duration,
    duration: Duration,
    easing: EasingFn,
}

impl Tween {
    /// Create a linear tween lasting `duration`.
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self {
            delay: Duration::ZERO,
            duration,
            easing: linear,
        }
    }

    /// Set the easing curve (builder pattern).
    #[must_use]
    pub fn easing(mut self, easing: EasingFn) -> Self {
        self.easing = easing;
        self
    }

    /// Set a start delay (builder pattern).
    #[must_use]
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Linear progress in `[0, 1]` after `elapsed` since start.
    fn progress_at(&self, elapsed: Duration) -> f32 {
        let Some(running) = elapsed.checked_sub(self.delay) else {
            return 0.0;
        };
        if self.duration.is_zero() {
            return 1.0;
        }
        (running.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0) as f32
    }

    /// Eased value after `elapsed` since start.
    #[must_use]
    pub fn sample(&self, elapsed: Duration) -> f32 {
        (self.easing)(self.progress_at(elapsed))
    }
}
