#![forbid(unsafe_code)]

//! Document scroll tracker.
//!
//! Translates raw scroll offsets into a normalized progress fraction, the
//! hero fade opacity, and the navigation bar's condensed flag.
//!
//! The tracker is a per-thread singleton: [`install`] returns a
//! [`ScrollTrackerGuard`], and dropping the guard uninstalls it. Writes go
//! only through [`handle`]; everyone else reads with [`snapshot`] or
//! subscribes for changes.
//!
//! # Invariants
//!
//! 1. `fraction = clamp(offset / range, 0, 1)` when `range > 0`, else `0`.
//! 2. `fade_opacity` falls linearly from 1 at offset 0 to 0 at
//!    `fade_distance`, clamped outside that domain.
//! 3. A non-positive range yields `fraction = 0` and `fade_opacity = 1`.
//! 4. NaN offsets and ranges are treated as 0.

use std::cell::RefCell;

use folio_core::animation::lerp_clamped;
use folio_core::event::ScrollEvent;

use crate::TrackerError;
use crate::reactive::{Observable, Subscription};

/// Scroll tracker tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollConfig {
    /// Offset over which the hero fades from 1 to 0.
    pub fade_distance: f64,
    /// Offset beyond which the navigation bar condenses.
    pub condensed_threshold: f64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            fade_distance: 200.0,
            condensed_threshold: 50.0,
        }
    }
}

/// Derived scroll state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollState {
    /// Sanitized offset, `>= 0`.
    pub offset: f64,
    /// Sanitized range, `>= 0`.
    pub range: f64,
    /// Progress through the document in `[0, 1]`.
    pub fraction: f64,
    /// Hero opacity in `[0, 1]`.
    pub fade_opacity: f64,
    /// Whether the navigation bar is condensed.
    pub condensed: bool,
}

impl Default for ScrollState {
    fn default() -> Self {
        Self {
            offset: 0.0,
            range: 0.0,
            fraction: 0.0,
            fade_opacity: 1.0,
            condensed: false,
        }
    }
}

fn sanitize(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.max(0.0) }
}

impl ScrollState {
    /// Compute the state for one scroll event.
    #[must_use]
    pub fn compute(config: &ScrollConfig, event: ScrollEvent) -> Self {
        let offset = sanitize(event.offset);
        let range = sanitize(event.range);
        if range <= 0.0 {
            return Self {
                offset,
                range,
                ..Self::default()
            };
        }
        let fraction = offset / range;
        Self {
            offset,
            range,
            // inf / inf
            fraction: if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) },
            fade_opacity: lerp_clamped(offset, (0.0, config.fade_distance), (1.0, 0.0)),
            condensed: offset > config.condensed_threshold,
        }
    }

    /// Integer scroll percent for the progress bar.
    #[must_use]
    pub fn percent(&self) -> u8 {
        (self.fraction * 100.0).round().clamp(0.0, 100.0) as u8
    }
}

struct ScrollTracker {
    config: ScrollConfig,
    state: Observable<ScrollState>,
}

thread_local! {
    static TRACKER: RefCell<Option<ScrollTracker>> = const { RefCell::new(None) };
}

/// Install the scroll tracker on this thread.
///
/// # Errors
///
/// Returns [`TrackerError::AlreadyInstalled`] if a tracker is already live.
pub fn install(config: ScrollConfig) -> Result<ScrollTrackerGuard, TrackerError> {
    TRACKER.with(|slot| {
        let mut slot = slot.borrow_mut();
        if slot.is_some() {
            return Err(TrackerError::AlreadyInstalled("scroll"));
        }
        *slot = Some(ScrollTracker {
            config,
            state: Observable::new(ScrollState::default()),
        });
        tracing::debug!(?config, "scroll tracker installed");
        Ok(ScrollTrackerGuard { _private: () })
    })
}

/// Whether a scroll tracker is installed on this thread.
#[must_use]
pub fn is_installed() -> bool {
    TRACKER.with(|slot| slot.borrow().is_some())
}

/// Feed one scroll event. Returns `false` if no tracker is installed.
pub fn handle(event: ScrollEvent) -> bool {
    let target = TRACKER.with(|slot| {
        slot.borrow()
            .as_ref()
            .map(|t| (t.state.clone(), ScrollState::compute(&t.config, event)))
    });
    let Some((state, next)) = target else {
        return false;
    };
    // Notify outside the thread-local borrow so subscribers can read back.
    state.set(next);
    true
}

/// Current scroll state, or `None` if no tracker is installed.
#[must_use]
pub fn snapshot() -> Option<ScrollState> {
    TRACKER.with(|slot| slot.borrow().as_ref().map(|t| t.state.get()))
}

/// Subscribe to scroll state changes.
pub fn subscribe(callback: impl Fn(&ScrollState) + 'static) -> Option<Subscription> {
    let state = TRACKER.with(|slot| slot.borrow().as_ref().map(|t| t.state.clone()))?;
    Some(state.subscribe(callback))
}

/// RAII guard for the installed scroll tracker.
#[must_use = "dropping the guard uninstalls the scroll tracker"]
#[derive(Debug)]
pub struct ScrollTrackerGuard {
    _private: (),
}

impl ScrollTrackerGuard {
    /// Feed one scroll event.
    pub fn handle(&self, event: ScrollEvent) {
        handle(event);
    }

    /// Current scroll state.
    #[must_use]
    pub fn snapshot(&self) -> ScrollState {
        snapshot().unwrap_or_default()
    }
}

impl Drop for ScrollTrackerGuard {
    fn drop(&mut self) {
        let old = TRACKER.with(|slot| slot.borrow_mut().take());
        drop(old);
        tracing::debug!("scroll tracker uninstalled");
    }
}
