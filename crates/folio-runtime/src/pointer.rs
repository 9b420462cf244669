#![forbid(unsafe_code)]

//! Global pointer tracker.
//!
//! Same singleton shape as [`crate::scroll`]: one tracker per thread,
//! installed with [`install`] and removed when its [`PointerTrackerGuard`]
//! drops.

use std::cell::RefCell;

use folio_core::event::{PointerEvent, PointerEventKind, chain_capabilities};

use crate::TrackerError;
use crate::reactive::{Observable, Subscription};

/// Position used before the first pointer event (off-screen).
pub const OFFSCREEN: f64 = -200.0;

/// Pointer position and interaction flags.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerState {
    pub x: f64,
    pub y: f64,
    /// Pointer is over an interactive element or one of its descendants.
    pub hovering: bool,
    /// Primary button is held.
    pub pressed: bool,
}

impl Default for PointerState {
    fn default() -> Self {
        Self {
            x: OFFSCREEN,
            y: OFFSCREEN,
            hovering: false,
            pressed: false,
        }
    }
}

impl PointerState {
    /// Apply one event and return the next state.
    #[must_use]
    pub fn apply(mut self, event: &PointerEvent) -> Self {
        match &event.kind {
            PointerEventKind::Moved => {
                self.x = event.x;
                self.y = event.y;
            }
            PointerEventKind::Down => {
                self.x = event.x;
                self.y = event.y;
                self.pressed = true;
            }
            PointerEventKind::Up => {
                self.x = event.x;
                self.y = event.y;
                self.pressed = false;
            }
            PointerEventKind::Over(chain) => {
                self.hovering = !chain_capabilities(chain).is_empty();
            }
        }
        self
    }
}

thread_local! {
    static TRACKER: RefCell<Option<Observable<PointerState>>> = const { RefCell::new(None) };
}

/// Install the pointer tracker on this thread.
///
/// # Errors
///
/// Returns [`TrackerError::AlreadyInstalled`] if a tracker is already live.
pub fn install() -> Result<PointerTrackerGuard, TrackerError> {
    TRACKER.with(|slot| {
        let mut slot = slot.borrow_mut();
        if slot.is_some() {
            return Err(TrackerError::AlreadyInstalled("pointer"));
        }
        *slot = Some(Observable::new(PointerState::default()));
        tracing::debug!("pointer tracker installed");
        Ok(PointerTrackerGuard { _private: () })
    })
}

fn current() -> Option<Observable<PointerState>> {
    TRACKER.with(|slot| slot.borrow().clone())
}

/// Feed one pointer event. Returns `false` if no tracker is installed.
pub fn handle(event: &PointerEvent) -> bool {
    let Some(state) = current() else {
        return false;
    };
    state.update(|s| *s = s.apply(event));
    true
}

/// Current pointer state, or `None` if no tracker is installed.
#[must_use]
pub fn snapshot() -> Option<PointerState> {
    current().map(|s| s.get())
}

/// Subscribe to pointer state changes.
pub fn subscribe(callback: impl Fn(&PointerState) + 'static) -> Option<Subscription> {
    current().map(|s| s.subscribe(callback))
}

/// RAII guard for the installed pointer tracker.
#[must_use = "dropping the guard uninstalls the pointer tracker"]
#[derive(Debug)]
pub struct PointerTrackerGuard {
    _private: (),
}

impl PointerTrackerGuard {
    /// Feed one pointer event.
    pub fn handle(&self, event: &PointerEvent) {
        handle(event);
    }

    /// Current pointer state.
    #[must_use]
    pub fn snapshot(&self) -> PointerState {
        snapshot().unwrap_or_default()
    }
}

impl Drop for PointerTrackerGuard {
    fn drop(&mut self) {
        let old = TRACKER.with(|slot| slot.borrow_mut().take());
        drop(old);
        tracing::debug!("pointer tracker uninstalled");
    }
}
