#![forbid(unsafe_code)]

//! Reveal-on-first-appearance controller.
//!
//! Each [`RevealController::attach`] registers one region with the
//! visibility oracle. The first time the oracle reports the region visible
//! (against the viewport grown or shrunk by the entry's margin), the entry
//! fires: `has_fired` becomes true, `fired_at` is stamped from the scheduler
//! clock, reveal listeners are notified, and the oracle subscription is
//! released. Fired entries never revert.
//!
//! The entrance itself is a pure function of time since firing; see
//! [`RevealController::entrance`].

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use ahash::AHashMap;
use folio_core::animation::{EasingFn, Tween, ease_out};
use folio_core::event::RegionId;
use web_time::Duration;

use crate::reactive::Subscription;
use crate::timer::Scheduler;
use crate::visibility::{ObserveOptions, VisibilityOracle};

/// Entrance animation shape.
#[derive(Debug, Clone, Copy)]
pub struct EntranceConfig {
    pub duration: Duration,
    /// Starting vertical offset; the element rises from here to 0.
    pub distance: f64,
    pub easing: EasingFn,
}

impl Default for EntranceConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_millis(600),
            distance: 50.0,
            easing: ease_out,
        }
    }
}

/// One frame of an entrance animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entrance {
    pub opacity: f64,
    /// Vertical offset in pixels (positive is below the resting position).
    pub offset: f64,
}

impl Entrance {
    /// Resting, fully shown.
    pub const SHOWN: Self = Self {
        opacity: 1.0,
        offset: 0.0,
    };
}

/// Public view of one tracked region.
#[derive(Debug, Clone, PartialEq)]
pub struct RevealEntry {
    pub id: RegionId,
    pub has_fired: bool,
    pub margin: f64,
    pub fired_at: Option<Duration>,
    /// Extra delay before this entry's entrance starts.
    pub stagger: Duration,
}

struct Slot {
    entry: RevealEntry,
    watch: Option<Subscription>,
}

type RevealListener = Rc<dyn Fn(&RevealEntry)>;

#[derive(Default)]
struct RevealInner {
    next_key: u64,
    slots: AHashMap<u64, Slot>,
    listeners: Vec<Weak<dyn Fn(&RevealEntry)>>,
}

/// Tracks reveal entries for any number of regions.
pub struct RevealController {
    scheduler: Scheduler,
    entrance: EntranceConfig,
    inner: Rc<RefCell<RevealInner>>,
}

impl std::fmt::Debug for RevealController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevealController")
            .field("entrance", &self.entrance)
            .field("entries", &self.inner.borrow().slots.len())
            .finish()
    }
}

impl RevealController {
    #[must_use]
    pub fn new(scheduler: &Scheduler, entrance: EntranceConfig) -> Self {
        Self {
            scheduler: scheduler.clone(),
            entrance,
            inner: Rc::new(RefCell::new(RevealInner::default())),
        }
    }

    /// Start watching `id`. Dropping the returned handle removes the entry.
    ///
    /// If the oracle reports visibility synchronously, the entry has already
    /// fired when this returns.
    pub fn attach(
        &self,
        oracle: &dyn VisibilityOracle,
        id: RegionId,
        margin: f64,
        stagger: Duration,
    ) -> RevealHandle {
        let key = {
            let mut inner = self.inner.borrow_mut();
            inner.next_key += 1;
            let key = inner.next_key;
            inner.slots.insert(
                key,
                Slot {
                    entry: RevealEntry {
                        id,
                        has_fired: false,
                        margin,
                        fired_at: None,
                        stagger,
                    },
                    watch: None,
                },
            );
            key
        };

        let weak = Rc::downgrade(&self.inner);
        let clock = self.scheduler.clone();
        let watch = oracle.observe(
            id,
            ObserveOptions::margin(margin),
            Box::new(move |vis| {
                if vis.visible {
                    fire(&weak, key, clock.now());
                }
            }),
        );

        let unused = {
            let mut inner = self.inner.borrow_mut();
            match inner.slots.get_mut(&key) {
                Some(slot) if !slot.entry.has_fired => {
                    slot.watch = Some(watch);
                    None
                }
                _ => Some(watch),
            }
        };
        drop(unused);

        RevealHandle {
            key,
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Listen for reveal signals. Each entry signals at most once.
    pub fn on_reveal(&self, callback: impl Fn(&RevealEntry) + 'static) -> Subscription {
        let strong: RevealListener = Rc::new(callback);
        self.inner
            .borrow_mut()
            .listeners
            .push(Rc::downgrade(&strong));
        Subscription::hold(strong)
    }

    /// Entrance frame for `handle` at scheduler time `now`.
    #[must_use]
    pub fn entrance(&self, handle: &RevealHandle, now: Duration) -> Entrance {
        let entry = self.inner.borrow().slots.get(&handle.key).map(|s| s.entry.clone());
        match entry {
            Some(entry) => self.entrance_for(&entry, now),
            None => self.hidden(),
        }
    }

    /// Entrance frame for an arbitrary entry snapshot.
    #[must_use]
    pub fn entrance_for(&self, entry: &RevealEntry, now: Duration) -> Entrance {
        let Some(fired_at) = entry.fired_at else {
            return self.hidden();
        };
        let t = Tween::new(self.entrance.duration)
            .easing(self.entrance.easing)
            .delay(entry.stagger)
            .sample(now.saturating_sub(fired_at));
        let t = f64::from(t);
        Entrance {
            opacity: t,
            offset: self.entrance.distance * (1.0 - t),
        }
    }

    fn hidden(&self) -> Entrance {
        Entrance {
            opacity: 0.0,
            offset: self.entrance.distance,
        }
    }

    /// Snapshot of every live entry, in attach order.
    #[must_use]
    pub fn entries(&self) -> Vec<RevealEntry> {
        let inner = self.inner.borrow();
        let mut keyed: Vec<_> = inner.slots.iter().map(|(k, s)| (*k, s.entry.clone())).collect();
        keyed.sort_by_key(|(k, _)| *k);
        keyed.into_iter().map(|(_, e)| e).collect()
    }

    /// Entries still waiting for their first appearance.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner
            .borrow()
            .slots
            .values()
            .filter(|s| !s.entry.has_fired)
            .count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn fire(inner: &Weak<RefCell<RevealInner>>, key: u64, now: Duration) {
    let Some(inner) = inner.upgrade() else {
        return;
    };
    let (entry, watch, listeners) = {
        let mut guard = inner.borrow_mut();
        let Some(slot) = guard.slots.get_mut(&key) else {
            return;
        };
        if slot.entry.has_fired {
            return;
        }
        slot.entry.has_fired = true;
        slot.entry.fired_at = Some(now);
        let entry = slot.entry.clone();
        let watch = slot.watch.take();
        guard.listeners.retain(|w| w.strong_count() > 0);
        let listeners: Vec<RevealListener> = guard.listeners.iter().filter_map(Weak::upgrade).collect();
        (entry, watch, listeners)
    };
    drop(watch);
    tracing::debug!(region = %entry.id, at = ?now, "reveal fired");
    for listener in &listeners {
        listener(&entry);
    }
}

/// Owner of one reveal entry.
#[must_use = "dropping the handle removes the reveal entry"]
pub struct RevealHandle {
    key: u64,
    inner: Weak<RefCell<RevealInner>>,
}

impl std::fmt::Debug for RevealHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevealHandle").field("key", &self.key).finish()
    }
}

impl RevealHandle {
    /// Current entry, or `None` if the controller is gone.
    #[must_use]
    pub fn entry(&self) -> Option<RevealEntry> {
        let inner = self.inner.upgrade()?;
        let inner = inner.borrow();
        inner.slots.get(&self.key).map(|s| s.entry.clone())
    }

    #[must_use]
    pub fn has_fired(&self) -> bool {
        self.entry().is_some_and(|e| e.has_fired)
    }

    #[must_use]
    pub fn fired_at(&self) -> Option<Duration> {
        self.entry().and_then(|e| e.fired_at)
    }
}

impl Drop for RevealHandle {
    fn drop(&mut self) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let removed = inner.borrow_mut().slots.remove(&self.key);
        drop(removed);
    }
}
