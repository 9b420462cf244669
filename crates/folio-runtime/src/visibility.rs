#![forbid(unsafe_code)]

//! Visibility oracle: "does region R intersect the viewport, at ratio >= T?"
//!
//! Three interchangeable strategies sit behind [`VisibilityOracle`]:
//!
//! | Strategy | Source of truth | Cost |
//! |----------|-----------------|------|
//! | [`NativeOracle`] | host pushes bounds when they change | event-driven |
//! | [`PollingOracle`] | [`GeometryProbe`] sampled on a fixed cadence | one timer |
//! | [`AlwaysVisibleOracle`] | none; every region is fully visible | free |
//!
//! [`select_oracle`] picks one from [`HostCapabilities`] at startup. Reveal
//! and lazy-media controllers only see the trait, so a host without
//! intersection support still makes forward progress: it degrades to
//! always-visible (content shows immediately) instead of never showing.
//!
//! # Delivery
//!
//! A callback fires once with the first observation, then again each time
//! the threshold-qualified `visible` flag flips. The first observation may be
//! delivered synchronously from inside [`VisibilityOracle::observe`], so
//! callers must not hold a borrow that the callback needs.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use ahash::AHashMap;
use folio_core::event::RegionId;
use folio_core::geometry::Rect;
use web_time::Duration;

use crate::reactive::Subscription;
use crate::timer::{Scheduler, TimerGuard};

/// Default polling cadence for [`PollingOracle`].
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A single visibility observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Visibility {
    /// Whether the region meets the observer's threshold.
    pub visible: bool,
    /// Fraction of the region's area inside the (margin-adjusted) viewport.
    pub ratio: f64,
}

impl Visibility {
    /// Full visibility, used by the fail-open fallback.
    pub const FULL: Self = Self {
        visible: true,
        ratio: 1.0,
    };
}

/// Per-observer options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserveOptions {
    /// Minimum visible ratio. `0.0` means "any overlap".
    pub threshold: f64,
    /// Root margin applied to the viewport on every side (negative shrinks).
    pub margin: f64,
}

impl Default for ObserveOptions {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            margin: 0.0,
        }
    }
}

impl ObserveOptions {
    /// Options with a ratio threshold and no margin.
    #[must_use]
    pub fn threshold(threshold: f64) -> Self {
        Self {
            threshold,
            ..Self::default()
        }
    }

    /// Options with a root margin and the "any overlap" threshold.
    #[must_use]
    pub fn margin(margin: f64) -> Self {
        Self {
            margin,
            ..Self::default()
        }
    }

    /// Whether `ratio` satisfies the threshold.
    #[must_use]
    pub fn qualifies(&self, ratio: f64) -> bool {
        if self.threshold <= 0.0 {
            ratio > 0.0
        } else {
            ratio >= self.threshold.min(1.0)
        }
    }

    /// Compute the observation for `bounds` against `viewport`.
    #[must_use]
    pub fn measure(&self, bounds: &Rect, viewport: &Rect) -> Visibility {
        let ratio = bounds.visible_ratio(&viewport.expand(self.margin));
        Visibility {
            visible: self.qualifies(ratio),
            ratio,
        }
    }
}

/// Which strategy an oracle uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleStrategy {
    /// Host-pushed geometry, event-driven.
    Native,
    /// Fixed-cadence sampling of a geometry probe.
    Polling,
    /// Fail-open: everything is visible.
    AlwaysVisible,
}

/// What the host environment can provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HostCapabilities {
    /// Host can push element geometry as it changes.
    pub intersection_observer: bool,
    /// Host can answer synchronous bounding-box queries.
    pub geometry_probe: bool,
}

impl HostCapabilities {
    /// Everything available.
    #[must_use]
    pub const fn full() -> Self {
        Self {
            intersection_observer: true,
            geometry_probe: true,
        }
    }

    /// Preferred strategy for these capabilities.
    #[must_use]
    pub fn strategy(&self) -> OracleStrategy {
        if self.intersection_observer {
            OracleStrategy::Native
        } else if self.geometry_probe {
            OracleStrategy::Polling
        } else {
            OracleStrategy::AlwaysVisible
        }
    }
}

/// Synchronous geometry queries answered by the host.
pub trait GeometryProbe {
    /// Current viewport rectangle.
    fn viewport(&self) -> Rect;

    /// Current bounds of `region`, or `None` if it is not laid out.
    fn bounds(&self, region: RegionId) -> Option<Rect>;
}

/// Abstraction over viewport-intersection detection.
pub trait VisibilityOracle {
    /// Start observing `region`. Dropping the returned guard stops delivery.
    fn observe(
        &self,
        region: RegionId,
        options: ObserveOptions,
        callback: Box<dyn Fn(Visibility)>,
    ) -> Subscription;

    /// Strategy in use.
    fn strategy(&self) -> OracleStrategy;
}

// ---------------------------------------------------------------------------
// Shared observer registry
// ---------------------------------------------------------------------------

type VisibilityCallback = Rc<dyn Fn(Visibility)>;

struct ObserverEntry {
    id: u64,
    region: RegionId,
    options: ObserveOptions,
    last: Option<bool>,
    callback: Weak<dyn Fn(Visibility)>,
}

#[derive(Default)]
struct ObserverRegistry {
    next_id: u64,
    entries: Vec<ObserverEntry>,
}

impl ObserverRegistry {
    fn register(
        &mut self,
        region: RegionId,
        options: ObserveOptions,
        callback: &VisibilityCallback,
    ) -> u64 {
        self.next_id += 1;
        self.entries.push(ObserverEntry {
            id: self.next_id,
            region,
            options,
            last: None,
            callback: Rc::downgrade(callback),
        });
        self.next_id
    }

    /// Measure matching entries and collect the callbacks whose qualified
    /// state changed. Dead entries are pruned.
    fn evaluate(
        &mut self,
        viewport: &Rect,
        only: Option<u64>,
        bounds_of: impl Fn(RegionId) -> Option<Rect>,
    ) -> Vec<(VisibilityCallback, Visibility)> {
        self.entries.retain(|e| e.callback.strong_count() > 0);
        let mut due = Vec::new();
        for entry in &mut self.entries {
            if only.is_some_and(|id| id != entry.id) {
                continue;
            }
            let Some(bounds) = bounds_of(entry.region) else {
                continue;
            };
            let vis = entry.options.measure(&bounds, viewport);
            if entry.last == Some(vis.visible) {
                continue;
            }
            entry.last = Some(vis.visible);
            if let Some(cb) = entry.callback.upgrade() {
                due.push((cb, vis));
            }
        }
        due
    }

    fn live_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.callback.strong_count() > 0)
            .count()
    }
}

fn deliver(due: Vec<(VisibilityCallback, Visibility)>) {
    for (cb, vis) in due {
        cb(vis);
    }
}

// ---------------------------------------------------------------------------
// Native (event-driven)
// ---------------------------------------------------------------------------

struct NativeState {
    viewport: Rect,
    bounds: AHashMap<RegionId, Rect>,
    registry: ObserverRegistry,
}

/// Event-driven oracle fed by host geometry notifications.
pub struct NativeOracle {
    state: Rc<RefCell<NativeState>>,
}

impl NativeOracle {
    /// Create with an initial viewport.
    #[must_use]
    pub fn new(viewport: Rect) -> Self {
        Self {
            state: Rc::new(RefCell::new(NativeState {
                viewport,
                bounds: AHashMap::new(),
                registry: ObserverRegistry::default(),
            })),
        }
    }

    /// Host notification: `region` now occupies `bounds`.
    pub fn report(&self, region: RegionId, bounds: Rect) {
        let due = {
            let mut state = self.state.borrow_mut();
            state.bounds.insert(region, bounds);
            let NativeState {
                viewport, registry, ..
            } = &mut *state;
            registry.evaluate(viewport, None, |r| (r == region).then_some(bounds))
        };
        deliver(due);
    }

    /// Host notification: the viewport changed. Re-evaluates every region
    /// with known bounds.
    pub fn set_viewport(&self, viewport: Rect) {
        let due = {
            let mut state = self.state.borrow_mut();
            state.viewport = viewport;
            let NativeState {
                viewport,
                bounds,
                registry,
            } = &mut *state;
            registry.evaluate(viewport, None, |r| bounds.get(&r).copied())
        };
        deliver(due);
    }

    /// Number of live observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.state.borrow().registry.live_count()
    }
}

impl VisibilityOracle for NativeOracle {
    fn observe(
        &self,
        region: RegionId,
        options: ObserveOptions,
        callback: Box<dyn Fn(Visibility)>,
    ) -> Subscription {
        let strong: VisibilityCallback = Rc::from(callback);
        let due = {
            let mut state = self.state.borrow_mut();
            let id = state.registry.register(region, options, &strong);
            let NativeState {
                viewport,
                bounds,
                registry,
            } = &mut *state;
            registry.evaluate(viewport, Some(id), |r| bounds.get(&r).copied())
        };
        deliver(due);
        Subscription::hold(strong)
    }

    fn strategy(&self) -> OracleStrategy {
        OracleStrategy::Native
    }
}

// ---------------------------------------------------------------------------
// Polling fallback
// ---------------------------------------------------------------------------

/// Oracle that samples a [`GeometryProbe`] on a fixed cadence.
///
/// The poll timer is owned by the oracle; dropping the oracle stops polling.
pub struct PollingOracle {
    registry: Rc<RefCell<ObserverRegistry>>,
    probe: Rc<dyn GeometryProbe>,
    _timer: TimerGuard,
}

impl PollingOracle {
    /// Start polling `probe` every `interval` on `scheduler`.
    pub fn new(scheduler: &Scheduler, probe: Rc<dyn GeometryProbe>, interval: Duration) -> Self {
        let registry = Rc::new(RefCell::new(ObserverRegistry::default()));
        let weak = Rc::downgrade(&registry);
        let timer_probe = Rc::clone(&probe);
        let timer = scheduler.every(interval, move |_| {
            let Some(registry) = weak.upgrade() else {
                return;
            };
            Self::poll(&registry, timer_probe.as_ref(), None);
        });
        Self {
            registry,
            probe,
            _timer: timer,
        }
    }

    fn poll(registry: &RefCell<ObserverRegistry>, probe: &dyn GeometryProbe, only: Option<u64>) {
        let viewport = probe.viewport();
        let due = registry
            .borrow_mut()
            .evaluate(&viewport, only, |r| probe.bounds(r));
        deliver(due);
    }

    /// Sample immediately instead of waiting for the next tick.
    pub fn poll_now(&self) {
        Self::poll(&self.registry, self.probe.as_ref(), None);
    }

    /// Number of live observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.registry.borrow().live_count()
    }
}

impl VisibilityOracle for PollingOracle {
    fn observe(
        &self,
        region: RegionId,
        options: ObserveOptions,
        callback: Box<dyn Fn(Visibility)>,
    ) -> Subscription {
        let strong: VisibilityCallback = Rc::from(callback);
        let id = self.registry.borrow_mut().register(region, options, &strong);
        Self::poll(&self.registry, self.probe.as_ref(), Some(id));
        Subscription::hold(strong)
    }

    fn strategy(&self) -> OracleStrategy {
        OracleStrategy::Polling
    }
}

// ---------------------------------------------------------------------------
// Always-visible fallback
// ---------------------------------------------------------------------------

/// Fail-open oracle: every region is reported fully visible immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysVisibleOracle;

impl VisibilityOracle for AlwaysVisibleOracle {
    fn observe(
        &self,
        region: RegionId,
        _options: ObserveOptions,
        callback: Box<dyn Fn(Visibility)>,
    ) -> Subscription {
        tracing::trace!(%region, "visibility.always_visible");
        callback(Visibility::FULL);
        Subscription::hold(callback)
    }

    fn strategy(&self) -> OracleStrategy {
        OracleStrategy::AlwaysVisible
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// The oracle chosen for a page session.
pub enum SelectedOracle {
    /// Event-driven.
    Native(NativeOracle),
    /// Polling fallback.
    Polling(PollingOracle),
    /// Fail-open fallback.
    AlwaysVisible(AlwaysVisibleOracle),
}

impl SelectedOracle {
    /// Borrow as the trait object controllers consume.
    #[must_use]
    pub fn as_oracle(&self) -> &dyn VisibilityOracle {
        match self {
            Self::Native(o) => o,
            Self::Polling(o) => o,
            Self::AlwaysVisible(o) => o,
        }
    }

    /// The native oracle, if selected (the host feeds it geometry).
    #[must_use]
    pub fn native(&self) -> Option<&NativeOracle> {
        match self {
            Self::Native(o) => Some(o),
            _ => None,
        }
    }
}

/// Pick an oracle for `caps`.
///
/// Polling needs a probe; if the host claims probe support but passes none,
/// selection falls through to always-visible.
pub fn select_oracle(
    caps: HostCapabilities,
    scheduler: &Scheduler,
    viewport: Rect,
    probe: Option<Rc<dyn GeometryProbe>>,
    poll_interval: Duration,
) -> SelectedOracle {
    let selected = match (caps.strategy(), probe) {
        (OracleStrategy::Native, _) => SelectedOracle::Native(NativeOracle::new(viewport)),
        (OracleStrategy::Polling, Some(probe)) => {
            SelectedOracle::Polling(PollingOracle::new(scheduler, probe, poll_interval))
        }
        _ => SelectedOracle::AlwaysVisible(AlwaysVisibleOracle),
    };
    tracing::debug!(
        strategy = ?selected.as_oracle().strategy(),
        ?caps,
        "visibility oracle selected"
    );
    selected
}
