#![forbid(unsafe_code)]

//! Host-driven timer scheduler.
//!
//! [`Scheduler`] replaces `setInterval`/`setTimeout` for a runtime that owns
//! no clock: the host calls [`Scheduler::advance_to`] with its monotonic time
//! and every due timer fires in order, each one observing `now()` equal to
//! its own due time.
//!
//! # Invariants
//!
//! 1. Timers fire in `(due, registration order)` order.
//! 2. A timer whose [`TimerGuard`] has been dropped never fires again.
//! 3. Callbacks run with no scheduler borrow held: they may schedule new
//!    timers, cancel themselves, or cancel others.
//! 4. A timer scheduled from inside a callback is measured from the firing
//!    timer's due time, not from the host's target time.
//! 5. Time never moves backwards; `advance_to` with an earlier instant is a
//!    no-op.
//! 6. A repeating timer replays at most [`MAX_CATCH_UP`] missed periods per
//!    `advance_to`; older ones are dropped. A repeating timer whose next due
//!    time would overflow is disarmed after its last firing.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use web_time::Duration;

/// Smallest allowed period for a repeating timer.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Missed periods a repeating timer replays after a long host step.
pub const MAX_CATCH_UP: u32 = 4096;

type TimerCallback = Rc<dyn Fn(&Scheduler)>;

struct TimerEntry {
    id: u64,
    due: Duration,
    period: Option<Duration>,
    callback: TimerCallback,
}

struct SchedulerInner {
    now: Duration,
    next_id: u64,
    entries: Vec<TimerEntry>,
}

/// Shared handle to the page's timer queue.
///
/// Cloning shares the same queue.
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<RefCell<SchedulerInner>>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Scheduler")
            .field("now", &inner.now)
            .field("pending", &inner.entries.len())
            .finish()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// Create an empty scheduler at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SchedulerInner {
                now: Duration::ZERO,
                next_id: 1,
                entries: Vec::new(),
            })),
        }
    }

    /// Current scheduler time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.inner.borrow().now
    }

    /// Number of armed timers.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    /// Due time of the earliest armed timer.
    #[must_use]
    pub fn next_due(&self) -> Option<Duration> {
        self.inner.borrow().entries.iter().map(|e| e.due).min()
    }

    /// Fire `callback` every `interval` (first firing one interval from now).
    ///
    /// Intervals under 1ms are raised to 1ms.
    pub fn every(&self, interval: Duration, callback: impl Fn(&Scheduler) + 'static) -> TimerGuard {
        let period = interval.max(MIN_PERIOD);
        self.arm(period, Some(period), Rc::new(callback))
    }

    /// Fire `callback` once after `delay`.
    pub fn once(&self, delay: Duration, callback: impl Fn(&Scheduler) + 'static) -> TimerGuard {
        self.arm(delay, None, Rc::new(callback))
    }

    fn arm(&self, delay: Duration, period: Option<Duration>, callback: TimerCallback) -> TimerGuard {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        let due = inner.now.saturating_add(delay);
        inner.entries.push(TimerEntry {
            id,
            due,
            period,
            callback,
        });
        tracing::trace!(timer_id = id, due_ms = due.as_millis() as u64, "timer.arm");
        TimerGuard {
            id,
            scheduler: Rc::downgrade(&self.inner),
        }
    }

    /// Advance by `dt`, firing every timer that becomes due.
    pub fn advance(&self, dt: Duration) -> usize {
        let target = self.now().saturating_add(dt);
        self.advance_to(target)
    }

    /// Advance to absolute time `target`, firing due timers in order.
    ///
    /// Returns the number of callbacks invoked.
    pub fn advance_to(&self, target: Duration) -> usize {
        let mut fired = 0;
        loop {
            let callback = {
                let mut inner = self.inner.borrow_mut();
                if target < inner.now {
                    return fired;
                }
                for entry in &mut inner.entries {
                    if let Some(period) = entry.period {
                        entry.due = skip_backlog(entry.due, period, target);
                    }
                }
                let Some(idx) = inner
                    .entries
                    .iter()
                    .enumerate()
                    .filter(|(_, e)| e.due <= target)
                    .min_by_key(|(_, e)| (e.due, e.id))
                    .map(|(idx, _)| idx)
                else {
                    break;
                };
                let due = inner.entries[idx].due;
                inner.now = due;
                // Re-arm before the call so a self-cancel inside the callback
                // removes the rearmed entry.
                match inner.entries[idx].period.and_then(|p| due.checked_add(p)) {
                    Some(next) => {
                        inner.entries[idx].due = next;
                        Rc::clone(&inner.entries[idx].callback)
                    }
                    None => {
                        let entry = inner.entries.swap_remove(idx);
                        if entry.period.is_some() {
                            tracing::debug!(timer_id = entry.id, "timer.disarm overflow");
                        }
                        entry.callback
                    }
                }
            };
            callback(self);
            fired += 1;
        }
        let mut inner = self.inner.borrow_mut();
        inner.now = inner.now.max(target);
        fired
    }
}

/// Move `due` forward so at most [`MAX_CATCH_UP`] periods remain up to
/// `target`, keeping the timer on its original phase.
fn skip_backlog(due: Duration, period: Duration, target: Duration) -> Duration {
    let Some(behind) = target.checked_sub(due) else {
        return due;
    };
    let missed = behind.as_nanos() / period.as_nanos();
    let keep = u128::from(MAX_CATCH_UP) - 1;
    if missed <= keep {
        return due;
    }
    let skip = period.as_nanos().saturating_mul(missed - keep);
    let secs = u64::try_from(skip / 1_000_000_000).unwrap_or(u64::MAX);
    let nanos = (skip % 1_000_000_000) as u32;
    tracing::trace!(skipped = (missed - keep) as u64, "timer.catch_up");
    due.saturating_add(Duration::new(secs, nanos))
}

/// RAII handle for an armed timer. Dropping it cancels the timer.
#[must_use = "dropping a TimerGuard cancels the timer"]
pub struct TimerGuard {
    id: u64,
    scheduler: Weak<RefCell<SchedulerInner>>,
}

impl TimerGuard {
    /// Scheduler-unique timer id.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether the timer is still armed (one-shots disarm after firing).
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.scheduler
            .upgrade()
            .is_some_and(|inner| inner.borrow().entries.iter().any(|e| e.id == self.id))
    }

    /// Cancel explicitly. Equivalent to dropping the guard.
    pub fn cancel(self) {}
}

impl std::fmt::Debug for TimerGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerGuard").field("id", &self.id).finish()
    }
}

impl Drop for TimerGuard {
    fn drop(&mut self) {
        let Some(inner) = self.scheduler.upgrade() else {
            return;
        };
        // Take the entry out first so its callback is dropped after the
        // borrow is released.
        let removed = {
            let mut inner = inner.borrow_mut();
            inner
                .entries
                .iter()
                .position(|e| e.id == self.id)
                .map(|idx| inner.entries.swap_remove(idx))
        };
        if removed.is_some() {
            tracing::trace!(timer_id = self.id, "timer.cancel");
        }
    }
}
