#![forbid(unsafe_code)]

//! Boot progress sequencer.
//!
//! A fixed-interval timer advances `percent` by a constant step until it
//! reaches 100. The sequencer then waits out a settle delay, enters
//! [`Phase::Exiting`] for the exit animation, and finally moves to
//! [`Phase::Done`] and runs the completion callback exactly once.
//!
//! ```text
//!  Running ──(percent = 100, settle)──▶ Exiting ──(exit delay)──▶ Done
//! ```
//!
//! State is published through an [`Observable<ProgressState>`]. All timers
//! are [`TimerGuard`]s owned by the sequencer; dropping the sequencer or
//! calling [`ProgressSequencer::cancel`] releases them, and any callback
//! still queued becomes a no-op.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use web_time::Duration;

use crate::reactive::Observable;
use crate::timer::{Scheduler, TimerGuard};

/// Upper bound for `percent`.
pub const COMPLETE: f64 = 100.0;

/// Lifecycle phase. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// Ticking toward 100.
    Running,
    /// Progress complete; exit animation playing.
    Exiting,
    /// Sequence finished; main content may mount.
    Done,
}

/// Snapshot of the sequencer.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressState {
    /// Progress in `[0, 100]`.
    pub percent: f64,
    /// Current phase.
    pub phase: Phase,
    /// Index into the [`StepTable`] of the active step, if any.
    pub active_step: Option<usize>,
}

impl ProgressState {
    /// Integer readout: `min(100, round(percent))`.
    #[must_use]
    pub fn display_percent(&self) -> u8 {
        display_percent(self.percent)
    }
}

/// `min(100, round(p))` clamped into `u8`.
#[must_use]
pub fn display_percent(p: f64) -> u8 {
    if p.is_nan() {
        return 0;
    }
    p.round().clamp(0.0, COMPLETE) as u8
}

/// A named milestone.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "policy-config", derive(serde::Serialize, serde::Deserialize))]
pub struct Step {
    /// Percent at which the step becomes active.
    pub threshold: f64,
    /// Text shown while the step is active.
    pub label: String,
}

impl Step {
    /// Build a step.
    pub fn new(threshold: f64, label: impl Into<String>) -> Self {
        Self {
            threshold,
            label: label.into(),
        }
    }
}

/// Ordered milestone table.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(
    feature = "policy-config",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct StepTable {
    steps: Vec<Step>,
}

impl StepTable {
    /// Wrap a list of steps as declared.
    #[must_use]
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// The profile page's boot sequence.
    #[must_use]
    pub fn profile() -> Self {
        Self::new(vec![
            Step::new(0.0, "LOADING PROFILE DATA"),
            Step::new(20.0, "INITIALIZING CAD MODULES"),
            Step::new(45.0, "RENDERING SPEC SHEETS"),
            Step::new(70.0, "CALIBRATING INSTRUMENTS"),
            Step::new(90.0, "SYSTEM READY"),
        ])
    }

    /// Index of the last-declared step whose threshold is `<= percent`.
    ///
    /// NaN thresholds never qualify, so a malformed table degrades to `None`
    /// rather than a wrong label.
    #[must_use]
    pub fn active_index(&self, percent: f64) -> Option<usize> {
        self.steps.iter().rposition(|s| s.threshold <= percent)
    }

    /// Label of the step at `index`.
    #[must_use]
    pub fn label(&self, index: usize) -> Option<&str> {
        self.steps.get(index).map(|s| s.label.as_str())
    }

    /// Label active at `percent`.
    #[must_use]
    pub fn active_label(&self, percent: f64) -> Option<&str> {
        self.active_index(percent).and_then(|i| self.label(i))
    }

    /// Steps in declaration order.
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Structural problems. An empty list means the table is well formed.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for (i, step) in self.steps.iter().enumerate() {
            if !step.threshold.is_finite() {
                errors.push(format!("steps[{i}].threshold must be finite"));
            } else if !(0.0..=COMPLETE).contains(&step.threshold) {
                errors.push(format!("steps[{i}].threshold must be in [0, 100]"));
            }
        }
        if self
            .steps
            .windows(2)
            .any(|w| w[1].threshold < w[0].threshold)
        {
            errors.push("steps must be ordered by ascending threshold".to_string());
        }
        errors
    }
}

/// Timing knobs for [`ProgressSequencer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequencerConfig {
    /// Period of the progress timer.
    pub tick_interval: Duration,
    /// Percent added per tick.
    pub step: f64,
    /// Pause at 100 before the exit animation.
    pub settle_delay: Duration,
    /// Length of the exit animation.
    pub exit_delay: Duration,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(28),
            step: 1.6,
            settle_delay: Duration::from_millis(400),
            exit_delay: Duration::from_millis(700),
        }
    }
}

impl SequencerConfig {
    /// Choose `step` so progress takes roughly `total` at the current tick
    /// interval. A zero `total` completes on the first tick.
    #[must_use]
    pub fn with_nominal_duration(mut self, total: Duration) -> Self {
        self.step = if total.is_zero() {
            COMPLETE
        } else {
            COMPLETE * self.tick_interval.as_secs_f64() / total.as_secs_f64()
        };
        self
    }

    /// Ticks needed to reach 100.
    #[must_use]
    pub fn ticks_to_complete(&self) -> u32 {
        (COMPLETE / self.effective_step()).ceil() as u32
    }

    /// `step`, or the default if it is not a positive finite number.
    fn effective_step(&self) -> f64 {
        if self.step.is_finite() && self.step > 0.0 {
            self.step
        } else {
            Self::default().step
        }
    }

    /// Structural problems with these values.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.tick_interval.is_zero() {
            errors.push("sequencer.tick_interval must be > 0".to_string());
        }
        if !(self.step.is_finite() && self.step > 0.0) {
            errors.push("sequencer.step must be a positive number".to_string());
        }
        errors
    }
}

type Completion = Box<dyn FnOnce()>;

#[derive(Default)]
struct Run {
    started: bool,
    ticks: u32,
    /// Scheduler time at which the current phase began.
    phase_at: Duration,
    interval: Option<TimerGuard>,
    delay: Option<TimerGuard>,
    on_complete: Option<Completion>,
}

/// Timer-driven boot progress state machine.
pub struct ProgressSequencer {
    config: SequencerConfig,
    steps: Rc<StepTable>,
    state: Observable<ProgressState>,
    run: Rc<RefCell<Run>>,
}

impl std::fmt::Debug for ProgressSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let run = self.run.borrow();
        f.debug_struct("ProgressSequencer")
            .field("config", &self.config)
            .field("state", &self.state.get())
            .field("ticks", &run.ticks)
            .finish_non_exhaustive()
    }
}

impl ProgressSequencer {
    /// Create an idle sequencer.
    #[must_use]
    pub fn new(config: SequencerConfig, steps: StepTable) -> Self {
        if !config.validate().is_empty() {
            tracing::warn!(?config, "invalid sequencer config; using default step");
        }
        let initial = ProgressState {
            percent: 0.0,
            phase: Phase::Running,
            active_step: steps.active_index(0.0),
        };
        Self {
            config,
            steps: Rc::new(steps),
            state: Observable::new(initial),
            run: Rc::new(RefCell::new(Run::default())),
        }
    }

    /// Begin ticking. Calling `start` a second time does nothing and returns
    /// `false`.
    pub fn start(&self, scheduler: &Scheduler, on_complete: impl FnOnce() + 'static) -> bool {
        {
            let mut run = self.run.borrow_mut();
            if run.started {
                return false;
            }
            run.started = true;
            run.phase_at = scheduler.now();
            run.on_complete = Some(Box::new(on_complete));
        }

        let weak = Rc::downgrade(&self.run);
        let state = self.state.clone();
        let steps = Rc::clone(&self.steps);
        let config = self.config;
        let step = config.effective_step();
        let interval = scheduler.every(config.tick_interval, move |sched| {
            let Some(run) = weak.upgrade() else {
                return;
            };
            let ticks = {
                let mut r = run.borrow_mut();
                r.ticks += 1;
                r.ticks
            };
            let percent = (f64::from(ticks) * step).min(COMPLETE);
            let active_step = steps.active_index(percent);
            tracing::trace!(ticks, percent, ?active_step, "sequencer.tick");
            state.set(ProgressState {
                percent,
                phase: Phase::Running,
                active_step,
            });
            if percent >= COMPLETE {
                Self::settle(&run, sched, &state, config);
            }
        });
        self.run.borrow_mut().interval = Some(interval);
        tracing::debug!(
            interval = ?config.tick_interval,
            step,
            ticks = config.ticks_to_complete(),
            "sequencer started"
        );
        true
    }

    fn settle(
        run: &Rc<RefCell<Run>>,
        scheduler: &Scheduler,
        state: &Observable<ProgressState>,
        config: SequencerConfig,
    ) {
        let weak = Rc::downgrade(run);
        let state = state.clone();
        let settle = scheduler.once(config.settle_delay, move |sched| {
            let Some(run) = weak.upgrade() else {
                return;
            };
            run.borrow_mut().phase_at = sched.now();
            state.update(|s| s.phase = Phase::Exiting);
            tracing::debug!("sequencer exiting");
            let exit = Self::schedule_exit(&run, sched, &state, config.exit_delay);
            run.borrow_mut().delay = Some(exit);
        });
        let interval = {
            let mut r = run.borrow_mut();
            r.delay = Some(settle);
            r.interval.take()
        };
        drop(interval);
    }

    fn schedule_exit(
        run: &Rc<RefCell<Run>>,
        scheduler: &Scheduler,
        state: &Observable<ProgressState>,
        delay: Duration,
    ) -> TimerGuard {
        let weak: Weak<RefCell<Run>> = Rc::downgrade(run);
        let state = state.clone();
        scheduler.once(delay, move |sched| {
            let Some(run) = weak.upgrade() else {
                return;
            };
            let on_complete = {
                let mut r = run.borrow_mut();
                r.phase_at = sched.now();
                r.on_complete.take()
            };
            state.update(|s| s.phase = Phase::Done);
            tracing::debug!("sequencer done");
            if let Some(cb) = on_complete {
                cb();
            }
        })
    }

    /// Release all timers and the pending completion callback. The published
    /// state freezes where it is.
    pub fn cancel(&self) {
        let (interval, delay, on_complete) = {
            let mut run = self.run.borrow_mut();
            (
                run.interval.take(),
                run.delay.take(),
                run.on_complete.take(),
            )
        };
        if interval.is_some() || delay.is_some() {
            tracing::debug!("sequencer cancelled");
        }
        drop((interval, delay, on_complete));
    }

    /// Handle to the published state.
    #[must_use]
    pub fn state(&self) -> Observable<ProgressState> {
        self.state.clone()
    }

    /// Current state.
    #[must_use]
    pub fn snapshot(&self) -> ProgressState {
        self.state.get()
    }

    /// Integer readout of the current percent.
    #[must_use]
    pub fn display_percent(&self) -> u8 {
        self.state.with(ProgressState::display_percent)
    }

    /// Label of the active step.
    #[must_use]
    pub fn active_label(&self) -> Option<String> {
        let idx = self.state.with(|s| s.active_step)?;
        self.steps.label(idx).map(str::to_owned)
    }

    #[must_use]
    pub fn steps(&self) -> &StepTable {
        &self.steps
    }

    #[must_use]
    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    /// Scheduler time at which the current phase began; `None` before
    /// [`start`](Self::start).
    ///
    /// Exit and fade animations are sampled from this instant.
    #[must_use]
    pub fn phase_started(&self) -> Option<Duration> {
        let run = self.run.borrow();
        run.started.then_some(run.phase_at)
    }

    /// Ticks observed so far.
    #[must_use]
    pub fn ticks(&self) -> u32 {
        self.run.borrow().ticks
    }

    /// Whether any sequencer timer is still pending.
    #[must_use]
    pub fn is_active(&self) -> bool {
        let run = self.run.borrow();
        run.interval.as_ref().is_some_and(TimerGuard::is_pending)
            || run.delay.as_ref().is_some_and(TimerGuard::is_pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn active_index_picks_last_qualifying() {
        let t = StepTable::profile();
        assert_eq!(t.active_index(0.0), Some(0));
        assert_eq!(t.active_index(19.99), Some(0));
        assert_eq!(t.active_index(20.0), Some(1));
        assert_eq!(t.active_index(100.0), Some(4));
        assert_eq!(t.active_label(72.0), Some("CALIBRATING INSTRUMENTS"));
    }

    #[test]
    fn lettered_table_resolves_at_boundaries() {
        let t = StepTable::new(
            [(0.0, "A"), (20.0, "B"), (45.0, "C"), (70.0, "D"), (90.0, "E")]
                .into_iter()
                .map(|(at, label)| Step::new(at, label))
                .collect(),
        );
        let cases = [
            (0.0, "A"),
            (19.0, "A"),
            (20.0, "B"),
            (44.0, "B"),
            (45.0, "C"),
            (100.0, "E"),
        ];
        for (percent, label) in cases {
            assert_eq!(t.active_label(percent), Some(label), "at {percent}");
        }
    }

    #[test]
    fn active_index_edge_cases() {
        assert_eq!(StepTable::default().active_index(50.0), None);
        let dup = StepTable::new(vec![Step::new(10.0, "a"), Step::new(10.0, "b")]);
        assert_eq!(dup.active_index(10.0), Some(1));
        let late = StepTable::new(vec![Step::new(50.0, "x")]);
        assert_eq!(late.active_index(10.0), None);
        let nan = StepTable::new(vec![Step::new(f64::NAN, "x")]);
        assert_eq!(nan.active_index(50.0), None);
    }

    #[test]
    fn validate_flags_bad_tables() {
        assert!(StepTable::profile().validate().is_empty());
        let bad = StepTable::new(vec![Step::new(50.0, "b"), Step::new(f64::NAN, "a")]);
        assert_eq!(bad.validate().len(), 1);
        let unordered = StepTable::new(vec![Step::new(50.0, "b"), Step::new(10.0, "a")]);
        assert_eq!(
            unordered.validate(),
            vec!["steps must be ordered by ascending threshold".to_string()]
        );
    }

    #[test]
    fn display_percent_rounds_and_caps() {
        assert_eq!(display_percent(99.2), 99);
        assert_eq!(display_percent(99.5), 100);
        assert_eq!(display_percent(140.0), 100);
        assert_eq!(display_percent(f64::NAN), 0);
    }

    #[test]
    fn nominal_duration_derives_step() {
        let cfg = SequencerConfig::default().with_nominal_duration(ms(1750));
        assert!((cfg.step - 1.6).abs() < 1e-9);
        assert_eq!(SequencerConfig::default().ticks_to_complete(), 63);
        let instant = SequencerConfig::default().with_nominal_duration(Duration::ZERO);
        assert_eq!(instant.ticks_to_complete(), 1);
    }

    #[test]
    fn runs_to_completion() {
        let sched = Scheduler::new();
        let seq = ProgressSequencer::new(SequencerConfig::default(), StepTable::profile());
        let done = Rc::new(Cell::new(0));
        let d = Rc::clone(&done);
        assert!(seq.start(&sched, move || d.set(d.get() + 1)));

        sched.advance_to(ms(28 * 62));
        assert_eq!(seq.snapshot().phase, Phase::Running);
        assert_eq!(seq.display_percent(), 99);

        sched.advance_to(ms(28 * 63));
        assert_eq!(seq.snapshot().percent, 100.0);
        assert_eq!(seq.active_label().as_deref(), Some("SYSTEM READY"));

        sched.advance_to(ms(28 * 63 + 399));
        assert_eq!(seq.snapshot().phase, Phase::Running);
        sched.advance_to(ms(28 * 63 + 400));
        assert_eq!(seq.snapshot().phase, Phase::Exiting);
        sched.advance_to(ms(28 * 63 + 1099));
        assert_eq!(done.get(), 0);
        sched.advance_to(ms(28 * 63 + 1100));
        assert_eq!(seq.snapshot().phase, Phase::Done);
        assert_eq!(done.get(), 1);

        sched.advance(Duration::from_secs(10));
        assert_eq!(done.get(), 1);
        assert_eq!(seq.ticks(), 63);
        assert_eq!(sched.pending(), 0);
    }

    #[test]
    fn phase_start_times_are_recorded() {
        let sched = Scheduler::new();
        sched.advance_to(ms(50));
        let seq = ProgressSequencer::new(SequencerConfig::default(), StepTable::profile());
        assert_eq!(seq.phase_started(), None);
        seq.start(&sched, || {});
        assert_eq!(seq.phase_started(), Some(ms(50)));

        // One long host step still stamps each phase at its own due time.
        sched.advance(Duration::from_secs(2));
        assert_eq!(seq.snapshot().phase, Phase::Exiting);
        assert_eq!(seq.phase_started(), Some(ms(50 + 28 * 63 + 400)));
        sched.advance(Duration::from_secs(1));
        assert_eq!(seq.snapshot().phase, Phase::Done);
        assert_eq!(seq.phase_started(), Some(ms(50 + 28 * 63 + 1100)));
    }

    #[test]
    fn second_start_is_ignored() {
        let sched = Scheduler::new();
        let seq = ProgressSequencer::new(SequencerConfig::default(), StepTable::profile());
        assert!(seq.start(&sched, || {}));
        assert!(!seq.start(&sched, || {}));
        assert_eq!(sched.pending(), 1);
    }

    #[test]
    fn cancel_mid_run_freezes_state() {
        let sched = Scheduler::new();
        let seq = ProgressSequencer::new(SequencerConfig::default(), StepTable::profile());
        let done = Rc::new(Cell::new(false));
        let d = Rc::clone(&done);
        seq.start(&sched, move || d.set(true));
        sched.advance_to(ms(280));
        seq.cancel();
        let frozen = seq.snapshot();
        sched.advance(Duration::from_secs(5));
        assert_eq!(seq.snapshot(), frozen);
        assert!(!done.get());
        assert!(!seq.is_active());
    }

    #[test]
    fn drop_during_settle_releases_timers() {
        let sched = Scheduler::new();
        let seq = ProgressSequencer::new(SequencerConfig::default(), StepTable::profile());
        let done = Rc::new(Cell::new(false));
        let d = Rc::clone(&done);
        seq.start(&sched, move || d.set(true));
        sched.advance_to(ms(28 * 63 + 100));
        assert_eq!(sched.pending(), 1);
        drop(seq);
        assert_eq!(sched.pending(), 0);
        sched.advance(Duration::from_secs(5));
        assert!(!done.get());
    }

    #[test]
    fn observers_see_every_tick_then_phases() {
        let sched = Scheduler::new();
        let seq = ProgressSequencer::new(SequencerConfig::default(), StepTable::profile());
        let phases = Rc::new(RefCell::new(Vec::new()));
        let p = Rc::clone(&phases);
        let _sub = seq.state().subscribe(move |s| p.borrow_mut().push(s.phase));
        seq.start(&sched, || {});
        sched.advance(Duration::from_secs(5));
        let phases = phases.borrow();
        assert_eq!(phases.len(), 63 + 2);
        assert_eq!(phases[62], Phase::Running);
        assert_eq!(phases[63], Phase::Exiting);
        assert_eq!(phases[64], Phase::Done);
    }

    #[test]
    fn invalid_step_falls_back_to_default() {
        let cfg = SequencerConfig {
            step: -1.0,
            ..SequencerConfig::default()
        };
        assert_eq!(cfg.validate().len(), 1);
        assert_eq!(cfg.ticks_to_complete(), 63);
    }
}
