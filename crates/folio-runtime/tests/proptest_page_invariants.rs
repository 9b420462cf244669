#![forbid(unsafe_code)]

//! Property-based invariant tests for the page controllers.
//!
//! ## Invariants
//!
//! 1. Sequencer percent never decreases and never exceeds 100.
//! 2. Phases only move forward.
//! 3. Active step is a pure function of percent.
//! 4. Scroll fraction and fade stay in `[0, 1]` for any input.
//! 5. Fade opacity is non-increasing in offset.
//! 6. Cursor style depends only on `(hovering, pressed)`.

use std::cell::RefCell;
use std::rc::Rc;

use folio_core::event::ScrollEvent;
use folio_runtime::{
    CursorColor, Phase, ProgressSequencer, Scheduler, ScrollConfig, ScrollState, SequencerConfig,
    Step, StepTable, cursor_style,
};
use proptest::prelude::*;
use web_time::Duration;

// ── Strategies ────────────────────────────────────────────────────────────

fn arb_step_table() -> impl Strategy<Value = StepTable> {
    prop::collection::vec((0u32..=100, "[A-Z ]{1,12}"), 0..8).prop_map(|raw| {
        StepTable::new(
            raw.into_iter()
                .map(|(t, label)| Step::new(f64::from(t), label))
                .collect(),
        )
    })
}

fn arb_config() -> impl Strategy<Value = SequencerConfig> {
    (1u64..=60, 1u32..=400, 0u64..=800, 0u64..=800).prop_map(|(tick, step_x10, settle, exit)| {
        SequencerConfig {
            tick_interval: Duration::from_millis(tick),
            step: f64::from(step_x10) / 10.0,
            settle_delay: Duration::from_millis(settle),
            exit_delay: Duration::from_millis(exit),
        }
    })
}

fn arb_advances() -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(0u64..=500, 1..60)
}

fn arb_scroll() -> impl Strategy<Value = f64> {
    prop_oneof![
        -1e6..1e6f64,
        Just(f64::NAN),
        Just(f64::INFINITY),
        Just(f64::NEG_INFINITY),
        Just(0.0),
    ]
}

// ── 1-3. Sequencer ────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn percent_monotone_and_bounded(config in arb_config(), steps in arb_advances()) {
        let sched = Scheduler::new();
        let seq = ProgressSequencer::new(config, StepTable::profile());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let _sub = seq.state().subscribe(move |st| s.borrow_mut().push((st.percent, st.phase)));
        seq.start(&sched, || {});
        for dt in steps {
            sched.advance(Duration::from_millis(dt));
        }
        let seen = seen.borrow();
        for pair in seen.windows(2) {
            prop_assert!(pair[1].0 >= pair[0].0);
            prop_assert!(pair[1].1 >= pair[0].1);
        }
        for (p, _) in seen.iter() {
            prop_assert!((0.0..=100.0).contains(p));
        }
    }

    #[test]
    fn completion_fires_exactly_once(config in arb_config()) {
        let sched = Scheduler::new();
        let seq = ProgressSequencer::new(config, StepTable::profile());
        let count = Rc::new(RefCell::new(0u32));
        let c = Rc::clone(&count);
        seq.start(&sched, move || *c.borrow_mut() += 1);
        let horizon = config.tick_interval * (config.ticks_to_complete() + 1)
            + config.settle_delay
            + config.exit_delay;
        sched.advance(horizon);
        sched.advance(Duration::from_secs(30));
        prop_assert_eq!(*count.borrow(), 1);
        prop_assert_eq!(seq.snapshot().phase, Phase::Done);
        prop_assert_eq!(seq.snapshot().percent, 100.0);
    }

    #[test]
    fn active_step_is_deterministic(table in arb_step_table(), p in 0.0..=100.0f64) {
        let a = table.active_index(p);
        prop_assert_eq!(a, table.clone().active_index(p));
        match a {
            Some(i) => {
                prop_assert!(table.steps()[i].threshold <= p);
                prop_assert!(table.steps()[i + 1..].iter().all(|s| s.threshold > p));
            }
            None => prop_assert!(table.steps().iter().all(|s| s.threshold > p)),
        }
    }
}

// ── 4-5. Scroll ───────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn scroll_outputs_bounded(offset in arb_scroll(), range in arb_scroll()) {
        let s = ScrollState::compute(&ScrollConfig::default(), ScrollEvent::new(offset, range));
        prop_assert!((0.0..=1.0).contains(&s.fraction));
        prop_assert!((0.0..=1.0).contains(&s.fade_opacity));
        prop_assert!(s.percent() <= 100);
        if !(range > 0.0) {
            prop_assert_eq!(s.fraction, 0.0);
            prop_assert_eq!(s.fade_opacity, 1.0);
        }
    }

    #[test]
    fn fade_non_increasing(a in 0.0..1e4f64, b in 0.0..1e4f64) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let cfg = ScrollConfig::default();
        let fade = |o| ScrollState::compute(&cfg, ScrollEvent::new(o, 1e5)).fade_opacity;
        prop_assert!(fade(hi) <= fade(lo));
    }
}

// ── 6. Cursor ─────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn cursor_mapping_exact(hovering: bool, pressed: bool) {
        let style = cursor_style(hovering, pressed);
        let expected_size = match (hovering, pressed) {
            (_, true) => 24.0,
            (true, false) => 36.0,
            (false, false) => 28.0,
        };
        prop_assert_eq!(style.size, expected_size);
        prop_assert_eq!(
            style.color,
            if hovering { CursorColor::Accent } else { CursorColor::Base }
        );
        prop_assert_eq!(style.arm, style.size / 2.0 - style.gap);
    }
}
