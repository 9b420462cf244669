#![forbid(unsafe_code)]

//! E2E: boot sequence, then reveals and lazy media once content mounts.
//!
//! Covers:
//! 1. 63 ticks at 28 ms reach 100% with the final step label
//! 2. Settle then exit delays, completion exactly once
//! 3. Reveals and media wired to a native oracle after completion
//! 4. Tracing events for ticks, reveal, and media load
//!
//! Run:
//!   cargo test -p folio-runtime --test e2e_boot_sequence

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use folio_core::event::RegionId;
use folio_core::geometry::Rect;
use folio_runtime::{
    EntranceConfig, LazyMedia, MediaConfig, MediaId, MediaRequest, NativeOracle, Phase,
    ProgressSequencer, RevealController, Scheduler, SequencerConfig, StepTable,
};
use pretty_assertions::assert_eq;
use tracing_subscriber::layer::SubscriberExt;
use web_time::Duration;

// ============================================================================
// Tracing capture
// ============================================================================

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    message: String,
}

struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

struct MessageVisitor(String);

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for EventCapture {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message: visitor.0,
        });
    }
}

fn capture<R>(f: impl FnOnce() -> R) -> (R, Vec<CapturedEvent>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry().with(EventCapture {
        events: events.clone(),
    });
    let out = tracing::subscriber::with_default(subscriber, f);
    let events = events.lock().unwrap().clone();
    (out, events)
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

// ============================================================================
// Scenario
// ============================================================================

#[test]
fn boot_then_content() {
    let ((), events) = capture(|| {
        let sched = Scheduler::new();
        let seq = ProgressSequencer::new(SequencerConfig::default(), StepTable::profile());
        let completions = Rc::new(Cell::new(0));
        let c = Rc::clone(&completions);
        seq.start(&sched, move || c.set(c.get() + 1));

        // 1. Progress
        sched.advance_to(ms(28 * 63));
        let state = seq.snapshot();
        assert_eq!(state.percent, 100.0);
        assert_eq!(state.phase, Phase::Running);
        assert_eq!(seq.active_label().as_deref(), Some("SYSTEM READY"));
        assert_eq!(seq.display_percent(), 100);

        // 2. Settle and exit
        sched.advance(ms(400));
        assert_eq!(seq.snapshot().phase, Phase::Exiting);
        sched.advance(ms(699));
        assert_eq!(completions.get(), 0);
        sched.advance(ms(1));
        assert_eq!(seq.snapshot().phase, Phase::Done);
        assert_eq!(completions.get(), 1);

        // 3. Content
        let oracle = NativeOracle::new(Rect::from_size(1280.0, 720.0));
        let reveals = RevealController::new(&sched, EntranceConfig::default());
        let about = reveals.attach(&oracle, RegionId(1), -100.0, Duration::ZERO);
        let projects = reveals.attach(&oracle, RegionId(2), -100.0, ms(150));

        let requests: Rc<RefCell<Vec<MediaRequest>>> = Rc::new(RefCell::new(Vec::new()));
        let demo = LazyMedia::mount(
            &oracle,
            RegionId(3),
            MediaId::new("dQw4w9WgXcQ"),
            &MediaConfig::default(),
            requests.clone(),
        );

        oracle.report(RegionId(1), Rect::new(0.0, 80.0, 1280.0, 500.0));
        oracle.report(RegionId(2), Rect::new(0.0, 900.0, 1280.0, 800.0));
        oracle.report(RegionId(3), Rect::new(0.0, 2000.0, 1280.0, 720.0));
        assert!(about.has_fired());
        assert!(!projects.has_fired());
        assert!(!demo.is_loaded());

        // Scroll down a screen.
        sched.advance(ms(500));
        oracle.report(RegionId(2), Rect::new(0.0, 180.0, 1280.0, 800.0));
        oracle.report(RegionId(3), Rect::new(0.0, 300.0, 1280.0, 720.0));
        assert!(projects.has_fired());
        assert!(demo.is_loaded());
        assert_eq!(requests.borrow().len(), 1);

        let fired_at = projects.fired_at().expect("fired");
        let shown = reveals.entrance(&projects, fired_at + ms(750));
        assert_eq!(shown.opacity, 1.0);
        assert_eq!(shown.offset, 0.0);

        assert_eq!(completions.get(), 1);
        assert_eq!(sched.pending(), 0);
    });

    let count = |msg: &str| events.iter().filter(|e| e.message == msg).count();
    assert_eq!(count("sequencer.tick"), 63);
    assert_eq!(count("sequencer done"), 1);
    assert_eq!(count("reveal fired"), 2);
    assert_eq!(count("media load requested"), 1);
    assert!(
        events
            .iter()
            .filter(|e| e.message == "sequencer.tick")
            .all(|e| e.level == tracing::Level::TRACE)
    );
}

#[test]
fn teardown_mid_sequence_is_silent() {
    let sched = Scheduler::new();
    let completions = Rc::new(Cell::new(0));
    {
        let seq = ProgressSequencer::new(SequencerConfig::default(), StepTable::profile());
        let c = Rc::clone(&completions);
        seq.start(&sched, move || c.set(c.get() + 1));
        sched.advance(ms(1000));
    }
    assert_eq!(sched.pending(), 0);
    sched.advance(Duration::from_secs(10));
    assert_eq!(completions.get(), 0);
}
