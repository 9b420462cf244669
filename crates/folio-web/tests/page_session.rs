#![forbid(unsafe_code)]

//! E2E: a full page visit driven frame by frame.
//!
//! Run:
//!   cargo test -p folio-web --test page_session

use std::cell::Cell;
use std::rc::Rc;

use folio_core::event::{Event, PointerEvent, PointerEventKind, RegionId, ScrollEvent};
use folio_core::geometry::Rect;
use folio_runtime::{GeometryProbe, MediaId, MediaView, OracleStrategy, PageConfig};
use folio_web::{HostEnv, PageSession};
use pretty_assertions::assert_eq;
use std::time::Duration;

const FRAME: Duration = Duration::from_millis(16);
const VIEWPORT_H: f64 = 800.0;

/// Sections stacked 1000px apart; region N starts at `N * 1000`.
struct Document {
    scroll: Cell<f64>,
}

impl GeometryProbe for Document {
    fn viewport(&self) -> Rect {
        Rect::from_size(1200.0, VIEWPORT_H)
    }

    fn bounds(&self, region: RegionId) -> Option<Rect> {
        let top = region.0 as f64 * 1000.0 - self.scroll.get();
        Some(Rect::new(0.0, top, 1200.0, 700.0))
    }
}

fn run_frames(session: &mut PageSession, n: usize) {
    for _ in 0..n {
        session.advance_time(FRAME);
        session.step();
    }
}

#[test]
fn polling_host_full_visit() {
    let doc = Rc::new(Document {
        scroll: Cell::new(0.0),
    });
    let host = HostEnv::polling(Rect::from_size(1200.0, VIEWPORT_H), doc.clone());
    let mut session = PageSession::new(PageConfig::default(), host).expect("session");
    assert_eq!(session.oracle_strategy(), OracleStrategy::Polling);

    session.add_section("hero", RegionId(0));
    session.add_group_item("projects", RegionId(2), 1);
    session.add_media(RegionId(3), MediaId::new("demo-video"));

    // Boot: about 2.9s of frames.
    let mut labels = Vec::new();
    while !session.is_content_ready() {
        session.advance_time(FRAME);
        if let Some(loading) = session.step().loading
            && let Some(label) = loading.label
            && labels.last() != Some(&label)
        {
            labels.push(label);
        }
        assert!(session.now() < Duration::from_secs(4), "boot never finished");
    }
    assert_eq!(
        labels,
        vec![
            "LOADING PROFILE DATA",
            "INITIALIZING CAD MODULES",
            "RENDERING SPEC SHEETS",
            "CALIBRATING INSTRUMENTS",
            "SYSTEM READY",
        ]
    );

    let frame = session.step();
    assert!(frame.content_opacity < 1.0);
    assert_eq!(frame.sections.len(), 2);
    assert!(frame.sections[0].revealed);
    assert!(!frame.sections[1].revealed);
    assert!(matches!(frame.media[0].view, MediaView::Placeholder { .. }));

    // Content finishes fading in while the page sits at the top.
    run_frames(&mut session, 44);
    let frame = session.step();
    assert_eq!(frame.content_opacity, 1.0);
    assert!(!frame.sections[1].revealed);

    // Scroll to the projects section and let the poll timer notice.
    doc.scroll.set(1700.0);
    session.push_event(Event::Scroll(ScrollEvent::from_document(1700.0, 4800.0, VIEWPORT_H)));
    run_frames(&mut session, 8);
    let frame = session.step();
    assert!(frame.sections[1].revealed);
    assert!(frame.nav.condensed);
    assert_eq!(frame.hero_opacity, 0.0);
    assert!(matches!(frame.media[0].view, MediaView::Placeholder { .. }));

    // Media at 3000..3700 becomes 30%+ visible at scroll 2410.
    doc.scroll.set(2500.0);
    run_frames(&mut session, 8);
    let frame = session.step();
    assert_eq!(
        frame.media[0].view,
        MediaView::Embed {
            src: "https://www.youtube.com/embed/demo-video?autoplay=1&mute=1&loop=1&playlist=demo-video"
                .to_string()
        }
    );

    // Scrolling away never unloads, and only one request goes out.
    doc.scroll.set(0.0);
    run_frames(&mut session, 20);
    let outputs = session.take_outputs();
    assert_eq!(outputs.media_requests.len(), 1);
    assert_eq!(outputs.media_requests[0].media, MediaId::new("demo-video"));
    assert!(matches!(
        outputs.last_frame.expect("frame").media[0].view,
        MediaView::Embed { .. }
    ));
    assert!(session.take_outputs().media_requests.is_empty());
}

#[test]
fn bare_host_shows_everything_after_boot() {
    let mut session =
        PageSession::new(PageConfig::default(), HostEnv::bare(Rect::from_size(800.0, 600.0)))
            .expect("session");
    session.add_section("about", RegionId(1));
    session.add_media(RegionId(2), MediaId::new("x"));
    assert!(session.step().sections.is_empty());

    session.set_time(Duration::from_secs(3));
    let frame = session.step();
    assert!(frame.sections.iter().all(|s| s.revealed));
    assert_eq!(session.take_outputs().media_requests.len(), 1);
}

#[test]
fn cursor_settles_on_pointer() {
    let mut session = PageSession::new(
        PageConfig::default(),
        HostEnv::native(Rect::from_size(800.0, 600.0)),
    )
    .expect("session");
    session.push_event(Event::Pointer(PointerEvent::moved(100.0, 100.0)));
    session.step();
    session.push_event(Event::Pointer(PointerEvent::moved(500.0, 300.0)));
    session.push_event(Event::Pointer(PointerEvent::new(
        PointerEventKind::Down,
        500.0,
        300.0,
    )));
    run_frames(&mut session, 90);
    let frame = session.step();
    assert_eq!(frame.cursor.size, 24.0);
    assert!((frame.cursor.x - 488.0).abs() < 0.5);
    assert!((frame.cursor.y - 288.0).abs() < 0.5);
}

#[test]
fn toml_config_reaches_components() {
    let session = PageSession::from_toml_str(
        r#"
        [sequencer]
        nominal_duration_ms = 1000
        "#,
        HostEnv::bare(Rect::from_size(800.0, 600.0)),
    )
    .expect("session");
    assert_eq!(session.config().sequencer.nominal_duration_ms, Some(1000));
    assert_eq!(session.nav_links().len(), 6);
}

#[test]
fn malformed_toml_is_a_config_error() {
    let err = PageSession::from_toml_str("[sequencer", HostEnv::bare(Rect::default())).unwrap_err();
    assert!(matches!(err, folio_web::SessionError::Config(_)));
}

#[test]
fn clock_jump_to_end_of_time_still_steps() {
    let doc = Rc::new(Document {
        scroll: Cell::new(0.0),
    });
    let host = HostEnv::polling(Rect::from_size(1200.0, VIEWPORT_H), doc);
    let mut session = PageSession::new(PageConfig::default(), host).expect("session");
    session.add_section("hero", RegionId(0));
    session.push_event(Event::Pointer(PointerEvent::moved(100.0, 100.0)));
    session.step();
    session.push_event(Event::Pointer(PointerEvent::moved(600.0, 400.0)));

    session.set_time(Duration::MAX);
    let frame = session.step();
    assert_eq!(frame.time, Duration::MAX);
    assert_eq!(frame.loading, None);
    assert_eq!(frame.content_opacity, 1.0);
    assert!(frame.sections[0].revealed);
    assert_eq!((frame.cursor.x, frame.cursor.y), (586.0, 386.0));

    // Stepping again at the same instant fires nothing new.
    let again = session.step();
    assert_eq!(again.sections.len(), 1);
}
