#![forbid(unsafe_code)]

//! Host-driven page session.
//!
//! ```text
//!  host ──push_event──▶ queue ─┐
//!  host ──set_time───▶ clock ──┤ step() ──▶ PageFrame ──▶ host paints
//!                              │    │
//!                              │    └──▶ WebOutputs.media_requests ──▶ host fetches
//! ```
//!
//! Each [`PageSession::step`]:
//! 1. fires every scheduler timer due at the current clock time,
//! 2. drains queued events into the trackers and the oracle,
//! 3. mounts declared sections and media once the boot sequence is done,
//! 4. snapshots everything into a [`PageFrame`].
//!
//! The session installs the thread-local scroll and pointer trackers, so at
//! most one session can be live per thread.

use core::time::Duration;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use folio_core::animation::Tween;
use folio_core::event::{Event, RegionId};
use folio_core::geometry::Rect;
use folio_runtime::policy_config::NavLink;
use folio_runtime::{
    CursorFollower, CursorPalette, CursorStyle, GeometryProbe, HostCapabilities, LazyMedia,
    MediaId, MediaRequest, OracleStrategy, PageConfig, Phase, PointerTrackerGuard,
    ProgressSequencer, ProgressState, RevealController, RevealHandle, Scheduler,
    ScrollTrackerGuard, SelectedOracle, pointer, scroll, select_oracle,
};

use crate::frame::{CursorFrame, LoadingFrame, MediaFrame, NavFrame, PageFrame, SectionFrame};
use crate::{DeterministicClock, SessionError, WebOutputs};

/// What the host environment offers.
#[derive(Clone)]
pub struct HostEnv {
    pub capabilities: HostCapabilities,
    /// Initial viewport.
    pub viewport: Rect,
    /// Synchronous geometry queries, used when native intersection is absent.
    pub probe: Option<Rc<dyn GeometryProbe>>,
}

impl core::fmt::Debug for HostEnv {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HostEnv")
            .field("capabilities", &self.capabilities)
            .field("viewport", &self.viewport)
            .field("probe", &self.probe.is_some())
            .finish()
    }
}

impl HostEnv {
    /// Host that pushes geometry events.
    #[must_use]
    pub fn native(viewport: Rect) -> Self {
        Self {
            capabilities: HostCapabilities::full(),
            viewport,
            probe: None,
        }
    }

    /// Host that can only answer geometry queries.
    #[must_use]
    pub fn polling(viewport: Rect, probe: Rc<dyn GeometryProbe>) -> Self {
        Self {
            capabilities: HostCapabilities {
                intersection_observer: false,
                geometry_probe: true,
            },
            viewport,
            probe: Some(probe),
        }
    }

    /// Host with no visibility support at all.
    #[must_use]
    pub fn bare(viewport: Rect) -> Self {
        Self {
            capabilities: HostCapabilities::default(),
            viewport,
            probe: None,
        }
    }
}

enum Mount {
    Section {
        name: String,
        region: RegionId,
        slot: Option<u32>,
    },
    Media {
        region: RegionId,
        id: MediaId,
    },
}

struct MountedSection {
    name: String,
    region: RegionId,
    handle: RevealHandle,
}

/// A single page session driven by the host.
pub struct PageSession {
    config: PageConfig,
    clock: DeterministicClock,
    queue: VecDeque<Event>,
    scheduler: Scheduler,
    viewport: Rect,
    oracle: SelectedOracle,
    sequencer: ProgressSequencer,
    content_ready: Rc<Cell<bool>>,
    pending: Vec<Mount>,
    reveals: RevealController,
    sections: Vec<MountedSection>,
    media: Vec<LazyMedia>,
    media_sink: Rc<RefCell<Vec<MediaRequest>>>,
    follower: CursorFollower,
    palette: CursorPalette,
    exit: Tween,
    content_fade: Tween,
    menu_open: bool,
    last_step: Duration,
    outputs: WebOutputs,
    scroll: ScrollTrackerGuard,
    pointer: PointerTrackerGuard,
}

impl core::fmt::Debug for PageSession {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PageSession")
            .field("now", &self.clock.now())
            .field("progress", &self.sequencer.snapshot())
            .field("strategy", &self.oracle.as_oracle().strategy())
            .field("sections", &self.sections.len())
            .field("media", &self.media.len())
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl PageSession {
    /// Build a session and start the boot sequence at time zero.
    ///
    /// Validation problems in `config` are logged, not rejected; components
    /// fall back to safe values.
    ///
    /// # Errors
    ///
    /// Fails if scroll or pointer trackers are already installed on this
    /// thread (another session is live).
    pub fn new(config: PageConfig, host: HostEnv) -> Result<Self, SessionError> {
        for problem in config.validate() {
            tracing::warn!(%problem, "page config");
        }
        tracing::debug!(config = %config.to_jsonl(), "page config loaded");
        let scroll = scroll::install(config.to_scroll_config())?;
        let pointer = pointer::install()?;

        let scheduler = Scheduler::new();
        let oracle = select_oracle(
            host.capabilities,
            &scheduler,
            host.viewport,
            host.probe,
            config.poll_interval(),
        );

        let sequencer = ProgressSequencer::new(config.to_sequencer_config(), config.to_step_table());
        let content_ready = Rc::new(Cell::new(false));
        let ready = Rc::clone(&content_ready);
        sequencer.start(&scheduler, move || ready.set(true));

        let reveals = RevealController::new(&scheduler, config.to_entrance_config());
        let follower = CursorFollower::new(config.to_follow_spring());
        let palette = config.to_cursor_palette();
        let exit = config.exit_tween();
        let content_fade = config.content_fade_tween();

        tracing::debug!(
            strategy = ?oracle.as_oracle().strategy(),
            viewport = ?host.viewport,
            "page session created"
        );

        Ok(Self {
            config,
            clock: DeterministicClock::new(),
            queue: VecDeque::new(),
            scheduler,
            viewport: host.viewport,
            oracle,
            sequencer,
            content_ready,
            pending: Vec::new(),
            reveals,
            sections: Vec::new(),
            media: Vec::new(),
            media_sink: Rc::new(RefCell::new(Vec::new())),
            follower,
            palette,
            exit,
            content_fade,
            menu_open: false,
            last_step: Duration::ZERO,
            outputs: WebOutputs::default(),
            scroll,
            pointer,
        })
    }

    /// Build a session from a TOML page configuration.
    ///
    /// # Errors
    ///
    /// Fails on malformed TOML or if another session is live on this thread.
    pub fn from_toml_str(toml: &str, host: HostEnv) -> Result<Self, SessionError> {
        let config = PageConfig::from_toml_str(toml)?;
        Self::new(config, host)
    }

    // -- host input --------------------------------------------------------

    /// Queue an event for the next step.
    pub fn push_event(&mut self, event: Event) {
        self.queue.push_back(event);
    }

    /// Set the session clock. Time never moves backwards.
    pub fn set_time(&mut self, now: Duration) {
        self.clock.set(now);
    }

    /// Advance the session clock by `dt`.
    pub fn advance_time(&mut self, dt: Duration) {
        self.clock.advance(dt);
    }

    /// Declare a revealable section. It attaches once the content mounts
    /// and enters as soon as it is revealed.
    pub fn add_section(&mut self, name: impl Into<String>, region: RegionId) {
        self.pending.push(Mount::Section {
            name: name.into(),
            region,
            slot: None,
        });
        self.mount_if_ready();
    }

    /// Declare the `index`-th item of a staggered group (project cards).
    /// Its entrance waits for the group's base delay plus one stagger step
    /// per preceding item.
    pub fn add_group_item(&mut self, name: impl Into<String>, region: RegionId, index: u32) {
        self.pending.push(Mount::Section {
            name: name.into(),
            region,
            slot: Some(index),
        });
        self.mount_if_ready();
    }

    /// Declare a lazy media slot.
    pub fn add_media(&mut self, region: RegionId, id: MediaId) {
        self.pending.push(Mount::Media { region, id });
        self.mount_if_ready();
    }

    /// Toggle the mobile navigation menu.
    pub fn toggle_menu(&mut self) {
        self.menu_open = !self.menu_open;
    }

    /// Activate a navigation link; closes the mobile menu.
    pub fn follow_link(&mut self, index: usize) -> Option<&NavLink> {
        let link = self.config.nav.links.get(index)?;
        self.menu_open = false;
        tracing::debug!(href = %link.href, "nav link followed");
        Some(link)
    }

    // -- stepping ----------------------------------------------------------

    /// Run one host step and return the resulting frame.
    pub fn step(&mut self) -> PageFrame {
        let now = self.clock.now();
        let _span = tracing::debug_span!("page.step", now_ms = now.as_millis() as u64).entered();

        let fired = self.scheduler.advance_to(now);
        let events = self.queue.len();
        while let Some(event) = self.queue.pop_front() {
            self.dispatch(event);
        }
        self.mount_if_ready();
        tracing::trace!(fired, events, "page.step.input");

        let frame = self.frame(now);
        self.outputs
            .media_requests
            .extend(self.media_sink.borrow_mut().drain(..));
        self.outputs.last_frame = Some(frame.clone());
        self.outputs.steps += 1;
        frame
    }

    /// Take and reset accumulated outputs.
    pub fn take_outputs(&mut self) -> WebOutputs {
        std::mem::take(&mut self.outputs)
    }

    fn dispatch(&mut self, event: Event) {
        match event {
            Event::Pointer(p) => self.pointer.handle(&p),
            Event::Scroll(s) => self.scroll.handle(s),
            Event::Geometry { region, bounds } => match self.oracle.native() {
                Some(native) => native.report(region, bounds),
                None => tracing::trace!(%region, "geometry ignored by non-native oracle"),
            },
            Event::Resize { width, height } => {
                self.viewport = Rect::from_size(width, height);
                if let Some(native) = self.oracle.native() {
                    native.set_viewport(self.viewport);
                }
            }
        }
    }

    fn mount_if_ready(&mut self) {
        if !self.content_ready.get() || self.pending.is_empty() {
            return;
        }
        let oracle = self.oracle.as_oracle();
        for mount in std::mem::take(&mut self.pending) {
            match mount {
                Mount::Section { name, region, slot } => {
                    let stagger = slot.map_or(Duration::ZERO, |i| self.config.reveal_stagger(i));
                    let handle =
                        self.reveals
                            .attach(oracle, region, self.config.reveal.margin, stagger);
                    self.sections.push(MountedSection {
                        name,
                        region,
                        handle,
                    });
                }
                Mount::Media { region, id } => {
                    let sink: Rc<dyn folio_runtime::MediaSink> = self.media_sink.clone();
                    self.media.push(LazyMedia::mount(
                        oracle,
                        region,
                        id,
                        &self.config.to_media_config(),
                        sink,
                    ));
                }
            }
        }
        tracing::debug!(
            sections = self.sections.len(),
            media = self.media.len(),
            "content mounted"
        );
    }

    fn frame(&mut self, now: Duration) -> PageFrame {
        let progress = self.sequencer.snapshot();
        let in_phase = now.saturating_sub(self.sequencer.phase_started().unwrap_or_default());
        let exit = match progress.phase {
            Phase::Running => 0.0,
            Phase::Exiting => f64::from(self.exit.sample(in_phase)),
            Phase::Done => 1.0,
        };
        let loading = (progress.phase != Phase::Done).then(|| LoadingFrame {
            percent: progress.display_percent(),
            progress: progress.percent,
            label: progress
                .active_step
                .and_then(|i| self.sequencer.steps().label(i))
                .map(str::to_owned),
            exiting: progress.phase == Phase::Exiting,
            opacity: 1.0 - exit,
            scale: 1.0 + (self.config.sequencer.exit_scale - 1.0) * exit,
        });
        let content_opacity = if progress.phase == Phase::Done {
            f64::from(self.content_fade.sample(in_phase))
        } else {
            0.0
        };

        let scroll = self.scroll.snapshot();
        let pointer = self.pointer.snapshot();
        let style = CursorStyle::from(&pointer);
        let dt = now.saturating_sub(self.last_step);
        self.last_step = now;
        let (x, y) = self.follower.follow(&pointer, &style, dt);

        PageFrame {
            time: now,
            loading,
            content_opacity,
            nav: NavFrame {
                condensed: scroll.condensed,
                scroll_percent: scroll.percent(),
                menu_open: self.menu_open,
            },
            hero_opacity: scroll.fade_opacity,
            cursor: CursorFrame {
                x,
                y,
                size: style.size,
                color: self.palette.resolve(style.color).to_owned(),
                ring_radius: style.ring_radius,
                gap: style.gap,
                arm: style.arm,
            },
            sections: self
                .sections
                .iter()
                .map(|s| SectionFrame {
                    name: s.name.clone(),
                    region: s.region,
                    revealed: s.handle.has_fired(),
                    entrance: self.reveals.entrance(&s.handle, now),
                })
                .collect(),
            media: self
                .media
                .iter()
                .map(|m| MediaFrame {
                    region: m.region(),
                    view: m.view(),
                })
                .collect(),
        }
    }

    // -- accessors ---------------------------------------------------------

    /// Session clock.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Boot sequence state.
    #[must_use]
    pub fn progress(&self) -> ProgressState {
        self.sequencer.snapshot()
    }

    /// Whether the boot sequence has completed.
    #[must_use]
    pub fn is_content_ready(&self) -> bool {
        self.content_ready.get()
    }

    #[must_use]
    pub fn oracle_strategy(&self) -> OracleStrategy {
        self.oracle.as_oracle().strategy()
    }

    #[must_use]
    pub fn config(&self) -> &PageConfig {
        &self.config
    }

    #[must_use]
    pub fn nav_links(&self) -> &[NavLink] {
        &self.config.nav.links
    }

    #[must_use]
    pub fn viewport(&self) -> Rect {
        self.viewport
    }
}
