#![forbid(unsafe_code)]

//! Per-step paint snapshot.
//!
//! A [`PageFrame`] is plain data: the host diffs it against the previous
//! frame (or just applies it) and never calls back into the session.

use core::time::Duration;

use folio_core::event::RegionId;
use folio_runtime::{Entrance, MediaView};

/// Everything the host paints for one step.
#[derive(Debug, Clone, PartialEq)]
pub struct PageFrame {
    /// Session clock at the time of the step.
    pub time: Duration,
    /// Boot overlay; `None` once the sequence is done.
    pub loading: Option<LoadingFrame>,
    /// Main content opacity: 0 during boot, then eased up to 1 over the
    /// configured fade once the sequence is done.
    pub content_opacity: f64,
    pub nav: NavFrame,
    /// Hero opacity from the scroll fade.
    pub hero_opacity: f64,
    pub cursor: CursorFrame,
    pub sections: Vec<SectionFrame>,
    pub media: Vec<MediaFrame>,
}

/// Boot overlay readout.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadingFrame {
    /// `min(100, round(percent))`.
    pub percent: u8,
    /// Raw progress, for the bar width.
    pub progress: f64,
    pub label: Option<String>,
    /// Exit animation is playing.
    pub exiting: bool,
    /// Overlay opacity: 1 while running, eased to 0 during the exit.
    pub opacity: f64,
    /// Overlay scale: 1 while running, eased to the exit scale.
    pub scale: f64,
}

/// Navigation bar state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavFrame {
    pub condensed: bool,
    /// Width of the scroll progress bar, in percent.
    pub scroll_percent: u8,
    pub menu_open: bool,
}

/// Cursor overlay placement and style.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorFrame {
    /// Top-left corner of the overlay box.
    pub x: f64,
    pub y: f64,
    pub size: f64,
    /// Resolved hex color.
    pub color: String,
    pub ring_radius: f64,
    pub gap: f64,
    pub arm: f64,
}

/// One revealable section.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionFrame {
    pub name: String,
    pub region: RegionId,
    pub revealed: bool,
    pub entrance: Entrance,
}

/// One lazy media slot.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaFrame {
    pub region: RegionId,
    pub view: MediaView,
}
