#![forbid(unsafe_code)]

//! Runtime: the stateful controllers behind the profile page.
//!
//! # Role in Folio
//! `folio-runtime` turns host input (time, scroll offset, pointer events,
//! viewport geometry) into discrete or interpolated UI state. Everything is
//! single-threaded and host-driven: no controller blocks, spawns, or reads a
//! clock on its own.
//!
//! # Primary responsibilities
//! - **Scheduler**: host-advanced timers with RAII cancellation guards.
//! - **Visibility oracle**: native, polling, or always-visible intersection.
//! - **ProgressSequencer**: the boot progress state machine.
//! - **Scroll and pointer trackers**: thread-local singletons with install guards.
//! - **RevealController / LazyMedia**: once-only visibility-gated widgets.
//! - **Cursor overlay**: pure style mapping plus spring follow.
//! - **PageConfig**: policy-as-data tuning loaded from TOML or JSON.
//!
//! # Ownership
//! Controller state lives in `Rc<RefCell<..>>`; callbacks registered with the
//! scheduler or the oracle hold only `Weak` references, so dropping a
//! controller makes any in-flight callback a no-op.

pub mod cursor;
pub mod media;
pub mod policy_config;
pub mod pointer;
pub mod reactive;
pub mod reveal;
pub mod scroll;
pub mod sequencer;
pub mod timer;
pub mod visibility;

pub use cursor::{
    CursorColor, CursorFollower, CursorPalette, CursorStyle, FollowSpring, cursor_style,
};
pub use media::{LazyMedia, MediaConfig, MediaId, MediaLazyState, MediaRequest, MediaSink, MediaView};
pub use policy_config::{ConfigError, NavLink, PageConfig};
pub use pointer::{PointerState, PointerTrackerGuard};
pub use reactive::{Observable, Subscription};
pub use reveal::{Entrance, EntranceConfig, RevealController, RevealEntry, RevealHandle};
pub use scroll::{ScrollConfig, ScrollState, ScrollTrackerGuard};
pub use sequencer::{Phase, ProgressSequencer, ProgressState, SequencerConfig, Step, StepTable};
pub use timer::{Scheduler, TimerGuard};
pub use visibility::{
    AlwaysVisibleOracle, GeometryProbe, HostCapabilities, NativeOracle, ObserveOptions,
    OracleStrategy, PollingOracle, SelectedOracle, Visibility, VisibilityOracle, select_oracle,
};

/// Errors raised when installing a process-wide tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerError {
    /// A tracker of this kind is already installed on this thread.
    AlreadyInstalled(&'static str),
}

impl std::fmt::Display for TrackerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyInstalled(kind) => write!(f, "{kind} tracker already installed"),
        }
    }
}

impl std::error::Error for TrackerError {}
