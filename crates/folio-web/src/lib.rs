#![forbid(unsafe_code)]

//! `folio-web` drives a profile page session from a browser host.
//!
//! Design goals:
//! - **Host-driven I/O**: the embedding environment (JS) pushes pointer,
//!   scroll, geometry, and resize events.
//! - **Deterministic time**: the host advances a monotonic clock explicitly.
//! - **No blocking / no threads**: suitable for `wasm32-unknown-unknown`.
//!
//! One [`PageSession`] owns everything: the scheduler, the global tracker
//! installations, the visibility oracle, the boot sequencer, and every
//! section and media controller. Each [`PageSession::step`] produces a
//! [`PageFrame`] describing what the host should paint, and outbound media
//! requests accumulate in [`WebOutputs`] until taken.

pub mod frame;
#[cfg(feature = "logging")]
pub mod logging;
pub mod session;

use core::time::Duration;

use folio_runtime::{ConfigError, MediaRequest, TrackerError};

pub use frame::{CursorFrame, LoadingFrame, MediaFrame, NavFrame, PageFrame, SectionFrame};
pub use session::{HostEnv, PageSession};

/// Errors raised while building a page session.
#[derive(Debug)]
pub enum SessionError {
    /// A global tracker is already installed on this thread.
    Tracker(TrackerError),
    /// The page configuration could not be loaded.
    Config(ConfigError),
}

impl core::fmt::Display for SessionError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Tracker(e) => write!(f, "tracker: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Tracker(e) => Some(e),
            Self::Config(e) => Some(e),
        }
    }
}

impl From<TrackerError> for SessionError {
    fn from(e: TrackerError) -> Self {
        Self::Tracker(e)
    }
}

impl From<ConfigError> for SessionError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Deterministic monotonic clock controlled by the host.
#[derive(Debug, Default, Clone)]
pub struct DeterministicClock {
    now: Duration,
}

impl DeterministicClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    /// Current monotonic time.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Set current monotonic time. Earlier values are ignored.
    pub fn set(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }
}

/// Captured outputs for host consumption.
#[derive(Debug, Default, Clone)]
pub struct WebOutputs {
    /// Media embeds the host should fetch and mount, in request order.
    pub media_requests: Vec<MediaRequest>,
    /// Frame produced by the most recent step.
    pub last_frame: Option<PageFrame>,
    /// Number of steps since the outputs were last taken.
    pub steps: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn deterministic_clock_advances_monotonically() {
        let mut c = DeterministicClock::new();
        assert_eq!(c.now(), Duration::ZERO);

        c.advance(Duration::from_millis(10));
        c.advance(Duration::from_millis(5));
        assert_eq!(c.now(), Duration::from_millis(15));

        c.set(Duration::from_millis(3));
        assert_eq!(c.now(), Duration::from_millis(15));

        // Saturation: don't panic or wrap.
        c.set(Duration::MAX);
        c.advance(Duration::from_secs(1));
        assert_eq!(c.now(), Duration::MAX);
    }

    #[test]
    fn session_error_chains_source() {
        let err = SessionError::from(TrackerError::AlreadyInstalled("scroll"));
        assert_eq!(err.to_string(), "tracker: scroll tracker already installed");
        assert!(std::error::Error::source(&err).is_some());
    }
}
