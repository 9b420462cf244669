#![forbid(unsafe_code)]

//! Cursor overlay: a pure style mapping plus a spring-driven follower.
//!
//! | hovering | pressed | size | color  |
//! |----------|---------|------|--------|
//! | false    | false   | 28   | base   |
//! | true     | false   | 36   | accent |
//! | any      | true    | 24   | accent if hovering, else base |

use folio_core::animation::Spring;
use web_time::Duration;

use crate::pointer::PointerState;

/// Crosshair gap between the center and each arm.
pub const ARM_GAP: f64 = 6.0;

/// Which palette entry the overlay uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorColor {
    Base,
    Accent,
}

/// Hex colors for the two palette entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorPalette {
    pub base: String,
    pub accent: String,
}

impl Default for CursorPalette {
    fn default() -> Self {
        Self {
            base: "#0ea5e9".to_string(),
            accent: "#f59e0b".to_string(),
        }
    }
}

impl CursorPalette {
    /// Resolve a palette entry.
    #[must_use]
    pub fn resolve(&self, color: CursorColor) -> &str {
        match color {
            CursorColor::Base => &self.base,
            CursorColor::Accent => &self.accent,
        }
    }
}

/// Visual parameters for one overlay frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorStyle {
    /// Overlay box edge length.
    pub size: f64,
    pub color: CursorColor,
    /// Radius of the center ring.
    pub ring_radius: f64,
    /// Distance from the center to where each arm starts.
    pub gap: f64,
    /// Arm length, `size / 2 - gap`.
    pub arm: f64,
}

/// Map interaction flags to overlay parameters.
#[must_use]
pub fn cursor_style(hovering: bool, pressed: bool) -> CursorStyle {
    let size = if pressed {
        24.0
    } else if hovering {
        36.0
    } else {
        28.0
    };
    CursorStyle {
        size,
        color: if hovering {
            CursorColor::Accent
        } else {
            CursorColor::Base
        },
        ring_radius: if hovering { 4.0 } else { 2.5 },
        gap: ARM_GAP,
        arm: size / 2.0 - ARM_GAP,
    }
}

impl From<&PointerState> for CursorStyle {
    fn from(state: &PointerState) -> Self {
        cursor_style(state.hovering, state.pressed)
    }
}

/// Spring constants for [`CursorFollower`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FollowSpring {
    pub stiffness: f64,
    pub damping: f64,
    pub mass: f64,
}

impl Default for FollowSpring {
    fn default() -> Self {
        Self {
            stiffness: 600.0,
            damping: 32.0,
            mass: 0.08,
        }
    }
}

impl FollowSpring {
    fn spring(&self, at: f64) -> Spring {
        Spring::cursor(at)
            .with_stiffness(self.stiffness)
            .with_damping(self.damping)
            .with_mass(self.mass)
    }
}

/// Overlay position chasing the pointer.
///
/// The overlay's top-left corner targets `pointer - size / 2` so the box
/// stays centered as it grows and shrinks. The first on-screen sample snaps
/// instead of flying in from the off-screen start.
#[derive(Debug, Clone)]
pub struct CursorFollower {
    x: Spring,
    y: Spring,
    primed: bool,
}

impl Default for CursorFollower {
    fn default() -> Self {
        Self::new(FollowSpring::default())
    }
}

impl CursorFollower {
    #[must_use]
    pub fn new(spring: FollowSpring) -> Self {
        let start = crate::pointer::OFFSCREEN;
        Self {
            x: spring.spring(start),
            y: spring.spring(start),
            primed: false,
        }
    }

    /// Retarget from the latest pointer state and advance by `dt`.
    /// Returns the overlay's top-left corner.
    pub fn follow(&mut self, pointer: &PointerState, style: &CursorStyle, dt: Duration) -> (f64, f64) {
        let half = style.size / 2.0;
        let (tx, ty) = (pointer.x - half, pointer.y - half);
        if !self.primed {
            if pointer.x == crate::pointer::OFFSCREEN && pointer.y == crate::pointer::OFFSCREEN {
                return self.position();
            }
            self.x.snap_to(tx);
            self.y.snap_to(ty);
            self.primed = true;
            return self.position();
        }
        self.x.set_target(tx);
        self.y.set_target(ty);
        self.x.advance(dt);
        self.y.advance(dt);
        self.position()
    }

    /// Current top-left corner.
    #[must_use]
    pub fn position(&self) -> (f64, f64) {
        (self.x.position(), self.y.position())
    }

    /// Whether both axes have settled.
    #[must_use]
    pub fn is_at_rest(&self) -> bool {
        self.x.is_at_rest() && self.y.is_at_rest()
    }
}
