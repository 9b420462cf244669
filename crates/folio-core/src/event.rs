#![forbid(unsafe_code)]

//! Canonical host input events.
//!
//! The host (browser glue, WASM shim, or a test) translates its native
//! notifications into these types and pushes them into a page session.
//!
//! # Design Notes
//!
//! - Coordinates are viewport-relative CSS pixels.
//! - "Pointer over" carries the target's ancestor chain so hover detection
//!   stays a pure function of the event.
//! - Interactive capabilities use bitflags for easy combination.

use bitflags::bitflags;

use crate::geometry::Rect;

/// Identifier for an observed on-screen region (a section, card, or embed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(pub u64);

impl std::fmt::Display for RegionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "region#{}", self.0)
    }
}

/// Canonical host event.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A pointer event.
    Pointer(PointerEvent),

    /// Document scroll position changed.
    Scroll(ScrollEvent),

    /// A registered region's bounding box changed (native intersection path).
    Geometry {
        /// Region whose bounds changed.
        region: RegionId,
        /// New bounds in viewport coordinates.
        bounds: Rect,
    },

    /// Viewport was resized.
    Resize {
        /// New viewport width.
        width: f64,
        /// New viewport height.
        height: f64,
    },
}

/// A pointer event.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    /// The type of pointer event.
    pub kind: PointerEventKind,

    /// X coordinate.
    pub x: f64,

    /// Y coordinate.
    pub y: f64,
}

impl PointerEvent {
    /// Create a new pointer event.
    #[must_use]
    pub const fn new(kind: PointerEventKind, x: f64, y: f64) -> Self {
        Self { kind, x, y }
    }

    /// Pointer moved to `(x, y)`.
    #[must_use]
    pub const fn moved(x: f64, y: f64) -> Self {
        Self::new(PointerEventKind::Moved, x, y)
    }
}

/// Types of pointer events.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerEventKind {
    /// Pointer moved.
    Moved,

    /// Primary button pressed.
    Down,

    /// Primary button released.
    Up,

    /// Pointer entered an element. The chain lists the target first, then
    /// each ancestor up to the document root.
    Over(Vec<ElementInfo>),
}

/// Document scroll position at the time of a scroll event.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollEvent {
    /// Distance scrolled from the top.
    pub offset: f64,
    /// Maximum scrollable distance (`content height - viewport height`).
    pub range: f64,
}

impl ScrollEvent {
    /// Create a scroll event from an offset and a precomputed range.
    #[must_use]
    pub const fn new(offset: f64, range: f64) -> Self {
        Self { offset, range }
    }

    /// Build from document metrics: `scroll_y`, full document height, and
    /// viewport height. Content shorter than the viewport yields a
    /// non-positive range.
    #[must_use]
    pub fn from_document(scroll_y: f64, scroll_height: f64, viewport_height: f64) -> Self {
        Self::new(scroll_y, scroll_height - viewport_height)
    }
}

bitflags! {
    /// Interactive capabilities an element can expose.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Interactive: u8 {
        /// No interactive capability.
        const NONE         = 0b0000;
        /// Hyperlink (`<a>`).
        const LINK         = 0b0001;
        /// Native button.
        const BUTTON       = 0b0010;
        /// Form control (`<input>`, `<textarea>`, `<select>`).
        const FORM_CONTROL = 0b0100;
        /// Explicit ARIA role (`button` or `link`).
        const ROLE         = 0b1000;
    }
}

impl Default for Interactive {
    fn default() -> Self {
        Self::NONE
    }
}

/// Minimal description of a DOM element for hover detection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ElementInfo {
    /// Lowercase tag name (`"a"`, `"div"`, ...).
    pub tag: String,
    /// Value of the `role` attribute, if any.
    pub role: Option<String>,
}

impl ElementInfo {
    /// Element with a tag and no role.
    #[must_use]
    pub fn tag(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            role: None,
        }
    }

    /// Builder: set the `role` attribute.
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Capabilities exposed by this element alone.
    #[must_use]
    pub fn capabilities(&self) -> Interactive {
        let mut caps = match self.tag.to_ascii_lowercase().as_str() {
            "a" => Interactive::LINK,
            "button" => Interactive::BUTTON,
            "input" | "textarea" | "select" => Interactive::FORM_CONTROL,
            _ => Interactive::NONE,
        };
        if let Some(role) = &self.role
            && matches!(role.trim().to_ascii_lowercase().as_str(), "button" | "link")
        {
            caps |= Interactive::ROLE;
        }
        caps
    }
}

/// Union of capabilities across a target and its ancestors.
#[must_use]
pub fn chain_capabilities(chain: &[ElementInfo]) -> Interactive {
    chain
        .iter()
        .fold(Interactive::NONE, |acc, el| acc | el.capabilities())
}
