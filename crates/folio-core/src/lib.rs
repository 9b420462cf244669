#![forbid(unsafe_code)]

//! Core: viewport geometry, canonical host input events, and animation
//! primitives.
//!
//! # Role in Folio
//! `folio-core` is the input layer. It owns the normalized event types the
//! host pushes into a page session and the small, pure building blocks the
//! runtime controllers interpolate with.
//!
//! # Primary responsibilities
//! - **Rect**: viewport-space rectangles and intersection ratios.
//! - **Event**: pointer, scroll, geometry, and resize notifications.
//! - **Capabilities**: interactive-element detection for hover state.
//! - **Animation**: easing curves, clamped interpolation, tweens, springs.
//!
//! Nothing in this crate reads a clock. Time is always supplied by the caller.

pub mod animation;
pub mod event;
pub mod geometry;

pub use web_time::Duration;
