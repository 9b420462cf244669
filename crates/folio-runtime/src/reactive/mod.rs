#![forbid(unsafe_code)]

//! Reactive primitives shared by the controllers.

pub mod observable;

pub use observable::{Observable, Subscription};
