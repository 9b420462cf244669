#![forbid(unsafe_code)]

//! Subscriber setup for native hosts and examples.
//!
//! `RUST_LOG` wins when set; otherwise `default_directive` applies
//! (for example `"folio_runtime=debug"`).

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Install a global fmt subscriber filtered by `RUST_LOG` or
/// `default_directive`.
///
/// # Errors
///
/// Fails if a global subscriber is already set.
pub fn init(default_directive: &str) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init()?;
    tracing::debug!(default_directive, "logging initialized");
    Ok(())
}
