//! Tracing setup for host applications embedding plantel-core.
//!
//! The library itself only emits `tracing` events. Hosts that have no
//! subscriber of their own can call [`init_tracing`] once at startup.

use tracing_subscriber::EnvFilter;

use crate::{Error, Result};

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info";

/// Initialize tracing subscriber for logging
///
/// Configures the tracing subscriber with:
/// - Environment filter from `RUST_LOG` (defaults to INFO level)
/// - Stderr output
///
/// # Errors
///
/// Returns `Error::Logging` if a global subscriber is already installed.
pub fn init_tracing() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| Error::Logging(format!("Failed to initialize tracing subscriber: {e}")))
}
