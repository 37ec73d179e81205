//! Tracing setup for the `contentgate` binary.
//!
//! The subscriber starts at `info` (or `RUST_LOG` when set) so configuration
//! loading is itself logged. The `[logging]` section is applied afterwards
//! through a reload handle on the filter layer.

use std::sync::OnceLock;

use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

use crate::config::LoggingConfig;

const STARTUP_LEVEL: &str = "info";

static FILTER_HANDLE: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();

/// Install the global subscriber. Later calls are no-ops.
pub fn init_tracing() {
    let startup = EnvFilter::try_from_default_env().unwrap_or_else(|_| level_filter(STARTUP_LEVEL));
    let (filter, handle) = reload::Layer::new(startup);
    let _ = FILTER_HANDLE.set(handle);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init();
}

/// Switch the filter to the configured level. `RUST_LOG` keeps priority.
pub fn apply_logging_config(logging: &LoggingConfig) {
    if std::env::var_os("RUST_LOG").is_some() {
        debug!(configured = %logging.level, "RUST_LOG is set, keeping its filter");
        return;
    }
    let Some(handle) = FILTER_HANDLE.get() else {
        return;
    };
    match handle.modify(|filter| *filter = level_filter(&logging.level)) {
        Ok(()) => debug!(level = %logging.level, "Logging level applied"),
        Err(e) => warn!(error = %e, "Could not apply logging level"),
    }
}

fn level_filter(level: &str) -> EnvFilter {
    EnvFilter::new(level.to_ascii_lowercase())
}
