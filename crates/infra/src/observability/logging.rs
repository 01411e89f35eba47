//! Tracing subscriber initialization.
//!
//! `RUST_LOG` wins when it parses; otherwise the configured level applies,
//! and `info` is the last resort when that is not a valid directive either.

use timeclock_domain::LoggingConfig;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

const FALLBACK_DIRECTIVE: &str = "info";

/// Install the global subscriber.
///
/// Returns `false` when a subscriber was already installed, so repeated
/// calls (tests, embedded hosts that set up their own) are harmless.
pub fn init_tracing(config: &LoggingConfig) -> bool {
    let filter = build_env_filter(config);

    let installed = if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_current_span(true).with_target(true))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .try_init()
    };

    installed.is_ok()
}

fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    EnvFilter::try_new(config.level.trim()).unwrap_or_else(|_| EnvFilter::new(FALLBACK_DIRECTIVE))
}
