//! Tracing/logging initialization.
//!
//! Logs always go to stderr so stdout stays reserved for command output.
//! `RUST_LOG` overrides the filter chosen from `--verbose`.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used unless `--verbose` is given: only problems reach the terminal.
pub const QUIET_FILTER: &str = "relay=warn";

/// Filter for `--verbose`: git argv, timings, and HTTP status lines.
pub const VERBOSE_FILTER: &str = "relay=debug";

pub const fn default_filter(verbose: bool) -> &'static str {
    if verbose { VERBOSE_FILTER } else { QUIET_FILTER }
}

fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

/// Install the global subscriber. Returns `false` if one was already set.
///
/// `log_json` switches to one JSON object per line for machine consumption.
pub fn init_tracing(default_filter: &str, log_json: bool) -> bool {
    let registry = tracing_subscriber::registry().with(env_filter(default_filter));
    let result = if log_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .without_time()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
    result.is_ok()
}
