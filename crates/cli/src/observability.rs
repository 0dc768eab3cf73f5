//! Logging wiring.
//!
//! All `tracing` events emitted by the `omega` crate flow through the
//! subscriber installed here. Events go to stderr so that stdout carries only
//! the summary document.

use tracing_subscriber::EnvFilter;

use crate::config::LogFormat;

/// Filter applied when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "warn";

/// Installs the global subscriber. Call once, before any work is done.
pub fn init(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
