//! Subscriber setup for the `tracing` diagnostics emitted by the solvers.
//!
//! Library code only emits events; installing a subscriber is left to the
//! binary or test. Events carry a `level` field with the per-level logger id
//! (e.g. `"SWEEPER"`, `"FINE"`) and use the targets `sweeper`, `transfer`,
//! `controller`, `comm` and `quadrature`.

use std::io::IsTerminal;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default logger id for a level that was not named.
pub const DEFAULT_LOGGER_ID: &str = "SWEEPER";

/// Install a fmt subscriber filtered by `filter`, `RUST_LOG`, or `info`.
///
/// Returns `false` if a global subscriber was already installed, so tests may
/// call it freely.
pub fn init_logging(filter: Option<&str>) -> bool {
    let filter = match filter {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .is_ok()
}
