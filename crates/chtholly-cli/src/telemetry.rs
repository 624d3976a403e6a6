//! Diagnostic logging
//!
//! Operator-facing output goes through the reporter; this only wires up
//! `tracing` for the library crates' debug and warn events.

use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Installs a stderr subscriber (if one is not already active).
///
/// `RUST_LOG` wins when present; otherwise the level is `warn`, or `debug`
/// with `--verbose`. Calling this more than once is harmless.
pub fn init_tracing(verbose: bool) {
    if TRACING_INIT.get().is_some() {
        return;
    }

    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();

    let _ = TRACING_INIT.set(());
}
