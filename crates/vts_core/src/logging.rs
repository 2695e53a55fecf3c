//! Logging setup for hosts of the library.
//!
//! The crate itself only emits `tracing` events (decode counts, lock
//! diagnostics); it never prints. Binaries embedding the codec can call
//! [`init_tracing`] once at startup to get those events on stderr, or install
//! their own subscriber.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize a global tracing subscriber for application-wide logging.
///
/// Respects `RUST_LOG` when set, falling back to `default_filter`
/// (e.g. `"info"` or `"vts_core=debug"`). Safe to call more than once; later
/// calls are no-ops.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter.to_string()));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .try_init();
}

/// Initialize tracing for tests (warnings and above, test writer).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}
