//! Tracing initialization.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Install the global tracing subscriber.
///
/// Reads `STYLIST_LOG` for filter directives, e.g.
/// `STYLIST_LOG=stylist_core=debug,stylist_server=info`.
/// Falls back to `info` for both crates when unset or invalid.
/// Safe to call more than once.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("STYLIST_LOG")
            .unwrap_or_else(|_| EnvFilter::new("stylist_core=info,stylist_server=info"));

        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true))
            .with(filter)
            .init();
    });
}
