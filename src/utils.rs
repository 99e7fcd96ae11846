//! Logging setup for the tick client binary.

use tracing_subscriber::{EnvFilter, fmt};

/// Install the `tracing` subscriber used by the `[WS]`/`[ROUTER]`/`[SESSION]`
/// log lines. `RUST_LOG` overrides the default `info` filter; set
/// `RUST_LOG=debug` to see raw outbound frames and ignored messages.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
