//! Diagnostic logging to stderr.
//!
//! stdout carries the statusline, so all tracing output goes to stderr.
//! The filter comes from `CLAUDE_QUOTA_LOG`, then `RUST_LOG`, then the
//! `--debug` flag (`debug`), defaulting to `warn`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_ENV: &str = "CLAUDE_QUOTA_LOG";

fn build_filter(debug: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "warn" }))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init_logging(debug: bool) {
    let _ = tracing_subscriber::registry()
        .with(build_filter(debug))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(debug)
                .with_ansi(false)
                .compact(),
        )
        .try_init();
}
