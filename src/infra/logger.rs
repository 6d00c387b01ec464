// src/infra/logger.rs — Structured logging with tracing

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the global subscriber. `RUST_LOG` takes precedence; otherwise
/// our own crate logs at `level` while dependencies stay at `warn`, so search
/// progress is not drowned out by reqwest connection chatter.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level)));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn default_directive(level: &str) -> String {
    format!("warn,prompttune={level}")
}
