//! Logging setup using `tracing` and `tracing-subscriber`.
//!
//! Logs go to stderr so they never mix with CSV on stdout.
//!
//! - `warn`: lossy decoding and other recoverable oddities (default)
//! - `info`: per-command summaries
//! - `debug`: stage boundaries, resolved columns, buffered table sizes
//! - `trace`: row-level detail

use std::io::{self, IsTerminal};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence when set and `use_env` is true; otherwise
/// `level` applies to everything.
pub fn init_logging(level: LevelFilter, use_env: bool) -> Result<(), TryInitError> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if use_env => EnvFilter::new(directives),
        _ => EnvFilter::default().add_directive(level.into()),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .finish()
        .try_init()
}
