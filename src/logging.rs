//! Logger set-up. Stdout carries the LSP stream, so everything goes to stderr.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber.
///
/// `log_level` wins over `RUST_LOG`; with neither the level is `info`.
/// Calling this twice is harmless, the second call is ignored.
pub fn init_logger(log_level: Option<&str>, no_color: bool) -> anyhow::Result<()> {
    let filter = match log_level {
        Some(level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .with_target(false)
        .with_filter(filter);

    // Ignore errors due to the subscriber already being set
    let _ = tracing_subscriber::registry().with(stderr_layer).try_init();
    Ok(())
}
