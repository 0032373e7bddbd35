//! Structured logging to stderr.

use tracing_subscriber::EnvFilter;

/// Filter directive for the CLI verbosity flags.
///
/// `-q` wins over everything; otherwise each `-v` raises the configured level
/// by one step, capped at `trace`.
pub fn level_for(verbosity: u8, quiet: bool, configured: &str) -> String {
    if quiet {
        return "warn".to_string();
    }
    match verbosity {
        0 => configured.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Install the global subscriber. `RUST_LOG` takes precedence over `level`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new(crate::defaults::LOG_LEVEL));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();

    if installed.is_err() {
        tracing::debug!("logging already initialized");
    }
}
