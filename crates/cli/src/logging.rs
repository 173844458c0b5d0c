//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Primary environment variable for the log filter.
pub const LOG_ENV: &str = "NETA_LOG";

/// Resolve the filter: `NETA_LOG`, then `RUST_LOG`, then `fallback`, then `info`.
///
/// Invalid expressions are reported on stderr and skipped.
pub fn resolve_filter(fallback: &str) -> EnvFilter {
    for var in [LOG_ENV, "RUST_LOG"] {
        if let Ok(value) = std::env::var(var) {
            match value.parse::<EnvFilter>() {
                Ok(filter) => return filter,
                Err(e) => {
                    eprintln!("WARN: {var}='{value}' is not a valid tracing filter ({e}); ignoring")
                }
            }
        }
    }
    match fallback.parse::<EnvFilter>() {
        Ok(filter) => filter,
        Err(e) => {
            eprintln!(
                "WARN: log level '{fallback}' is not a valid tracing filter ({e}); \
                 falling back to 'info'"
            );
            EnvFilter::new("info")
        }
    }
}

/// Install the global fmt subscriber. Later calls are no-ops.
pub fn init(fallback_level: &str, json: bool) {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(resolve_filter(fallback_level))
        .with_target(true)
        .with_writer(std::io::stderr);

    // try_init fails only when a subscriber is already installed.
    let _ = if json { subscriber.json().try_init() } else { subscriber.try_init() };
}
