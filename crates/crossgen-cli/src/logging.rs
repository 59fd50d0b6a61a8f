//! Log subscriber setup for the `crossgen` binary.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding the log filter directives.
pub const LOG_ENV: &str = "CROSSGEN_LOG";

/// Returns the filter directives to use.
///
/// `CROSSGEN_LOG` wins when set; otherwise `--verbose` selects `debug` and the
/// default is `warn`.
pub fn directives(env_value: Option<&str>, verbose: bool) -> String {
    match env_value {
        Some(value) if !value.trim().is_empty() => value.to_string(),
        _ if verbose => "debug".to_string(),
        _ => "warn".to_string(),
    }
}

/// Installs the global subscriber, writing to stderr.
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init(verbose: bool) {
    let env_value = std::env::var(LOG_ENV).ok();
    let filter = EnvFilter::try_new(directives(env_value.as_deref(), verbose))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}
