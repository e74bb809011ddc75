//! Logging setup for the Aura binary
//!
//! Logs go to stderr so command output on stdout stays machine readable
//! (`sessions list --json`). `RUST_LOG` takes precedence over `--verbose`.

use crate::cli::LogFormat;
use crate::error::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is not set
///
/// # Examples
///
/// ```
/// use aura::logging::default_filter;
///
/// assert_eq!(default_filter(false), "aura=info");
/// assert_eq!(default_filter(true), "aura=debug");
/// ```
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "aura=debug"
    } else {
        "aura=info"
    }
}

/// Initialize the global tracing subscriber
///
/// # Errors
///
/// Returns error if the default filter cannot be parsed
pub fn init_logging(verbose: bool, format: LogFormat) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_filter(verbose)))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Json => {
            let stderr_layer = fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(std::io::stderr);
            registry.with(stderr_layer).init();
        }
        LogFormat::Text => {
            let stderr_layer = fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_writer(std::io::stderr);
            registry.with(stderr_layer).init();
        }
    }

    Ok(())
}
