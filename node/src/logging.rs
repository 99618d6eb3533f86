//! # Structured Logging
//!
//! Initializes the `tracing` subscriber with a selectable output format and
//! `RUST_LOG`-style filtering.
//!
//! All log output goes to stderr, so stdout stays clean for commands like
//! `keygen` whose output is meant to be piped.

use clap::ValueEnum;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format, selectable with `--log-format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable, colored, with file and line. For local development.
    Pretty,
    /// One line per event, no source locations.
    Compact,
    /// Machine-parseable JSON lines. For log aggregation.
    Json,
}

/// Filter used when neither `RUST_LOG` nor `--log-level` say otherwise.
pub const DEFAULT_FILTER: &str = "keystone_node=info,keystone_protocol=info,tower_http=info";

/// Initialize the global tracing subscriber.
///
/// Call this exactly once, early in `main()`. Subsequent calls will panic.
///
/// `RUST_LOG` wins over `default_filter` when set:
///
/// ```text
/// RUST_LOG=keystone_node=debug,keystone_protocol=trace,tower_http=debug
/// ```
pub fn init_logging(default_filter: &str, format: LogFormat) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init(),
        LogFormat::Compact => registry
            .with(fmt::layer().with_writer(std::io::stderr).compact())
            .init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .json()
                    .with_target(true),
            )
            .init(),
    }

    tracing::debug!(?format, "logging initialized");
}
