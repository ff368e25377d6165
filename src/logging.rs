// src/logging.rs

//! Logging for the `proctrack` binary.
//!
//! Stdout and stderr of the binary carry the launched command's output, so
//! diagnostics are kept quiet by default: only `warn` and above (timeouts,
//! kill failures, handler failures) reach stderr.
//!
//! - `--log-level LEVEL` sets the level for everything.
//! - Otherwise `PROCTRACK_LOG` is read as an `EnvFilter` directive, so both
//!   `debug` and `proctrack::exec=debug,warn` work. An unparsable value falls
//!   back to the default.

use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

const DEFAULT_DIRECTIVE: &str = "warn";

/// Install the global subscriber, writing to stderr. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var("PROCTRACK_LOG").ok();

    fmt()
        .with_env_filter(resolve_filter(cli_level, env.as_deref()))
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;

    Ok(())
}

/// Filter for the given CLI level and `PROCTRACK_LOG` value, CLI first.
fn resolve_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> EnvFilter {
    if let Some(level) = cli_level {
        return EnvFilter::new(directive(level));
    }
    env.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| EnvFilter::try_new(s).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVE))
}

fn directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}
