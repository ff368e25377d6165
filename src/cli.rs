// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::types::Timeout;

/// Command-line arguments for `proctrack`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "proctrack",
    version,
    about = "Run a command, enforce a timeout, and report how it ended.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `PROCTRACK_CONFIG`, else `Proctrack.toml` in the current
    /// directory if it exists.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Working directory for the command.
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Kill the command after this long (e.g. `500ms`, `30s`, `2m`).
    #[arg(long, value_name = "DURATION", allow_hyphen_values = true)]
    pub timeout: Option<Timeout>,

    /// Exit code treated as success (default from config, else 0).
    #[arg(long, value_name = "CODE", allow_hyphen_values = true)]
    pub success_code: Option<i32>,

    /// Set an environment variable for the command. Repeatable.
    #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_env_pair)]
    pub env: Vec<(String, String)>,

    /// Write the command's stdout to this file instead of the terminal.
    #[arg(long, value_name = "FILE")]
    pub stdout: Option<PathBuf>,

    /// Write the command's stderr to this file instead of the terminal.
    #[arg(long, value_name = "FILE")]
    pub stderr: Option<PathBuf>,

    /// Discard the command's stdout and stderr.
    #[arg(long, conflicts_with_all = ["stdout", "stderr"])]
    pub quiet_output: bool,

    /// Run the command through the platform shell (`sh -c` / `cmd /c`).
    #[arg(long)]
    pub shell: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PROCTRACK_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// The command followed by its arguments.
    #[arg(required = true, trailing_var_arg = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn parse_env_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
