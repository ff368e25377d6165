// src/errors.rs

//! Crate-wide error types.
//!
//! [`ProctrackError`] is what public operations return. [`ExecutionFailure`]
//! is the cause attached to an [`ExecutionRecord`](crate::exec::ExecutionRecord)
//! when an execution ends in `ERROR` or `CANCELLED`; it is `Clone` so that
//! the record can hand it out to any number of readers.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::event::EventHandlingError;
use crate::types::Timeout;

#[derive(Error, Debug)]
pub enum ProctrackError {
    #[error("command must not be empty")]
    EmptyCommand,

    #[error("working directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("no executor strategy supports this platform")]
    NoSupportedStrategy,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Execution(#[from] ExecutionFailure),

    #[error(transparent)]
    EventHandling(#[from] EventHandlingError),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Why an execution ended in `ERROR` or `CANCELLED`.
#[derive(Error, Debug, Clone)]
pub enum ExecutionFailure {
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: Arc<io::Error>,
    },

    #[error("failed to open redirect target {}: {source}", .path.display())]
    Redirect {
        path: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },

    #[error("failed waiting for `{command}`: {source}")]
    Wait {
        command: String,
        #[source]
        source: Arc<io::Error>,
    },

    #[error("`{command}` timed out after {timeout}")]
    Timeout { command: String, timeout: Timeout },

    #[error("success condition for `{command}` panicked: {message}")]
    Predicate { command: String, message: String },
}

impl ExecutionFailure {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ExecutionFailure::Timeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, ProctrackError>;
