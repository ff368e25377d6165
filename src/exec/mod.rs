// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`request`] holds the immutable [`ExecutionRequest`] and its
//!   [`RequestBuilder`].
//! - [`record`] holds the mutable, observable [`ExecutionRecord`].
//! - [`manager`] owns one record and drives its state machine.
//! - [`strategy`] turns a request into a `tokio::process::Command`, with
//!   per-platform built-ins.
//! - [`registry`] picks the strategy to use.
//! - [`runner`] runs the start / wait / timeout / classify sequence, inline
//!   or on a spawned task.

pub mod manager;
pub mod record;
pub mod registry;
pub mod request;
pub mod runner;
pub mod strategy;

pub use manager::ExecutionManager;
pub use record::ExecutionRecord;
pub use registry::ExecutorRegistry;
pub use request::{
    DEFAULT_SUCCESS_CODE, EnvironmentFn, ExecutionRequest, RequestBuilder, SuccessPredicate,
};
pub use runner::execute;
pub use strategy::{
    BUILTIN_PRIORITY, DEFAULT_PRIORITY, DirectStrategy, ExecutorStrategy, FALLBACK_PRIORITY,
    MsDosStrategy, PosixShellStrategy, Prioritized, direct_command_line, prepare_command,
};
