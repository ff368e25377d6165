// src/exec/request.rs

//! Execution requests and the builder that validates them.
//!
//! A [`RequestBuilder`] rejects bad input as early as possible: an empty
//! command fails in [`RequestBuilder::new`], a missing working directory fails
//! in [`RequestBuilder::directory`]. Nothing here starts a process.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::{ProctrackError, Result};
use crate::event::{SharedHandler, SharedObserver};
use crate::exec::ExecutionRecord;
use crate::platform;
use crate::types::{Status, Timeout};

/// Exit code considered successful when no other condition is given.
pub const DEFAULT_SUCCESS_CODE: i32 = 0;

/// Classifies an exit code as success (`true`) or failure.
pub type SuccessPredicate = Arc<dyn Fn(i32) -> bool + Send + Sync>;

/// Mutates the environment inherited by the child before it starts.
pub type EnvironmentFn = Arc<dyn Fn(&mut HashMap<String, String>) + Send + Sync>;

type RecordHandler = SharedHandler<ExecutionRecord>;

/// A finalized description of one process launch.
///
/// Built by [`RequestBuilder`] and read-only afterwards.
pub struct ExecutionRequest {
    command: String,
    options: Vec<String>,
    directory: Option<PathBuf>,
    environment: Option<EnvironmentFn>,
    redirect_stdout: Option<PathBuf>,
    redirect_stderr: Option<PathBuf>,
    timeout: Option<Timeout>,
    asynchronous: bool,
    success_condition: SuccessPredicate,
    handlers: HashMap<Status, Vec<RecordHandler>>,
    done_handlers: Vec<RecordHandler>,
    observers: Vec<SharedObserver<ExecutionRecord>>,
}

impl ExecutionRequest {
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    pub fn environment(&self) -> Option<&EnvironmentFn> {
        self.environment.as_ref()
    }

    pub fn redirect_stdout(&self) -> Option<&Path> {
        self.redirect_stdout.as_deref()
    }

    pub fn redirect_stderr(&self) -> Option<&Path> {
        self.redirect_stderr.as_deref()
    }

    pub fn timeout(&self) -> Option<Timeout> {
        self.timeout
    }

    pub fn is_async(&self) -> bool {
        self.asynchronous
    }

    pub fn success_condition(&self) -> &SuccessPredicate {
        &self.success_condition
    }

    /// Handlers registered for `status`, in registration order.
    pub fn handlers(&self, status: Status) -> &[RecordHandler] {
        self.handlers.get(&status).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Completion handlers, run once after the terminal status.
    pub fn done_handlers(&self) -> &[RecordHandler] {
        &self.done_handlers
    }

    pub fn observers(&self) -> &[SharedObserver<ExecutionRecord>] {
        &self.observers
    }

    /// Command and options joined for log output.
    pub fn display_command(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.options.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Debug for ExecutionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionRequest")
            .field("command", &self.command)
            .field("options", &self.options)
            .field("directory", &self.directory)
            .field("redirect_stdout", &self.redirect_stdout)
            .field("redirect_stderr", &self.redirect_stderr)
            .field("timeout", &self.timeout)
            .field("asynchronous", &self.asynchronous)
            .finish_non_exhaustive()
    }
}

/// Fluent builder for [`ExecutionRequest`].
pub struct RequestBuilder {
    request: ExecutionRequest,
}

impl RequestBuilder {
    /// Start a request for `command`. Fails if the command is empty.
    pub fn new(command: impl Into<String>) -> Result<Self> {
        let command = command.into();
        if command.trim().is_empty() {
            return Err(ProctrackError::EmptyCommand);
        }

        Ok(Self {
            request: ExecutionRequest {
                command,
                options: Vec::new(),
                directory: None,
                environment: None,
                redirect_stdout: None,
                redirect_stderr: None,
                timeout: None,
                asynchronous: false,
                success_condition: Arc::new(|rc| rc == DEFAULT_SUCCESS_CODE),
                handlers: HashMap::new(),
                done_handlers: Vec::new(),
                observers: Vec::new(),
            },
        })
    }

    pub fn option(mut self, option: impl Into<String>) -> Self {
        self.request.options.push(option.into());
        self
    }

    /// Replace the option list.
    pub fn options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request.options = options.into_iter().map(Into::into).collect();
        self
    }

    /// Set the working directory.
    ///
    /// The path is canonicalized; if it does not exist the error carries the
    /// absolute path that was looked up.
    pub fn directory(mut self, directory: impl AsRef<Path>) -> Result<Self> {
        let directory = directory.as_ref();
        let canonical = match directory.canonicalize() {
            Ok(p) => p,
            Err(_) => {
                let absolute =
                    std::path::absolute(directory).unwrap_or_else(|_| directory.to_path_buf());
                return Err(ProctrackError::DirectoryNotFound(absolute));
            }
        };

        if !canonical.is_dir() {
            return Err(ProctrackError::ConfigError(format!(
                "working directory {} is not a directory",
                canonical.display()
            )));
        }

        self.request.directory = Some(canonical);
        Ok(self)
    }

    /// Mutate the inherited environment before the child starts.
    pub fn environment<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut HashMap<String, String>) + Send + Sync + 'static,
    {
        self.request.environment = Some(Arc::new(f));
        self
    }

    pub fn redirect_stdout(mut self, path: impl Into<PathBuf>) -> Self {
        self.request.redirect_stdout = Some(path.into());
        self
    }

    pub fn redirect_stderr(mut self, path: impl Into<PathBuf>) -> Self {
        self.request.redirect_stderr = Some(path.into());
        self
    }

    pub fn redirect_stdout_to_dev_null(self) -> Self {
        self.redirect_stdout(platform::dev_null())
    }

    pub fn redirect_stderr_to_dev_null(self) -> Self {
        self.redirect_stderr(platform::dev_null())
    }

    pub fn timeout(mut self, timeout: Timeout) -> Self {
        self.request.timeout = Some(timeout);
        self
    }

    pub fn timeout_millis(self, millis: i64) -> Self {
        self.timeout(Timeout::millis(millis))
    }

    /// Run detached: `execute` returns the `READY` record immediately.
    pub fn async_mode(mut self, asynchronous: bool) -> Self {
        self.request.asynchronous = asynchronous;
        self
    }

    /// Treat exactly `code` as success.
    pub fn success_code(self, code: i32) -> Self {
        self.success_condition(move |rc| rc == code)
    }

    pub fn success_condition<F>(mut self, condition: F) -> Self
    where
        F: Fn(i32) -> bool + Send + Sync + 'static,
    {
        self.request.success_condition = Arc::new(condition);
        self
    }

    /// Register a handler for `status`. Handlers for the same status run in
    /// registration order.
    pub fn handler(mut self, status: Status, handler: RecordHandler) -> Self {
        self.request
            .handlers
            .entry(status)
            .or_default()
            .push(handler);
        self
    }

    /// Register a completion handler.
    pub fn done_handler(mut self, handler: RecordHandler) -> Self {
        self.request.done_handlers.push(handler);
        self
    }

    /// Attach an observer to the record created for this request.
    pub fn observer(mut self, observer: SharedObserver<ExecutionRecord>) -> Self {
        self.request.observers.push(observer);
        self
    }

    pub fn on_ready<F>(self, f: F) -> Self
    where
        F: Fn(&ExecutionRecord) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.handler(Status::Ready, Arc::new(f))
    }

    pub fn on_running<F>(self, f: F) -> Self
    where
        F: Fn(&ExecutionRecord) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.handler(Status::Running, Arc::new(f))
    }

    pub fn on_succeeded<F>(self, f: F) -> Self
    where
        F: Fn(&ExecutionRecord) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.handler(Status::Succeeded, Arc::new(f))
    }

    pub fn on_failed<F>(self, f: F) -> Self
    where
        F: Fn(&ExecutionRecord) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.handler(Status::Failed, Arc::new(f))
    }

    pub fn on_error<F>(self, f: F) -> Self
    where
        F: Fn(&ExecutionRecord) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.handler(Status::Error, Arc::new(f))
    }

    pub fn on_cancelled<F>(self, f: F) -> Self
    where
        F: Fn(&ExecutionRecord) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.handler(Status::Cancelled, Arc::new(f))
    }

    pub fn on_done<F>(self, f: F) -> Self
    where
        F: Fn(&ExecutionRecord) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.done_handler(Arc::new(f))
    }

    pub fn build(self) -> ExecutionRequest {
        self.request
    }
}
