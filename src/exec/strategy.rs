// src/exec/strategy.rs

//! Platform strategies: how a request becomes an OS process invocation.
//!
//! A strategy decides the argv ([`ExecutorStrategy::command_line`]) and may
//! override how the whole `tokio::process::Command` is assembled
//! ([`ExecutorStrategy::prepare`]). The [`ExecutorRegistry`](super::ExecutorRegistry)
//! picks one per launch by priority and platform support.
//!
//! Priority convention: lower values are tried first. A strategy may declare
//! its own priority through [`ExecutorStrategy::priority`]; one that does not
//! is ranked by whoever registers it, at [`DEFAULT_PRIORITY`] unless told
//! otherwise, and is therefore preferred over the built-ins, which use
//! [`BUILTIN_PRIORITY`]. [`DirectStrategy`] sits at [`FALLBACK_PRIORITY`] so
//! it is only chosen when nothing more specific applies.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;

use tokio::process::Command;

use crate::errors::ExecutionFailure;
use crate::exec::ExecutionRequest;
use crate::exec::request::EnvironmentFn;
use crate::platform;

/// Priority of custom strategies that do not declare one.
pub const DEFAULT_PRIORITY: i32 = 1;

/// Default priority of the platform built-ins.
pub const BUILTIN_PRIORITY: i32 = 100;

/// Priority of [`DirectStrategy`], the last resort.
pub const FALLBACK_PRIORITY: i32 = i32::MAX;

pub trait ExecutorStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Priority this strategy insists on. `None` leaves the choice to the
    /// registry.
    fn priority(&self) -> Option<i32> {
        None
    }

    /// Whether this strategy can run on the current platform/configuration.
    fn is_supported(&self) -> bool;

    /// The argv to execute. Defaults to the command followed by its options.
    fn command_line(&self, request: &ExecutionRequest) -> Vec<String> {
        direct_command_line(request)
    }

    /// Assemble the command: argv, working directory, environment, redirects.
    ///
    /// Failing to open a redirect target is reported as a launch failure.
    fn prepare(&self, request: &ExecutionRequest) -> Result<Command, ExecutionFailure> {
        prepare_command(&self.command_line(request), request)
    }
}

/// `command` followed by `options`, unchanged.
pub fn direct_command_line(request: &ExecutionRequest) -> Vec<String> {
    std::iter::once(request.command().to_string())
        .chain(request.options().iter().cloned())
        .collect()
}

/// Build a `Command` for `argv` with the request's directory, environment
/// and redirects applied.
///
/// stdin is closed; stdout/stderr are piped unless redirected to a file. The
/// child is killed if its handle is dropped.
pub fn prepare_command(
    argv: &[String],
    request: &ExecutionRequest,
) -> Result<Command, ExecutionFailure> {
    let Some((program, args)) = argv.split_first() else {
        return Err(ExecutionFailure::Spawn {
            command: request.command().to_string(),
            source: Arc::new(io::Error::new(
                io::ErrorKind::InvalidInput,
                "empty command line",
            )),
        });
    };

    let mut cmd = Command::new(program);
    cmd.args(args);

    if let Some(dir) = request.directory() {
        cmd.current_dir(dir);
    }

    if let Some(environment) = request.environment() {
        apply_environment(&mut cmd, environment);
    }

    cmd.stdin(Stdio::null());

    match request.redirect_stdout() {
        Some(path) => cmd.stdout(open_redirect(path)?),
        None => cmd.stdout(Stdio::piped()),
    };
    match request.redirect_stderr() {
        Some(path) => cmd.stderr(open_redirect(path)?),
        None => cmd.stderr(Stdio::piped()),
    };

    cmd.kill_on_drop(true);
    Ok(cmd)
}

/// Let `environment` edit a copy of the inherited environment, then apply
/// the difference to `cmd`.
///
/// Variables whose name or value is not valid UTF-8 are not shown to the
/// mutation function and are passed through untouched.
fn apply_environment(cmd: &mut Command, environment: &EnvironmentFn) {
    let inherited: HashMap<String, String> = std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect();

    let mut env = inherited.clone();
    environment(&mut env);

    for key in inherited.keys() {
        if !env.contains_key(key) {
            cmd.env_remove(key);
        }
    }
    for (key, value) in &env {
        if inherited.get(key) != Some(value) {
            cmd.env(key, value);
        }
    }
}

fn open_redirect(path: &Path) -> Result<File, ExecutionFailure> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(|e| ExecutionFailure::Redirect {
            path: path.to_path_buf(),
            source: Arc::new(e),
        })
}

/// Pins an existing strategy to a given priority, delegating everything
/// else.
pub struct Prioritized {
    inner: Arc<dyn ExecutorStrategy>,
    priority: i32,
}

impl Prioritized {
    pub fn new(inner: Arc<dyn ExecutorStrategy>, priority: i32) -> Self {
        Self { inner, priority }
    }
}

impl ExecutorStrategy for Prioritized {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn priority(&self) -> Option<i32> {
        Some(self.priority)
    }

    fn is_supported(&self) -> bool {
        self.inner.is_supported()
    }

    fn command_line(&self, request: &ExecutionRequest) -> Vec<String> {
        self.inner.command_line(request)
    }

    fn prepare(&self, request: &ExecutionRequest) -> Result<Command, ExecutionFailure> {
        self.inner.prepare(request)
    }
}

/// Runs the command as-is on every platform.
#[derive(Debug, Clone)]
pub struct DirectStrategy;

impl ExecutorStrategy for DirectStrategy {
    fn name(&self) -> &str {
        "direct"
    }

    fn priority(&self) -> Option<i32> {
        Some(FALLBACK_PRIORITY)
    }

    fn is_supported(&self) -> bool {
        true
    }
}

/// Wraps the command in `sh -c` on Unix so shell builtins (`:`, `exit`,
/// `cd`, ...) can be launched. Only supported when enabled in config.
#[derive(Debug, Clone)]
pub struct PosixShellStrategy {
    priority: i32,
    enabled: bool,
}

impl PosixShellStrategy {
    pub fn new(priority: i32, enabled: bool) -> Self {
        Self { priority, enabled }
    }
}

impl ExecutorStrategy for PosixShellStrategy {
    fn name(&self) -> &str {
        "posix-shell"
    }

    fn priority(&self) -> Option<i32> {
        Some(self.priority)
    }

    fn is_supported(&self) -> bool {
        self.enabled && platform::is_unix()
    }

    fn command_line(&self, request: &ExecutionRequest) -> Vec<String> {
        let script = shell_words::join(direct_command_line(request));
        vec!["sh".to_string(), "-c".to_string(), script]
    }
}

/// Windows strategy. With `auto_msdos` the command is prefixed by `cmd /c`
/// so `cmd` builtins work; otherwise it runs directly.
#[derive(Debug, Clone)]
pub struct MsDosStrategy {
    priority: i32,
    auto_msdos: bool,
}

impl MsDosStrategy {
    pub fn new(priority: i32, auto_msdos: bool) -> Self {
        Self {
            priority,
            auto_msdos,
        }
    }
}

impl ExecutorStrategy for MsDosStrategy {
    fn name(&self) -> &str {
        "msdos"
    }

    fn priority(&self) -> Option<i32> {
        Some(self.priority)
    }

    fn is_supported(&self) -> bool {
        platform::is_windows()
    }

    fn command_line(&self, request: &ExecutionRequest) -> Vec<String> {
        let mut argv = Vec::with_capacity(request.options().len() + 3);
        if self.auto_msdos {
            argv.push("cmd".to_string());
            argv.push("/c".to_string());
        }
        argv.extend(direct_command_line(request));
        argv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::RequestBuilder;

    fn request(cmd: &str, opts: &[&str]) -> ExecutionRequest {
        RequestBuilder::new(cmd)
            .unwrap()
            .options(opts.iter().copied())
            .build()
    }

    #[test]
    fn direct_passes_argv_through() {
        let req = request("echo", &["a b", "c"]);
        assert_eq!(
            DirectStrategy.command_line(&req),
            vec!["echo".to_string(), "a b".to_string(), "c".to_string()]
        );
        assert!(DirectStrategy.is_supported());
        assert_eq!(DirectStrategy.priority(), Some(FALLBACK_PRIORITY));
    }

    #[test]
    fn posix_shell_quotes_arguments() {
        let req = request("echo", &["a b", "c"]);
        let argv = PosixShellStrategy::new(BUILTIN_PRIORITY, true).command_line(&req);
        assert_eq!(argv[0], "sh");
        assert_eq!(argv[1], "-c");
        assert_eq!(shell_words::split(&argv[2]).unwrap(), vec!["echo", "a b", "c"]);
    }

    #[test]
    fn posix_shell_disabled_is_unsupported() {
        assert!(!PosixShellStrategy::new(BUILTIN_PRIORITY, false).is_supported());
    }

    #[test]
    fn msdos_prefixes_cmd_only_when_enabled() {
        let req = request("dir", &["/b"]);
        assert_eq!(
            MsDosStrategy::new(BUILTIN_PRIORITY, true).command_line(&req),
            vec!["cmd", "/c", "dir", "/b"]
        );
        assert_eq!(
            MsDosStrategy::new(BUILTIN_PRIORITY, false).command_line(&req),
            vec!["dir", "/b"]
        );
    }

    #[test]
    fn prioritized_overrides_priority_only() {
        let wrapped = Prioritized::new(Arc::new(DirectStrategy), 7);
        assert_eq!(wrapped.priority(), Some(7));
        assert_eq!(wrapped.name(), "direct");
        assert!(wrapped.is_supported());
    }

    #[test]
    fn unopenable_redirect_is_a_launch_failure() {
        let req = RequestBuilder::new("true")
            .unwrap()
            .redirect_stdout("/definitely/not/a/dir/out.log")
            .build();
        let err = DirectStrategy.prepare(&req).err().expect("redirect should fail");
        assert!(matches!(err, ExecutionFailure::Redirect { .. }));
    }
}
