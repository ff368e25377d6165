// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod event;
pub mod exec;
pub mod launcher;
pub mod logging;
pub mod platform;
pub mod types;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::AsyncWrite;
use tokio::task::JoinHandle;
use tracing::{debug, info};

pub use crate::config::ConfigFile;
pub use crate::errors::{ExecutionFailure, ProctrackError};
pub use crate::exec::{ExecutionRecord, ExecutionRequest, RequestBuilder};
pub use crate::launcher::Launcher;
pub use crate::types::{Status, TimeUnit, Timeout};

use crate::cli::CliArgs;
use crate::config::{default_config_path, load_and_validate, load_or_default};

/// How long output forwarding may lag behind a cancelled or failed command.
///
/// A killed command can leave children behind that keep its pipes open;
/// forwarding is abandoned after this grace period.
const FORWARD_GRACE: Duration = Duration::from_millis(200);

/// High-level entry point used by `main.rs`.
///
/// Runs one command to completion and returns the exit code `proctrack`
/// itself should exit with:
/// - `0` when the command SUCCEEDED,
/// - the command's own exit code when it FAILED (or `1` if that is `0`),
/// - `1` for ERROR and CANCELLED.
pub async fn run(args: CliArgs) -> Result<i32> {
    let mut config = match &args.config {
        Some(path) => load_and_validate(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => load_or_default(default_config_path())?,
    };
    if args.shell {
        config.platform.auto_shell = true;
        config.platform.auto_msdos = true;
    }

    let launcher = Launcher::new(config);
    debug!(strategies = ?launcher.registry().names(), "launcher ready");

    let (program, rest) = args
        .command
        .split_first()
        .context("no command given")?;

    let mut builder = launcher.command(program.as_str())?.options(rest.iter().cloned());

    if let Some(dir) = &args.dir {
        builder = builder.directory(dir)?;
    }
    if let Some(timeout) = args.timeout {
        builder = builder.timeout(timeout);
    }
    if let Some(code) = args.success_code {
        builder = builder.success_code(code);
    }
    if !args.env.is_empty() {
        let pairs = args.env.clone();
        builder = builder.environment(move |env| {
            for (key, value) in &pairs {
                env.insert(key.clone(), value.clone());
            }
        });
    }
    if args.quiet_output {
        builder = builder
            .redirect_stdout_to_dev_null()
            .redirect_stderr_to_dev_null();
    }
    if let Some(path) = &args.stdout {
        builder = builder.redirect_stdout(path);
    }
    if let Some(path) = &args.stderr {
        builder = builder.redirect_stderr(path);
    }

    // Forward whatever pipes the child has to our own stdout/stderr.
    let forwarders: Arc<Mutex<Vec<JoinHandle<()>>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&forwarders);
    builder = builder.on_running(move |record| {
        let mut handles = sink.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(stdout) = record.take_stdout() {
            handles.push(forward(stdout, tokio::io::stdout()));
        }
        if let Some(stderr) = record.take_stderr() {
            handles.push(forward(stderr, tokio::io::stderr()));
        }
        Ok(())
    });

    let record = launcher.execute(builder.build()).await?;

    let handles = std::mem::take(&mut *forwarders.lock().unwrap_or_else(|e| e.into_inner()));
    let grace = match record.status() {
        Status::Cancelled | Status::Error => Some(FORWARD_GRACE),
        _ => None,
    };
    let abandoned = drain_forwarders(handles, grace).await;
    if abandoned > 0 {
        debug!(abandoned, "gave up forwarding output of a stopped command");
    }

    report(&record);
    Ok(exit_code_for(&record))
}

fn forward<R, W>(mut reader: R, mut writer: W) -> JoinHandle<()>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = tokio::io::copy(&mut reader, &mut writer).await {
            debug!(error = %e, "output forwarding stopped");
        }
    })
}

/// Wait for output forwarders to finish, each for at most `grace` when given.
///
/// Returns how many were still running and got aborted.
async fn drain_forwarders(handles: Vec<JoinHandle<()>>, grace: Option<Duration>) -> usize {
    let mut abandoned = 0;
    for mut handle in handles {
        let joined = match grace {
            Some(limit) => match tokio::time::timeout(limit, &mut handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    handle.abort();
                    abandoned += 1;
                    continue;
                }
            },
            None => handle.await,
        };
        if let Err(e) = joined {
            debug!(error = %e, "output forwarder failed");
        }
    }
    abandoned
}

fn report(record: &ExecutionRecord) {
    info!(status = %record.status(), exit_code = ?record.exit_code(), "command finished");
    match (record.exit_code(), record.thrown()) {
        (Some(code), None) => eprintln!("{} (exit code {})", record.status(), code),
        (Some(code), Some(cause)) => {
            eprintln!("{} (exit code {}): {}", record.status(), code, cause)
        }
        (None, Some(cause)) => eprintln!("{}: {}", record.status(), cause),
        (None, None) => eprintln!("{}", record.status()),
    }
}

fn exit_code_for(record: &ExecutionRecord) -> i32 {
    match record.status() {
        Status::Succeeded => 0,
        Status::Failed => match record.exit_code() {
            Some(0) | None => 1,
            Some(code) => code,
        },
        _ => 1,
    }
}
