// src/exec/runner.rs

//! Start / wait / classify / notify.
//!
//! [`execute`] is the single entry point. The sequence always runs on its own
//! Tokio task, so it reaches a terminal status and fires completion handlers
//! even if the caller stops polling. For a synchronous request `execute`
//! awaits that task and hands back a terminal record. For an asynchronous
//! request it returns the `READY` record at once; later transitions are only
//! visible through handlers, observers, or polling the record.

use std::process::ExitStatus;
use std::sync::Arc;

use tracing::{info, warn};

use crate::errors::{ExecutionFailure, Result};
use crate::exec::strategy::ExecutorStrategy;
use crate::exec::{ExecutionManager, ExecutionRecord, ExecutionRequest};

/// Launch `request` with `strategy`.
///
/// Errors returned here:
/// - a failing `READY` handler (nothing was started);
/// - for synchronous requests, a launch/wait failure (the record is in
///   `ERROR` and completion handlers already ran), or otherwise the latest
///   handler failure.
///
/// Asynchronous requests log those errors instead.
///
/// Dropping the returned future does not abandon the execution: the process
/// is still waited for, classified, and the completion handlers still run.
pub async fn execute(
    strategy: Arc<dyn ExecutorStrategy>,
    request: ExecutionRequest,
) -> Result<Arc<ExecutionRecord>> {
    let request = Arc::new(request);
    let manager = ExecutionManager::new(Arc::clone(&request))?;
    let record = Arc::clone(manager.record());

    let asynchronous = request.is_async();
    let task = tokio::spawn(async move {
        let outcome = run_process(strategy.as_ref(), &manager).await;
        if asynchronous && let Err(err) = &outcome {
            warn!(
                command = %manager.request().command(),
                error = %err,
                "asynchronous execution error"
            );
        }
        outcome
    });

    if asynchronous {
        return Ok(record);
    }

    match task.await {
        Ok(outcome) => outcome?,
        Err(err) => {
            return Err(anyhow::Error::new(err)
                .context("execution task failed")
                .into());
        }
    }

    Ok(record)
}

async fn run_process(strategy: &dyn ExecutorStrategy, manager: &ExecutionManager) -> Result<()> {
    let outcome = drive(strategy, manager).await;

    if let Err(failure) = &outcome {
        manager.notify_error(failure.clone());
    }
    manager.notify_finished();

    outcome?;
    if let Some(err) = manager.take_handler_error() {
        return Err(err.into());
    }
    Ok(())
}

async fn drive(
    strategy: &dyn ExecutorStrategy,
    manager: &ExecutionManager,
) -> std::result::Result<(), ExecutionFailure> {
    let request = manager.request();
    let mut command = strategy.prepare(request)?;

    info!(
        strategy = strategy.name(),
        cmd = %request.display_command(),
        "starting process"
    );
    let mut child = manager.start_process(&mut command)?;

    let Some(timeout) = request.timeout() else {
        let status = child.wait().await.map_err(|e| wait_failure(request, e))?;
        let code = exit_code_of(status);
        info!(cmd = %request.command(), exit_code = code, "process exited");
        manager.notify_ended(code);
        return Ok(());
    };

    let exited = match timeout.as_duration() {
        Some(limit) => tokio::time::timeout(limit, child.wait()).await.ok(),
        None => None,
    };

    match exited {
        Some(status) => {
            let status = status.map_err(|e| wait_failure(request, e))?;
            let code = exit_code_of(status);
            info!(cmd = %request.command(), exit_code = code, "process exited");
            manager.notify_ended(code);
        }
        None => {
            warn!(cmd = %request.command(), %timeout, "process timed out; killing");
            if let Err(e) = child.kill().await {
                warn!(cmd = %request.command(), error = %e, "failed to kill timed out process");
            }
            let status = child.wait().await.map_err(|e| wait_failure(request, e))?;
            manager.notify_cancelled(
                exit_code_of(status),
                ExecutionFailure::Timeout {
                    command: request.command().to_string(),
                    timeout,
                },
            );
        }
    }

    Ok(())
}

fn wait_failure(request: &ExecutionRequest, e: std::io::Error) -> ExecutionFailure {
    ExecutionFailure::Wait {
        command: request.command().to_string(),
        source: Arc::new(e),
    }
}

/// Numeric exit code; a signal-terminated Unix process maps to
/// `128 + signal`, anything else without a code to `-1`.
pub fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}

#[cfg(all(test, unix))]
mod tests {
    use std::os::unix::process::ExitStatusExt;

    use super::*;

    #[test]
    fn exit_codes_from_status() {
        assert_eq!(exit_code_of(ExitStatus::from_raw(0)), 0);
        assert_eq!(exit_code_of(ExitStatus::from_raw(3 << 8)), 3);
        // Raw wait status 9: terminated by SIGKILL.
        assert_eq!(exit_code_of(ExitStatus::from_raw(9)), 137);
    }
}
