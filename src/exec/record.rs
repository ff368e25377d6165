// src/exec/record.rs

//! The per-execution result holder.
//!
//! An [`ExecutionRecord`] is created in `READY` by its
//! [`ExecutionManager`](super::ExecutionManager), which is the only thing that
//! mutates it. Callers get an `Arc<ExecutionRecord>` and read from it; all
//! readers are infallible.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::process::{ChildStderr, ChildStdout};

use crate::errors::ExecutionFailure;
use crate::event::SharedObserver;
use crate::types::Status;

#[derive(Debug)]
struct RecordState {
    status: Status,
    exit_code: Option<i32>,
    thrown: Option<ExecutionFailure>,
}

pub struct ExecutionRecord {
    state: Mutex<RecordState>,
    stdout: Mutex<Option<ChildStdout>>,
    stderr: Mutex<Option<ChildStderr>>,
    observers: Mutex<Vec<SharedObserver<ExecutionRecord>>>,
}

/// Lock ignoring poisoning; a panicking observer must not make the record
/// unreadable.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ExecutionRecord {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(RecordState {
                status: Status::Ready,
                exit_code: None,
                thrown: None,
            }),
            stdout: Mutex::new(None),
            stderr: Mutex::new(None),
            observers: Mutex::new(Vec::new()),
        }
    }

    pub fn status(&self) -> Status {
        lock(&self.state).status
    }

    /// Exit code of the process; `None` until it has exited (or was killed).
    pub fn exit_code(&self) -> Option<i32> {
        lock(&self.state).exit_code
    }

    /// Cause of an `ERROR` or `CANCELLED` outcome.
    pub fn thrown(&self) -> Option<ExecutionFailure> {
        lock(&self.state).thrown.clone()
    }

    pub fn is_ready(&self) -> bool {
        self.status() == Status::Ready
    }

    pub fn is_running(&self) -> bool {
        self.status() == Status::Running
    }

    pub fn is_succeeded(&self) -> bool {
        self.status() == Status::Succeeded
    }

    pub fn is_failed(&self) -> bool {
        self.status() == Status::Failed
    }

    pub fn is_error(&self) -> bool {
        self.status() == Status::Error
    }

    pub fn is_cancelled(&self) -> bool {
        self.status() == Status::Cancelled
    }

    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }

    /// Take the live stdout pipe of the child.
    ///
    /// `None` if stdout was redirected, the process never started, or the
    /// handle was already taken. Draining it is the caller's job.
    pub fn take_stdout(&self) -> Option<ChildStdout> {
        lock(&self.stdout).take()
    }

    /// Take the live stderr pipe of the child. See [`take_stdout`](Self::take_stdout).
    pub fn take_stderr(&self) -> Option<ChildStderr> {
        lock(&self.stderr).take()
    }

    /// Register an observer, notified after each subsequent status change.
    pub fn add_observer(&self, observer: SharedObserver<ExecutionRecord>) {
        lock(&self.observers).push(observer);
    }

    pub(crate) fn set_status(&self, status: Status) {
        lock(&self.state).status = status;
    }

    pub(crate) fn set_exit_code(&self, exit_code: i32) {
        lock(&self.state).exit_code = Some(exit_code);
    }

    pub(crate) fn set_thrown(&self, thrown: ExecutionFailure) {
        lock(&self.state).thrown = Some(thrown);
    }

    pub(crate) fn set_streams(&self, stdout: Option<ChildStdout>, stderr: Option<ChildStderr>) {
        *lock(&self.stdout) = stdout;
        *lock(&self.stderr) = stderr;
    }

    /// Notify every observer of the current state, in registration order.
    ///
    /// The observer list is snapshotted first so observers may register
    /// further observers without deadlocking.
    pub(crate) fn notify_observers(&self) {
        let observers = lock(&self.observers).clone();
        for observer in observers {
            observer.update(self);
        }
    }
}

impl fmt::Debug for ExecutionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("ExecutionRecord")
            .field("status", &state.status)
            .field("exit_code", &state.exit_code)
            .field("thrown", &state.thrown)
            .finish_non_exhaustive()
    }
}
