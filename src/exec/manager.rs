// src/exec/manager.rs

//! State machine for a single execution.
//!
//! ```text
//! READY --start--> RUNNING --exit, predicate true-->  SUCCEEDED
//!                          --exit, predicate false--> FAILED
//!                          --launch/wait failure-->   ERROR
//!                          --timeout-->               CANCELLED
//! ```
//!
//! The three terminal transitions are serialized by the manager's lock and
//! only the first one takes effect. Completion handlers run exactly once,
//! after whichever terminal transition happened.
//!
//! Handler failures never change the outcome of the execution. They are kept
//! (latest wins) and handed back through [`ExecutionManager::take_handler_error`]
//! once the run is over.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::errors::ExecutionFailure;
use crate::event::dispatcher::panic_message;
use crate::event::{EventHandlingError, fire};
use crate::exec::{ExecutionRecord, ExecutionRequest};
use crate::types::Status;

#[derive(Debug, Default)]
struct Progress {
    /// A terminal status has been set.
    handled: bool,
    /// Completion handlers have run.
    finished: bool,
    /// Most recent handler failure not yet reported.
    deferred: Option<EventHandlingError>,
}

#[derive(Debug)]
pub struct ExecutionManager {
    request: Arc<ExecutionRequest>,
    record: Arc<ExecutionRecord>,
    progress: Mutex<Progress>,
}

impl ExecutionManager {
    /// Create the record for `request` in `READY` and fire the `READY`
    /// handlers.
    ///
    /// A failing `READY` handler aborts here, before any process exists.
    pub fn new(request: Arc<ExecutionRequest>) -> Result<Self, EventHandlingError> {
        let record = Arc::new(ExecutionRecord::new());
        for observer in request.observers() {
            record.add_observer(Arc::clone(observer));
        }

        let manager = Self {
            request,
            record,
            progress: Mutex::new(Progress::default()),
        };

        {
            let mut progress = manager.lock();
            manager.transition(&mut progress, Status::Ready);
            if let Some(err) = progress.deferred.take() {
                return Err(err);
            }
        }

        Ok(manager)
    }

    pub fn record(&self) -> &Arc<ExecutionRecord> {
        &self.record
    }

    pub fn request(&self) -> &ExecutionRequest {
        &self.request
    }

    fn lock(&self) -> MutexGuard<'_, Progress> {
        self.progress.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spawn `command`, publish its pipes on the record, and move to
    /// `RUNNING`.
    pub(crate) fn start_process(&self, command: &mut Command) -> Result<Child, ExecutionFailure> {
        let mut child = command.spawn().map_err(|e| ExecutionFailure::Spawn {
            command: self.request.command().to_string(),
            source: Arc::new(e),
        })?;

        self.record
            .set_streams(child.stdout.take(), child.stderr.take());

        let mut progress = self.lock();
        if !progress.handled {
            self.transition(&mut progress, Status::Running);
        }

        Ok(child)
    }

    /// The process exited with `exit_code`; classify it.
    ///
    /// A panicking success condition is routed to `ERROR`.
    pub fn notify_ended(&self, exit_code: i32) {
        let mut progress = self.lock();
        if progress.handled {
            return;
        }
        progress.handled = true;

        self.record.set_exit_code(exit_code);

        let condition = self.request.success_condition();
        let status = match panic::catch_unwind(AssertUnwindSafe(|| condition(exit_code))) {
            Ok(true) => Status::Succeeded,
            Ok(false) => Status::Failed,
            Err(payload) => {
                let failure = ExecutionFailure::Predicate {
                    command: self.request.command().to_string(),
                    message: panic_message(payload.as_ref()),
                };
                warn!(error = %failure, "success condition panicked");
                self.record.set_thrown(failure);
                Status::Error
            }
        };

        self.transition(&mut progress, status);
    }

    /// Launching or waiting failed.
    pub fn notify_error(&self, failure: ExecutionFailure) {
        let mut progress = self.lock();
        if progress.handled {
            return;
        }
        progress.handled = true;

        self.record.set_thrown(failure);
        self.transition(&mut progress, Status::Error);
    }

    /// The process was terminated after its deadline.
    pub fn notify_cancelled(&self, exit_code: i32, failure: ExecutionFailure) {
        let mut progress = self.lock();
        if progress.handled {
            return;
        }
        progress.handled = true;

        self.record.set_exit_code(exit_code);
        self.record.set_thrown(failure);
        self.transition(&mut progress, Status::Cancelled);
    }

    /// Run the completion handlers. Only the first call has any effect.
    pub fn notify_finished(&self) {
        let mut progress = self.lock();
        if progress.finished {
            return;
        }
        progress.finished = true;

        debug!(
            command = %self.request.command(),
            status = %self.record.status(),
            "firing completion handlers"
        );
        if let Err(err) = fire(self.request.done_handlers(), self.record.as_ref()) {
            warn!(error = %err, "completion handler failed");
            progress.deferred = Some(err);
        }
    }

    /// Take the latest handler failure recorded during this execution.
    pub fn take_handler_error(&self) -> Option<EventHandlingError> {
        self.lock().deferred.take()
    }

    fn transition(&self, progress: &mut Progress, status: Status) {
        self.record.set_status(status);
        debug!(command = %self.request.command(), %status, "status changed");

        self.record.notify_observers();

        if let Err(err) = fire(self.request.handlers(status), self.record.as_ref()) {
            warn!(%status, error = %err, "status handler failed");
            progress.deferred = Some(err);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::bail;

    use super::*;
    use crate::exec::RequestBuilder;
    use crate::types::Timeout;

    fn counter() -> (Arc<AtomicUsize>, impl Fn(&ExecutionRecord) -> anyhow::Result<()> + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        (count, move |_: &ExecutionRecord| {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    fn manager(builder: RequestBuilder) -> ExecutionManager {
        ExecutionManager::new(Arc::new(builder.build())).unwrap()
    }

    #[test]
    fn new_manager_is_ready_and_fires_ready_handlers() {
        let (ready, handler) = counter();
        let m = manager(RequestBuilder::new("true").unwrap().on_ready(handler));
        assert!(m.record().is_ready());
        assert_eq!(ready.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failing_ready_handler_aborts_construction() {
        let req = RequestBuilder::new("true")
            .unwrap()
            .on_ready(|_| bail!("not ready"))
            .build();
        let err = ExecutionManager::new(Arc::new(req)).unwrap_err();
        assert_eq!(err.last().to_string(), "not ready");
    }

    #[test]
    fn ended_is_classified_by_success_condition() {
        let m = manager(RequestBuilder::new("exit").unwrap().success_code(1));
        m.notify_ended(1);
        assert!(m.record().is_succeeded());
        assert_eq!(m.record().exit_code(), Some(1));
        assert!(m.record().thrown().is_none());

        let m = manager(RequestBuilder::new("exit").unwrap());
        m.notify_ended(1);
        assert!(m.record().is_failed());
        assert!(m.record().thrown().is_none());
    }

    #[test]
    fn first_terminal_transition_wins() {
        let (failed, on_failed) = counter();
        let (cancelled, on_cancelled) = counter();
        let m = manager(
            RequestBuilder::new("x")
                .unwrap()
                .on_failed(on_failed)
                .on_cancelled(on_cancelled),
        );

        m.notify_ended(2);
        m.notify_cancelled(
            137,
            ExecutionFailure::Timeout {
                command: "x".into(),
                timeout: Timeout::millis(1),
            },
        );
        m.notify_error(ExecutionFailure::Predicate {
            command: "x".into(),
            message: "late".into(),
        });

        assert!(m.record().is_failed());
        assert_eq!(m.record().exit_code(), Some(2));
        assert!(m.record().thrown().is_none());
        assert_eq!(failed.load(Ordering::SeqCst), 1);
        assert_eq!(cancelled.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn panicking_success_condition_routes_to_error() {
        let m = manager(
            RequestBuilder::new("x")
                .unwrap()
                .success_condition(|_| panic!("bad predicate")),
        );
        m.notify_ended(0);
        assert!(m.record().is_error());
        let thrown = m.record().thrown().expect("predicate failure recorded");
        assert!(thrown.to_string().contains("bad predicate"));
    }

    #[test]
    fn finished_runs_once() {
        let (done, on_done) = counter();
        let m = manager(RequestBuilder::new("x").unwrap().on_done(on_done));
        m.notify_ended(0);
        m.notify_finished();
        m.notify_finished();
        assert_eq!(done.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn handler_failures_are_deferred_latest_wins() {
        let (done, on_done) = counter();
        let m = manager(
            RequestBuilder::new("x")
                .unwrap()
                .on_succeeded(|_| bail!("succeeded handler"))
                .on_done(|_| bail!("done handler"))
                .on_done(on_done),
        );
        m.notify_ended(0);
        m.notify_finished();

        assert!(m.record().is_succeeded());
        assert_eq!(done.load(Ordering::SeqCst), 1);
        let err = m.take_handler_error().expect("handler error kept");
        assert_eq!(err.last().to_string(), "done handler");
        assert!(m.take_handler_error().is_none());
    }
}
