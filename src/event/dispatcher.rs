// src/event/dispatcher.rs

//! Fire-all-then-report dispatch.
//!
//! Every handler runs, in registration order, even if an earlier one failed
//! or panicked. When at least one failed, a single [`EventHandlingError`] is
//! returned wrapping the **last** failure; earlier failures are only counted.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;
use tracing::debug;

use super::handler::SharedHandler;

#[derive(Error, Debug)]
#[error("{failures} event handler(s) failed; last error: {last}")]
pub struct EventHandlingError {
    failures: usize,
    #[source]
    last: anyhow::Error,
}

impl EventHandlingError {
    /// Number of handlers that failed during the dispatch.
    pub fn failures(&self) -> usize {
        self.failures
    }

    /// The most recent failure. Earlier ones are not retained.
    pub fn last(&self) -> &anyhow::Error {
        &self.last
    }
}

pub fn fire<T: ?Sized>(
    handlers: &[SharedHandler<T>],
    target: &T,
) -> Result<(), EventHandlingError> {
    let mut failures = 0;
    let mut last = None;

    for (index, handler) in handlers.iter().enumerate() {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler.handle(target)))
            .unwrap_or_else(|payload| {
                Err(anyhow::anyhow!(
                    "handler panicked: {}",
                    panic_message(payload.as_ref())
                ))
            });

        if let Err(err) = outcome {
            debug!(handler = index, error = %err, "event handler failed; continuing");
            failures += 1;
            last = Some(err);
        }
    }

    match last {
        Some(last) => Err(EventHandlingError { failures, last }),
        None => Ok(()),
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
