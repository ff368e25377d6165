// src/event/handler.rs

use std::sync::Arc;

/// A caller-supplied callback invoked when an execution reaches a status.
///
/// Returning an error does not stop other handlers from running; see
/// [`fire`](super::fire).
pub trait EventHandler<T: ?Sized>: Send + Sync {
    fn handle(&self, event: &T) -> anyhow::Result<()>;
}

impl<T, F> EventHandler<T> for F
where
    T: ?Sized,
    F: Fn(&T) -> anyhow::Result<()> + Send + Sync,
{
    fn handle(&self, event: &T) -> anyhow::Result<()> {
        self(event)
    }
}

/// Listener notified after every status change of the value it observes.
///
/// Observers cannot fail; they read the new state and return.
pub trait Observer<T: ?Sized>: Send + Sync {
    fn update(&self, observed: &T);
}

impl<T, F> Observer<T> for F
where
    T: ?Sized,
    F: Fn(&T) + Send + Sync,
{
    fn update(&self, observed: &T) {
        self(observed)
    }
}

pub type SharedHandler<T> = Arc<dyn EventHandler<T>>;
pub type SharedObserver<T> = Arc<dyn Observer<T>>;
