// src/event/mod.rs

//! Handler and observer plumbing.
//!
//! - [`handler`] defines [`EventHandler`], the fallible callback a caller
//!   registers for a status (or for completion), and [`Observer`], the
//!   infallible listener attached to an execution record.
//! - [`dispatcher`] fires a list of handlers against a target, keeps going
//!   past failures, and reports them once at the end.

pub mod dispatcher;
pub mod handler;

pub use dispatcher::{EventHandlingError, fire};
pub use handler::{EventHandler, Observer, SharedHandler, SharedObserver};
