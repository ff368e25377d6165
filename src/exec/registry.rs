// src/exec/registry.rs

//! Ordered collection of executor strategies.
//!
//! The registry is an ordinary value owned by a [`Launcher`](crate::Launcher);
//! there is no global registry. Each strategy is stored with its resolved
//! priority: the one it declares, else the default given at registration.
//! Strategies are kept sorted by ascending priority and selection returns the
//! first one that reports support for the current platform.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::config::ConfigFile;
use crate::errors::{ProctrackError, Result};
use crate::exec::strategy::{
    DEFAULT_PRIORITY, DirectStrategy, ExecutorStrategy, MsDosStrategy, PosixShellStrategy,
};

#[derive(Clone)]
struct Entry {
    priority: i32,
    strategy: Arc<dyn ExecutorStrategy>,
}

#[derive(Default, Clone)]
pub struct ExecutorRegistry {
    entries: Vec<Entry>,
}

impl ExecutorRegistry {
    /// An empty registry. Selecting from it fails until something is
    /// registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in strategies configured by `config`.
    pub fn with_builtins(config: &ConfigFile) -> Self {
        let priority = config.registry.builtin_priority;
        let mut registry = Self::new();
        registry.register(Arc::new(PosixShellStrategy::new(
            priority,
            config.platform.auto_shell,
        )));
        registry.register(Arc::new(MsDosStrategy::new(
            priority,
            config.platform.auto_msdos,
        )));
        registry.register(Arc::new(DirectStrategy));
        registry
    }

    /// Add a strategy at its declared priority, or [`DEFAULT_PRIORITY`].
    pub fn register(&mut self, strategy: Arc<dyn ExecutorStrategy>) {
        self.register_with_default(strategy, DEFAULT_PRIORITY);
    }

    /// Add a strategy at its declared priority, or `default` if it declares
    /// none, and re-sort.
    ///
    /// The sort is stable, so strategies with equal priority keep their
    /// registration order.
    pub fn register_with_default(&mut self, strategy: Arc<dyn ExecutorStrategy>, default: i32) {
        let priority = strategy.priority().unwrap_or(default);
        debug!(
            strategy = strategy.name(),
            priority, "registering executor strategy"
        );
        self.entries.push(Entry { priority, strategy });
        self.entries.sort_by_key(|e| e.priority);
    }

    /// First supported strategy in priority order.
    pub fn select(&self) -> Result<Arc<dyn ExecutorStrategy>> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.strategy.is_supported())
            .ok_or(ProctrackError::NoSupportedStrategy)?;
        debug!(
            strategy = entry.strategy.name(),
            priority = entry.priority,
            "selected executor strategy"
        );
        Ok(Arc::clone(&entry.strategy))
    }

    /// Strategy names in the order they would be tried.
    pub fn names(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| e.strategy.name().to_string())
            .collect()
    }

    /// Resolved priorities, in the same order as [`names`](Self::names).
    pub fn priorities(&self) -> Vec<i32> {
        self.entries.iter().map(|e| e.priority).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ExecutorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutorRegistry")
            .field("strategies", &self.names())
            .field("priorities", &self.priorities())
            .finish()
    }
}
