// src/launcher.rs

//! Top-level facade.
//!
//! A [`Launcher`] owns the configuration and the [`ExecutorRegistry`] for one
//! application context. Create it once and reuse it.
//!
//! With the default configuration commands run directly, without a shell, so
//! a shell builtin such as `:` fails to start and ends in `ERROR`. Turn on
//! `[platform].auto_shell` (or `auto_msdos` on Windows) to run builtins:
//!
//! ```no_run
//! # async fn demo() -> proctrack::errors::Result<()> {
//! use proctrack::{ConfigFile, Launcher, Status};
//!
//! let mut config = ConfigFile::default();
//! config.platform.auto_shell = true;
//! config.platform.auto_msdos = true;
//! let launcher = Launcher::new(config);
//!
//! let record = launcher.execute(launcher.command(":")?.build()).await?;
//! assert_eq!(record.status(), Status::Succeeded);
//!
//! let request = launcher.command("git")?.options(["status"]).build();
//! let record = launcher.execute(request).await?;
//! println!("{} (exit code {:?})", record.status(), record.exit_code());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use crate::config::ConfigFile;
use crate::errors::Result;
use crate::exec::{
    ExecutionRecord, ExecutionRequest, ExecutorRegistry, ExecutorStrategy, Prioritized,
    RequestBuilder, runner,
};

#[derive(Debug, Clone)]
pub struct Launcher {
    config: ConfigFile,
    registry: ExecutorRegistry,
}

impl Launcher {
    /// Launcher with the built-in strategies configured by `config`.
    pub fn new(config: ConfigFile) -> Self {
        let registry = ExecutorRegistry::with_builtins(&config);
        Self { config, registry }
    }

    /// Launcher with an explicitly assembled registry.
    pub fn with_registry(config: ConfigFile, registry: ExecutorRegistry) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn registry(&self) -> &ExecutorRegistry {
        &self.registry
    }

    /// Register a custom strategy.
    ///
    /// A strategy that declares a priority keeps it; otherwise it is ranked at
    /// `[registry].custom_priority`.
    pub fn register_strategy(&mut self, strategy: Arc<dyn ExecutorStrategy>) {
        let default = self.config.registry.custom_priority;
        self.registry.register_with_default(strategy, default);
    }

    /// Register a custom strategy at exactly `priority`, whatever it declares.
    pub fn register_strategy_at(&mut self, strategy: Arc<dyn ExecutorStrategy>, priority: i32) {
        self.registry
            .register(Arc::new(Prioritized::new(strategy, priority)));
    }

    /// Start a request for `command`, seeded with the configured defaults.
    pub fn command(&self, command: impl Into<String>) -> Result<RequestBuilder> {
        let mut builder = RequestBuilder::new(command)?.success_code(self.config.defaults.success_code);
        if let Some(timeout) = self.config.defaults.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(builder)
    }

    /// Run `request` with the best supported strategy.
    ///
    /// See [`runner::execute`] for what is awaited and what is returned in
    /// synchronous and asynchronous mode.
    pub async fn execute(&self, request: ExecutionRequest) -> Result<Arc<ExecutionRecord>> {
        let strategy = self.registry.select()?;
        runner::execute(strategy, request).await
    }
}

impl Default for Launcher {
    fn default() -> Self {
        Self::new(ConfigFile::default())
    }
}
