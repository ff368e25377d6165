#![allow(dead_code)]

use proctrack::config::{ConfigFile, RawConfigFile};
use proctrack::{Launcher, Timeout};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    /// Wrap commands in the platform shell (`sh -c` / `cmd /c`).
    pub fn with_shell(mut self) -> Self {
        self.config.platform.auto_shell = true;
        self.config.platform.auto_msdos = true;
        self
    }

    pub fn with_success_code(mut self, code: i32) -> Self {
        self.config.defaults.success_code = code;
        self
    }

    pub fn with_default_timeout(mut self, timeout: Timeout) -> Self {
        self.config.defaults.timeout = Some(timeout);
        self
    }

    pub fn with_priorities(mut self, builtin: i32, custom: i32) -> Self {
        self.config.registry.builtin_priority = builtin;
        self.config.registry.custom_priority = custom;
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Launcher that runs commands through the platform shell, so builtins such
/// as `:` and `exit 1` work.
pub fn shell_launcher() -> Launcher {
    Launcher::new(ConfigFileBuilder::new().with_shell().build())
}

/// Launcher that runs commands directly, without a shell.
pub fn direct_launcher() -> Launcher {
    Launcher::new(ConfigFileBuilder::new().build())
}
