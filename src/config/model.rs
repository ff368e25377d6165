// src/config/model.rs

use serde::Deserialize;

use crate::exec::{BUILTIN_PRIORITY, DEFAULT_PRIORITY, DEFAULT_SUCCESS_CODE};
use crate::types::Timeout;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [platform]
/// auto_shell = true
///
/// [registry]
/// builtin_priority = 100
/// custom_priority = 1
///
/// [defaults]
/// success_code = 0
/// timeout = "30s"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub platform: PlatformSection,

    #[serde(default)]
    pub registry: RegistrySection,

    #[serde(default)]
    pub defaults: DefaultsSection,
}

/// Validated configuration. Build it with `ConfigFile::try_from(raw)` or
/// [`load_and_validate`](super::load_and_validate).
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub platform: PlatformSection,
    pub registry: RegistrySection,
    pub defaults: DefaultsSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        platform: PlatformSection,
        registry: RegistrySection,
        defaults: DefaultsSection,
    ) -> Self {
        Self {
            platform,
            registry,
            defaults,
        }
    }
}

/// `[platform]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlatformSection {
    /// Wrap commands in `sh -c` on Unix so shell builtins can be run.
    #[serde(default)]
    pub auto_shell: bool,

    /// Wrap commands in `cmd /c` on Windows.
    #[serde(default)]
    pub auto_msdos: bool,
}

/// `[registry]` section.
///
/// Lower priority values are tried first. Built-ins default to 100 and
/// custom strategies to 1, so custom strategies win unless configured
/// otherwise.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistrySection {
    #[serde(default = "default_builtin_priority")]
    pub builtin_priority: i32,

    #[serde(default = "default_custom_priority")]
    pub custom_priority: i32,
}

fn default_builtin_priority() -> i32 {
    BUILTIN_PRIORITY
}

fn default_custom_priority() -> i32 {
    DEFAULT_PRIORITY
}

impl Default for RegistrySection {
    fn default() -> Self {
        Self {
            builtin_priority: default_builtin_priority(),
            custom_priority: default_custom_priority(),
        }
    }
}

/// `[defaults]` section: values seeded into every request built through a
/// [`Launcher`](crate::Launcher).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultsSection {
    #[serde(default = "default_success_code")]
    pub success_code: i32,

    /// e.g. `"30s"`, `"500ms"`. No timeout when absent.
    #[serde(default)]
    pub timeout: Option<Timeout>,
}

fn default_success_code() -> i32 {
    DEFAULT_SUCCESS_CODE
}

impl Default for DefaultsSection {
    fn default() -> Self {
        Self {
            success_code: default_success_code(),
            timeout: None,
        }
    }
}
