// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{ProctrackError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = ProctrackError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.platform, raw.registry, raw.defaults))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_priorities(cfg)?;
    validate_defaults(cfg)?;
    Ok(())
}

/// Equal priorities would make the custom-vs-builtin order depend on
/// registration order alone, so they are rejected.
fn validate_priorities(cfg: &RawConfigFile) -> Result<()> {
    let registry = &cfg.registry;
    if registry.builtin_priority == registry.custom_priority {
        return Err(ProctrackError::ConfigError(format!(
            "[registry].builtin_priority and [registry].custom_priority must differ (both {})",
            registry.builtin_priority
        )));
    }
    Ok(())
}

fn validate_defaults(cfg: &RawConfigFile) -> Result<()> {
    if let Some(timeout) = cfg.defaults.timeout {
        if timeout.value <= 0 {
            return Err(ProctrackError::ConfigError(format!(
                "[defaults].timeout must be positive (got {})",
                timeout
            )));
        }
    }
    Ok(())
}
