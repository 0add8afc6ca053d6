// src/config/validate.rs

use std::path::{Component, Path};

use globset::Glob;

use crate::config::model::{Config, RawConfig};
use crate::errors::{DaemonmakeError, Result};

impl TryFrom<RawConfig> for Config {
    type Error = DaemonmakeError;

    fn try_from(raw: RawConfig) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(Config::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfig) -> Result<()> {
    validate_project_root(cfg)?;
    validate_folder_name("source_folder_name", &cfg.source_folder_name)?;
    validate_folder_name("include_folder_name", &cfg.include_folder_name)?;
    validate_folder_name("apps_folder_name", &cfg.apps_folder_name)?;
    validate_daemon_section(cfg)?;
    Ok(())
}

fn validate_project_root(cfg: &RawConfig) -> Result<()> {
    if !cfg.project_root.is_absolute() {
        return Err(DaemonmakeError::ConfigError(format!(
            "project_root must be an absolute path (got {:?})",
            cfg.project_root
        )));
    }
    Ok(())
}

/// Folder names are joined onto the project root, so they must be exactly one
/// normal path component.
fn validate_folder_name(key: &str, name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(DaemonmakeError::ConfigError(format!(
            "{key} must be a single folder name (got {name:?})"
        ))),
    }
}

fn validate_daemon_section(cfg: &RawConfig) -> Result<()> {
    let daemon = &cfg.daemon;

    if daemon.queue_capacity == 0 {
        return Err(DaemonmakeError::ConfigError(
            "[daemon].queue_capacity must be >= 1 (got 0)".to_string(),
        ));
    }
    if daemon.debounce_ms == 0 {
        return Err(DaemonmakeError::ConfigError(
            "[daemon].debounce_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    if daemon.poll_timeout_ms == 0 {
        return Err(DaemonmakeError::ConfigError(
            "[daemon].poll_timeout_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    for pattern in &daemon.ignore {
        Glob::new(pattern).map_err(|e| {
            DaemonmakeError::ConfigError(format!(
                "[daemon].ignore contains invalid glob {pattern:?}: {e}"
            ))
        })?;
    }

    Ok(())
}
