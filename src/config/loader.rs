// src/config/loader.rs

use std::fs;
use std::path::Path;

use anyhow::Context;
use tracing::{debug, info};

use crate::config::model::{Config, DaemonSection, RawConfig, config_path};
use crate::config::model::{
    DEFAULT_APPS_FOLDER_NAME, DEFAULT_BUILD_FOLDER_NAME, DEFAULT_COMPILER, DEFAULT_CXX_STANDARD,
    DEFAULT_INCLUDE_FOLDER_NAME, DEFAULT_SOURCE_FOLDER_NAME,
};
use crate::errors::Result;

/// Read a config file and return the raw, unvalidated `RawConfig`.
///
/// This only performs TOML deserialization. Use [`load_and_validate`] for the
/// checked [`Config`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;

    let config: RawConfig = toml::from_str(&contents)?;

    Ok(config)
}

/// Read a config file and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Config> {
    let raw_config = load_from_path(&path)?;
    let config = Config::try_from(raw_config)?;
    Ok(config)
}

/// Load the config stored under `<project_root>/.daemonmake/config.toml`.
pub fn load_config(project_root: &Path) -> Result<Config> {
    let path = config_path(project_root);
    debug!(path = %path.display(), "loading project config");
    load_and_validate(path)
}

/// Persist `cfg` to `<project_root>/.daemonmake/config.toml`, creating the
/// directory when needed.
pub fn save_config(cfg: &Config) -> Result<()> {
    let path = cfg.config_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating config dir {}", parent.display()))?;
    }

    let contents = toml::to_string_pretty(cfg)?;
    fs::write(&path, contents)
        .with_context(|| format!("writing config file {}", path.display()))?;

    info!(path = %path.display(), "saved project config");
    Ok(())
}

/// Default configuration for `project_root`.
///
/// The root is canonicalised so stored paths stay valid regardless of the
/// working directory the tool is later invoked from.
pub fn make_default_config(project_root: &Path) -> Result<Config> {
    let root = project_root
        .canonicalize()
        .with_context(|| format!("resolving project root {}", project_root.display()))?;

    let raw = RawConfig {
        build_directory: Some(root.join(DEFAULT_BUILD_FOLDER_NAME)),
        project_root: root,
        compiler: DEFAULT_COMPILER.to_string(),
        cxx_standard: DEFAULT_CXX_STANDARD.to_string(),
        source_folder_name: DEFAULT_SOURCE_FOLDER_NAME.to_string(),
        include_folder_name: DEFAULT_INCLUDE_FOLDER_NAME.to_string(),
        apps_folder_name: DEFAULT_APPS_FOLDER_NAME.to_string(),
        daemon: DaemonSection::default(),
    };

    Config::try_from(raw)
}
