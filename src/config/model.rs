// src/config/model.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const CONFIG_DIR_NAME: &str = ".daemonmake";
pub const CONFIG_FILE_NAME: &str = "config.toml";

pub const DEFAULT_SOURCE_FOLDER_NAME: &str = "src";
pub const DEFAULT_INCLUDE_FOLDER_NAME: &str = "include";
pub const DEFAULT_APPS_FOLDER_NAME: &str = "apps";
pub const DEFAULT_BUILD_FOLDER_NAME: &str = "build";
pub const DEFAULT_COMPILER: &str = "g++";
pub const DEFAULT_CXX_STANDARD: &str = "c++20";

/// Project configuration as read from `.daemonmake/config.toml`.
///
/// ```toml
/// project_root = "/home/me/proj"
/// build_directory = "/home/me/proj/build"
/// compiler = "g++"
/// cxx_standard = "c++20"
/// source_folder_name = "src"
/// include_folder_name = "include"
/// apps_folder_name = "apps"
///
/// [daemon]
/// debounce_ms = 1000
/// ```
///
/// Everything except `project_root` has a default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawConfig {
    pub project_root: PathBuf,

    /// Defaults to `<project_root>/build` when omitted.
    #[serde(default)]
    pub build_directory: Option<PathBuf>,

    #[serde(default = "default_compiler")]
    pub compiler: String,

    #[serde(default = "default_cxx_standard")]
    pub cxx_standard: String,

    #[serde(default = "default_source_folder_name")]
    pub source_folder_name: String,

    #[serde(default = "default_include_folder_name")]
    pub include_folder_name: String,

    #[serde(default = "default_apps_folder_name")]
    pub apps_folder_name: String,

    #[serde(default)]
    pub daemon: DaemonSection,
}

/// `[daemon]` section: knobs for the watch/debounce pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaemonSection {
    /// Quiet period after the last file event before a rebuild starts.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Maximum number of distinct pending paths before the watcher blocks.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// How long one watcher poll waits before re-checking for cancellation.
    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,

    /// Globs (relative to the project root) whose events are never surfaced.
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,
}

impl Default for DaemonSection {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            queue_capacity: default_queue_capacity(),
            poll_timeout_ms: default_poll_timeout_ms(),
            ignore: default_ignore(),
        }
    }
}

fn default_compiler() -> String {
    DEFAULT_COMPILER.to_string()
}

fn default_cxx_standard() -> String {
    DEFAULT_CXX_STANDARD.to_string()
}

fn default_source_folder_name() -> String {
    DEFAULT_SOURCE_FOLDER_NAME.to_string()
}

fn default_include_folder_name() -> String {
    DEFAULT_INCLUDE_FOLDER_NAME.to_string()
}

fn default_apps_folder_name() -> String {
    DEFAULT_APPS_FOLDER_NAME.to_string()
}

fn default_debounce_ms() -> u64 {
    1000
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_poll_timeout_ms() -> u64 {
    500
}

fn default_ignore() -> Vec<String> {
    vec!["**/*.swp".to_string(), "**/*.tmp".to_string()]
}

/// Validated configuration.
///
/// Only constructed through `TryFrom<RawConfig>` (see `validate.rs`) or
/// [`crate::config::make_default_config`], so the rest of the crate can rely
/// on the folder names being single path components and the daemon knobs
/// being non-zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub project_root: PathBuf,
    pub build_directory: PathBuf,
    pub compiler: String,
    pub cxx_standard: String,
    pub source_folder_name: String,
    pub include_folder_name: String,
    pub apps_folder_name: String,
    pub daemon: DaemonSection,
}

impl Config {
    pub(crate) fn new_unchecked(raw: RawConfig) -> Self {
        let build_directory = raw
            .build_directory
            .unwrap_or_else(|| raw.project_root.join(DEFAULT_BUILD_FOLDER_NAME));

        Self {
            project_root: raw.project_root,
            build_directory,
            compiler: raw.compiler,
            cxx_standard: raw.cxx_standard,
            source_folder_name: raw.source_folder_name,
            include_folder_name: raw.include_folder_name,
            apps_folder_name: raw.apps_folder_name,
            daemon: raw.daemon,
        }
    }

    pub fn source_dir(&self) -> PathBuf {
        self.project_root.join(&self.source_folder_name)
    }

    pub fn include_dir(&self) -> PathBuf {
        self.project_root.join(&self.include_folder_name)
    }

    pub fn apps_dir(&self) -> PathBuf {
        self.project_root.join(&self.apps_folder_name)
    }

    /// Directories the daemon watches: source, include and apps folders.
    pub fn watch_roots(&self) -> Vec<PathBuf> {
        vec![self.source_dir(), self.include_dir(), self.apps_dir()]
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.daemon.debounce_ms)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.daemon.poll_timeout_ms)
    }

    pub fn config_path(&self) -> PathBuf {
        config_path(&self.project_root)
    }
}

/// Location of the config file for a given project root.
pub fn config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME)
}
