#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use daemonmake::config::{Config, DaemonSection, RawConfig};
use tempfile::TempDir;

/// Builder for `Config` to simplify test setup.
pub struct ConfigBuilder {
    raw: RawConfig,
}

impl ConfigBuilder {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            raw: RawConfig {
                project_root: project_root.into(),
                build_directory: None,
                compiler: "g++".to_string(),
                cxx_standard: "c++20".to_string(),
                source_folder_name: "src".to_string(),
                include_folder_name: "include".to_string(),
                apps_folder_name: "apps".to_string(),
                daemon: DaemonSection::default(),
            },
        }
    }

    pub fn build_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.raw.build_directory = Some(dir.into());
        self
    }

    pub fn cxx_standard(mut self, standard: &str) -> Self {
        self.raw.cxx_standard = standard.to_string();
        self
    }

    pub fn source_folder(mut self, name: &str) -> Self {
        self.raw.source_folder_name = name.to_string();
        self
    }

    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.raw.daemon.debounce_ms = ms;
        self
    }

    pub fn poll_timeout_ms(mut self, ms: u64) -> Self {
        self.raw.daemon.poll_timeout_ms = ms;
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.raw.daemon.queue_capacity = capacity;
        self
    }

    pub fn ignore(mut self, pattern: &str) -> Self {
        self.raw.daemon.ignore.push(pattern.to_string());
        self
    }

    pub fn raw(self) -> RawConfig {
        self.raw
    }

    pub fn build(self) -> Config {
        Config::try_from(self.raw).expect("Failed to build valid config from builder")
    }
}

/// A C++ project laid out in a temporary directory.
///
/// The root is canonicalised so paths compare equal to what the OS watcher
/// reports (e.g. `/tmp` being a symlink on macOS).
pub struct ProjectTree {
    _dir: TempDir,
    root: PathBuf,
}

impl ProjectTree {
    pub fn new() -> Self {
        let dir = tempfile::Builder::new()
            .prefix("proj")
            .tempdir()
            .expect("create temp project dir");
        let root = dir.path().canonicalize().expect("canonicalize temp dir");
        Self { _dir: dir, root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    /// Write `contents` to `rel`, creating parent directories.
    pub fn write(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write project file");
        path
    }

    pub fn mkdir(&self, rel: &str) -> PathBuf {
        let path = self.path(rel);
        fs::create_dir_all(&path).expect("create dir");
        path
    }

    pub fn remove(&self, rel: &str) {
        let path = self.path(rel);
        if path.is_dir() {
            fs::remove_dir_all(&path).expect("remove dir");
        } else {
            fs::remove_file(&path).expect("remove file");
        }
    }

    /// Default config rooted here, with a short debounce for tests.
    pub fn config(&self) -> ConfigBuilder {
        ConfigBuilder::new(&self.root)
            .debounce_ms(100)
            .poll_timeout_ms(50)
    }

    /// The two-library, one-app project used across the integration tests:
    /// `bar` includes `foo`, `app` includes `bar`.
    pub fn foo_bar_app() -> Self {
        let tree = Self::new();
        let include = format!("include/{}", tree.name());
        tree.write("src/foo/foo.cpp", "#include \"proj/foo/foo.hpp\"\nint foo() { return 1; }\n");
        tree.write(
            "src/bar/bar.cpp",
            "#include \"proj/bar/bar.hpp\"\n#include \"proj/foo/foo.hpp\"\nint bar() { return foo(); }\n",
        );
        tree.write(&format!("{include}/foo/foo.hpp"), "#pragma once\nint foo();\n");
        tree.write(&format!("{include}/bar/bar.hpp"), "#pragma once\nint bar();\n");
        tree.write("apps/app.cpp", "#include \"proj/bar/bar.hpp\"\nint main() { return bar(); }\n");
        tree
    }

    /// Last path component of the root, i.e. the discovered project name.
    pub fn name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

impl Default for ProjectTree {
    fn default() -> Self {
        Self::new()
    }
}
