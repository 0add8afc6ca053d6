// src/project/layout.rs

//! Targets and the project layout they belong to.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::errors::Result;
use crate::fs::FileSystem;

/// Name of the library that collects sources/headers not grouped in a folder.
pub const DEFAULT_LIB_NAME: &str = "UnnamedLib";

/// Used when the project root has no final path component (e.g. `/`).
pub const FALLBACK_PROJECT_NAME: &str = "daemonmake_project";

pub const SOURCE_EXTENSIONS: &[&str] = &["cpp"];
pub const HEADER_EXTENSIONS: &[&str] = &["hpp", "h"];

/// Canonical target name type used throughout the project model.
pub type TargetName = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Library,
    Executable,
}

/// One buildable unit.
///
/// File paths are relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub name: TargetName,
    pub kind: TargetKind,
    pub source_files: Vec<PathBuf>,
    pub header_files: Vec<PathBuf>,
    pub dependencies: BTreeSet<TargetName>,
}

impl Target {
    pub fn new(name: impl Into<TargetName>, kind: TargetKind) -> Self {
        Self {
            name: name.into(),
            kind,
            source_files: Vec::new(),
            header_files: Vec::new(),
            dependencies: BTreeSet::new(),
        }
    }

    pub fn has_files(&self) -> bool {
        !self.source_files.is_empty() || !self.header_files.is_empty()
    }

    /// Sources first, then headers.
    pub fn files(&self) -> impl Iterator<Item = &PathBuf> {
        self.source_files.iter().chain(self.header_files.iter())
    }
}

/// Snapshot of the project's targets.
///
/// `project_name` and `project_root` are fixed at construction; `targets` is
/// replaced wholesale by every discovery pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    pub project_name: String,
    pub project_root: PathBuf,
    pub targets: Vec<Target>,
}

impl ProjectLayout {
    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.name == name)
    }

    pub fn target_names(&self) -> impl Iterator<Item = &str> {
        self.targets.iter().map(|t| t.name.as_str())
    }
}

/// Empty layout for `project_root`, named after the root's last component.
pub fn make_project_layout(fs: &dyn FileSystem, project_root: &Path) -> Result<ProjectLayout> {
    let project_root = fs.canonicalize(project_root)?;
    let project_name = project_root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| FALLBACK_PROJECT_NAME.to_string());

    Ok(ProjectLayout {
        project_name,
        project_root,
        targets: Vec::new(),
    })
}

pub(crate) fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.contains(&ext))
}
