// src/watch/ignore.rs

//! Noise filter for watch events (editor swap files, temp files, ...).

use std::fmt;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::errors::{DaemonmakeError, Result};

/// Compiled `[daemon].ignore` globs, evaluated against paths relative to the
/// project root (e.g. `"src/foo/.a.cpp.swp"`).
#[derive(Clone)]
pub struct IgnoreSet {
    base: PathBuf,
    patterns: Vec<String>,
    set: GlobSet,
}

impl fmt::Debug for IgnoreSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IgnoreSet")
            .field("base", &self.base)
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

impl IgnoreSet {
    pub fn new(base: impl Into<PathBuf>, patterns: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern).map_err(|e| {
                DaemonmakeError::ConfigError(format!("invalid ignore glob {pattern:?}: {e}"))
            })?;
            builder.add(glob);
        }
        let set = builder.build().map_err(|e| {
            DaemonmakeError::ConfigError(format!("failed to compile ignore globs: {e}"))
        })?;

        Ok(Self {
            base: base.into(),
            patterns: patterns.to_vec(),
            set,
        })
    }

    /// Filter that lets everything through.
    pub fn empty(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            patterns: Vec::new(),
            set: GlobSet::empty(),
        }
    }

    pub fn is_ignored(&self, path: &Path) -> bool {
        if self.set.is_empty() {
            return false;
        }
        match relative_str(&self.base, path) {
            Some(rel) => self.set.is_match(rel),
            None => path.file_name().is_some_and(|name| self.set.is_match(name)),
        }
    }
}

/// `path` relative to `root` with forward slashes, if it lies below `root`.
fn relative_str(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    Some(rel.to_string_lossy().replace('\\', "/"))
}
