// src/watch/table.rs

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// The set of directories that currently hold a watch.
///
/// Owned and mutated by a single `FileWatcher`; no internal locking.
#[derive(Debug, Default)]
pub struct WatchTable {
    dirs: HashSet<PathBuf>,
}

impl WatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `dir`. Returns `false` if it is already watched.
    pub fn insert(&mut self, dir: &Path) -> bool {
        if self.dirs.contains(dir) {
            return false;
        }
        self.dirs.insert(dir.to_path_buf())
    }

    pub fn contains(&self, dir: &Path) -> bool {
        self.dirs.contains(dir)
    }

    pub fn remove(&mut self, dir: &Path) -> bool {
        self.dirs.remove(dir)
    }

    /// Remove `dir` and every watched directory below it.
    pub fn remove_subtree(&mut self, dir: &Path) -> Vec<PathBuf> {
        let doomed: Vec<PathBuf> = self
            .dirs
            .iter()
            .filter(|p| p.starts_with(dir))
            .cloned()
            .collect();
        for path in &doomed {
            self.dirs.remove(path);
        }
        doomed
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    pub fn dirs(&self) -> impl Iterator<Item = &Path> {
        self.dirs.iter().map(PathBuf::as_path)
    }
}
