// src/types.rs

//! Event types shared by the watcher and the build queue.

use std::path::PathBuf;

/// Normalised category of a filesystem change.
///
/// `Overflow` is not a real file event: it means the event stream lost
/// fidelity (kernel queue overflow, or a watched directory vanished) and the
/// consumer must assume that anything may have changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileEventKind {
    Created,
    Modified,
    Deleted,
    Overflow,
}

/// One normalised filesystem change. `path` is `None` only for `Overflow`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    pub path: Option<PathBuf>,
    pub kind: FileEventKind,
}

impl FileEvent {
    pub fn created(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            kind: FileEventKind::Created,
        }
    }

    pub fn modified(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            kind: FileEventKind::Modified,
        }
    }

    pub fn deleted(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            kind: FileEventKind::Deleted,
        }
    }

    pub fn overflow() -> Self {
        Self {
            path: None,
            kind: FileEventKind::Overflow,
        }
    }
}
