// src/fs/mock.rs

use std::collections::{BTreeMap, BTreeSet};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Result, anyhow};

use super::FileSystem;

#[derive(Debug, Clone)]
enum Node {
    File { contents: Vec<u8>, readable: bool },
    Dir(BTreeSet<PathBuf>),
}

/// In-memory filesystem keyed by absolute path.
///
/// Parent directories are created implicitly. Clones share the same tree.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    nodes: Arc<Mutex<BTreeMap<PathBuf, Node>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<PathBuf, Node>> {
        // A panic while holding the lock only happens inside a failing test.
        self.nodes.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_file(&self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) {
        let path = path.as_ref().to_path_buf();
        let mut nodes = self.lock();
        link_parent(&mut nodes, &path);
        nodes.insert(
            path,
            Node::File {
                contents: contents.into(),
                readable: true,
            },
        );
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        let mut nodes = self.lock();
        ensure_dir(&mut nodes, &path);
    }

    /// Keep the file listed but make `open_read` fail, like a permission error.
    pub fn make_unreadable(&self, path: impl AsRef<Path>) {
        if let Some(Node::File { readable, .. }) = self.lock().get_mut(path.as_ref()) {
            *readable = false;
        }
    }
}

fn ensure_dir(nodes: &mut BTreeMap<PathBuf, Node>, path: &Path) {
    if nodes.contains_key(path) {
        return;
    }
    link_parent(nodes, path);
    nodes.insert(path.to_path_buf(), Node::Dir(BTreeSet::new()));
}

fn link_parent(nodes: &mut BTreeMap<PathBuf, Node>, path: &Path) {
    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return;
    };
    ensure_dir(nodes, parent);
    if let Some(Node::Dir(children)) = nodes.get_mut(parent) {
        children.insert(path.to_path_buf());
    }
}

impl FileSystem for MockFileSystem {
    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        match self.lock().get(path) {
            Some(Node::File {
                contents,
                readable: true,
            }) => Ok(Box::new(Cursor::new(contents.clone()))),
            Some(Node::File { readable: false, .. }) => {
                Err(anyhow!("Permission denied: {:?}", path))
            }
            Some(Node::Dir(_)) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        self.lock().contains_key(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(self.lock().get(path), Some(Node::File { .. }))
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.lock().get(path), Some(Node::Dir(_)))
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        if self.exists(path) {
            Ok(path.to_path_buf())
        } else {
            Err(anyhow!("File not found: {:?}", path))
        }
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        match self.lock().get(path) {
            Some(Node::Dir(children)) => Ok(children.iter().cloned().collect()),
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }
}
