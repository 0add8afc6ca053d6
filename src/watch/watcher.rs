// src/watch/watcher.rs

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::event::{AccessKind, AccessMode, CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::errors::Result;
use crate::types::FileEvent;
use crate::watch::ignore::IgnoreSet;
use crate::watch::table::WatchTable;

/// Upper bound on raw notifications handled by one `wait_for_events` call.
const MAX_BATCH_SIZE: usize = 1024;

/// Raw notifications as delivered by the OS watch facility.
pub type RawEventReceiver = mpsc::UnboundedReceiver<notify::Result<Event>>;

/// The per-directory operations `FileWatcher` needs from the OS facility.
///
/// Every watch is non-recursive; `FileWatcher` walks the tree itself so it
/// owns the handle-to-directory table.
pub trait WatchBackend: Send {
    fn watch_dir(&mut self, dir: &Path) -> notify::Result<()>;
    fn unwatch_dir(&mut self, dir: &Path) -> notify::Result<()>;
}

impl WatchBackend for RecommendedWatcher {
    fn watch_dir(&mut self, dir: &Path) -> notify::Result<()> {
        self.watch(dir, RecursiveMode::NonRecursive)
    }

    fn unwatch_dir(&mut self, dir: &Path) -> notify::Result<()> {
        self.unwatch(dir)
    }
}

/// Recursive directory watcher producing normalised [`FileEvent`]s.
///
/// Owns the OS watch descriptor and one watch per directory. Not `Clone`:
/// all watches are released exactly once, when the watcher is dropped.
///
/// The parent of every root is watched too (an anchor), so a root that is
/// missing at startup, or deleted and re-created later, is picked up when it
/// appears.
pub struct FileWatcher<B: WatchBackend = RecommendedWatcher> {
    backend: B,
    events_rx: RawEventReceiver,
    table: WatchTable,
    roots: Vec<PathBuf>,
    anchors: HashSet<PathBuf>,
    /// Directories dropped from the table whose own removal notice may still
    /// be in flight.
    lost: HashSet<PathBuf>,
    ignore: IgnoreSet,
}

impl<B: WatchBackend> std::fmt::Debug for FileWatcher<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatcher")
            .field("watched_dirs", &self.table.len())
            .field("ignore", &self.ignore)
            .finish_non_exhaustive()
    }
}

impl FileWatcher<RecommendedWatcher> {
    /// Initialise the OS watch facility and watch every directory below
    /// `roots`.
    ///
    /// Fails only if the facility itself cannot be initialised. Roots that do
    /// not exist yet are adopted once they appear; directories that cannot be
    /// watched are skipped.
    pub fn new(roots: &[PathBuf], ignore: IgnoreSet) -> Result<Self> {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        // Runs on the backend's own thread.
        let backend = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                // Only fails once the FileWatcher (and its receiver) is gone.
                let _ = events_tx.send(res);
            },
            notify::Config::default(),
        )?;

        Ok(Self::with_backend(backend, events_rx, roots, ignore))
    }
}

impl<B: WatchBackend> FileWatcher<B> {
    /// Build a watcher over an already-initialised backend whose
    /// notifications arrive on `events_rx`.
    pub fn with_backend(
        backend: B,
        events_rx: RawEventReceiver,
        roots: &[PathBuf],
        ignore: IgnoreSet,
    ) -> Self {
        let mut watcher = Self {
            backend,
            events_rx,
            table: WatchTable::new(),
            roots: roots.to_vec(),
            anchors: HashSet::new(),
            lost: HashSet::new(),
            ignore,
        };

        for root in roots {
            if !root.is_dir() {
                debug!(root = %root.display(), "watch root does not exist yet");
                continue;
            }
            watcher.watch_tree(root, None);
        }
        for parent in roots.iter().filter_map(|root| root.parent()) {
            watcher.add_anchor(parent);
        }

        info!(
            dirs = watcher.table.len(),
            anchors = watcher.anchors.len(),
            "file watcher started"
        );
        watcher
    }

    pub fn is_watching(&self, dir: &Path) -> bool {
        self.table.contains(dir)
    }

    pub fn watched_dirs(&self) -> impl Iterator<Item = &Path> {
        self.table.dirs()
    }

    /// Wait up to `timeout` for filesystem activity and return the normalised
    /// events. An empty result just means nothing happened.
    pub async fn wait_for_events(&mut self, timeout: Duration) -> Vec<FileEvent> {
        let mut events = Vec::new();

        let first = match tokio::time::timeout(timeout, self.events_rx.recv()).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                warn!("watch backend channel closed; no further events");
                tokio::time::sleep(timeout).await;
                return events;
            }
            Err(_elapsed) => return events,
        };
        self.handle_raw(first, &mut events);

        for _ in 1..MAX_BATCH_SIZE {
            match self.events_rx.try_recv() {
                Ok(raw) => self.handle_raw(raw, &mut events),
                Err(_) => break,
            }
        }

        events
    }

    fn handle_raw(&mut self, raw: notify::Result<Event>, out: &mut Vec<FileEvent>) {
        match raw {
            Ok(event) => self.normalize(event, out),
            Err(err) => {
                // The backend may have dropped notifications; assume the worst.
                warn!(error = %err, "watch backend error; requesting full rebuild");
                out.push(FileEvent::overflow());
            }
        }
    }

    fn normalize(&mut self, event: Event, out: &mut Vec<FileEvent>) {
        trace!(?event, "raw watch event");

        if event.need_rescan() {
            info!("kernel event queue overflowed; requesting full rebuild");
            out.push(FileEvent::overflow());
            return;
        }

        match event.kind {
            EventKind::Create(kind) => {
                for path in event.paths {
                    self.on_appeared(path, kind == CreateKind::Folder, out);
                }
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
                for path in event.paths {
                    self.on_appeared(path, false, out);
                }
            }
            // The parent reports a removed subdirectory with the folder kind.
            // Only watched ones matter; the rest are not files.
            EventKind::Remove(RemoveKind::Folder) => {
                for path in event.paths {
                    if self.table.contains(&path) {
                        self.on_disappeared(path, out);
                    } else {
                        self.lost.remove(&path);
                    }
                }
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) | EventKind::Remove(_) => {
                for path in event.paths {
                    self.on_disappeared(path, out);
                }
            }
            // Unpaired rename (e.g. a watched directory moving itself):
            // decide by whether the path is still there.
            EventKind::Modify(ModifyKind::Name(RenameMode::Any | RenameMode::Other)) => {
                for path in event.paths {
                    if !self.table.contains(&path) && path.exists() {
                        self.on_appeared(path, false, out);
                    } else {
                        self.on_disappeared(path, out);
                    }
                }
            }
            // Backends without close notifications (FSEvents, Windows) only
            // report data writes; the queue folds the repeats.
            EventKind::Access(AccessKind::Close(AccessMode::Write))
            | EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any)
                if !cfg!(target_os = "linux") || event.kind.is_access() =>
            {
                for path in event.paths {
                    self.on_written(path, out);
                }
            }
            // Paired renames were already reported as From + To. On Linux raw
            // data writes are reported once the writer closes the file.
            _ => {}
        }
    }

    fn on_appeared(&mut self, path: PathBuf, known_dir: bool, out: &mut Vec<FileEvent>) {
        if self.roots.contains(&path) && !self.table.contains(&path) {
            self.adopt_root(&path, out);
            return;
        }
        if !self.parent_is_watched(&path) {
            return;
        }

        if known_dir || path.is_dir() {
            // Files may land in the directory before its watch exists; report
            // whatever is already there.
            self.watch_tree(&path, Some(out));
            return;
        }

        if self.ignore.is_ignored(&path) {
            return;
        }
        out.push(FileEvent::created(path));
    }

    fn on_disappeared(&mut self, path: PathBuf, out: &mut Vec<FileEvent>) {
        if self.table.contains(&path) {
            self.lose_tree(&path);
            out.push(FileEvent::overflow());
            return;
        }
        // Second notice for a directory already handled above.
        if self.lost.remove(&path) {
            return;
        }

        if !self.parent_is_watched(&path) || self.ignore.is_ignored(&path) {
            return;
        }
        out.push(FileEvent::deleted(path));
    }

    /// A configured root showed up after startup. Its contents are reported
    /// and a full rebuild requested, since it may hold whole new targets.
    fn adopt_root(&mut self, root: &Path, out: &mut Vec<FileEvent>) {
        if !root.is_dir() {
            return;
        }
        info!(root = %root.display(), "watch root appeared; requesting full rebuild");
        self.watch_tree(root, Some(out));
        out.push(FileEvent::overflow());
    }

    fn on_written(&mut self, path: PathBuf, out: &mut Vec<FileEvent>) {
        if !self.parent_is_watched(&path) || self.ignore.is_ignored(&path) {
            return;
        }
        out.push(FileEvent::modified(path));
    }

    fn parent_is_watched(&self, path: &Path) -> bool {
        path.parent().is_some_and(|dir| self.table.contains(dir))
    }

    /// Watch `dir` and every directory below it. When `report` is given,
    /// regular files found along the way are reported as `Created`.
    fn watch_tree(&mut self, dir: &Path, mut report: Option<&mut Vec<FileEvent>>) {
        if !self.add_watch(dir) {
            return;
        }

        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(dir = %dir.display(), error = %err, "cannot list directory; subdirectories not watched");
                return;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_dir() {
                self.watch_tree(&path, report.as_deref_mut());
            } else if file_type.is_file() {
                if let Some(out) = report.as_deref_mut() {
                    if !self.ignore.is_ignored(&path) {
                        out.push(FileEvent::created(path));
                    }
                }
            }
        }
    }

    /// Establish one watch. A failure only degrades coverage of that
    /// directory, so it is logged and reported as `false`.
    fn add_watch(&mut self, dir: &Path) -> bool {
        if self.table.contains(dir) {
            return false;
        }
        match self.backend.watch_dir(dir) {
            Ok(()) => {
                self.table.insert(dir);
                self.lost.remove(dir);
                debug!(dir = %dir.display(), "watch added");
                true
            }
            Err(err) => {
                warn!(dir = %dir.display(), error = %err, "failed to watch directory; subtree not monitored");
                false
            }
        }
    }

    /// Watch the parent of a root so the root's own creation is seen. Events
    /// for the anchor's other children are dropped.
    fn add_anchor(&mut self, dir: &Path) {
        if self.anchors.contains(dir) || self.table.contains(dir) || !dir.is_dir() {
            return;
        }
        match self.backend.watch_dir(dir) {
            Ok(()) => {
                debug!(dir = %dir.display(), "anchor watch added");
                self.anchors.insert(dir.to_path_buf());
            }
            Err(err) => {
                warn!(dir = %dir.display(), error = %err, "failed to watch root parent; late roots not seen");
            }
        }
    }

    /// Forget `dir` and everything watched below it.
    fn lose_tree(&mut self, dir: &Path) {
        for lost in self.table.remove_subtree(dir) {
            // The OS usually invalidated the watch already.
            if let Err(err) = self.backend.unwatch_dir(&lost) {
                trace!(dir = %lost.display(), error = %err, "unwatch after loss failed");
            }
            debug!(dir = %lost.display(), "watched directory lost");
            self.lost.insert(lost);
        }
    }
}

impl<B: WatchBackend> Drop for FileWatcher<B> {
    fn drop(&mut self) {
        let mut dirs: Vec<PathBuf> = self.table.dirs().map(Path::to_path_buf).collect();
        dirs.extend(self.anchors.drain());
        for dir in dirs {
            self.table.remove(&dir);
            if let Err(err) = self.backend.unwatch_dir(&dir) {
                trace!(dir = %dir.display(), error = %err, "unwatch on drop failed");
            }
        }
        debug!("file watcher released all watches");
    }
}
