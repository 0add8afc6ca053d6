use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use daemonmake::types::{FileEvent, FileEventKind};
use daemonmake::watch::{FileWatcher, IgnoreSet, WatchBackend};
use daemonmake_test_utils::builders::ProjectTree;
use daemonmake_test_utils::{init_tracing, with_timeout};
use notify::event::{
    AccessKind, AccessMode, CreateKind, DataChange, Flag, ModifyKind, RemoveKind, RenameMode,
};
use notify::{Event, EventKind};
use tokio::sync::mpsc;

const POLL: Duration = Duration::from_millis(50);

/// Records which directories are currently watched.
#[derive(Clone, Default)]
struct FakeBackend {
    watched: Arc<Mutex<BTreeSet<PathBuf>>>,
}

impl FakeBackend {
    fn watched(&self) -> BTreeSet<PathBuf> {
        self.watched.lock().unwrap().clone()
    }
}

impl WatchBackend for FakeBackend {
    fn watch_dir(&mut self, dir: &Path) -> notify::Result<()> {
        self.watched.lock().unwrap().insert(dir.to_path_buf());
        Ok(())
    }

    fn unwatch_dir(&mut self, dir: &Path) -> notify::Result<()> {
        self.watched.lock().unwrap().remove(dir);
        Ok(())
    }
}

struct Harness {
    tree: ProjectTree,
    backend: FakeBackend,
    tx: mpsc::UnboundedSender<notify::Result<Event>>,
    watcher: FileWatcher<FakeBackend>,
}

impl Harness {
    fn new(ignore: &[&str]) -> Self {
        init_tracing();
        let tree = ProjectTree::new();
        tree.write("src/foo/foo.cpp", "");
        tree.write("src/foo/detail/impl.cpp", "");
        tree.write("apps/app.cpp", "");

        let patterns: Vec<String> = ignore.iter().map(|p| p.to_string()).collect();
        let ignore = IgnoreSet::new(tree.root(), &patterns).unwrap();

        let backend = FakeBackend::default();
        let (tx, rx) = mpsc::unbounded_channel();
        let roots = vec![tree.path("src"), tree.path("include"), tree.path("apps")];
        let watcher = FileWatcher::with_backend(backend.clone(), rx, &roots, ignore);

        Self {
            tree,
            backend,
            tx,
            watcher,
        }
    }

    fn send(&self, kind: EventKind, path: PathBuf) {
        self.tx.send(Ok(Event::new(kind).add_path(path))).unwrap();
    }

    async fn events(&mut self) -> Vec<FileEvent> {
        self.watcher.wait_for_events(POLL).await
    }
}

#[tokio::test]
async fn initial_watch_covers_existing_directories() {
    let h = Harness::new(&[]);

    let expected: BTreeSet<PathBuf> = [
        h.tree.root().to_path_buf(),
        h.tree.path("src"),
        h.tree.path("src/foo"),
        h.tree.path("src/foo/detail"),
        h.tree.path("apps"),
    ]
    .into();
    assert_eq!(h.backend.watched(), expected);
    // `include` does not exist yet; the project root is only an anchor.
    assert!(!h.watcher.is_watching(&h.tree.path("include")));
    assert!(!h.watcher.is_watching(h.tree.root()));
    assert_eq!(h.watcher.watched_dirs().count(), 4);
}

#[tokio::test]
async fn file_lifecycle_is_classified() {
    let mut h = Harness::new(&[]);
    let file = h.tree.write("src/foo/new.cpp", "");

    h.send(EventKind::Create(CreateKind::File), file.clone());
    h.send(
        EventKind::Access(AccessKind::Close(AccessMode::Write)),
        file.clone(),
    );
    h.send(EventKind::Remove(RemoveKind::File), file.clone());

    assert_eq!(
        h.events().await,
        vec![
            FileEvent::created(&file),
            FileEvent::modified(&file),
            FileEvent::deleted(&file)
        ]
    );
}

#[tokio::test]
async fn raw_data_writes_wait_for_close_on_linux() {
    let mut h = Harness::new(&[]);
    let file = h.tree.path("src/foo/foo.cpp");

    h.send(
        EventKind::Modify(ModifyKind::Data(DataChange::Content)),
        file.clone(),
    );
    let events = h.events().await;

    if cfg!(target_os = "linux") {
        assert!(events.is_empty());
    } else {
        assert_eq!(events, vec![FileEvent::modified(&file)]);
    }
}

#[tokio::test]
async fn renames_map_to_deleted_and_created() {
    let mut h = Harness::new(&[]);
    let from = h.tree.path("src/foo/old.cpp");
    let to = h.tree.write("src/foo/renamed.cpp", "");

    h.send(EventKind::Modify(ModifyKind::Name(RenameMode::From)), from.clone());
    h.send(EventKind::Modify(ModifyKind::Name(RenameMode::To)), to.clone());
    // Paired form is ignored; the halves above carry the information.
    h.tx.send(Ok(Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
        .add_path(from.clone())
        .add_path(to.clone())))
        .unwrap();

    assert_eq!(
        h.events().await,
        vec![FileEvent::deleted(&from), FileEvent::created(&to)]
    );
}

#[tokio::test]
async fn events_outside_watched_directories_are_dropped() {
    let mut h = Harness::new(&[]);
    let stray = h.tree.write("docs/readme.cpp", "");

    h.send(EventKind::Create(CreateKind::File), stray);
    assert!(h.events().await.is_empty());
}

#[tokio::test]
async fn new_directory_is_watched_and_its_files_reported() {
    let mut h = Harness::new(&[]);
    let dir = h.tree.mkdir("src/bar");
    let early = h.tree.write("src/bar/bar.cpp", "");
    h.tree.write("src/bar/nested/deep.cpp", "");

    h.send(EventKind::Create(CreateKind::Folder), dir.clone());
    let events = h.events().await;

    assert!(h.watcher.is_watching(&dir));
    assert!(h.watcher.is_watching(&h.tree.path("src/bar/nested")));
    assert!(h.backend.watched().contains(&dir));
    assert!(events.contains(&FileEvent::created(&early)));
    assert!(events.contains(&FileEvent::created(h.tree.path("src/bar/nested/deep.cpp"))));
    assert_eq!(events.len(), 2);
}

#[tokio::test]
async fn removed_directory_drops_its_subtree_and_overflows() {
    let mut h = Harness::new(&[]);
    let foo = h.tree.path("src/foo");
    h.tree.remove("src/foo");

    h.send(EventKind::Remove(RemoveKind::Folder), foo.clone());
    assert_eq!(h.events().await, vec![FileEvent::overflow()]);

    assert!(!h.watcher.is_watching(&foo));
    assert!(!h.watcher.is_watching(&h.tree.path("src/foo/detail")));
    assert!(h.watcher.is_watching(&h.tree.path("src")));
    assert!(!h.backend.watched().contains(&h.tree.path("src/foo/detail")));
}

#[tokio::test]
async fn directory_removal_is_reported_once() {
    let mut h = Harness::new(&[]);
    let detail = h.tree.path("src/foo/detail");
    h.tree.remove("src/foo/detail");

    // The parent's notice and the directory's own notice both arrive.
    h.send(EventKind::Remove(RemoveKind::Folder), detail.clone());
    h.send(EventKind::Remove(RemoveKind::Any), detail.clone());
    assert_eq!(h.events().await, vec![FileEvent::overflow()]);

    // Unwatched directories never surface as file events.
    let stray = h.tree.mkdir("src/foo/empty");
    h.tree.remove("src/foo/empty");
    h.send(EventKind::Remove(RemoveKind::Folder), stray);
    assert!(h.events().await.is_empty());
}

#[tokio::test]
async fn missing_root_is_adopted_when_created() {
    let mut h = Harness::new(&[]);
    let include = h.tree.path("include");
    let header = h.tree.write("include/proj/foo.hpp", "");
    let stray = h.tree.write("notes.cpp", "");

    h.send(EventKind::Create(CreateKind::File), stray);
    h.send(EventKind::Create(CreateKind::Folder), include.clone());
    let events = h.events().await;

    assert_eq!(
        events,
        vec![FileEvent::created(&header), FileEvent::overflow()]
    );
    assert!(h.watcher.is_watching(&include));
    assert!(h.watcher.is_watching(&h.tree.path("include/proj")));
}

#[tokio::test]
async fn recreated_root_is_watched_again() {
    let mut h = Harness::new(&[]);
    let apps = h.tree.path("apps");
    h.tree.remove("apps");

    h.send(EventKind::Remove(RemoveKind::Folder), apps.clone());
    assert_eq!(h.events().await, vec![FileEvent::overflow()]);
    assert!(!h.watcher.is_watching(&apps));

    let tool = h.tree.write("apps/tool.cpp", "");
    h.send(EventKind::Modify(ModifyKind::Name(RenameMode::To)), apps.clone());
    assert_eq!(
        h.events().await,
        vec![FileEvent::created(&tool), FileEvent::overflow()]
    );
    assert!(h.watcher.is_watching(&apps));

    // A later file in the adopted root is classified normally.
    let late = h.tree.write("apps/late.cpp", "");
    h.send(EventKind::Create(CreateKind::File), late.clone());
    assert_eq!(h.events().await, vec![FileEvent::created(&late)]);
}

#[tokio::test]
async fn unpaired_rename_is_resolved_by_existence() {
    let mut h = Harness::new(&[]);
    let moved_in = h.tree.write("apps/tool.cpp", "");
    let detail = h.tree.path("src/foo/detail");
    h.tree.remove("src/foo/detail");

    h.send(EventKind::Modify(ModifyKind::Name(RenameMode::Any)), moved_in.clone());
    h.send(EventKind::Modify(ModifyKind::Name(RenameMode::Any)), detail.clone());

    assert_eq!(
        h.events().await,
        vec![FileEvent::created(&moved_in), FileEvent::overflow()]
    );
    assert!(!h.watcher.is_watching(&detail));
}

#[tokio::test]
async fn rescan_flag_yields_a_single_overflow() {
    let mut h = Harness::new(&[]);
    h.tx.send(Ok(Event::new(EventKind::Other).set_flag(Flag::Rescan)))
        .unwrap();

    let events = h.events().await;
    assert_eq!(events, vec![FileEvent::overflow()]);
    assert_eq!(events[0].kind, FileEventKind::Overflow);
    assert!(events[0].path.is_none());
}

#[tokio::test]
async fn backend_errors_become_overflow() {
    let mut h = Harness::new(&[]);
    h.tx.send(Err(notify::Error::generic("queue lost"))).unwrap();

    assert_eq!(h.events().await, vec![FileEvent::overflow()]);
}

#[tokio::test]
async fn ignored_paths_are_not_reported() {
    let mut h = Harness::new(&["**/*.swp", "apps/generated/**"]);
    let swap = h.tree.write("src/foo/.foo.cpp.swp", "");
    let kept = h.tree.write("src/foo/kept.cpp", "");

    h.send(EventKind::Create(CreateKind::File), swap);
    h.send(EventKind::Create(CreateKind::File), kept.clone());

    assert_eq!(h.events().await, vec![FileEvent::created(&kept)]);
}

#[tokio::test]
async fn quiet_poll_returns_empty() {
    let mut h = Harness::new(&[]);
    let events = with_timeout(5, "empty poll", h.events()).await;
    assert!(events.is_empty());
}

#[tokio::test]
async fn drop_releases_every_watch() {
    let h = Harness::new(&[]);
    let backend = h.backend.clone();
    assert!(!backend.watched().is_empty());

    drop(h);
    assert!(backend.watched().is_empty());
}

#[tokio::test]
async fn real_watcher_reports_new_files() {
    init_tracing();
    let tree = ProjectTree::new();
    tree.mkdir("src/foo");

    let mut watcher =
        FileWatcher::new(&[tree.path("src")], IgnoreSet::empty(tree.root())).unwrap();
    assert!(watcher.is_watching(&tree.path("src/foo")));

    let file = tree.write("src/foo/foo.cpp", "int foo();\n");

    let seen = with_timeout(10, "created event", async {
        loop {
            let events = watcher.wait_for_events(POLL).await;
            if events.contains(&FileEvent::created(&file)) {
                break true;
            }
        }
    })
    .await;
    assert!(seen);
}
