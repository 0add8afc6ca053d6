use std::sync::{Arc, Mutex};

use daemonmake::exec::{BuildBackend, RebuildFuture};
use daemonmake::project::ProjectLayout;
use tokio::sync::mpsc;

/// One call to [`RecordingBackend::rebuild`].
#[derive(Debug, Clone)]
pub struct RecordedBuild {
    pub layout: Arc<ProjectLayout>,
    pub regenerate: bool,
}

impl RecordedBuild {
    pub fn target_names(&self) -> Vec<String> {
        self.layout.target_names().map(str::to_string).collect()
    }
}

/// A fake backend that:
/// - records every rebuild request
/// - forwards it on a channel so tests can await builds
/// - reports the configured exit code without running anything.
pub struct RecordingBackend {
    builds: Arc<Mutex<Vec<RecordedBuild>>>,
    notify_tx: mpsc::UnboundedSender<RecordedBuild>,
    exit_code: i32,
}

impl RecordingBackend {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RecordedBuild>) {
        let (notify_tx, notify_rx) = mpsc::unbounded_channel();
        let backend = Self {
            builds: Arc::new(Mutex::new(Vec::new())),
            notify_tx,
            exit_code: 0,
        };
        (backend, notify_rx)
    }

    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    /// Shared handle to everything recorded so far.
    pub fn builds(&self) -> Arc<Mutex<Vec<RecordedBuild>>> {
        Arc::clone(&self.builds)
    }
}

impl BuildBackend for RecordingBackend {
    fn rebuild(&mut self, layout: Arc<ProjectLayout>, regenerate: bool) -> RebuildFuture<'_> {
        let build = RecordedBuild { layout, regenerate };
        self.builds.lock().unwrap().push(build.clone());
        let _ = self.notify_tx.send(build);
        let code = self.exit_code;
        Box::pin(async move { Ok(code) })
    }
}
