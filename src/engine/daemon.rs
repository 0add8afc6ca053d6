// src/engine/daemon.rs

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::Context;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::errors::Result;
use crate::exec::{BuildBackend, CMakeBackend};
use crate::fs::RealFileSystem;
use crate::project::{ProjectLayout, ProjectSnapshot, TargetGraph};
use crate::watch::{FileWatcher, IgnoreSet};

use super::queue::{BuildQueue, BuildTask};

/// Long-running orchestrator: one watcher activity feeding the
/// [`BuildQueue`], one builder activity draining it.
///
/// The project snapshot is shared between the builder (which replaces it
/// after re-discovery) and callers of [`layout`](Self::layout) /
/// [`graph`](Self::graph). Dropping a daemon that was never stopped cancels
/// and aborts both activities.
pub struct Daemon<B: BuildBackend = CMakeBackend> {
    cfg: Arc<Config>,
    queue: Arc<BuildQueue>,
    snapshot: Arc<Mutex<ProjectSnapshot>>,
    cancel: CancellationToken,
    backend: Option<B>,
    watcher_task: Option<JoinHandle<()>>,
    builder_task: Option<JoinHandle<()>>,
}

impl<B: BuildBackend> fmt::Debug for Daemon<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Daemon")
            .field("project_root", &self.cfg.project_root)
            .field("queue", &self.queue)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl Daemon<CMakeBackend> {
    /// Daemon building with CMake.
    pub async fn with_cmake(cfg: Config) -> Result<Self> {
        let backend = CMakeBackend::new(cfg.clone());
        Self::new(cfg, backend).await
    }
}

impl<B: BuildBackend> Daemon<B> {
    /// Run the initial discovery pass and set up the queue. Nothing is
    /// watched or built until [`run`](Self::run).
    pub async fn new(cfg: Config, backend: B) -> Result<Self> {
        let cfg = Arc::new(cfg);
        let snapshot = discover(Arc::clone(&cfg)).await?;
        info!(
            root = %cfg.project_root.display(),
            targets = snapshot.layout.targets.len(),
            "initial discovery complete"
        );

        let queue = BuildQueue::new(cfg.daemon.queue_capacity, cfg.debounce());

        Ok(Self {
            cfg,
            queue: Arc::new(queue),
            snapshot: Arc::new(Mutex::new(snapshot)),
            cancel: CancellationToken::new(),
            backend: Some(backend),
            watcher_task: None,
            builder_task: None,
        })
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn queue(&self) -> &Arc<BuildQueue> {
        &self.queue
    }

    /// Layout from the most recent discovery pass.
    pub fn layout(&self) -> Arc<ProjectLayout> {
        Arc::clone(&lock_snapshot(&self.snapshot).layout)
    }

    /// Graph from the most recent discovery pass.
    pub fn graph(&self) -> Arc<TargetGraph> {
        Arc::clone(&lock_snapshot(&self.snapshot).graph)
    }

    pub fn is_running(&self) -> bool {
        self.watcher_task.is_some() || self.builder_task.is_some()
    }

    /// Start watching the configured roots and spawn both activities.
    ///
    /// The watcher is set up before anything is spawned, so watch errors are
    /// reported here. Calling `run` a second time is an error.
    pub fn run(&mut self) -> Result<()> {
        if self.backend.is_none() {
            return Err(anyhow::anyhow!("daemon already started").into());
        }

        let ignore = IgnoreSet::new(&self.cfg.project_root, &self.cfg.daemon.ignore)?;
        let watcher = FileWatcher::new(&self.cfg.watch_roots(), ignore)?;
        let Some(backend) = self.backend.take() else {
            return Err(anyhow::anyhow!("daemon already started").into());
        };
        info!(
            dirs = watcher.watched_dirs().count(),
            debounce_ms = self.cfg.daemon.debounce_ms,
            "watching project"
        );

        self.watcher_task = Some(tokio::spawn(watch_loop(
            watcher,
            Arc::clone(&self.queue),
            self.cancel.clone(),
            self.cfg.poll_timeout(),
        )));
        self.builder_task = Some(tokio::spawn(build_loop(
            backend,
            Arc::clone(&self.cfg),
            Arc::clone(&self.queue),
            Arc::clone(&self.snapshot),
            self.cancel.clone(),
        )));

        Ok(())
    }

    /// Shut down the queue, cancel both activities and wait for them to
    /// finish. A build in progress is abandoned. Idempotent.
    pub async fn stop(&mut self) {
        self.queue.shutdown();
        self.cancel.cancel();

        for (name, handle) in [
            ("watcher", self.watcher_task.take()),
            ("builder", self.builder_task.take()),
        ] {
            let Some(handle) = handle else { continue };
            if let Err(err) = handle.await {
                warn!(activity = name, error = %err, "daemon activity ended abnormally");
            }
        }
        debug!("daemon stopped");
    }
}

impl<B: BuildBackend> Drop for Daemon<B> {
    fn drop(&mut self) {
        if !self.is_running() {
            return;
        }
        self.queue.shutdown();
        self.cancel.cancel();
        for handle in [self.watcher_task.take(), self.builder_task.take()]
            .into_iter()
            .flatten()
        {
            handle.abort();
        }
    }
}

fn lock_snapshot(snapshot: &Mutex<ProjectSnapshot>) -> MutexGuard<'_, ProjectSnapshot> {
    snapshot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Full discovery pass on the blocking pool.
async fn discover(cfg: Arc<Config>) -> Result<ProjectSnapshot> {
    tokio::task::spawn_blocking(move || ProjectSnapshot::discover(&RealFileSystem, &cfg))
        .await
        .context("discovery task panicked")?
}

async fn watch_loop(
    mut watcher: FileWatcher,
    queue: Arc<BuildQueue>,
    cancel: CancellationToken,
    poll_timeout: Duration,
) {
    debug!("watcher activity started");

    loop {
        let events = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            events = watcher.wait_for_events(poll_timeout) => events,
        };

        for event in events {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = queue.push_event(event) => {}
            }
        }
        // The inner break only leaves the batch.
        if cancel.is_cancelled() {
            break;
        }
    }

    debug!("watcher activity exiting");
}

async fn build_loop<B: BuildBackend>(
    mut backend: B,
    cfg: Arc<Config>,
    queue: Arc<BuildQueue>,
    snapshot: Arc<Mutex<ProjectSnapshot>>,
    cancel: CancellationToken,
) {
    debug!("builder activity started");

    loop {
        let task = queue.pop_all_events(&cancel).await;
        if cancel.is_cancelled() {
            if !task.is_empty() {
                debug!(paths = task.events.len(), "discarding batch popped during shutdown");
            }
            break;
        }
        if task.is_empty() {
            if queue.is_shutdown() {
                break;
            }
            continue;
        }

        let Some((layout, regenerate)) = prepare_build(&task, &cfg, &snapshot).await else {
            continue;
        };

        info!(
            paths = task.events.len(),
            full_rebuild = task.full_rebuild,
            regenerate,
            "rebuilding"
        );

        tokio::select! {
            _ = cancel.cancelled() => {
                info!("shutdown interrupted a running build");
                break;
            }
            result = backend.rebuild(layout, regenerate) => match result {
                Ok(0) => info!("build finished"),
                Ok(rc) => warn!(rc, "build failed"),
                Err(err) => error!(error = %err, "build backend error"),
            },
        }
    }

    debug!("builder activity exiting");
}

/// Pick the layout to build from. Re-discovers when the task says the target
/// list may have changed, holding the snapshot lock for the whole pass.
async fn prepare_build(
    task: &BuildTask,
    cfg: &Arc<Config>,
    snapshot: &Arc<Mutex<ProjectSnapshot>>,
) -> Option<(Arc<ProjectLayout>, bool)> {
    let regenerate = task.full_rebuild || task.requires_discovery();
    if !regenerate {
        return Some((Arc::clone(&lock_snapshot(snapshot).layout), false));
    }

    let cfg = Arc::clone(cfg);
    let snapshot = Arc::clone(snapshot);
    let rediscovered = tokio::task::spawn_blocking(move || -> Result<Arc<ProjectLayout>> {
        let mut current = lock_snapshot(&snapshot);
        *current = ProjectSnapshot::discover(&RealFileSystem, &cfg)?;
        Ok(Arc::clone(&current.layout))
    })
    .await;

    match rediscovered {
        Ok(Ok(layout)) => {
            debug!(targets = layout.targets.len(), "re-discovered project");
            Some((layout, true))
        }
        Ok(Err(err)) => {
            error!(error = %err, "re-discovery failed; skipping build");
            None
        }
        Err(err) => {
            error!(error = %err, "re-discovery task panicked; skipping build");
            None
        }
    }
}
