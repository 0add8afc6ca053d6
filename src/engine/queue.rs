// src/engine/queue.rs

use std::collections::BTreeMap;
use std::mem;
use std::path::PathBuf;
use std::pin::pin;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::types::{FileEvent, FileEventKind};

/// One batch of work for the builder, produced by [`BuildQueue::pop_all_events`].
///
/// `events` holds the net change per path over the debounce window, so it
/// carries no ordering between paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildTask {
    pub events: BTreeMap<PathBuf, FileEventKind>,
    pub full_rebuild: bool,
}

impl BuildTask {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && !self.full_rebuild
    }

    /// True if files appeared or vanished, i.e. the target list may be stale.
    pub fn requires_discovery(&self) -> bool {
        self.events
            .values()
            .any(|kind| matches!(kind, FileEventKind::Created | FileEventKind::Deleted))
    }
}

#[derive(Debug, Default)]
struct QueueState {
    pending: BTreeMap<PathBuf, FileEventKind>,
    needs_full_rebuild: bool,
    last_push: Option<Instant>,
    shutdown: bool,
}

impl QueueState {
    fn has_work(&self) -> bool {
        !self.pending.is_empty() || self.needs_full_rebuild
    }

    /// Whether `event` can be applied without exceeding `capacity` distinct
    /// paths.
    fn has_room_for(&self, event: &FileEvent, capacity: usize) -> bool {
        match &event.path {
            _ if event.kind == FileEventKind::Overflow => true,
            Some(path) if self.pending.contains_key(path) => true,
            _ => self.pending.len() < capacity,
        }
    }

    fn apply(&mut self, event: FileEvent) {
        if event.kind == FileEventKind::Overflow {
            self.needs_full_rebuild = true;
            return;
        }
        let Some(path) = event.path else {
            debug!(kind = ?event.kind, "dropping file event without a path");
            return;
        };

        match self.pending.get(&path) {
            None | Some(FileEventKind::Modified) => {
                self.pending.insert(path, event.kind);
            }
            Some(FileEventKind::Created) if event.kind == FileEventKind::Deleted => {
                // Created and deleted inside one window: nothing to see.
                trace!(path = %path.display(), "create/delete cancelled out");
                self.pending.remove(&path);
            }
            Some(_) => {}
        }
    }
}

/// Bounded, debouncing, path-coalescing queue between the watcher and the
/// builder.
///
/// Producers call [`push_event`](Self::push_event); the single consumer calls
/// [`pop_all_events`](Self::pop_all_events), which only returns once no new
/// event has arrived for a full debounce window. Pending state is one entry
/// per path, so memory is bounded by distinct paths rather than raw events.
#[derive(Debug)]
pub struct BuildQueue {
    capacity: usize,
    debounce: Duration,
    state: Mutex<QueueState>,
    not_empty: Notify,
    not_full: Notify,
}

impl BuildQueue {
    /// `capacity` is clamped to at least 1.
    pub fn new(capacity: usize, debounce: Duration) -> Self {
        Self {
            capacity: capacity.max(1),
            debounce,
            state: Mutex::new(QueueState::default()),
            not_empty: Notify::new(),
            not_full: Notify::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Number of distinct paths currently pending.
    pub fn len(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        !self.lock().has_work()
    }

    pub fn is_shutdown(&self) -> bool {
        self.lock().shutdown
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        // The state is always left consistent between statements, so a
        // poisoned lock is still usable.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Fold `event` into the pending state.
    ///
    /// Waits while the queue holds `capacity` distinct paths and `event` would
    /// add another one. Returns without effect once the queue is shut down.
    pub async fn push_event(&self, event: FileEvent) {
        let mut not_full = pin!(self.not_full.notified());

        loop {
            // Register before checking so a drain between the check and the
            // await is not missed.
            not_full.as_mut().enable();

            {
                let mut state = self.lock();
                if state.shutdown {
                    return;
                }
                if state.has_room_for(&event, self.capacity) {
                    state.apply(event);
                    state.last_push = Some(Instant::now());
                    drop(state);
                    self.not_empty.notify_one();
                    return;
                }
            }

            trace!(capacity = self.capacity, "build queue full; producer waiting");
            not_full.as_mut().await;
            not_full.set(self.not_full.notified());
        }
    }

    /// Wait for work, let it settle for one debounce window, then drain it.
    ///
    /// Every push during the window restarts it. Shutdown, a pending full
    /// rebuild or `cancel` end the window early. Returns an empty task only
    /// when shutdown or cancellation arrives with nothing pending.
    pub async fn pop_all_events(&self, cancel: &CancellationToken) -> BuildTask {
        if !self.wait_for_work(cancel).await {
            return BuildTask::default();
        }
        self.wait_for_quiet(cancel).await;
        self.drain()
    }

    /// Returns `false` if woken by shutdown/cancellation with nothing pending.
    async fn wait_for_work(&self, cancel: &CancellationToken) -> bool {
        loop {
            let mut not_empty = pin!(self.not_empty.notified());
            not_empty.as_mut().enable();

            {
                let state = self.lock();
                if state.has_work() {
                    return true;
                }
                if state.shutdown {
                    return false;
                }
            }

            tokio::select! {
                _ = not_empty => {}
                _ = cancel.cancelled() => {
                    return self.lock().has_work();
                }
            }
        }
    }

    async fn wait_for_quiet(&self, cancel: &CancellationToken) {
        loop {
            let mut pushed = pin!(self.not_empty.notified());
            pushed.as_mut().enable();

            let deadline = {
                let state = self.lock();
                if state.shutdown || state.needs_full_rebuild {
                    return;
                }
                match state.last_push {
                    Some(at) => at + self.debounce,
                    None => return,
                }
            };

            if cancel.is_cancelled() || Instant::now() >= deadline {
                return;
            }

            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => {}
                _ = pushed => {}
                _ = cancel.cancelled() => return,
            }
        }
    }

    fn drain(&self) -> BuildTask {
        let task = {
            let mut state = self.lock();
            state.last_push = None;
            BuildTask {
                events: mem::take(&mut state.pending),
                full_rebuild: mem::take(&mut state.needs_full_rebuild),
            }
        };
        self.not_full.notify_waiters();

        debug!(
            paths = task.events.len(),
            full_rebuild = task.full_rebuild,
            "drained build queue"
        );
        task
    }

    /// Stop accepting events and wake every waiting producer and consumer.
    /// Idempotent.
    pub fn shutdown(&self) {
        {
            let mut state = self.lock();
            if state.shutdown {
                return;
            }
            state.shutdown = true;
        }
        self.not_full.notify_waiters();
        self.not_empty.notify_waiters();
        debug!("build queue shut down");
    }
}
