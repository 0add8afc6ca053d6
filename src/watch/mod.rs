// src/watch/mod.rs

//! Filesystem watching.
//!
//! - [`watcher`] wraps the OS watch facility (`notify`, inotify on Linux) and
//!   turns its notifications into normalised [`crate::types::FileEvent`]s.
//! - [`table`] is the set of directories the watcher holds a watch on.
//! - [`ignore`] is the glob-based noise filter.
//!
//! The watcher knows nothing about targets or builds; it only reports which
//! paths changed and when its own view of the tree became unreliable.

pub mod ignore;
pub mod table;
pub mod watcher;

pub use ignore::IgnoreSet;
pub use table::WatchTable;
pub use watcher::{FileWatcher, RawEventReceiver, WatchBackend};
