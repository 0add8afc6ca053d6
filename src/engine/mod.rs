// src/engine/mod.rs

//! Orchestration engine for daemonmake.
//!
//! This module ties together:
//! - the build queue between the watcher and the builder ([`queue`])
//! - the daemon that owns both activities and their shutdown ([`daemon`])

pub mod daemon;
pub mod queue;

pub use daemon::Daemon;
pub use queue::{BuildQueue, BuildTask};
