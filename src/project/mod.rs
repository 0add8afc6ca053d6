// src/project/mod.rs

//! Project model: layout discovery, include-based dependency inference and
//! the target dependency graph.
//!
//! - [`layout`] defines `Target` and `ProjectLayout`.
//! - [`discovery`] scans the tree into targets.
//! - [`deps`] infers inter-target dependencies from include lines.
//! - [`graph`] builds the forward/reverse dependency graph.

pub mod deps;
pub mod discovery;
pub mod graph;
pub mod layout;

use std::sync::Arc;

use crate::config::Config;
use crate::errors::Result;
use crate::fs::FileSystem;

pub use deps::{infer_target_dependencies, parse_includes};
pub use discovery::discover_targets;
pub use graph::{TargetGraph, TargetId};
pub use layout::{DEFAULT_LIB_NAME, ProjectLayout, Target, TargetKind, make_project_layout};

/// A layout together with the graph built from it.
///
/// Shared between the daemon's activities behind one lock and replaced as a
/// whole, so a reader never sees a layout paired with a stale graph.
#[derive(Debug, Clone)]
pub struct ProjectSnapshot {
    pub layout: Arc<ProjectLayout>,
    pub graph: Arc<TargetGraph>,
}

impl ProjectSnapshot {
    /// Run a complete discovery pass: layout, targets, dependencies, graph.
    pub fn discover(fs: &dyn FileSystem, cfg: &Config) -> Result<Self> {
        let mut layout = make_project_layout(fs, &cfg.project_root)?;
        discover_targets(fs, cfg, &mut layout);
        infer_target_dependencies(fs, &mut layout);
        let graph = TargetGraph::new(&layout);

        if let Some(target) = graph.find_cycle() {
            tracing::warn!(%target, "target dependency cycle detected");
        }

        Ok(Self {
            layout: Arc::new(layout),
            graph: Arc::new(graph),
        })
    }
}
