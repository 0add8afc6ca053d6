// src/exec/backend.rs

//! Pluggable build backend abstraction.
//!
//! The daemon talks to a `BuildBackend` instead of spawning CMake itself, so
//! tests can substitute a backend that just records what it was asked to do.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::config::Config;
use crate::errors::Result;
use crate::project::ProjectLayout;

use super::cmake::cmake_build;

pub type RebuildFuture<'a> = Pin<Box<dyn Future<Output = Result<i32>> + Send + 'a>>;

/// Something that can rebuild a project.
pub trait BuildBackend: Send + 'static {
    /// Rebuild everything in `layout` and return the process exit code.
    ///
    /// `regenerate` is set when the target list may have changed, so any
    /// derived build description should be refreshed first.
    fn rebuild(&mut self, layout: Arc<ProjectLayout>, regenerate: bool) -> RebuildFuture<'_>;
}

/// Production backend: CMake configure + build.
#[derive(Debug, Clone)]
pub struct CMakeBackend {
    cfg: Config,
}

impl CMakeBackend {
    pub fn new(cfg: Config) -> Self {
        Self { cfg }
    }
}

impl BuildBackend for CMakeBackend {
    fn rebuild(&mut self, layout: Arc<ProjectLayout>, regenerate: bool) -> RebuildFuture<'_> {
        Box::pin(async move { cmake_build(&self.cfg, &layout, regenerate).await })
    }
}
