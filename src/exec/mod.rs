// src/exec/mod.rs

//! Build backend layer.
//!
//! - [`backend`] defines the `BuildBackend` trait and the CMake implementation
//!   the daemon uses in production.
//! - [`cmake`] runs `cmake` configure/build steps via `tokio::process`.
//! - [`cmakelists`] renders and writes `CMakeLists.txt` from a layout.

pub mod backend;
pub mod cmake;
pub mod cmakelists;

pub use backend::{BuildBackend, CMakeBackend, RebuildFuture};
pub use cmake::cmake_build;
pub use cmakelists::{render_cmakelists, write_cmakelists};
