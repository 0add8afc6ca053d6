// src/config/mod.rs

//! Project configuration.
//!
//! - [`model`] holds the TOML-backed data model.
//! - [`loader`] reads, writes and creates default configs.
//! - [`validate`] turns a `RawConfig` into a checked `Config`.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_config, load_from_path, make_default_config, save_config};
pub use model::{Config, DaemonSection, RawConfig, config_path};
