// src/logging.rs

//! Logging setup for `daemonmake` using `tracing` + `tracing-subscriber`.
//!
//! Filter resolution:
//! 1. `--log-level` CLI flag applies one level to everything.
//! 2. Otherwise `DAEMONMAKE_LOG` is parsed as an `EnvFilter` directive list,
//!    e.g. `daemonmake::engine=debug,info`.
//! 3. Otherwise [`DEFAULT_DIRECTIVES`].
//!
//! Logs go to STDERR; the project summary and CMake output use stdout.

use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

/// Environment variable consulted when no `--log-level` flag is given.
pub const LOG_ENV_VAR: &str = "DAEMONMAKE_LOG";

/// `notify` is chatty at debug level; keep it at warn unless asked.
pub const DEFAULT_DIRECTIVES: &str = "info,notify=warn";

/// Initialise the global logging subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = match cli_level {
        Some(level) => EnvFilter::new(level.as_directive()),
        None => EnvFilter::try_from_env(LOG_ENV_VAR)
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES)),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}
