// src/lib.rs

pub mod cli;
pub mod commands;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod project;
pub mod types;
pub mod watch;

use anyhow::Result;
use tracing::debug;

use crate::cli::{CliArgs, Command};
use crate::commands::resolve_root;

/// High-level entry point used by `main.rs`. Returns the process exit code.
pub async fn run(args: CliArgs) -> Result<i32> {
    debug!(command = ?args.command, "dispatching command");

    let code = match args.command {
        Command::Init(arg) => commands::run_init(&resolve_root(arg.root)?).await?,
        Command::Status(arg) => commands::run_status(&resolve_root(arg.root)?).await?,
        Command::Build(arg) => commands::run_build(&resolve_root(arg.root)?).await?,
        Command::Gencmake { root, force } => {
            commands::run_generate_cmake(&resolve_root(root.root)?, force).await?
        }
        Command::Daemon(arg) => commands::run_daemon(&resolve_root(arg.root)?).await?,
    };

    Ok(code)
}
