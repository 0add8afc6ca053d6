// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Command-line arguments for `daemonmake`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "daemonmake",
    version,
    about = "Discover C++ targets, generate CMake, and rebuild on file changes.",
    long_about = None
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DAEMONMAKE_LOG` or a default filter will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Write a default `.daemonmake/config.toml` and print the discovered targets.
    Init(RootArg),
    /// Print the configuration and the currently discovered targets.
    Status(RootArg),
    /// Discover targets and run a one-shot CMake build.
    Build(RootArg),
    /// Generate `CMakeLists.txt` without building.
    Gencmake {
        #[command(flatten)]
        root: RootArg,

        /// Overwrite an existing `CMakeLists.txt`.
        #[arg(long)]
        force: bool,
    },
    /// Watch the project and rebuild whenever changes settle.
    Daemon(RootArg),
}

#[derive(Debug, Clone, Args)]
pub struct RootArg {
    /// Project root. Defaults to the current directory.
    #[arg(value_name = "ROOT")]
    pub root: Option<PathBuf>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
