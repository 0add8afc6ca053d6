// src/commands.rs

//! One function per CLI subcommand. Each returns the process exit code.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{info, warn};

use crate::config::{Config, load_config, make_default_config, save_config};
use crate::engine::Daemon;
use crate::errors::Result;
use crate::exec::{cmake_build, write_cmakelists};
use crate::fs::RealFileSystem;
use crate::project::{ProjectLayout, ProjectSnapshot, TargetKind};

/// `init`: write the default config and show what was found.
pub async fn run_init(root: &Path) -> Result<i32> {
    let cfg = make_default_config(root)?;
    save_config(&cfg)?;
    println!("Initialised {}", cfg.config_path().display());

    let snapshot = discover(cfg.clone()).await?;
    print_project_summary(&mut io::stdout().lock(), &cfg, &snapshot.layout)?;
    Ok(0)
}

/// `status`: show the config and the current targets.
pub async fn run_status(root: &Path) -> Result<i32> {
    let cfg = load_or_default(root)?;
    let snapshot = discover(cfg.clone()).await?;
    print_project_summary(&mut io::stdout().lock(), &cfg, &snapshot.layout)?;

    if let Some(target) = snapshot.graph.find_cycle() {
        println!("warning: dependency cycle through target `{target}`");
    }
    Ok(0)
}

/// `build`: one-shot discovery and CMake build.
pub async fn run_build(root: &Path) -> Result<i32> {
    let cfg = load_or_default(root)?;
    let snapshot = discover(cfg.clone()).await?;
    cmake_build(&cfg, &snapshot.layout, true).await
}

/// `gencmake`: write `CMakeLists.txt` without building.
pub async fn run_generate_cmake(root: &Path, force: bool) -> Result<i32> {
    let cfg = load_or_default(root)?;
    let snapshot = discover(cfg.clone()).await?;
    let path = write_cmakelists(&cfg, &snapshot.layout, force)?;
    println!("Wrote {}", path.display());
    Ok(0)
}

/// `daemon`: watch and rebuild until Ctrl-C.
pub async fn run_daemon(root: &Path) -> Result<i32> {
    let cfg = load_or_default(root)?;
    let mut daemon = Daemon::with_cmake(cfg).await?;
    print_project_summary(&mut io::stdout().lock(), daemon.config(), &daemon.layout())?;

    daemon.run()?;
    info!("daemon running; press Ctrl-C to stop");

    let signal = tokio::signal::ctrl_c().await;
    if let Err(err) = &signal {
        warn!(error = %err, "failed to listen for Ctrl-C; stopping");
    }

    info!("shutting down");
    daemon.stop().await;
    Ok(0)
}

/// Human-readable overview of `layout`.
pub fn print_project_summary(
    out: &mut impl Write,
    cfg: &Config,
    layout: &ProjectLayout,
) -> io::Result<()> {
    writeln!(out, "Project:   {}", layout.project_name)?;
    writeln!(out, "Root:      {}", cfg.project_root.display())?;
    writeln!(out, "Build dir: {}", cfg.build_directory.display())?;
    writeln!(out, "Compiler:  {} ({})", cfg.compiler, cfg.cxx_standard)?;
    writeln!(out, "Targets:   {}", layout.targets.len())?;

    for target in &layout.targets {
        let kind = match target.kind {
            TargetKind::Library => "lib",
            TargetKind::Executable => "exe",
        };
        write!(
            out,
            "  {kind} {} ({} sources",
            target.name,
            target.source_files.len()
        )?;
        if !target.dependencies.is_empty() {
            let deps: Vec<&str> = target.dependencies.iter().map(String::as_str).collect();
            write!(out, ", deps: {}", deps.join(", "))?;
        }
        writeln!(out, ")")?;
    }
    Ok(())
}

/// Resolve the optional ROOT argument against the working directory.
pub fn resolve_root(root: Option<PathBuf>) -> Result<PathBuf> {
    match root {
        Some(root) => Ok(root),
        None => Ok(std::env::current_dir().context("reading current directory")?),
    }
}

/// The stored config if there is one, otherwise defaults for `root`.
fn load_or_default(root: &Path) -> Result<Config> {
    if crate::config::config_path(root).is_file() {
        return load_config(root);
    }
    info!(root = %root.display(), "no config found; using defaults (run `daemonmake init` to create one)");
    make_default_config(root)
}

async fn discover(cfg: Config) -> Result<ProjectSnapshot> {
    tokio::task::spawn_blocking(move || ProjectSnapshot::discover(&RealFileSystem, &cfg))
        .await
        .context("discovery task panicked")?
}
