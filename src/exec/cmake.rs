// src/exec/cmake.rs

//! Running CMake as a subprocess.

use std::ffi::OsString;
use std::process::Stdio;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::errors::Result;
use crate::exec::cmakelists::{cmakelists_path, is_generated, write_cmakelists};
use crate::project::ProjectLayout;

const CMAKE_PROGRAM: &str = "cmake";

/// Make sure a `CMakeLists.txt` exists, regenerating it when asked.
///
/// A missing file is always written. With `regenerate`, an existing file is
/// rewritten only if daemonmake generated it.
pub fn ensure_build_description(cfg: &Config, layout: &ProjectLayout, regenerate: bool) -> Result<()> {
    let path = cmakelists_path(cfg);
    if !path.exists() {
        write_cmakelists(cfg, layout, false)?;
        return Ok(());
    }
    if !regenerate {
        return Ok(());
    }
    if is_generated(&path) {
        write_cmakelists(cfg, layout, true)?;
    } else {
        info!(path = %path.display(), "CMakeLists.txt is hand-written; not regenerating");
    }
    Ok(())
}

/// Configure and build the project. Returns the exit code of the failing
/// step, or of the build step if configuration succeeded.
pub async fn cmake_build(cfg: &Config, layout: &ProjectLayout, regenerate: bool) -> Result<i32> {
    tokio::fs::create_dir_all(&cfg.build_directory)
        .await
        .with_context(|| format!("creating build dir {}", cfg.build_directory.display()))?;

    ensure_build_description(cfg, layout, regenerate)?;

    let configure_args: Vec<OsString> = vec![
        "-S".into(),
        cfg.project_root.clone().into(),
        "-B".into(),
        cfg.build_directory.clone().into(),
    ];
    let rc = run_cmake(configure_args).await?;
    if rc != 0 {
        error!(rc, "CMake configuration failed");
        return Ok(rc);
    }

    let build_args: Vec<OsString> = vec!["--build".into(), cfg.build_directory.clone().into()];
    let rc = run_cmake(build_args).await?;
    if rc != 0 {
        error!(rc, "CMake build failed");
    } else {
        info!("CMake build succeeded");
    }
    Ok(rc)
}

async fn run_cmake(args: Vec<OsString>) -> Result<i32> {
    info!(?args, "running {CMAKE_PROGRAM}");

    let mut child = Command::new(CMAKE_PROGRAM)
        .args(&args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("spawning {CMAKE_PROGRAM}"))?;

    let stdout = child.stdout.take().map(|s| tokio::spawn(forward_lines(s, false)));
    let stderr = child.stderr.take().map(|s| tokio::spawn(forward_lines(s, true)));

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for {CMAKE_PROGRAM}"))?;

    for forwarder in [stdout, stderr].into_iter().flatten() {
        if let Err(err) = forwarder.await {
            warn!(error = %err, "output forwarder failed");
        }
    }

    let code = status.code().unwrap_or(-1);
    debug!(code, success = status.success(), "{CMAKE_PROGRAM} exited");
    Ok(code)
}

/// Forward the child's output into the log, one event per line.
async fn forward_lines(stream: impl AsyncRead + Unpin, is_stderr: bool) {
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if is_stderr {
            warn!(target: "cmake", "{line}");
        } else {
            info!(target: "cmake", "{line}");
        }
    }
}
