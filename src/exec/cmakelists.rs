// src/exec/cmakelists.rs

//! `CMakeLists.txt` generation from a discovered layout.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::info;

use crate::config::Config;
use crate::errors::{DaemonmakeError, Result};
use crate::project::{ProjectLayout, TargetKind};

pub const CMAKELISTS_FILE_NAME: &str = "CMakeLists.txt";

/// First line of every file written by [`write_cmakelists`]. Files without it
/// are treated as hand-written and never regenerated.
pub const GENERATED_MARKER: &str = "# Generated by daemonmake";

const CMAKE_MINIMUM_VERSION: &str = "3.20";
const DEFAULT_CXX_STANDARD_NUMBER: &str = "20";

pub fn cmakelists_path(cfg: &Config) -> PathBuf {
    cfg.project_root.join(CMAKELISTS_FILE_NAME)
}

/// Leading digits of e.g. `"c++20"` or `"gnu++17"`; `"20"` if there are none.
pub fn cxx_standard_number(standard: &str) -> &str {
    let Some(start) = standard.find(|c: char| c.is_ascii_digit()) else {
        return DEFAULT_CXX_STANDARD_NUMBER;
    };
    let rest = &standard[start..];
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    &rest[..end]
}

/// Render the build description for `layout`.
///
/// Link dependencies are restricted to library targets present in the layout;
/// anything else the include scan picked up would make CMake fail.
pub fn render_cmakelists(cfg: &Config, layout: &ProjectLayout) -> String {
    let libraries: HashSet<&str> = layout
        .targets
        .iter()
        .filter(|t| t.kind == TargetKind::Library)
        .map(|t| t.name.as_str())
        .collect();

    // Writing into a String cannot fail.
    let mut out = String::new();
    let _ = writeln!(out, "{GENERATED_MARKER}");
    let _ = writeln!(out, "cmake_minimum_required(VERSION {CMAKE_MINIMUM_VERSION})\n");

    let _ = writeln!(out, "if (NOT CMAKE_CXX_COMPILER)");
    let _ = writeln!(out, "    set(CMAKE_CXX_COMPILER \"{}\")", cfg.compiler);
    let _ = writeln!(out, "endif()\n");
    let _ = writeln!(out, "project({} LANGUAGES CXX)\n", layout.project_name);

    let _ = writeln!(
        out,
        "set(CMAKE_CXX_STANDARD {})",
        cxx_standard_number(&cfg.cxx_standard)
    );
    let _ = writeln!(out, "set(CMAKE_CXX_STANDARD_REQUIRED ON)");
    let _ = writeln!(out, "set(CMAKE_CXX_EXTENSIONS OFF)\n");

    let _ = writeln!(
        out,
        "set(PROJECT_INCLUDE_DIR ${{CMAKE_CURRENT_SOURCE_DIR}}/{})\n",
        cfg.include_folder_name
    );

    for target in &layout.targets {
        let command = match target.kind {
            TargetKind::Library => "add_library",
            TargetKind::Executable => "add_executable",
        };
        let _ = write!(out, "{command}({}", target.name);
        for src in &target.source_files {
            let _ = write!(out, "\n    {}", cmake_path(src));
        }
        let _ = writeln!(out, ")");
        let _ = writeln!(
            out,
            "target_include_directories({} PRIVATE ${{PROJECT_INCLUDE_DIR}})\n",
            target.name
        );
    }

    for target in &layout.targets {
        let deps: Vec<&str> = target
            .dependencies
            .iter()
            .map(String::as_str)
            .filter(|dep| libraries.contains(dep))
            .collect();
        if deps.is_empty() {
            continue;
        }
        let _ = writeln!(out, "target_link_libraries({}\n    PRIVATE", target.name);
        for dep in deps {
            let _ = writeln!(out, "        {dep}");
        }
        let _ = writeln!(out, ")\n");
    }

    out
}

/// Write `CMakeLists.txt` into the project root.
///
/// Refuses to replace an existing file unless `overwrite` is set.
pub fn write_cmakelists(cfg: &Config, layout: &ProjectLayout, overwrite: bool) -> Result<PathBuf> {
    let path = cmakelists_path(cfg);
    if path.exists() && !overwrite {
        return Err(DaemonmakeError::BuildDescriptionExists(path));
    }

    fs::write(&path, render_cmakelists(cfg, layout))
        .with_context(|| format!("writing {}", path.display()))?;

    info!(path = %path.display(), targets = layout.targets.len(), "wrote CMakeLists.txt");
    Ok(path)
}

/// Whether the file at `path` starts with [`GENERATED_MARKER`].
pub fn is_generated(path: &Path) -> bool {
    let Ok(file) = fs::File::open(path) else {
        return false;
    };
    let mut first_line = String::new();
    match BufReader::new(file).read_line(&mut first_line) {
        Ok(_) => first_line.trim_end() == GENERATED_MARKER,
        Err(_) => false,
    }
}

fn cmake_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
