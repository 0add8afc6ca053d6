// src/project/discovery.rs

//! Turn the project tree into a list of targets.
//!
//! Layout conventions:
//!
//! ```text
//! <root>/<src>/<lib>/**.cpp              -> Library <lib>
//! <root>/<src>/*.cpp                     -> Library UnnamedLib
//! <root>/<include>/<project>/*.hpp       -> headers of UnnamedLib
//! <root>/<include>/<project>/<lib>/**.hpp -> headers of <lib>
//! <root>/<apps>/<name>.cpp               -> Executable <name>
//! ```

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::Config;
use crate::fs::{FileSystem, walk_files};
use crate::project::layout::{
    DEFAULT_LIB_NAME, HEADER_EXTENSIONS, ProjectLayout, SOURCE_EXTENSIONS, Target, TargetKind,
    has_extension,
};

/// Replace `layout.targets` with the targets found on disk.
///
/// Stateless: nothing from the previous target list survives. Directories
/// that cannot be read are logged and treated as empty.
pub fn discover_targets(fs: &dyn FileSystem, cfg: &Config, layout: &mut ProjectLayout) {
    let root = layout.project_root.clone();

    let mut fallback = Target::new(DEFAULT_LIB_NAME, TargetKind::Library);
    let mut libraries: Vec<Target> = Vec::new();

    let src_dir = root.join(&cfg.source_folder_name);
    if fs.is_dir(&src_dir) {
        for entry in list_dir(fs, &src_dir) {
            if fs.is_dir(&entry) {
                if let Some(name) = file_name(&entry) {
                    libraries.push(Target::new(name, TargetKind::Library));
                }
            } else if fs.is_file(&entry) && has_extension(&entry, SOURCE_EXTENSIONS) {
                fallback.source_files.push(relative_to(&root, &entry));
            }
        }

        for lib in &mut libraries {
            lib.source_files = collect_recursive(fs, &root, &src_dir.join(&lib.name), SOURCE_EXTENSIONS);
        }
    }

    let include_dir = root
        .join(&cfg.include_folder_name)
        .join(&layout.project_name);
    if fs.is_dir(&include_dir) {
        for entry in list_dir(fs, &include_dir) {
            if fs.is_file(&entry) && has_extension(&entry, HEADER_EXTENSIONS) {
                fallback.header_files.push(relative_to(&root, &entry));
            }
        }

        for lib in &mut libraries {
            let lib_include = include_dir.join(&lib.name);
            if fs.is_dir(&lib_include) {
                lib.header_files = collect_recursive(fs, &root, &lib_include, HEADER_EXTENSIONS);
            }
        }
    }

    let mut targets = libraries;
    if fallback.has_files() {
        targets.push(fallback);
    }

    let apps_dir = root.join(&cfg.apps_folder_name);
    if fs.is_dir(&apps_dir) {
        for entry in list_dir(fs, &apps_dir) {
            if !fs.is_file(&entry) || !has_extension(&entry, SOURCE_EXTENSIONS) {
                continue;
            }
            let Some(stem) = entry.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };
            let mut exe = Target::new(stem, TargetKind::Executable);
            exe.source_files.push(relative_to(&root, &entry));
            targets.push(exe);
        }
    }

    debug!(
        project = %layout.project_name,
        targets = targets.len(),
        "target discovery finished"
    );
    layout.targets = targets;
}

fn list_dir(fs: &dyn FileSystem, dir: &Path) -> Vec<PathBuf> {
    fs.read_dir(dir).unwrap_or_else(|err| {
        warn!(dir = %dir.display(), error = %err, "cannot list directory; treating as empty");
        Vec::new()
    })
}

fn collect_recursive(
    fs: &dyn FileSystem,
    root: &Path,
    dir: &Path,
    extensions: &[&str],
) -> Vec<PathBuf> {
    match walk_files(fs, dir) {
        Ok(files) => files
            .iter()
            .filter(|p| has_extension(p, extensions))
            .map(|p| relative_to(root, p))
            .collect(),
        Err(err) => {
            warn!(dir = %dir.display(), error = %err, "cannot scan directory; treating as empty");
            Vec::new()
        }
    }
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

fn relative_to(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}
