// src/project/deps.rs

//! Inter-target dependency inference from `#include "..."` lines.
//!
//! This is textual matching, not a preprocessor: macros, conditional
//! compilation and relative includes are not resolved. An include of the form
//! `"<project>/<target>/<...>"` makes the including target depend on
//! `<target>`; `"<project>/<file>"` points at the ungrouped default library.

use std::collections::BTreeSet;
use std::io::{BufRead, BufReader};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::fs::FileSystem;
use crate::project::layout::{DEFAULT_LIB_NAME, ProjectLayout, TargetName};

static QUOTED_INCLUDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*#\s*include\s*"([^"]+)""#).expect("include pattern is a valid regex")
});

/// Every quoted include path found in `reader`, in file order.
///
/// Lines that are not valid UTF-8 are decoded lossily; a read error ends the
/// scan with whatever was collected so far.
pub fn parse_includes(reader: impl BufRead) -> Vec<String> {
    let mut includes = Vec::new();
    for line in reader.split(b'\n') {
        let Ok(line) = line else { break };
        let line = String::from_utf8_lossy(&line);
        if let Some(caps) = QUOTED_INCLUDE.captures(&line) {
            includes.push(caps[1].to_string());
        }
    }
    includes
}

/// Target named by an include path, if any.
///
/// The first segment is the project marker and is ignored.
pub fn dependency_for_include(include: &str) -> Option<&str> {
    let mut segments = include.splitn(3, '/');
    let _project = segments.next()?;
    let second = segments.next()?;
    match segments.next() {
        Some(_) if !second.is_empty() => Some(second),
        Some(_) => None,
        None => Some(DEFAULT_LIB_NAME),
    }
}

/// Fill `dependencies` for every target in `layout`.
///
/// Files that cannot be opened contribute nothing and do not stop the scan.
pub fn infer_target_dependencies(fs: &dyn FileSystem, layout: &mut ProjectLayout) {
    let root = layout.project_root.clone();

    for target in &mut layout.targets {
        let mut deps: BTreeSet<TargetName> = BTreeSet::new();

        for rel in target.files() {
            let path = root.join(rel);
            let reader = match fs.open_read(&path) {
                Ok(r) => r,
                Err(err) => {
                    warn!(
                        target = %target.name,
                        file = %path.display(),
                        error = %err,
                        "skipping unreadable file during include scan"
                    );
                    continue;
                }
            };

            for include in parse_includes(BufReader::new(reader)) {
                if let Some(dep) = dependency_for_include(&include) {
                    deps.insert(dep.to_string());
                }
            }
        }

        deps.remove(&target.name);
        debug!(target = %target.name, ?deps, "inferred target dependencies");
        target.dependencies = deps;
    }
}
