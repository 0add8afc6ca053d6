use std::path::{Path, PathBuf};

use daemonmake::watch::{IgnoreSet, WatchTable};

#[test]
fn insert_and_remove_report_membership() {
    let mut table = WatchTable::new();
    assert!(table.insert(Path::new("/p/src")));
    assert!(table.insert(Path::new("/p/apps")));
    assert!(!table.insert(Path::new("/p/src")));
    assert_eq!(table.len(), 2);

    assert!(table.remove(Path::new("/p/src")));
    assert!(!table.remove(Path::new("/p/src")));
    assert!(!table.contains(Path::new("/p/src")));
    assert!(table.contains(Path::new("/p/apps")));
}

#[test]
fn subtree_removal_stops_at_component_boundaries() {
    let mut table = WatchTable::new();
    for dir in ["/p/src", "/p/src/foo", "/p/src/foo/detail", "/p/src/foobar"] {
        table.insert(Path::new(dir));
    }

    let mut removed = table.remove_subtree(Path::new("/p/src/foo"));
    removed.sort();
    assert_eq!(
        removed,
        vec![PathBuf::from("/p/src/foo"), PathBuf::from("/p/src/foo/detail")]
    );
    assert!(table.contains(Path::new("/p/src/foobar")));
    assert!(table.contains(Path::new("/p/src")));
    assert_eq!(table.len(), 2);
}

#[test]
fn removed_directory_can_be_watched_again() {
    let mut table = WatchTable::new();
    table.insert(Path::new("/p/a"));
    table.remove_subtree(Path::new("/p/a"));
    assert!(table.is_empty());

    assert!(table.insert(Path::new("/p/a")));
    assert_eq!(table.dirs().collect::<Vec<_>>(), vec![Path::new("/p/a")]);
}

#[test]
fn ignore_globs_match_relative_paths() {
    let patterns = vec!["**/*.swp".to_string(), "apps/scratch/**".to_string()];
    let ignore = IgnoreSet::new("/p", &patterns).unwrap();

    assert!(ignore.is_ignored(Path::new("/p/src/.foo.cpp.swp")));
    assert!(ignore.is_ignored(Path::new("/p/apps/scratch/try.cpp")));
    assert!(!ignore.is_ignored(Path::new("/p/apps/app.cpp")));
    // Outside the base only the file name is considered.
    assert!(ignore.is_ignored(Path::new("/elsewhere/x.swp")));
    assert!(!IgnoreSet::empty("/p").is_ignored(Path::new("/p/a.swp")));
}

#[test]
fn invalid_glob_is_an_error() {
    assert!(IgnoreSet::new("/p", &["{unclosed".to_string()]).is_err());
}
