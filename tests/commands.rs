use std::path::PathBuf;

use daemonmake::commands::{
    print_project_summary, resolve_root, run_generate_cmake, run_init, run_status,
};
use daemonmake::config::{config_path, load_config};
use daemonmake::errors::DaemonmakeError;
use daemonmake::exec::cmakelists::{GENERATED_MARKER, is_generated};
use daemonmake::project::{ProjectLayout, Target, TargetKind};
use daemonmake_test_utils::builders::{ConfigBuilder, ProjectTree};
use daemonmake_test_utils::init_tracing;

#[test]
fn summary_lists_targets_with_dependencies() {
    let cfg = ConfigBuilder::new("/work/demo").build();

    let mut foo = Target::new("foo", TargetKind::Library);
    foo.source_files = vec![PathBuf::from("src/foo/a.cpp"), PathBuf::from("src/foo/b.cpp")];
    let mut app = Target::new("app", TargetKind::Executable);
    app.source_files = vec![PathBuf::from("apps/app.cpp")];
    app.dependencies = ["foo".to_string(), "UnnamedLib".to_string()].into();

    let layout = ProjectLayout {
        project_name: "demo".to_string(),
        project_root: PathBuf::from("/work/demo"),
        targets: vec![foo, app],
    };

    let mut out = Vec::new();
    print_project_summary(&mut out, &cfg, &layout).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.contains("Project:   demo\n"));
    assert!(text.contains("Build dir: /work/demo/build\n"));
    assert!(text.contains("Compiler:  g++ (c++20)\n"));
    assert!(text.contains("Targets:   2\n"));
    assert!(text.contains("  lib foo (2 sources)\n"));
    assert!(text.contains("  exe app (1 sources, deps: UnnamedLib, foo)\n"));
}

#[test]
fn explicit_root_is_kept() {
    let root = PathBuf::from("/some/where");
    assert_eq!(resolve_root(Some(root.clone())).unwrap(), root);
    assert!(resolve_root(None).unwrap().is_absolute());
}

#[tokio::test]
async fn init_writes_a_loadable_config() {
    init_tracing();
    let tree = ProjectTree::foo_bar_app();

    assert_eq!(run_init(tree.root()).await.unwrap(), 0);
    assert!(config_path(tree.root()).is_file());

    let cfg = load_config(tree.root()).unwrap();
    assert_eq!(cfg.project_root, tree.root());
}

#[tokio::test]
async fn status_works_without_a_config() {
    init_tracing();
    let tree = ProjectTree::foo_bar_app();
    assert_eq!(run_status(tree.root()).await.unwrap(), 0);
    assert!(!config_path(tree.root()).exists());
}

#[tokio::test]
async fn gencmake_respects_force() {
    init_tracing();
    let tree = ProjectTree::foo_bar_app();

    assert_eq!(run_generate_cmake(tree.root(), false).await.unwrap(), 0);
    let path = tree.path("CMakeLists.txt");
    assert!(is_generated(&path));
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with(GENERATED_MARKER));
    assert!(text.contains("add_executable(app"));

    match run_generate_cmake(tree.root(), false).await {
        Err(DaemonmakeError::BuildDescriptionExists(existing)) => assert_eq!(existing, path),
        other => panic!("expected BuildDescriptionExists, got {other:?}"),
    }

    assert_eq!(run_generate_cmake(tree.root(), true).await.unwrap(), 0);
}
