use std::collections::BTreeSet;
use std::path::PathBuf;

use daemonmake::project::{ProjectLayout, Target, TargetGraph, TargetKind};
use proptest::prelude::*;

/// `targets` pairs a name with its space-separated dependencies.
fn layout(targets: &[(&str, &str)]) -> ProjectLayout {
    ProjectLayout {
        project_name: "demo".to_string(),
        project_root: PathBuf::from("/work/demo"),
        targets: targets
            .iter()
            .map(|(name, deps)| {
                let mut target = Target::new(*name, TargetKind::Library);
                target.dependencies = deps.split_whitespace().map(str::to_string).collect();
                target
            })
            .collect(),
    }
}

#[test]
fn ids_follow_layout_order() {
    let graph = TargetGraph::new(&layout(&[("foo", ""), ("bar", "foo"), ("app", "bar")]));

    assert_eq!(graph.len(), 3);
    assert_eq!(graph.id_of("foo"), Some(0));
    assert_eq!(graph.id_of("app"), Some(2));
    assert_eq!(graph.name_of(1), Some("bar"));
    assert_eq!(graph.name_of(3), None);
    assert_eq!(graph.id_of("nope"), None);
}

#[test]
fn forward_and_reverse_edges() {
    let graph = TargetGraph::new(&layout(&[
        ("foo", ""),
        ("bar", "foo"),
        ("baz", "foo"),
        ("app", "bar baz"),
    ]));

    assert_eq!(graph.dependencies_of("app"), vec!["bar", "baz"]);
    assert_eq!(graph.dependents_of("foo"), vec!["bar", "baz"]);
    assert!(graph.dependents_of("app").is_empty());
    assert!(graph.dependencies_of("unknown").is_empty());
    assert!(graph.find_cycle().is_none());
}

#[test]
fn unknown_dependencies_get_no_edge() {
    let graph = TargetGraph::new(&layout(&[("app", "ghost lib"), ("lib", "")]));

    assert_eq!(graph.len(), 2);
    assert_eq!(graph.dependencies_of("app"), vec!["lib"]);
    assert_eq!(graph.id_of("ghost"), None);
}

#[test]
fn empty_layout_gives_empty_graph() {
    let graph = TargetGraph::new(&layout(&[]));
    assert!(graph.is_empty());
    assert!(graph.find_cycle().is_none());
}

#[test]
fn cycles_are_reported() {
    let graph = TargetGraph::new(&layout(&[
        ("a", "b"),
        ("b", "c"),
        ("c", "a"),
        ("d", ""),
    ]));

    let target = graph.find_cycle().expect("cycle expected");
    assert!(["a", "b", "c"].contains(&target), "unexpected cycle member {target}");
}

// Random layouts: target i may name any target (including unknown ones).
fn layout_strategy(max_targets: usize) -> impl Strategy<Value = ProjectLayout> {
    (1..=max_targets).prop_flat_map(|n| {
        proptest::collection::vec(proptest::collection::vec(0..n + 2, 0..n), n).prop_map(
            move |raw| ProjectLayout {
                project_name: "p".to_string(),
                project_root: PathBuf::from("/p"),
                targets: raw
                    .into_iter()
                    .enumerate()
                    .map(|(i, deps)| {
                        let mut target = Target::new(format!("t{i}"), TargetKind::Library);
                        target.dependencies = deps
                            .into_iter()
                            .filter(|&d| d != i)
                            .map(|d| format!("t{d}"))
                            .collect();
                        target
                    })
                    .collect(),
            },
        )
    })
}

proptest! {
    #[test]
    fn reverse_edges_are_the_exact_transpose(layout in layout_strategy(8)) {
        let graph = TargetGraph::new(&layout);
        prop_assert_eq!(graph.len(), layout.targets.len());

        let mut forward = BTreeSet::new();
        let mut backward = BTreeSet::new();
        for id in 0..graph.len() as u32 {
            for &dep in graph.dependencies(id).unwrap() {
                forward.insert((id, dep));
            }
            for &user in graph.reverse_dependencies(id).unwrap() {
                backward.insert((user, id));
            }
        }
        prop_assert_eq!(&forward, &backward);

        // Every declared dependency on a known target has an edge, nothing else does.
        for (id, target) in layout.targets.iter().enumerate() {
            let expected: BTreeSet<u32> = target
                .dependencies
                .iter()
                .filter_map(|d| graph.id_of(d))
                .collect();
            prop_assert_eq!(graph.dependencies(id as u32).unwrap(), &expected);
        }
    }

    #[test]
    fn graphs_built_with_only_backward_edges_are_acyclic(n in 1usize..10) {
        let targets: Vec<(String, Vec<String>)> = (0..n)
            .map(|i| (format!("t{i}"), (0..i).map(|d| format!("t{d}")).collect()))
            .collect();
        let layout = ProjectLayout {
            project_name: "p".to_string(),
            project_root: PathBuf::from("/p"),
            targets: targets
                .into_iter()
                .map(|(name, deps)| {
                    let mut target = Target::new(name, TargetKind::Library);
                    target.dependencies = deps.into_iter().collect();
                    target
                })
                .collect(),
        };
        prop_assert!(TargetGraph::new(&layout).find_cycle().is_none());
    }
}
