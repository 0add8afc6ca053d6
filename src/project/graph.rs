// src/project/graph.rs

use std::collections::{BTreeSet, HashMap};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::{debug, warn};

use crate::project::layout::{ProjectLayout, TargetName};

/// Dense target identifier, assigned in layout order.
pub type TargetId = u32;

/// Directed dependency graph over the targets of one layout snapshot.
///
/// Built once and never mutated; a new discovery produces a new graph. Edge
/// `a -> b` exists iff `b` is a declared dependency of `a`, and
/// `reverse_dependencies` is the exact transpose of `dependencies`.
/// Dependencies naming targets that are not part of the layout get no edge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetGraph {
    name_to_id: HashMap<TargetName, TargetId>,
    names: Vec<TargetName>,
    dependencies: Vec<BTreeSet<TargetId>>,
    reverse_dependencies: Vec<BTreeSet<TargetId>>,
}

impl TargetGraph {
    pub fn new(layout: &ProjectLayout) -> Self {
        let mut name_to_id = HashMap::with_capacity(layout.targets.len());
        let mut names = Vec::with_capacity(layout.targets.len());

        for (idx, target) in layout.targets.iter().enumerate() {
            let id = idx as TargetId;
            if name_to_id.insert(target.name.clone(), id).is_some() {
                warn!(target = %target.name, "duplicate target name; later target shadows earlier one");
            }
            names.push(target.name.clone());
        }

        let mut dependencies = vec![BTreeSet::new(); names.len()];
        let mut reverse_dependencies = vec![BTreeSet::new(); names.len()];

        for (idx, target) in layout.targets.iter().enumerate() {
            let id = idx as TargetId;
            for dep in &target.dependencies {
                let Some(&dep_id) = name_to_id.get(dep) else {
                    debug!(target = %target.name, dependency = %dep, "dependency names no known target; no edge");
                    continue;
                };
                dependencies[idx].insert(dep_id);
                reverse_dependencies[dep_id as usize].insert(id);
            }
        }

        Self {
            name_to_id,
            names,
            dependencies,
            reverse_dependencies,
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn id_of(&self, name: &str) -> Option<TargetId> {
        self.name_to_id.get(name).copied()
    }

    pub fn name_of(&self, id: TargetId) -> Option<&str> {
        self.names.get(id as usize).map(String::as_str)
    }

    /// What `id` needs.
    pub fn dependencies(&self, id: TargetId) -> Option<&BTreeSet<TargetId>> {
        self.dependencies.get(id as usize)
    }

    /// Who needs `id`.
    pub fn reverse_dependencies(&self, id: TargetId) -> Option<&BTreeSet<TargetId>> {
        self.reverse_dependencies.get(id as usize)
    }

    pub fn dependencies_of(&self, name: &str) -> Vec<&str> {
        self.resolve_names(self.id_of(name).and_then(|id| self.dependencies(id)))
    }

    pub fn dependents_of(&self, name: &str) -> Vec<&str> {
        self.resolve_names(self.id_of(name).and_then(|id| self.reverse_dependencies(id)))
    }

    fn resolve_names(&self, ids: Option<&BTreeSet<TargetId>>) -> Vec<&str> {
        ids.into_iter()
            .flatten()
            .filter_map(|&id| self.name_of(id))
            .collect()
    }

    /// A target that takes part in a dependency cycle, if there is one.
    pub fn find_cycle(&self) -> Option<&str> {
        let mut graph: DiGraphMap<TargetId, ()> = DiGraphMap::new();
        for id in 0..self.names.len() as TargetId {
            graph.add_node(id);
        }
        for (idx, deps) in self.dependencies.iter().enumerate() {
            for &dep in deps {
                graph.add_edge(idx as TargetId, dep, ());
            }
        }

        match toposort(&graph, None) {
            Ok(_) => None,
            Err(cycle) => self.name_of(cycle.node_id()),
        }
    }
}
