// src/flow/graph.rs

use std::collections::HashMap;
use std::path::Path;

use petgraph::algo::{has_path_connecting, toposort};
use petgraph::graphmap::DiGraphMap;

use crate::config::PathRegistry;
use crate::errors::{AssetdagError, Result};
use crate::tasks::TaskName;

use super::Flow;

/// A [`Flow`] laid out as a DAG of tasks.
///
/// Edge direction: `a -> b` means `b` starts only after `a` finished. Two
/// tasks without a path between them may run at the same time.
#[derive(Debug, Clone)]
pub struct FlowGraph {
    graph: DiGraphMap<TaskName, ()>,
}

impl FlowGraph {
    pub fn from_flow(flow: &Flow) -> Self {
        let mut graph = DiGraphMap::new();
        add(&mut graph, flow);
        Self { graph }
    }

    /// Groups of tasks in execution order; tasks within a stage may run
    /// concurrently.
    pub fn stages(&self) -> Vec<Vec<TaskName>> {
        // Flows are trees of series/parallel, so the graph is always acyclic.
        let order = toposort(&self.graph, None).unwrap_or_default();

        let mut level: HashMap<TaskName, usize> = HashMap::new();
        for node in &order {
            let depth = self
                .graph
                .neighbors_directed(*node, petgraph::Direction::Incoming)
                .filter_map(|pred| level.get(&pred))
                .map(|l| l + 1)
                .max()
                .unwrap_or(0);
            level.insert(*node, depth);
        }

        let mut stages: Vec<Vec<TaskName>> = Vec::new();
        for node in order {
            let depth = level[&node];
            if stages.len() <= depth {
                stages.resize_with(depth + 1, Vec::new);
            }
            stages[depth].push(node);
        }
        for stage in &mut stages {
            stage.sort();
        }
        stages
    }

    /// True if neither task is ordered before the other.
    pub fn concurrent(&self, a: TaskName, b: TaskName) -> bool {
        a != b
            && self.graph.contains_node(a)
            && self.graph.contains_node(b)
            && !has_path_connecting(&self.graph, a, b, None)
            && !has_path_connecting(&self.graph, b, a, None)
    }

    /// Reject flows in which two concurrent tasks write overlapping
    /// destinations.
    pub fn check_destinations(&self, root: &Path, paths: &PathRegistry) -> Result<()> {
        let nodes: Vec<TaskName> = self.graph.nodes().collect();
        for (i, &a) in nodes.iter().enumerate() {
            for &b in &nodes[i + 1..] {
                if !self.concurrent(a, b) {
                    continue;
                }
                for out_a in a.outputs(root, paths) {
                    for out_b in b.outputs(root, paths) {
                        if out_a.overlaps(&out_b) {
                            return Err(AssetdagError::ConfigError(format!(
                                "tasks '{a}' and '{b}' run concurrently but write overlapping destinations {} and {}",
                                out_a.path().display(),
                                out_b.path().display()
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Add `flow` to the graph; returns its entry and exit tasks.
fn add(graph: &mut DiGraphMap<TaskName, ()>, flow: &Flow) -> (Vec<TaskName>, Vec<TaskName>) {
    match flow {
        Flow::Task(name) => {
            graph.add_node(*name);
            (vec![*name], vec![*name])
        }
        Flow::Series(children) => {
            let mut entries: Option<Vec<TaskName>> = None;
            let mut exits: Vec<TaskName> = Vec::new();
            for child in children {
                let (child_entries, child_exits) = add(graph, child);
                if child_entries.is_empty() {
                    continue;
                }
                for &from in &exits {
                    for &to in &child_entries {
                        graph.add_edge(from, to, ());
                    }
                }
                entries.get_or_insert(child_entries);
                exits = child_exits;
            }
            (entries.unwrap_or_default(), exits)
        }
        Flow::Parallel(children) => {
            let mut entries = Vec::new();
            let mut exits = Vec::new();
            for child in children {
                let (e, x) = add(graph, child);
                entries.extend(e);
                exits.extend(x);
            }
            (entries, exits)
        }
    }
}
