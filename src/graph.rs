//! Processing order of release records
//!
//! A record depends on every watched directory outside itself: tagging the
//! dependency commits into it, which would count as a change for the
//! dependent. Processing dependencies first means every bump happens exactly
//! once per run.

use crate::error::{ReleaseTagError, Result};
use crate::record::ReleaseRecord;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Directed graph of component directories
///
/// Edges point from a component to the directories it watches. Watched
/// directories without a record of their own are nodes too, but never show
/// up in the processing order.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    graph: DiGraph<PathBuf, ()>,
    node_map: HashMap<PathBuf, NodeIndex>,
    components: HashSet<NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph of `records`, keyed on their canonical directories
    pub fn from_records(records: &[ReleaseRecord]) -> Self {
        let mut graph = Self::new();
        for record in records {
            graph.add_component(record.absolute_directory(), record.watched_paths());
        }
        graph
    }

    fn node(&mut self, path: &Path) -> NodeIndex {
        if let Some(idx) = self.node_map.get(path) {
            return *idx;
        }
        let idx = self.graph.add_node(path.to_path_buf());
        self.node_map.insert(path.to_path_buf(), idx);
        idx
    }

    /// Add a component directory depending on `watched`; self references are ignored
    pub fn add_component(&mut self, directory: &Path, watched: &[PathBuf]) {
        let idx = self.node(directory);
        self.components.insert(idx);

        for dependency in watched {
            if dependency == directory {
                continue;
            }
            let dep = self.node(dependency);
            if self.graph.find_edge(idx, dep).is_none() {
                self.graph.add_edge(idx, dep, ());
            }
        }
    }

    /// Dependencies of `idx` in the order they were added
    fn dependencies(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut deps: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .collect();
        // petgraph walks edges newest first
        deps.reverse();
        deps
    }

    /// Get dependencies of a specific directory
    pub fn dependencies_of(&self, directory: &Path) -> Option<Vec<PathBuf>> {
        let idx = self.node_map.get(directory)?;
        Some(
            self.dependencies(*idx)
                .into_iter()
                .map(|dep| self.graph[dep].clone())
                .collect(),
        )
    }

    /// Number of directories in the graph, watched-only ones included
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Component directories, dependencies before dependents.
    ///
    /// Depth-first from each component, deepest directories first and ties
    /// broken by path. Meeting a directory that is still being visited is a
    /// cycle.
    pub fn processing_order(&self) -> Result<Vec<PathBuf>> {
        let mut starts: Vec<NodeIndex> = self.components.iter().copied().collect();
        starts.sort_by(|a, b| {
            let (pa, pb) = (&self.graph[*a], &self.graph[*b]);
            pb.components()
                .count()
                .cmp(&pa.components().count())
                .then_with(|| pa.cmp(pb))
        });

        let mut marks: HashMap<NodeIndex, Mark> = HashMap::new();
        let mut order = Vec::new();

        for start in starts {
            if marks.contains_key(&start) {
                continue;
            }

            marks.insert(start, Mark::Visiting);
            let mut stack: Vec<(NodeIndex, Vec<NodeIndex>, usize)> =
                vec![(start, self.dependencies(start), 0)];

            while let Some((node, deps, next)) = stack.last_mut() {
                let node = *node;
                let Some(&dep) = deps.get(*next) else {
                    stack.pop();
                    marks.insert(node, Mark::Done);
                    if self.components.contains(&node) {
                        order.push(self.graph[node].clone());
                    }
                    continue;
                };
                *next += 1;

                match marks.get(&dep).copied() {
                    Some(Mark::Done) => {}
                    Some(Mark::Visiting) => {
                        return Err(ReleaseTagError::CycleDetected {
                            from: self.graph[node].clone(),
                            to: self.graph[dep].clone(),
                        });
                    }
                    None => {
                        marks.insert(dep, Mark::Visiting);
                        stack.push((dep, self.dependencies(dep), 0));
                    }
                }
            }
        }

        Ok(order)
    }
}

/// Order records so that every record follows the records it watches.
/// Records for the same directory are kept once.
pub fn order_records(records: Vec<ReleaseRecord>) -> Result<Vec<ReleaseRecord>> {
    let mut unique: Vec<ReleaseRecord> = Vec::with_capacity(records.len());
    for record in records {
        if !unique.contains(&record) {
            unique.push(record);
        }
    }

    let graph = DependencyGraph::from_records(&unique);
    if graph.is_empty() {
        return Ok(Vec::new());
    }
    let order = graph.processing_order()?;
    debug!(records = unique.len(), directories = graph.len(), "processing order");
    for path in &order {
        if let Some(deps) = graph.dependencies_of(path).filter(|deps| !deps.is_empty()) {
            debug!(directory = %path.display(), ?deps, "watches");
        }
    }

    let mut by_path: HashMap<PathBuf, ReleaseRecord> = unique
        .into_iter()
        .map(|r| (r.absolute_directory().to_path_buf(), r))
        .collect();

    Ok(order
        .into_iter()
        .filter_map(|path| by_path.remove(&path))
        .collect())
}
