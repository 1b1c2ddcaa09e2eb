//! Full dataset snapshot handed over by the initial scan

use crate::value_objects::{Edge, Node, NodeId};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// Complete graph: nodes keyed by id, edges keyed by `(from, to)`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: IndexMap<NodeId, Node>,
    pub edges: IndexSet<Edge>,
}

impl GraphSnapshot {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from raw lists.
    ///
    /// Duplicate node ids keep the last node; duplicate edges collapse.
    pub fn from_parts<N, E>(nodes: N, edges: E) -> Self
    where
        N: IntoIterator<Item = Node>,
        E: IntoIterator<Item = Edge>,
    {
        let mut snapshot = Self::new();
        for node in nodes {
            snapshot.nodes.insert(node.id.clone(), node);
        }
        snapshot.edges.extend(edges);
        snapshot
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}
