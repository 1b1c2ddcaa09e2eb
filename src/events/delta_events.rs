//! Graph delta events
//!
//! A delta is one incremental change to the authoritative dataset, as opposed to
//! a full snapshot replace. Deltas arrive one at a time from the file watcher.

use crate::value_objects::{Edge, Node, NodeId};
use serde::{Deserialize, Serialize};

/// One incremental change to the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum DeltaEvent {
    /// A node was added (upserts when the id already exists)
    NodeAdded { node: Node },

    /// A node was removed
    #[serde(rename_all = "camelCase")]
    NodeRemoved { node_id: NodeId },

    /// A node's fields changed
    NodeUpdated { node: Node },

    /// A new edge was added between two nodes
    EdgeAdded { edge: Edge },

    /// An edge was removed from the graph
    EdgeRemoved { edge: Edge },
}

impl DeltaEvent {
    /// Node added event
    pub fn node_added(node: Node) -> Self {
        Self::NodeAdded { node }
    }

    /// Node removed event
    pub fn node_removed(node_id: impl Into<NodeId>) -> Self {
        Self::NodeRemoved {
            node_id: node_id.into(),
        }
    }

    /// Node updated event
    pub fn node_updated(node: Node) -> Self {
        Self::NodeUpdated { node }
    }

    /// Edge added event
    pub fn edge_added(from: impl Into<NodeId>, to: impl Into<NodeId>) -> Self {
        Self::EdgeAdded {
            edge: Edge::new(from, to),
        }
    }

    /// Edge removed event
    pub fn edge_removed(from: impl Into<NodeId>, to: impl Into<NodeId>) -> Self {
        Self::EdgeRemoved {
            edge: Edge::new(from, to),
        }
    }

    /// Short event name for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::NodeAdded { .. } => "NodeAdded",
            Self::NodeRemoved { .. } => "NodeRemoved",
            Self::NodeUpdated { .. } => "NodeUpdated",
            Self::EdgeAdded { .. } => "EdgeAdded",
            Self::EdgeRemoved { .. } => "EdgeRemoved",
        }
    }

    /// Check the event is structurally valid
    pub fn validate(&self) -> Result<(), DeltaError> {
        match self {
            Self::NodeAdded { node } | Self::NodeUpdated { node } => {
                if node.id.is_empty() {
                    return Err(DeltaError::EmptyNodeId);
                }
                if node.is_phantom() && !node.source_path.is_empty() {
                    return Err(DeltaError::PhantomWithSourcePath(node.id.clone()));
                }
                Ok(())
            }
            Self::NodeRemoved { node_id } => {
                if node_id.is_empty() {
                    return Err(DeltaError::EmptyNodeId);
                }
                Ok(())
            }
            Self::EdgeAdded { edge } | Self::EdgeRemoved { edge } => {
                if edge.from.is_empty() || edge.to.is_empty() {
                    return Err(DeltaError::EmptyEdgeEndpoint(edge.clone()));
                }
                Ok(())
            }
        }
    }
}

/// Errors for structurally invalid deltas
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DeltaError {
    #[error("Node id cannot be empty")]
    EmptyNodeId,

    #[error("Edge has an empty endpoint: {0}")]
    EmptyEdgeEndpoint(Edge),

    #[error("Phantom node {0} cannot carry a source path")]
    PhantomWithSourcePath(NodeId),
}

/// A group of changes produced by one file-system event.
///
/// Converting into events orders removals before additions so a phantom node
/// is removed before the real node with the same id is added.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeltaBatch {
    /// Nodes to add to the graph
    #[serde(default)]
    pub nodes_added: Vec<Node>,

    /// Node ids to remove from the graph
    #[serde(default)]
    pub nodes_removed: Vec<NodeId>,

    /// Nodes whose fields changed
    #[serde(default)]
    pub nodes_updated: Vec<Node>,

    /// Edges to add to the graph
    #[serde(default)]
    pub edges_added: Vec<Edge>,

    /// Edges to remove from the graph
    #[serde(default)]
    pub edges_removed: Vec<Edge>,
}

impl DeltaBatch {
    /// Checks if the batch contains any changes.
    pub fn is_empty(&self) -> bool {
        self.nodes_added.is_empty()
            && self.nodes_removed.is_empty()
            && self.nodes_updated.is_empty()
            && self.edges_added.is_empty()
            && self.edges_removed.is_empty()
    }

    /// Number of individual events in the batch
    pub fn len(&self) -> usize {
        self.nodes_added.len()
            + self.nodes_removed.len()
            + self.nodes_updated.len()
            + self.edges_added.len()
            + self.edges_removed.len()
    }

    /// Flatten into single events: node removals, edge removals, node
    /// additions, node updates, edge additions.
    pub fn into_events(self) -> Vec<DeltaEvent> {
        let mut events = Vec::with_capacity(self.len());
        events.extend(self.nodes_removed.into_iter().map(DeltaEvent::node_removed));
        events.extend(
            self.edges_removed
                .into_iter()
                .map(|edge| DeltaEvent::EdgeRemoved { edge }),
        );
        events.extend(self.nodes_added.into_iter().map(DeltaEvent::node_added));
        events.extend(self.nodes_updated.into_iter().map(DeltaEvent::node_updated));
        events.extend(
            self.edges_added
                .into_iter()
                .map(|edge| DeltaEvent::EdgeAdded { edge }),
        );
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_event_wire_format() {
        let event = DeltaEvent::node_removed("a");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "node-removed");
        assert_eq!(json["nodeId"], "a");

        let event = DeltaEvent::edge_added("a", "b");
        let json = serde_json::to_string(&event).unwrap();
        let back: DeltaEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_validate_rejects_malformed_events() {
        assert_eq!(
            DeltaEvent::node_added(Node::document("", "x.md")).validate(),
            Err(DeltaError::EmptyNodeId)
        );
        assert!(matches!(
            DeltaEvent::edge_added("a", "").validate(),
            Err(DeltaError::EmptyEdgeEndpoint(_))
        ));

        let mut phantom = Node::phantom("p");
        phantom.source_path = "/notes/p.md".to_string();
        assert_eq!(
            DeltaEvent::node_updated(phantom).validate(),
            Err(DeltaError::PhantomWithSourcePath(NodeId::from("p")))
        );

        assert!(DeltaEvent::node_added(Node::phantom("p")).validate().is_ok());
    }

    #[test]
    fn test_batch_orders_removals_first() {
        let batch = DeltaBatch {
            nodes_added: vec![Node::document("note", "/n/note.md")],
            nodes_removed: vec![NodeId::from("note")],
            edges_added: vec![Edge::new("note", "other")],
            edges_removed: vec![Edge::new("old", "note")],
            ..Default::default()
        };
        assert_eq!(batch.len(), 4);

        let kinds: Vec<_> = batch.into_events().iter().map(|e| e.event_type()).collect();
        assert_eq!(kinds, vec!["NodeRemoved", "EdgeRemoved", "NodeAdded", "EdgeAdded"]);
    }
}
