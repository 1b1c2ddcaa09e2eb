//! Authoritative in-memory graph store
//!
//! The store is the sole source of truth for nodes and edges. It absorbs delta
//! events with idempotent upsert semantics and notifies subscribers
//! synchronously after every successful mutation. Renderers receive copies,
//! never references into the store.

use super::snapshot::GraphSnapshot;
use super::subscribers::{SubscriberRegistry, Subscription};
use crate::events::{DeltaBatch, DeltaError, DeltaEvent, StoreNotification};
use crate::value_objects::{Edge, Node, NodeId};
use indexmap::{IndexMap, IndexSet};
use std::collections::HashSet;

/// Result of applying one delta
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaOutcome {
    /// The store changed and subscribers were notified
    Applied,
    /// The delta was already satisfied; nothing changed
    Unchanged,
}

/// Incoming and outgoing neighbours of a node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Connected {
    pub incoming: HashSet<NodeId>,
    pub outgoing: HashSet<NodeId>,
}

impl Connected {
    /// Whether the node has no neighbours
    pub fn is_empty(&self) -> bool {
        self.incoming.is_empty() && self.outgoing.is_empty()
    }

    /// Union of incoming and outgoing
    pub fn all(&self) -> HashSet<NodeId> {
        self.incoming.union(&self.outgoing).cloned().collect()
    }
}

/// Authoritative node/edge collection
#[derive(Debug, Default)]
pub struct GraphStore {
    nodes: IndexMap<NodeId, Node>,
    edges: IndexSet<Edge>,
    phantoms: HashSet<NodeId>,
    subscribers: SubscriberRegistry,
}

impl GraphStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents wholesale and notify a reset
    pub fn initialize(&mut self, snapshot: GraphSnapshot) {
        self.nodes = snapshot.nodes;
        self.edges = snapshot.edges;
        self.phantoms = self
            .nodes
            .values()
            .filter(|node| node.is_phantom())
            .map(|node| node.id.clone())
            .collect();

        tracing::info!(
            "Graph store initialized with {} nodes and {} edges",
            self.nodes.len(),
            self.edges.len()
        );
        self.subscribers.notify(&StoreNotification::Reset);
    }

    /// Drop all contents and subscribers
    pub fn destroy(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.phantoms.clear();
        self.subscribers.clear();
        tracing::info!("Graph store destroyed");
    }

    /// Apply a single delta.
    ///
    /// Malformed events are logged and dropped without touching the store.
    /// Removals of missing nodes or edges and duplicate edge additions are
    /// no-ops and do not notify.
    pub fn apply_delta(&mut self, event: DeltaEvent) -> Result<DeltaOutcome, DeltaError> {
        if let Err(error) = event.validate() {
            tracing::warn!("Dropping malformed {} delta: {}", event.event_type(), error);
            return Err(error);
        }

        let changed = match &event {
            DeltaEvent::NodeAdded { node } | DeltaEvent::NodeUpdated { node } => {
                self.upsert_node(node.clone());
                true
            }
            DeltaEvent::NodeRemoved { node_id } => self.remove_node(node_id),
            DeltaEvent::EdgeAdded { edge } => self.edges.insert(edge.clone()),
            DeltaEvent::EdgeRemoved { edge } => self.edges.shift_remove(edge),
        };

        if !changed {
            tracing::debug!("{} delta already satisfied", event.event_type());
            return Ok(DeltaOutcome::Unchanged);
        }

        tracing::debug!("Applied {} delta", event.event_type());
        self.subscribers.notify(&StoreNotification::Delta(event));
        Ok(DeltaOutcome::Applied)
    }

    /// Apply every event of a batch, removals first.
    ///
    /// Returns the number of events that changed the store. Malformed events
    /// are dropped individually.
    pub fn apply_batch(&mut self, batch: DeltaBatch) -> usize {
        batch
            .into_events()
            .into_iter()
            .filter_map(|event| self.apply_delta(event).ok())
            .filter(|outcome| *outcome == DeltaOutcome::Applied)
            .count()
    }

    fn upsert_node(&mut self, node: Node) {
        if node.is_phantom() {
            self.phantoms.insert(node.id.clone());
        } else {
            self.phantoms.remove(&node.id);
        }
        self.nodes.insert(node.id.clone(), node);
    }

    // Incident edges stay; their removal arrives as separate deltas.
    fn remove_node(&mut self, id: &NodeId) -> bool {
        self.phantoms.remove(id);
        self.nodes.shift_remove(id).is_some()
    }

    /// Register a notification callback
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&StoreNotification) + Send + Sync + 'static,
    {
        self.subscribers.subscribe(callback)
    }

    /// Shared handle to the subscriber registry
    pub fn subscribers(&self) -> &SubscriberRegistry {
        &self.subscribers
    }

    /// Get a node by id
    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// All nodes in insertion order
    pub fn get_nodes(&self) -> Vec<&Node> {
        self.nodes.values().collect()
    }

    /// All node ids in insertion order
    pub fn get_node_ids(&self) -> Vec<NodeId> {
        self.nodes.keys().cloned().collect()
    }

    /// Iterate node ids in insertion order
    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    /// All edges in insertion order
    pub fn get_edges(&self) -> Vec<&Edge> {
        self.edges.iter().collect()
    }

    /// Whether a node with this id exists
    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Whether this exact edge exists
    pub fn contains_edge(&self, edge: &Edge) -> bool {
        self.edges.contains(edge)
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Whether the store holds no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Neighbours of `id`, found by scanning every edge.
    ///
    /// O(E) per call, fine at interactive scale. An adjacency index belongs
    /// here if edge counts grow large.
    pub fn get_connected(&self, id: &str) -> Connected {
        let mut connected = Connected::default();
        for edge in &self.edges {
            if edge.to.as_str() == id {
                connected.incoming.insert(edge.from.clone());
            }
            if edge.from.as_str() == id {
                connected.outgoing.insert(edge.to.clone());
            }
        }
        connected
    }

    /// Whether `id` is a known phantom
    pub fn is_phantom(&self, id: &str) -> bool {
        self.phantoms.contains(id)
    }

    /// Ids of all phantom nodes
    pub fn phantom_ids(&self) -> &HashSet<NodeId> {
        &self.phantoms
    }

    /// Search nodes by label (case-insensitive substring match).
    ///
    /// A query starting with `#` matches tags instead. An empty query matches
    /// nothing.
    pub fn search(&self, query: &str) -> Vec<NodeId> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        if let Some(tag) = query.strip_prefix('#') {
            let tag = tag.to_lowercase();
            return self
                .nodes
                .values()
                .filter(|node| node.tags.iter().any(|t| t.to_lowercase().contains(&tag)))
                .map(|node| node.id.clone())
                .collect();
        }

        let query = query.to_lowercase();
        self.nodes
            .values()
            .filter(|node| node.label.to_lowercase().contains(&query))
            .map(|node| node.id.clone())
            .collect()
    }

    /// Copy the current contents into a snapshot
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }
}
