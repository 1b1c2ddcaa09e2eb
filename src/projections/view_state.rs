//! View state engine
//!
//! Owns selection, focus and filter state, derives per-node appearance and
//! produces full or incremental redraw batches. Store notifications arrive
//! through a channel filled by the engine's subscription and are drained
//! before every recolor, so pointers at removed nodes are cleared first.

use super::classification::{NodeAppearance, NodeFacts, NodeStyle, RecolorMode, RedrawBatch};
use crate::aggregate::{GraphStore, Subscription};
use crate::commands::ViewError;
use crate::events::{DeltaEvent, StoreNotification};
use crate::value_objects::NodeId;
use crossbeam::channel::{unbounded, Receiver};
use indexmap::IndexMap;
use std::collections::HashSet;
use tokio::sync::watch;

/// Selection, focus and filter state of one view.
///
/// `incoming_ids` and `outgoing_ids` are always derived from `selected_id`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub selected_id: Option<NodeId>,
    pub focused_id: Option<NodeId>,
    pub incoming_ids: HashSet<NodeId>,
    pub outgoing_ids: HashSet<NodeId>,
    /// `None` means no filter
    pub active_ids: Option<HashSet<NodeId>>,
    pub phantom_ids: HashSet<NodeId>,
}

impl ViewState {
    /// The filter-derived visibility set, extended with the selection's
    /// neighbourhood. `None` when no filter is in effect.
    pub fn effective_active(&self) -> Option<HashSet<NodeId>> {
        let active = self.active_ids.as_ref()?;
        let mut effective = active.clone();
        if let Some(selected) = &self.selected_id {
            effective.insert(selected.clone());
            effective.extend(self.incoming_ids.iter().cloned());
            effective.extend(self.outgoing_ids.iter().cloned());
        }
        Some(effective)
    }

    /// Union of the selection's incoming and outgoing neighbours
    pub fn connected_ids(&self) -> HashSet<NodeId> {
        self.incoming_ids.union(&self.outgoing_ids).cloned().collect()
    }

    fn clear_selection(&mut self) {
        self.selected_id = None;
        self.incoming_ids.clear();
        self.outgoing_ids.clear();
    }
}

/// Derives node appearance from view state and emits redraw batches
pub struct ViewStateEngine {
    state: ViewState,
    observed: IndexMap<NodeId, NodeAppearance>,
    needs_full_recolor: bool,
    inbox: Receiver<StoreNotification>,
    focus_tx: watch::Sender<Option<NodeId>>,
    subscription: Option<Subscription>,
}

impl ViewStateEngine {
    /// Create an engine subscribed to `store`
    pub fn new(store: &GraphStore) -> Self {
        let (tx, inbox) = unbounded();
        let subscription = store.subscribe(move |notification| {
            // The receiver only disappears once the engine is dropped
            let _ = tx.send(notification.clone());
        });
        let (focus_tx, _) = watch::channel(None);

        let mut engine = Self {
            state: ViewState::default(),
            observed: IndexMap::new(),
            needs_full_recolor: true,
            inbox,
            focus_tx,
            subscription: Some(subscription),
        };
        engine.state.phantom_ids = store.phantom_ids().clone();
        engine
    }

    /// Current view state
    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Selected node, if any
    pub fn selected(&self) -> Option<&NodeId> {
        self.state.selected_id.as_ref()
    }

    /// Focused node, if any
    pub fn focused(&self) -> Option<&NodeId> {
        self.state.focused_id.as_ref()
    }

    /// Whether a filter is in effect
    pub fn is_filtering(&self) -> bool {
        self.state.active_ids.is_some()
    }

    /// See [`ViewState::effective_active`]
    pub fn effective_active(&self) -> Option<HashSet<NodeId>> {
        self.state.effective_active()
    }

    /// Receiver that observes every focus change
    pub fn focus_watch(&self) -> watch::Receiver<Option<NodeId>> {
        self.focus_tx.subscribe()
    }

    /// Whether the next recolor will be a full one
    pub fn needs_full_recolor(&self) -> bool {
        self.needs_full_recolor
    }

    /// Select a node (or deselect with `None`) and recolor
    pub fn select(
        &mut self,
        store: &GraphStore,
        id: Option<NodeId>,
    ) -> Result<RedrawBatch, ViewError> {
        self.sync(store);
        match id {
            Some(id) => {
                if !store.contains_node(id.as_str()) {
                    return Err(ViewError::UnknownNode(id));
                }
                let connected = store.get_connected(id.as_str());
                tracing::debug!(
                    "Selected {} ({} incoming, {} outgoing)",
                    id,
                    connected.incoming.len(),
                    connected.outgoing.len()
                );
                self.state.selected_id = Some(id);
                self.state.incoming_ids = connected.incoming;
                self.state.outgoing_ids = connected.outgoing;
            }
            None => self.state.clear_selection(),
        }
        Ok(self.recolor(store))
    }

    /// Focus a node (or clear focus with `None`) and recolor.
    ///
    /// Focus is independent of selection and leaves connectivity untouched.
    pub fn focus(
        &mut self,
        store: &GraphStore,
        id: Option<NodeId>,
    ) -> Result<RedrawBatch, ViewError> {
        self.sync(store);
        if let Some(id) = &id {
            if !store.contains_node(id.as_str()) {
                return Err(ViewError::UnknownNode(id.clone()));
            }
        }
        self.set_focus(id);
        Ok(self.recolor(store))
    }

    /// Replace the filter (`None` clears it) and recolor
    pub fn set_active(
        &mut self,
        store: &GraphStore,
        ids: Option<HashSet<NodeId>>,
    ) -> RedrawBatch {
        self.sync(store);
        tracing::debug!(
            "Active filter set to {:?} nodes",
            ids.as_ref().map(HashSet::len)
        );
        self.state.active_ids = ids;
        self.recolor(store)
    }

    /// Clear selection, focus and connectivity; the next read recolors fully
    pub fn reset(&mut self) {
        self.state.clear_selection();
        self.set_focus(None);
        self.needs_full_recolor = true;
    }

    /// Absorb pending store notifications and recolor
    pub fn refresh(&mut self, store: &GraphStore) -> RedrawBatch {
        self.sync(store);
        self.recolor(store)
    }

    /// Force a full recolor of every node in the store
    pub fn full_recolor(&mut self, store: &GraphStore) -> RedrawBatch {
        self.sync(store);
        self.recolor_all(store)
    }

    /// Mark the next recolor as a full one (bulk dataset change)
    pub fn invalidate(&mut self) {
        self.needs_full_recolor = true;
    }

    /// Compute the current appearance of one node
    pub fn appearance(&self, id: &NodeId) -> NodeAppearance {
        let effective = self.state.effective_active();
        self.appearance_with(id, effective.as_ref())
    }

    /// Stop listening to the store
    pub fn detach(&mut self) {
        self.subscription.take();
    }

    /// Drain queued store notifications and repair state that points at
    /// nodes which are gone. Returns whether anything was drained.
    pub fn sync(&mut self, store: &GraphStore) -> bool {
        let mut drained = false;
        let mut reset = false;

        while let Ok(notification) = self.inbox.try_recv() {
            drained = true;
            match notification {
                StoreNotification::Reset => reset = true,
                StoreNotification::Delta(DeltaEvent::NodeRemoved { node_id }) => {
                    self.forget(&node_id)
                }
                StoreNotification::Delta(_) => {}
            }
        }

        if !drained {
            return false;
        }

        if reset {
            self.needs_full_recolor = true;
            let stale: Vec<NodeId> = [&self.state.selected_id, &self.state.focused_id]
                .into_iter()
                .flatten()
                .filter(|id| !store.contains_node(id.as_str()))
                .cloned()
                .collect();
            for id in stale {
                self.forget(&id);
            }
            if let Some(active) = &mut self.state.active_ids {
                active.retain(|id| store.contains_node(id.as_str()));
            }
        }

        self.state.phantom_ids = store.phantom_ids().clone();
        if let Some(selected) = &self.state.selected_id {
            let connected = store.get_connected(selected.as_str());
            self.state.incoming_ids = connected.incoming;
            self.state.outgoing_ids = connected.outgoing;
        }
        true
    }

    fn forget(&mut self, id: &NodeId) {
        if self.state.focused_id.as_ref() == Some(id) {
            tracing::debug!("Focused node {} removed, clearing focus", id);
            self.set_focus(None);
        }
        if self.state.selected_id.as_ref() == Some(id) {
            tracing::debug!("Selected node {} removed, clearing selection", id);
            self.state.clear_selection();
        }
        if let Some(active) = &mut self.state.active_ids {
            active.remove(id);
        }
    }

    fn set_focus(&mut self, id: Option<NodeId>) {
        if self.state.focused_id != id {
            self.state.focused_id = id.clone();
            self.focus_tx.send_replace(id);
        }
    }

    fn recolor(&mut self, store: &GraphStore) -> RedrawBatch {
        if self.needs_full_recolor {
            self.recolor_all(store)
        } else {
            self.recolor_changed(store)
        }
    }

    fn recolor_all(&mut self, store: &GraphStore) -> RedrawBatch {
        let effective = self.state.effective_active();
        self.observed.clear();

        let mut entries = Vec::with_capacity(store.node_count());
        for id in store.node_ids() {
            let appearance = self.appearance_with(id, effective.as_ref());
            self.observed.insert(id.clone(), appearance);
            entries.push(NodeStyle {
                id: id.clone(),
                appearance,
            });
        }
        self.needs_full_recolor = false;

        tracing::debug!("Full recolor of {} nodes", entries.len());
        RedrawBatch {
            mode: RecolorMode::Full,
            entries,
        }
    }

    // Diffs against the last known appearance; ids not seen before are always
    // emitted and ids no longer in the store are forgotten.
    fn recolor_changed(&mut self, store: &GraphStore) -> RedrawBatch {
        let effective = self.state.effective_active();
        let mut observed = IndexMap::with_capacity(store.node_count());
        let mut entries = Vec::new();

        for id in store.node_ids() {
            let appearance = self.appearance_with(id, effective.as_ref());
            if self.observed.get(id) != Some(&appearance) {
                entries.push(NodeStyle {
                    id: id.clone(),
                    appearance,
                });
            }
            observed.insert(id.clone(), appearance);
        }
        self.observed = observed;

        tracing::debug!("Incremental recolor changed {} nodes", entries.len());
        RedrawBatch {
            mode: RecolorMode::Incremental,
            entries,
        }
    }

    fn appearance_with(&self, id: &NodeId, effective: Option<&HashSet<NodeId>>) -> NodeAppearance {
        let state = &self.state;
        NodeAppearance::from_facts(NodeFacts {
            selected: state.selected_id.as_ref() == Some(id),
            outgoing: state.outgoing_ids.contains(id),
            incoming: state.incoming_ids.contains(id),
            phantom: state.phantom_ids.contains(id),
            active: effective.map_or(true, |set| set.contains(id)),
            focused: state.focused_id.as_ref() == Some(id),
        })
    }
}

impl std::fmt::Debug for ViewStateEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewStateEngine")
            .field("state", &self.state)
            .field("observed", &self.observed.len())
            .field("needs_full_recolor", &self.needs_full_recolor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::GraphSnapshot;
    use crate::projections::Classification;
    use crate::value_objects::{Edge, Node};

    fn setup(nodes: &[&str], edges: &[(&str, &str)]) -> (GraphStore, ViewStateEngine) {
        let mut store = GraphStore::new();
        let mut engine = ViewStateEngine::new(&store);
        store.initialize(GraphSnapshot::from_parts(
            nodes.iter().map(|id| Node::document(*id, format!("/n/{id}.md"))),
            edges.iter().map(|(from, to)| Edge::new(*from, *to)),
        ));
        let batch = engine.refresh(&store);
        assert_eq!(batch.mode, RecolorMode::Full);
        (store, engine)
    }

    fn ids(list: &[&str]) -> HashSet<NodeId> {
        list.iter().map(|id| NodeId::from(*id)).collect()
    }

    #[test]
    fn test_select_isolated_node_emits_single_entry() {
        let (store, mut engine) = setup(&["a", "b"], &[]);
        let batch = engine.select(&store, Some(NodeId::from("a"))).unwrap();

        assert_eq!(batch.mode, RecolorMode::Incremental);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.entries[0].id, NodeId::from("a"));
        assert_eq!(batch.entries[0].appearance.classification, Classification::Selected);
    }

    #[test]
    fn test_select_derives_connectivity() {
        let (store, mut engine) = setup(&["a", "b", "c", "d"], &[("a", "b"), ("c", "a")]);
        let batch = engine.select(&store, Some(NodeId::from("a"))).unwrap();

        assert_eq!(engine.state().outgoing_ids, ids(&["b"]));
        assert_eq!(engine.state().incoming_ids, ids(&["c"]));
        assert_eq!(batch.get("b").unwrap().classification, Classification::Outgoing);
        assert_eq!(batch.get("c").unwrap().classification, Classification::Incoming);
        assert!(batch.get("d").is_none());

        let batch = engine.select(&store, None).unwrap();
        assert!(engine.state().incoming_ids.is_empty());
        assert!(engine.state().outgoing_ids.is_empty());
        assert_eq!(batch.len(), 3);
    }

    #[test]
    fn test_outgoing_wins_over_incoming() {
        let (store, mut engine) = setup(&["a", "b"], &[("a", "b"), ("b", "a")]);
        let batch = engine.select(&store, Some(NodeId::from("a"))).unwrap();
        assert_eq!(batch.get("b").unwrap().classification, Classification::Outgoing);
    }

    #[test]
    fn test_select_unknown_node_fails_without_change() {
        let (store, mut engine) = setup(&["a"], &[]);
        let result = engine.select(&store, Some(NodeId::from("zzz")));
        assert!(matches!(result, Err(ViewError::UnknownNode(_))));
        assert!(engine.selected().is_none());
    }

    #[test]
    fn test_filter_keeps_selection_neighbourhood_active() {
        let (store, mut engine) = setup(&["x", "y", "z", "w"], &[("z", "y")]);
        engine.set_active(&store, Some(ids(&["x", "y"])));
        engine.select(&store, Some(NodeId::from("z"))).unwrap();

        assert_eq!(engine.effective_active(), Some(ids(&["x", "y", "z"])));
        let z = engine.appearance(&NodeId::from("z"));
        let y = engine.appearance(&NodeId::from("y"));
        let w = engine.appearance(&NodeId::from("w"));
        assert_eq!(z.classification, Classification::Selected);
        assert!(!z.inactive);
        assert_eq!(y.classification, Classification::Outgoing);
        assert!(!y.inactive);
        assert!(w.inactive);
    }

    #[test]
    fn test_focus_is_independent_of_selection() {
        let (store, mut engine) = setup(&["a", "b"], &[("a", "b")]);
        engine.select(&store, Some(NodeId::from("a"))).unwrap();

        let batch = engine.focus(&store, Some(NodeId::from("b"))).unwrap();
        assert_eq!(batch.len(), 1);
        assert!(batch.get("b").unwrap().focused);
        assert_eq!(engine.selected(), Some(&NodeId::from("a")));
        assert_eq!(engine.state().outgoing_ids, ids(&["b"]));
    }

    #[test]
    fn test_removal_clears_pointers_and_prunes_filter() {
        let (mut store, mut engine) = setup(&["a", "b", "c"], &[("a", "b")]);
        engine.set_active(&store, Some(ids(&["a", "c"])));
        engine.select(&store, Some(NodeId::from("a"))).unwrap();
        engine.focus(&store, Some(NodeId::from("a"))).unwrap();

        store.apply_delta(DeltaEvent::node_removed("a")).unwrap();
        engine.refresh(&store);

        assert!(engine.selected().is_none());
        assert!(engine.focused().is_none());
        assert!(engine.state().outgoing_ids.is_empty());
        assert_eq!(engine.state().active_ids, Some(ids(&["c"])));
    }

    #[test]
    fn test_edge_delta_rederives_connectivity() {
        let (mut store, mut engine) = setup(&["a", "b", "c"], &[]);
        engine.select(&store, Some(NodeId::from("a"))).unwrap();

        store.apply_delta(DeltaEvent::edge_added("a", "c")).unwrap();
        let batch = engine.refresh(&store);

        assert_eq!(engine.state().outgoing_ids, ids(&["c"]));
        assert_eq!(batch.mode, RecolorMode::Incremental);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.get("c").unwrap().classification, Classification::Outgoing);
    }

    #[test]
    fn test_new_node_is_emitted_incrementally() {
        let (mut store, mut engine) = setup(&["a"], &[]);
        store.apply_delta(DeltaEvent::node_added(Node::phantom("p"))).unwrap();

        let batch = engine.refresh(&store);
        assert_eq!(batch.mode, RecolorMode::Incremental);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.get("p").unwrap().classification, Classification::Phantom);
    }

    #[test]
    fn test_reset_forces_full_recolor() {
        let (store, mut engine) = setup(&["a", "b"], &[]);
        engine.select(&store, Some(NodeId::from("a"))).unwrap();
        engine.reset();

        assert!(engine.selected().is_none());
        let batch = engine.refresh(&store);
        assert_eq!(batch.mode, RecolorMode::Full);
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn test_incremental_matches_full() {
        let (store, mut engine) = setup(&["a", "b", "c", "d"], &[("a", "b"), ("c", "a")]);
        engine.set_active(&store, Some(ids(&["d"])));
        engine.select(&store, Some(NodeId::from("a"))).unwrap();
        engine.focus(&store, Some(NodeId::from("c"))).unwrap();

        let expected: Vec<_> = store
            .node_ids()
            .map(|id| (id.clone(), engine.appearance(id)))
            .collect();
        let full = engine.full_recolor(&store);
        let actual: Vec<_> = full.entries.into_iter().map(|e| (e.id, e.appearance)).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_focus_watch_observes_changes() {
        let (store, mut engine) = setup(&["a"], &[]);
        let watch = engine.focus_watch();
        engine.focus(&store, Some(NodeId::from("a"))).unwrap();
        assert_eq!(*watch.borrow(), Some(NodeId::from("a")));
    }

    #[test]
    fn test_reset_notification_drops_stale_pointers() {
        let (mut store, mut engine) = setup(&["a", "b"], &[]);
        engine.select(&store, Some(NodeId::from("a"))).unwrap();
        engine.focus(&store, Some(NodeId::from("b"))).unwrap();

        store.initialize(GraphSnapshot::from_parts(vec![Node::document("b", "/b.md")], vec![]));
        let batch = engine.refresh(&store);

        assert_eq!(batch.mode, RecolorMode::Full);
        assert!(engine.selected().is_none());
        assert_eq!(engine.focused(), Some(&NodeId::from("b")));
    }
}
