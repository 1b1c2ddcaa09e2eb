//! Spatial navigation
//!
//! Read-only over the store and view state. Positions come from the layout
//! engine through [`PositionSource`]; the navigator never moves the camera, it
//! only names the next focus and a suggested zoom factor.

use super::bearing::{order_by_bearing, step_index, CycleStep};
use crate::aggregate::GraphStore;
use crate::config::ViewConfig;
use crate::infrastructure::PositionSource;
use crate::projections::ViewState;
use crate::value_objects::{Direction, NodeId, Position2D};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How a hop was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HopKind {
    Directional,
    Connected,
    Search,
}

/// Next focus chosen by a navigation query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationHop {
    pub target: NodeId,
    pub zoom_factor: f64,
    pub kind: HopKind,
}

/// Directional and angular traversal queries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialNavigator {
    perpendicular_weight: f64,
    move_zoom: f64,
    relationship_zoom: f64,
}

impl Default for SpatialNavigator {
    fn default() -> Self {
        Self::new(&ViewConfig::default())
    }
}

impl SpatialNavigator {
    /// Create a navigator with the config's scoring weight and zoom factors
    pub fn new(config: &ViewConfig) -> Self {
        Self {
            perpendicular_weight: config.perpendicular_weight,
            move_zoom: config.move_zoom,
            relationship_zoom: config.relationship_zoom,
        }
    }

    fn hop(&self, target: NodeId, kind: HopKind) -> NavigationHop {
        let zoom_factor = match kind {
            HopKind::Directional => self.move_zoom,
            HopKind::Connected | HopKind::Search => self.relationship_zoom,
        };
        NavigationHop {
            target,
            zoom_factor,
            kind,
        }
    }

    /// Starting point for directional moves: the focused node, else the
    /// first active node when filtering, else the first node in the store.
    pub fn origin(&self, store: &GraphStore, view: &ViewState) -> Option<NodeId> {
        if let Some(focused) = &view.focused_id {
            if store.contains_node(focused.as_str()) {
                return Some(focused.clone());
            }
        }
        match view.effective_active() {
            Some(active) => store.node_ids().find(|id| active.contains(*id)).cloned(),
            None => store.node_ids().next().cloned(),
        }
    }

    /// Nearest node in `direction` from the origin.
    ///
    /// Score is distance plus the weighted perpendicular offset; the first
    /// candidate in store order wins a tie. Candidates without a position are
    /// skipped. The origin is returned only when it is the sole active node.
    pub fn nearest_in_direction(
        &self,
        store: &GraphStore,
        view: &ViewState,
        positions: &dyn PositionSource,
        direction: Direction,
    ) -> Option<NavigationHop> {
        let origin = self.origin(store, view)?;
        let effective = view.effective_active();
        let candidates: Vec<NodeId> = store
            .node_ids()
            .filter(|id| effective.as_ref().map_or(true, |set| set.contains(*id)))
            .cloned()
            .collect();

        if candidates.len() == 1 && candidates[0] == origin {
            return Some(self.hop(origin, HopKind::Directional));
        }

        let mut wanted = candidates.clone();
        wanted.push(origin.clone());
        let known = positions.positions(Some(wanted.as_slice()));
        let Some(from) = known.get(&origin).copied() else {
            debug!("No position for navigation origin {}", origin);
            return None;
        };

        let mut best: Option<(&NodeId, f64)> = None;
        for id in candidates.iter().filter(|id| **id != origin) {
            let Some(to) = known.get(id) else {
                continue;
            };
            let (dx, dy) = (to.x - from.x, to.y - from.y);
            if !direction.admits(dx, dy) {
                continue;
            }
            let score =
                from.distance_to(to) + self.perpendicular_weight * direction.perpendicular(dx, dy).abs();
            if best.map_or(true, |(_, current)| score < current) {
                best = Some((id, score));
            }
        }

        let (target, score) = best?;
        debug!("Move {} from {} to {} (score {:.2})", direction, origin, target, score);
        Some(self.hop(target.clone(), HopKind::Directional))
    }

    /// Neighbours of the selection ordered clockwise around it, with their
    /// bearings. Empty when nothing is selected.
    pub fn connected_ring(
        &self,
        store: &GraphStore,
        view: &ViewState,
        positions: &dyn PositionSource,
    ) -> Vec<(NodeId, f64)> {
        let Some(selected) = &view.selected_id else {
            return Vec::new();
        };
        let connected = view.connected_ids();
        let members: Vec<NodeId> = store
            .node_ids()
            .filter(|id| connected.contains(*id))
            .cloned()
            .collect();
        if members.is_empty() {
            return Vec::new();
        }

        let mut wanted = members.clone();
        wanted.push(selected.clone());
        let known = positions.positions(Some(wanted.as_slice()));
        let center = known.get(selected).copied();
        order_by_bearing(members, center, &known)
    }

    /// Step to the next or previous neighbour of the selection
    pub fn step_connected(
        &self,
        store: &GraphStore,
        view: &ViewState,
        positions: &dyn PositionSource,
        step: CycleStep,
    ) -> Option<NavigationHop> {
        let ring = self.connected_ring(store, view, positions);
        let target = Self::step_ring(&ring, view.focused_id.as_ref(), step)?;
        debug!("Connected {:?} to {}", step, target);
        Some(self.hop(target, HopKind::Connected))
    }

    /// Filter matches ordered clockwise around their centroid, with their
    /// bearings. Empty when no filter is in effect.
    pub fn search_ring(
        &self,
        store: &GraphStore,
        view: &ViewState,
        positions: &dyn PositionSource,
    ) -> Vec<(NodeId, f64)> {
        let Some(active) = view.effective_active() else {
            return Vec::new();
        };
        let members: Vec<NodeId> = store
            .node_ids()
            .filter(|id| active.contains(*id))
            .cloned()
            .collect();
        if members.is_empty() {
            return Vec::new();
        }

        let known = positions.positions(Some(members.as_slice()));
        let center = Position2D::centroid(members.iter().filter_map(|id| known.get(id)));
        order_by_bearing(members, center, &known)
    }

    /// Step to the next or previous filter match
    pub fn step_search(
        &self,
        store: &GraphStore,
        view: &ViewState,
        positions: &dyn PositionSource,
        step: CycleStep,
    ) -> Option<NavigationHop> {
        let ring = self.search_ring(store, view, positions);
        let target = Self::step_ring(&ring, view.focused_id.as_ref(), step)?;
        debug!("Search {:?} to {}", step, target);
        Some(self.hop(target, HopKind::Search))
    }

    fn step_ring(ring: &[(NodeId, f64)], current: Option<&NodeId>, step: CycleStep) -> Option<NodeId> {
        let index = current.and_then(|focused| ring.iter().position(|(id, _)| id == focused));
        let next = step_index(index, ring.len(), step)?;
        Some(ring[next].0.clone())
    }
}
