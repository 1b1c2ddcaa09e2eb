//! In-memory collaborators

use super::{CameraInstruction, DocumentService, PositionSource, RenderSurface, SimulationCommand};
use crate::projections::RedrawBatch;
use crate::value_objects::{NodeId, Position2D};
use anyhow::anyhow;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::time::Instant;

/// One instruction received by a [`RecordingSurface`]
#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    Redraw(RedrawBatch),
    Camera(CameraInstruction),
    Simulation(SimulationCommand),
}

/// Render surface that records every instruction with the time it arrived
#[derive(Debug, Default)]
pub struct RecordingSurface {
    events: Mutex<Vec<(Instant, RenderEvent)>>,
}

impl RecordingSurface {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: RenderEvent) {
        self.events.lock().push((Instant::now(), event));
    }

    /// Every recorded instruction in arrival order
    pub fn events(&self) -> Vec<RenderEvent> {
        self.events.lock().iter().map(|(_, e)| e.clone()).collect()
    }

    /// Every recorded instruction with its arrival time
    pub fn timed_events(&self) -> Vec<(Instant, RenderEvent)> {
        self.events.lock().clone()
    }

    /// Recorded redraw batches
    pub fn redraws(&self) -> Vec<RedrawBatch> {
        self.events
            .lock()
            .iter()
            .filter_map(|(_, e)| match e {
                RenderEvent::Redraw(batch) => Some(batch.clone()),
                _ => None,
            })
            .collect()
    }

    /// Recorded camera instructions
    pub fn camera_instructions(&self) -> Vec<CameraInstruction> {
        self.events
            .lock()
            .iter()
            .filter_map(|(_, e)| match e {
                RenderEvent::Camera(instruction) => Some(instruction.clone()),
                _ => None,
            })
            .collect()
    }

    /// Recorded simulation commands with arrival times
    pub fn simulation_commands(&self) -> Vec<(Instant, SimulationCommand)> {
        self.events
            .lock()
            .iter()
            .filter_map(|(at, e)| match e {
                RenderEvent::Simulation(command) => Some((*at, *command)),
                _ => None,
            })
            .collect()
    }

    /// Forget everything recorded so far
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl RenderSurface for RecordingSurface {
    fn redraw(&self, batch: &RedrawBatch) {
        self.push(RenderEvent::Redraw(batch.clone()));
    }

    fn camera(&self, instruction: CameraInstruction) {
        self.push(RenderEvent::Camera(instruction));
    }

    fn simulation(&self, command: SimulationCommand) {
        self.push(RenderEvent::Simulation(command));
    }
}

/// Position source backed by a settable map
#[derive(Debug, Default)]
pub struct StaticPositions {
    positions: Mutex<HashMap<NodeId, Position2D>>,
}

impl StaticPositions {
    /// Create an empty position map
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from `(id, x, y)` triples
    pub fn from_points<I, S>(points: I) -> Self
    where
        I: IntoIterator<Item = (S, f64, f64)>,
        S: Into<NodeId>,
    {
        let source = Self::new();
        for (id, x, y) in points {
            source.set(id, Position2D::new(x, y));
        }
        source
    }

    /// Set one node's position
    pub fn set(&self, id: impl Into<NodeId>, position: Position2D) {
        self.positions.lock().insert(id.into(), position);
    }

    /// Forget one node's position
    pub fn remove(&self, id: &str) {
        self.positions.lock().remove(id);
    }
}

impl PositionSource for StaticPositions {
    fn positions(&self, ids: Option<&[NodeId]>) -> HashMap<NodeId, Position2D> {
        let positions = self.positions.lock();
        match ids {
            None => positions.clone(),
            Some(ids) => ids
                .iter()
                .filter_map(|id| positions.get(id).map(|p| (id.clone(), *p)))
                .collect(),
        }
    }
}

/// Document service backed by an in-memory content map
#[derive(Debug, Default)]
pub struct InMemoryDocuments {
    contents: Mutex<HashMap<NodeId, String>>,
    opened: Mutex<Vec<NodeId>>,
}

impl InMemoryDocuments {
    /// Create an empty document set
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a document's content
    pub fn insert(&self, id: impl Into<NodeId>, content: impl Into<String>) {
        self.contents.lock().insert(id.into(), content.into());
    }

    /// Ids passed to `open`, in call order
    pub fn opened(&self) -> Vec<NodeId> {
        self.opened.lock().clone()
    }
}

#[async_trait]
impl DocumentService for InMemoryDocuments {
    async fn open(&self, id: &NodeId) -> anyhow::Result<()> {
        if !self.contents.lock().contains_key(id) {
            return Err(anyhow!("File does not exist: {id}"));
        }
        self.opened.lock().push(id.clone());
        Ok(())
    }

    async fn read_content(&self, id: &NodeId) -> anyhow::Result<String> {
        self.contents
            .lock()
            .get(id)
            .cloned()
            .ok_or_else(|| anyhow!("File does not exist: {id}"))
    }
}
