//! Boundaries to the external collaborators
//!
//! The renderer draws nodes and owns the layout simulation, the position
//! source reports canvas coordinates, and the document service opens or reads
//! the files behind nodes. None of them is implemented by this crate; the
//! in-memory implementations record instructions for tests and headless use.

mod in_memory;

pub use in_memory::{InMemoryDocuments, RecordingSurface, RenderEvent, StaticPositions};

use crate::projections::RedrawBatch;
use crate::value_objects::{NodeId, Position2D};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Camera instruction for the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum CameraInstruction {
    /// Center on a node with a suggested zoom factor
    #[serde(rename_all = "camelCase")]
    Focus { focus: NodeId, zoom_factor: f64 },
    /// Fit every listed node into view
    #[serde(rename_all = "camelCase")]
    FitTo { fit_to: Vec<NodeId> },
    /// Keep the camera on a node while the layout settles
    Lock { focus: NodeId },
    /// Undo a previous lock
    Release,
}

/// Layout simulation control.
///
/// `Stop` halts an in-progress step and must precede `Disable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationCommand {
    Enable,
    Stop,
    Disable,
}

/// The rendering collaborator
pub trait RenderSurface: Send + Sync {
    /// Restyle the nodes in the batch
    fn redraw(&self, batch: &RedrawBatch);

    /// Move the camera
    fn camera(&self, instruction: CameraInstruction);

    /// Toggle or halt the layout simulation
    fn simulation(&self, command: SimulationCommand);
}

/// Canvas positions computed by the layout engine
pub trait PositionSource: Send + Sync {
    /// Positions of the given ids, or of every node when `ids` is `None`.
    /// Ids without a known position are absent from the map.
    fn positions(&self, ids: Option<&[NodeId]>) -> HashMap<NodeId, Position2D>;
}

/// Editor launch and content read
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// Open the node's document in an external editor
    async fn open(&self, id: &NodeId) -> anyhow::Result<()>;

    /// Read the node's document content
    async fn read_content(&self, id: &NodeId) -> anyhow::Result<String>;
}
