//! Graph view core for linked notes
//!
//! The authoritative node/edge store fed by a file watcher, the view-state
//! engine that classifies nodes for the renderer, keyboard spatial navigation,
//! and the debounced layout reheat. Rendering, layout, file scanning and the
//! editor are external collaborators reached through the traits in
//! [`infrastructure`].

pub mod aggregate;
pub mod commands;
pub mod config;
pub mod events;
pub mod handlers;
pub mod infrastructure;
pub mod projections;
pub mod queries;
pub mod systems;
pub mod value_objects;

// Re-export main types
pub use aggregate::*;
pub use events::*;

// Re-export commands and their types
pub use commands::{CommandOutcome, ViewCommand, ViewError, ViewResult};

// Re-export configuration
pub use config::{ConfigError, ViewConfig};

// Re-export the view
pub use handlers::{GraphView, PreviewRequest};

// Re-export collaborator boundaries
pub use infrastructure::{
    CameraInstruction, DocumentService, PositionSource, RenderSurface, SimulationCommand,
};

// Re-export projections
pub use projections::{
    Classification, NodeAppearance, NodeStyle, RecolorMode, RedrawBatch, ViewState,
    ViewStateEngine,
};

// Re-export navigation
pub use queries::{compass_bearing, CycleStep, HopKind, NavigationHop, SpatialNavigator};

// Re-export systems
pub use systems::{ReheatController, ReheatPhase};

// Re-export value objects
pub use value_objects::{Direction, Edge, Node, NodeId, NodeKind, Position2D};
