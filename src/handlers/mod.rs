//! View command handlers
//!
//! The graph view processes user commands and dataset deltas, validates them
//! against the store, and emits redraw, camera and simulation instructions.

mod graph_view;

pub use graph_view::{GraphView, PreviewRequest};
