//! View projections
//!
//! The view state engine projects store contents plus selection, focus and
//! filter state into per-node appearances for the renderer.

pub mod classification;
pub mod view_state;

pub use classification::*;
pub use view_state::*;
