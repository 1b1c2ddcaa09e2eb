//! Navigation queries
//!
//! Queries provide read-only traversal over the store and view state. They
//! never mutate either; the owning view applies the hop they return.

pub mod bearing;
pub mod navigator;

pub use bearing::{compass_bearing, order_by_bearing, step_index, CycleStep};
pub use navigator::{HopKind, NavigationHop, SpatialNavigator};
