//! Background systems
//!
//! Systems react to store notifications outside the request path. The only
//! one today is the layout reheat debounce.

pub mod reheat;

pub use reheat::{ReheatController, ReheatPhase};
