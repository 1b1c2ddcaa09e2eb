//! Graph aggregate: the authoritative store and its publish/subscribe contract

pub mod graph_store;
pub mod snapshot;
pub mod subscribers;

pub use graph_store::*;
pub use snapshot::*;
pub use subscribers::*;
