//! Graph events
//!
//! Delta events flow from the file watcher into the store; store notifications
//! flow from the store to its subscribers.

mod delta_events;

pub use delta_events::{DeltaBatch, DeltaError, DeltaEvent};

/// Notification delivered synchronously to store subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum StoreNotification {
    /// The dataset was replaced wholesale
    Reset,
    /// A single delta was applied
    Delta(DeltaEvent),
}

impl StoreNotification {
    /// Whether this notification is an incremental change
    pub fn is_delta(&self) -> bool {
        matches!(self, StoreNotification::Delta(_))
    }
}
