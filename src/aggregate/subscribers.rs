//! Publish/subscribe registry for store notifications

use crate::events::StoreNotification;
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};
use uuid::Uuid;

/// Callback invoked for every store notification
pub type NotificationCallback = Arc<dyn Fn(&StoreNotification) + Send + Sync>;

/// Identifier of one subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

type Callbacks = Mutex<IndexMap<SubscriptionId, NotificationCallback>>;

/// Registry of store subscribers.
///
/// Cloning shares the same registry, so a callback may hold a clone and
/// subscribe or unsubscribe while a notification pass is running.
#[derive(Clone, Default)]
pub struct SubscriberRegistry {
    callbacks: Arc<Callbacks>,
}

impl SubscriberRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback. Dropping the returned handle unsubscribes it.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&StoreNotification) + Send + Sync + 'static,
    {
        let id = SubscriptionId::new();
        self.callbacks.lock().insert(id, Arc::new(callback));
        tracing::debug!("Subscriber {} registered", id);
        Subscription {
            id,
            callbacks: Arc::downgrade(&self.callbacks),
        }
    }

    /// Deliver a notification to every subscriber registered when the pass
    /// starts. The lock is released before any callback runs.
    pub fn notify(&self, notification: &StoreNotification) {
        let snapshot: Vec<NotificationCallback> =
            self.callbacks.lock().values().cloned().collect();
        for callback in snapshot {
            callback(notification);
        }
    }

    /// Number of live subscriptions
    pub fn len(&self) -> usize {
        self.callbacks.lock().len()
    }

    /// Whether there are no subscriptions
    pub fn is_empty(&self) -> bool {
        self.callbacks.lock().is_empty()
    }

    /// Remove every subscription
    pub fn clear(&self) {
        self.callbacks.lock().clear();
    }
}

impl fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberRegistry")
            .field("subscribers", &self.len())
            .finish()
    }
}

/// Handle returned by [`SubscriberRegistry::subscribe`]
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    callbacks: Weak<Callbacks>,
}

impl Subscription {
    /// The subscription id
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Stop receiving notifications
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(callbacks) = self.callbacks.upgrade() {
            if callbacks.lock().shift_remove(&self.id).is_some() {
                tracing::debug!("Subscriber {} removed", self.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let registry = SubscriberRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));

        let counter = count.clone();
        let subscription = registry.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        registry.notify(&StoreNotification::Reset);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        subscription.unsubscribe();
        registry.notify(&StoreNotification::Reset);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_callback_can_unsubscribe_another_during_notify() {
        let registry = SubscriberRegistry::new();
        let second_calls = Arc::new(AtomicUsize::new(0));
        let victim: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let slot = victim.clone();
        let _first = registry.subscribe(move |_| {
            slot.lock().take();
        });

        let counter = second_calls.clone();
        *victim.lock() = Some(registry.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        // The pass snapshot still includes the second callback
        registry.notify(&StoreNotification::Reset);
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);

        registry.notify(&StoreNotification::Reset);
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_callback_can_subscribe_during_notify() {
        let registry = SubscriberRegistry::new();
        let added: Arc<Mutex<Vec<Subscription>>> = Arc::new(Mutex::new(Vec::new()));

        let inner_registry = registry.clone();
        let sink = added.clone();
        let _subscription = registry.subscribe(move |_| {
            sink.lock().push(inner_registry.subscribe(|_| {}));
        });

        registry.notify(&StoreNotification::Reset);
        assert_eq!(registry.len(), 2);
    }
}
