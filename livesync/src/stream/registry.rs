use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::types::ResourceEvent;

/// Callback invoked once per successfully decoded inbound event.
pub type Observer = Arc<dyn Fn(&ResourceEvent) + Send + Sync>;

#[derive(Default)]
struct Inner {
    observers: HashMap<Uuid, Observer>,
}

/// Set of callbacks notified on every inbound event.
///
/// Subscriptions are additive and delivery order is unspecified. Observers
/// are invoked synchronously but outside the registry lock, so an observer
/// may subscribe or unsubscribe (including itself) during delivery without
/// corrupting the set. Publishing never fails.
#[derive(Clone, Default)]
pub struct ObserverRegistry {
    inner: Arc<Mutex<Inner>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback and returns a handle that removes exactly that
    /// callback when dropped or explicitly unsubscribed.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&ResourceEvent) + Send + Sync + 'static,
    {
        let id = Uuid::new_v4();

        let mut inner = self.inner.lock().expect("observer registry lock poisoned");
        inner.observers.insert(id, Arc::new(observer));

        Subscription {
            id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Delivers the event to all currently registered observers.
    pub fn notify(&self, event: &ResourceEvent) {
        // Snapshot the observers so callbacks run without the lock held.
        let observers: Vec<Observer> = {
            let inner = self.inner.lock().expect("observer registry lock poisoned");
            inner.observers.values().cloned().collect()
        };

        for observer in observers {
            observer(event);
        }
    }

    /// Returns the number of registered observers.
    pub fn len(&self) -> usize {
        let inner = self.inner.lock().expect("observer registry lock poisoned");
        inner.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remove(inner: &Arc<Mutex<Inner>>, id: Uuid) {
        let mut inner = inner.lock().expect("observer registry lock poisoned");
        inner.observers.remove(&id);
    }
}

/// Removal handle for a registered observer.
///
/// The observer stays registered for the lifetime of this handle; dropping it
/// (or calling [`Subscription::unsubscribe`]) removes the observer. The
/// handle holds only a weak reference to the registry, so an outliving
/// subscription does not keep the registry alive.
#[must_use = "dropping the subscription unsubscribes the observer"]
pub struct Subscription {
    id: Uuid,
    inner: std::sync::Weak<Mutex<Inner>>,
}

impl Subscription {
    /// Removes the observer from the registry.
    pub fn unsubscribe(self) {
        // Removal happens in Drop.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            ObserverRegistry::remove(&inner, self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChangeAction, EventResource, ResourceKind};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn event() -> ResourceEvent {
        ResourceEvent {
            kind: ResourceKind::Backup,
            action: ChangeAction::Modified,
            resource: EventResource {
                name: "b1".to_owned(),
                phase: Some("Completed".to_owned()),
            },
            cluster_id: None,
        }
    }

    #[test]
    fn notifies_all_subscribers() {
        let registry = ObserverRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let first = counter.clone();
        let _sub_a = registry.subscribe(move |_| {
            first.fetch_add(1, Ordering::SeqCst);
        });
        let second = counter.clone();
        let _sub_b = registry.subscribe(move |_| {
            second.fetch_add(1, Ordering::SeqCst);
        });

        registry.notify(&event());

        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unsubscribe_removes_exactly_that_observer() {
        let registry = ObserverRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let kept = counter.clone();
        let _kept_sub = registry.subscribe(move |_| {
            kept.fetch_add(1, Ordering::SeqCst);
        });
        let removed = counter.clone();
        let removed_sub = registry.subscribe(move |_| {
            removed.fetch_add(10, Ordering::SeqCst);
        });

        removed_sub.unsubscribe();
        registry.notify(&event());

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let registry = ObserverRegistry::new();

        {
            let _sub = registry.subscribe(|_| {});
            assert_eq!(registry.len(), 1);
        }

        assert!(registry.is_empty());
    }

    #[test]
    fn unsubscribing_during_delivery_does_not_disrupt_others() {
        let registry = ObserverRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));

        // This observer drops another subscription while the event is being
        // delivered; the snapshot taken by `notify` keeps delivery intact.
        let dropped_sub: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let dropper = dropped_sub.clone();
        let first = counter.clone();
        let _sub_a = registry.subscribe(move |_| {
            first.fetch_add(1, Ordering::SeqCst);
            *dropper.lock().unwrap() = None;
        });

        let second = counter.clone();
        let sub_b = registry.subscribe(move |_| {
            second.fetch_add(1, Ordering::SeqCst);
        });
        *dropped_sub.lock().unwrap() = Some(sub_b);

        registry.notify(&event());

        // Both observers ran for this event; the second is gone afterwards.
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(registry.len(), 1);
    }
}
