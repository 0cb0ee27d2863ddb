//! # Observers
//!
//! Synchronous change notification for the cart and session stores.
//!
//! ## Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  store.subscribe(listener) ──► Subscription                            │
//! │                                                                         │
//! │  store mutation ──► observers.notify(&event)                           │
//! │                         │                                               │
//! │                         ├──► listener #1 (&event)   subscription order │
//! │                         ├──► listener #2 (&event)                      │
//! │                         └──► ...                                       │
//! │                                                                         │
//! │  subscription.unsubscribe() ──► listener removed (idempotent)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Listeners run on the caller's thread before the mutating call returns.
//! `notify` iterates over a snapshot, so a listener may unsubscribe itself
//! (or another listener) while being notified.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, Weak};

type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Registry<E> {
    next_id: u64,
    listeners: Vec<(u64, Listener<E>)>,
}

/// Removes a listener by id. Lets `Subscription` stay non-generic.
trait Detach: Send + Sync {
    fn detach(&self, id: u64);
}

impl<E> Detach for Mutex<Registry<E>> {
    fn detach(&self, id: u64) {
        let mut registry = self.lock().unwrap_or_else(PoisonError::into_inner);
        registry.listeners.retain(|(lid, _)| *lid != id);
    }
}

// =============================================================================
// Observers
// =============================================================================

/// A registry of listeners for events of type `E`.
pub struct Observers<E> {
    registry: Arc<Mutex<Registry<E>>>,
}

impl<E: 'static> Observers<E> {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                listeners: Vec::new(),
            })),
        }
    }

    /// Registers a listener.
    ///
    /// The listener stays registered until [`Subscription::unsubscribe`] is
    /// called. Dropping the handle does NOT unsubscribe.
    ///
    /// ## Example
    /// ```rust
    /// use barkas_core::observe::Observers;
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    /// use std::sync::Arc;
    ///
    /// let observers = Observers::<u32>::new();
    /// let seen = Arc::new(AtomicUsize::new(0));
    ///
    /// let counter = seen.clone();
    /// let sub = observers.subscribe(move |_| {
    ///     counter.fetch_add(1, Ordering::SeqCst);
    /// });
    ///
    /// observers.notify(&1);
    /// sub.unsubscribe();
    /// observers.notify(&2);
    ///
    /// assert_eq!(seen.load(Ordering::SeqCst), 1);
    /// ```
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.push((id, Arc::new(listener)));

        let weak: Weak<Mutex<Registry<E>>> = Arc::downgrade(&self.registry);
        Subscription {
            id,
            registry: weak,
        }
    }

    /// Calls every registered listener with `event`, in subscription order.
    pub fn notify(&self, event: &E) {
        let snapshot: Vec<Listener<E>> = {
            let registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
            registry.listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
        };

        for listener in snapshot {
            listener(event);
        }
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E: 'static> Default for Observers<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Observers<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self
            .registry
            .lock()
            .map(|r| r.listeners.len())
            .unwrap_or_default();
        f.debug_struct("Observers").field("listeners", &count).finish()
    }
}

// =============================================================================
// Subscription
// =============================================================================

/// Handle returned by `subscribe`.
///
/// Holds only a weak reference, so it never keeps a store alive.
#[must_use = "dropping a Subscription leaves the listener registered; call unsubscribe() to remove it"]
pub struct Subscription {
    id: u64,
    registry: Weak<dyn Detach>,
}

impl Subscription {
    /// Removes the listener.
    ///
    /// No-op when already unsubscribed or when the store has been dropped.
    pub fn unsubscribe(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.detach(self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notifies_in_subscription_order() {
        let observers = Observers::<i32>::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let first = log.clone();
        let _a = observers.subscribe(move |e| first.lock().unwrap().push(("a", *e)));
        let second = log.clone();
        let _b = observers.subscribe(move |e| second.lock().unwrap().push(("b", *e)));

        observers.notify(&7);
        assert_eq!(*log.lock().unwrap(), vec![("a", 7), ("b", 7)]);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let observers = Observers::<()>::new();
        let sub = observers.subscribe(|_| {});
        assert_eq!(observers.len(), 1);

        sub.unsubscribe();
        sub.unsubscribe();
        assert!(observers.is_empty());
    }

    #[test]
    fn test_drop_keeps_listener() {
        let observers = Observers::<()>::new();
        drop(observers.subscribe(|_| {}));
        assert_eq!(observers.len(), 1);
    }

    #[test]
    fn test_unsubscribe_after_registry_dropped() {
        let observers = Observers::<()>::new();
        let sub = observers.subscribe(|_| {});
        drop(observers);
        sub.unsubscribe();
    }

    #[test]
    fn test_listener_can_unsubscribe_itself() {
        let observers = Observers::<u8>::new();
        let calls = Arc::new(Mutex::new(0));
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let counter = calls.clone();
        let own = slot.clone();
        let sub = observers.subscribe(move |_| {
            *counter.lock().unwrap() += 1;
            if let Some(sub) = own.lock().unwrap().take() {
                sub.unsubscribe();
            }
        });
        *slot.lock().unwrap() = Some(sub);

        observers.notify(&1);
        observers.notify(&2);

        assert_eq!(*calls.lock().unwrap(), 1);
        assert!(observers.is_empty());
    }
}
