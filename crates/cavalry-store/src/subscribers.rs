//! # Subscriber Registry
//!
//! Per-store list of change callbacks.
//!
//! ## Notification Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  notify(cart)                                                           │
//! │    1. lock, clone the callback list, unlock                             │
//! │    2. call each callback in registration order                          │
//! │    3. a panicking callback is logged; the rest still run                │
//! │                                                                         │
//! │  Callbacks run outside the lock, so a callback may read or mutate the  │
//! │  store, subscribe, or drop its own Subscription.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tracing::warn;

use cavalry_core::Cart;

type Callback = Arc<dyn Fn(&Cart) + Send + Sync>;

#[derive(Default)]
pub(crate) struct SubscriberRegistry {
    next_id: AtomicU64,
    callbacks: Mutex<Vec<(u64, Callback)>>,
}

impl SubscriberRegistry {
    pub(crate) fn register(&self, callback: Callback) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().push((id, callback));
        id
    }

    pub(crate) fn unregister(&self, id: u64) -> bool {
        let mut callbacks = self.lock();
        let before = callbacks.len();
        callbacks.retain(|(existing, _)| *existing != id);
        callbacks.len() != before
    }

    pub(crate) fn contains(&self, id: u64) -> bool {
        self.lock().iter().any(|(existing, _)| *existing == id)
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    pub(crate) fn notify(&self, cart: &Cart) {
        let snapshot: Vec<(u64, Callback)> = self.lock().clone();

        for (id, callback) in snapshot {
            if catch_unwind(AssertUnwindSafe(|| callback(cart))).is_err() {
                warn!(subscriber = id, "cart subscriber panicked");
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(u64, Callback)>> {
        self.callbacks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberRegistry")
            .field("subscribers", &self.len())
            .finish()
    }
}

/// Handle returned by [`crate::CartStore::subscribe`].
///
/// Dropping the handle unsubscribes. Call [`Subscription::detach`] to keep
/// the callback registered for as long as the store lives.
#[must_use = "dropping a Subscription unsubscribes its callback"]
pub struct Subscription {
    id: u64,
    registry: Weak<SubscriberRegistry>,
    armed: bool,
}

impl Subscription {
    pub(crate) fn new(id: u64, registry: &Arc<SubscriberRegistry>) -> Self {
        Subscription {
            id,
            registry: Arc::downgrade(registry),
            armed: true,
        }
    }

    /// Stops delivery. Calling this more than once is harmless.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    /// Leaves the callback registered and forgets the handle.
    pub fn detach(mut self) {
        self.armed = false;
    }

    /// True while the callback is registered with a live store.
    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .map(|registry| registry.contains(self.id))
            .unwrap_or(false)
    }

    fn release(&mut self) {
        if !self.armed {
            return;
        }
        self.armed = false;
        if let Some(registry) = self.registry.upgrade() {
            registry.unregister(self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
