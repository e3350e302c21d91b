//! # Cart Store
//!
//! The single authority over the durable cart slot.
//!
//! ## Mutation Cycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Every Mutation                                       │
//! │                                                                         │
//! │  read slot ──► parse + normalize ──► mutate ──► normalize ──► write    │
//! │                (bad data → empty)                              │        │
//! │                                                      ok ───────┤        │
//! │                                                                ▼        │
//! │                                                    notify subscribers   │
//! │                                                                         │
//! │  A failed write returns StoreError and notifies no one.                 │
//! │  Nothing is cached between calls: another context may have written.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Cross-Context Updates
//! ```text
//!   Context A                    storage                    Context B
//!   ─────────                    ───────                    ─────────
//!   clear() ──── set(slot) ────► SlotChange{origin: A} ───► sync_external()
//!                                                           or listener task
//!                                                             │
//!                                                             ▼
//!                                                  read() + notify B's subscribers
//! ```
//!
//! Concurrent writers are last-writer-wins.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use cavalry_core::{
    normalize, parse_cart, Cart, Mutation, RequestedQuantity, Variant, DEFAULT_CART_SLOT,
};

use crate::error::StoreResult;
use crate::storage::{ContextId, DurableStorage, SlotChange};
use crate::subscribers::{SubscriberRegistry, Subscription};

/// Cart operations over one durable slot.
///
/// ## Example
/// ```rust
/// use std::sync::Arc;
/// use cavalry_store::{CartStore, MemoryStorage};
///
/// let store = CartStore::new(Arc::new(MemoryStorage::new()));
/// store.add("tee", 2, None).unwrap();
/// store.add("tee", 3, None).unwrap();
///
/// assert_eq!(store.read().items[0].qty, 5);
/// assert_eq!(store.get_count(None), 5);
/// ```
pub struct CartStore {
    storage: Arc<dyn DurableStorage>,
    slot: String,
    context: ContextId,
    subscribers: Arc<SubscriberRegistry>,
    changes: Mutex<Option<broadcast::Receiver<SlotChange>>>,
}

impl CartStore {
    /// Creates a store on the default slot with a fresh context id.
    pub fn new(storage: Arc<dyn DurableStorage>) -> Self {
        Self::with_slot(storage, DEFAULT_CART_SLOT)
    }

    /// Creates a store on a specific slot.
    pub fn with_slot(storage: Arc<dyn DurableStorage>, slot: impl Into<String>) -> Self {
        let changes = Mutex::new(Some(storage.watch()));
        let store = CartStore {
            storage,
            slot: slot.into(),
            context: ContextId::new(),
            subscribers: Arc::new(SubscriberRegistry::default()),
            changes,
        };
        debug!(slot = %store.slot, context = %store.context, "cart store created");
        store
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }

    pub fn context(&self) -> ContextId {
        self.context
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Loads the current cart.
    ///
    /// Missing, unreadable or malformed data reads as an empty cart. Reading
    /// never writes.
    pub fn read(&self) -> Cart {
        let raw = match self.storage.get(&self.slot) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Cart::new(),
            Err(e) => {
                warn!(slot = %self.slot, error = %e, "cart slot unreadable, using empty cart");
                return Cart::new();
            }
        };

        parse_cart(&raw).unwrap_or_else(|e| {
            warn!(slot = %self.slot, error = %e, "cart slot malformed, using empty cart");
            Cart::new()
        })
    }

    /// Sum of all quantities in `cart`, or in the stored cart when `None`.
    pub fn get_count(&self, cart: Option<&Cart>) -> u64 {
        match cart {
            Some(cart) => cart.total_quantity(),
            None => self.read().total_quantity(),
        }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Normalizes and persists `cart`, then notifies subscribers.
    ///
    /// Returns the cart as written.
    pub fn write(&self, cart: &Cart) -> StoreResult<Cart> {
        let cart = normalize(cart);
        let payload = serde_json::to_string(&cart)?;

        self.storage.set(&self.slot, &payload, self.context)?;

        self.subscribers.notify(&cart);
        Ok(cart)
    }

    /// Adds `qty` of a product (at least 1), merging into the matching line.
    ///
    /// An empty product id changes nothing and returns the current cart.
    pub fn add(
        &self,
        product_id: &str,
        qty: impl Into<RequestedQuantity>,
        variant: Option<Variant>,
    ) -> StoreResult<Cart> {
        let product_id = product_id.trim();
        if product_id.is_empty() {
            debug!("add ignored: empty product id");
            return Ok(self.read());
        }

        let qty = qty.into().for_add();
        let mut cart = self.read();
        let key = cart.add_item(product_id, qty, variant);

        debug!(key = %key, qty = qty, "add");
        self.write(&cart)
    }

    /// Sets a line's quantity. Zero, negative or non-finite removes the line.
    ///
    /// An unknown key changes nothing: no write, no notification.
    pub fn set_qty(&self, key: &str, qty: impl Into<RequestedQuantity>) -> StoreResult<Cart> {
        let mut cart = self.read();
        if !cart.contains(key) {
            debug!(key = %key, "set_qty ignored: unknown key");
            return Ok(cart);
        }

        let qty = qty.into().for_set();
        cart.set_quantity(key, qty);

        debug!(key = %key, qty = qty, "set_qty");
        self.write(&cart)
    }

    /// Removes a line. An unknown key changes nothing.
    pub fn remove(&self, key: &str) -> StoreResult<Cart> {
        let mut cart = self.read();
        if !cart.remove_item(key) {
            debug!(key = %key, "remove ignored: unknown key");
            return Ok(cart);
        }

        debug!(key = %key, "remove");
        self.write(&cart)
    }

    /// Empties the cart. Always writes and notifies.
    pub fn clear(&self) -> StoreResult<Cart> {
        debug!("clear");
        self.write(&Cart::new())
    }

    /// Applies a resolved intent.
    pub fn apply(&self, mutation: Mutation) -> StoreResult<Cart> {
        match mutation {
            Mutation::Add {
                product_id,
                qty,
                variant,
            } => self.add(&product_id, qty, variant),
            Mutation::SetQty { key, qty } => self.set_qty(&key, qty),
            Mutation::Remove { key } => self.remove(&key),
            Mutation::Clear => self.clear(),
        }
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Registers a callback that receives the fresh cart after every
    /// successful mutation, local or from another context.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Cart) + Send + Sync + 'static,
    {
        let id = self.subscribers.register(Arc::new(callback));
        Subscription::new(id, &self.subscribers)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    // =========================================================================
    // Cross-Context Sync
    // =========================================================================
    //
    // A store owns one feed receiver, opened at construction so nothing
    // written after `new` is missed. Polling (`sync_external`) uses it until
    // a listener takes it; after that the listener alone delivers external
    // changes and `sync_external` returns false.

    /// Drains pending slot changes without blocking.
    ///
    /// If any came from another context (or changes were dropped because
    /// this store fell behind), re-reads once and notifies subscribers.
    /// Returns whether it did. Always false once a change listener runs.
    pub fn sync_external(&self) -> bool {
        let mut stale = false;
        {
            let mut guard = self.changes.lock().unwrap_or_else(PoisonError::into_inner);
            let Some(changes) = guard.as_mut() else {
                return false;
            };
            loop {
                match changes.try_recv() {
                    Ok(change) => stale |= self.is_external(&change),
                    Err(TryRecvError::Lagged(missed)) => {
                        warn!(missed = missed, "change feed lagged, resyncing");
                        stale = true;
                    }
                    Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
                }
            }
        }

        if stale {
            self.refresh_from_storage();
        }
        stale
    }

    /// Waits for changes from other contexts and notifies subscribers for
    /// each, until the storage's feed closes.
    ///
    /// Takes over the store's feed receiver, so `sync_external` stops
    /// reporting changes. The future borrows the store; drop it to stop.
    pub async fn listen_for_external_changes(&self) {
        let mut changes = self.take_changes();
        info!(slot = %self.slot, context = %self.context, "listening for external cart changes");
        loop {
            let event = changes.recv().await;
            if !self.handle_change(event) {
                break;
            }
        }
    }

    /// Spawns an external-change listener on the current tokio runtime.
    ///
    /// The task holds only a weak reference to the store. It exits when the
    /// feed closes, or on the first change after the last `Arc<CartStore>`
    /// is dropped. Takes over the store's feed receiver like
    /// [`CartStore::listen_for_external_changes`].
    pub fn spawn_change_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let mut changes = self.take_changes();
        let weak: Weak<Self> = Arc::downgrade(self);
        info!(slot = %self.slot, context = %self.context, "spawning external cart change listener");

        tokio::spawn(async move {
            loop {
                let event = changes.recv().await;
                let Some(store) = weak.upgrade() else {
                    debug!("cart store dropped, change listener exiting");
                    break;
                };
                if !store.handle_change(event) {
                    break;
                }
            }
        })
    }

    /// Hands the construction-time receiver to a listener, or opens a new
    /// one if a previous listener already took it.
    fn take_changes(&self) -> broadcast::Receiver<SlotChange> {
        self.changes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .unwrap_or_else(|| self.storage.watch())
    }

    /// Returns false once the feed is closed.
    fn handle_change(&self, event: Result<SlotChange, RecvError>) -> bool {
        match event {
            Ok(change) => {
                if self.is_external(&change) {
                    self.refresh_from_storage();
                }
                true
            }
            Err(RecvError::Lagged(missed)) => {
                warn!(missed = missed, "change feed lagged, resyncing");
                self.refresh_from_storage();
                true
            }
            Err(RecvError::Closed) => {
                debug!(slot = %self.slot, "change feed closed");
                false
            }
        }
    }

    fn is_external(&self, change: &SlotChange) -> bool {
        change.slot == self.slot && change.origin != self.context
    }

    fn refresh_from_storage(&self) {
        let cart = self.read();
        debug!(slot = %self.slot, items = cart.item_count(), "external cart change");
        self.subscribers.notify(&cart);
    }
}

impl fmt::Debug for CartStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartStore")
            .field("slot", &self.slot)
            .field("context", &self.context)
            .field("storage", &self.storage)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn store() -> (MemoryStorage, CartStore) {
        let storage = MemoryStorage::new();
        let store = CartStore::new(Arc::new(storage.clone()));
        (storage, store)
    }

    #[test]
    fn test_empty_product_id_is_noop() {
        let (storage, store) = store();
        let cart = store.add("   ", 1, None).unwrap();

        assert!(cart.is_empty());
        assert_eq!(storage.get(DEFAULT_CART_SLOT).unwrap(), None);
    }

    #[test]
    fn test_unknown_key_does_not_write() {
        let (storage, store) = store();
        let writes = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&writes);
        store
            .subscribe(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            })
            .detach();

        store.set_qty("ghost", 3).unwrap();
        store.remove("ghost").unwrap();

        assert_eq!(writes.load(Ordering::SeqCst), 0);
        assert_eq!(storage.get(DEFAULT_CART_SLOT).unwrap(), None);
    }

    #[test]
    fn test_own_writes_are_not_external() {
        let (_, store) = store();
        store.add("p1", 1, None).unwrap();
        assert!(!store.sync_external());
    }

    #[test]
    fn test_apply_mutations() {
        let (_, store) = store();
        store
            .apply(Mutation::Add {
                product_id: "p1".into(),
                qty: RequestedQuantity::from(2),
                variant: None,
            })
            .unwrap();
        store
            .apply(Mutation::SetQty {
                key: "p1".into(),
                qty: RequestedQuantity::from(7),
            })
            .unwrap();
        assert_eq!(store.get_count(None), 7);

        store.apply(Mutation::Clear).unwrap();
        assert_eq!(store.get_count(None), 0);
    }

    #[test]
    fn test_subscriber_count() {
        let (_, store) = store();
        let sub = store.subscribe(|_| {});
        assert_eq!(store.subscriber_count(), 1);
        drop(sub);
        assert_eq!(store.subscriber_count(), 0);
    }
}
