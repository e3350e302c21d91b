//! In-memory storage backend.
//!
//! Clones share the same slots and change feed, so two `CartStore`s built
//! from clones of one `MemoryStorage` behave like two tabs of one site.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::broadcast;
use tracing::debug;

use super::{ChangeFeed, ContextId, DurableStorage, SlotChange};
use crate::error::{StorageError, StorageResult};

#[derive(Debug)]
struct Inner {
    slots: Mutex<HashMap<String, String>>,
    quota_bytes: Option<usize>,
    available: AtomicBool,
    feed: ChangeFeed,
}

/// Shared in-memory slots with an optional byte quota.
///
/// The quota counts slot names plus values across all slots, the way browser
/// storage quotas do.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    inner: Arc<Inner>,
}

impl MemoryStorage {
    /// Creates an unbounded storage.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Creates a storage that rejects writes past `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self::build(Some(quota_bytes))
    }

    fn build(quota_bytes: Option<usize>) -> Self {
        MemoryStorage {
            inner: Arc::new(Inner {
                slots: Mutex::new(HashMap::new()),
                quota_bytes,
                available: AtomicBool::new(true),
                feed: ChangeFeed::new(),
            }),
        }
    }

    /// Switches the storage on or off. While off, every call fails with
    /// [`StorageError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.inner.available.store(available, Ordering::SeqCst);
    }

    pub fn is_available(&self) -> bool {
        self.inner.available.load(Ordering::SeqCst)
    }

    /// Bytes currently used (names plus values).
    pub fn used_bytes(&self) -> usize {
        let slots = self.lock();
        slots.iter().map(|(k, v)| k.len() + v.len()).sum()
    }

    /// Writes a slot without publishing a change.
    ///
    /// Stands in for an out-of-band edit (devtools, another program).
    pub fn poke(&self, slot: &str, value: &str) {
        self.lock().insert(slot.to_string(), value.to_string());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.inner.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_available(&self) -> StorageResult<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(StorageError::unavailable("memory storage is disabled"))
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl DurableStorage for MemoryStorage {
    fn get(&self, slot: &str) -> StorageResult<Option<String>> {
        self.ensure_available()?;
        Ok(self.lock().get(slot).cloned())
    }

    fn set(&self, slot: &str, value: &str, origin: ContextId) -> StorageResult<()> {
        self.ensure_available()?;

        {
            let mut slots = self.lock();

            if let Some(limit) = self.inner.quota_bytes {
                let others: usize = slots
                    .iter()
                    .filter(|(name, _)| name.as_str() != slot)
                    .map(|(name, v)| name.len() + v.len())
                    .sum();
                let needed = others + slot.len() + value.len();
                if needed > limit {
                    return Err(StorageError::quota_exceeded(slot, needed, limit));
                }
            }

            slots.insert(slot.to_string(), value.to_string());
        }

        debug!(slot = %slot, origin = %origin, bytes = value.len(), "memory slot written");
        self.inner.feed.publish(slot, origin);
        Ok(())
    }

    fn remove(&self, slot: &str, origin: ContextId) -> StorageResult<()> {
        self.ensure_available()?;
        self.lock().remove(slot);
        self.inner.feed.publish(slot, origin);
        Ok(())
    }

    fn watch(&self) -> broadcast::Receiver<SlotChange> {
        self.inner.feed.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set_remove() {
        let storage = MemoryStorage::new();
        let me = ContextId::new();

        assert_eq!(storage.get("cav-cart-v1").unwrap(), None);
        storage.set("cav-cart-v1", "{}", me).unwrap();
        assert_eq!(storage.get("cav-cart-v1").unwrap().as_deref(), Some("{}"));

        storage.remove("cav-cart-v1", me).unwrap();
        assert_eq!(storage.get("cav-cart-v1").unwrap(), None);
        storage.remove("cav-cart-v1", me).unwrap();
    }

    #[test]
    fn test_clones_share_slots_and_feed() {
        let a = MemoryStorage::new();
        let b = a.clone();
        let mut rx = b.watch();

        let origin = ContextId::new();
        a.set("slot-v1", "x", origin).unwrap();

        assert_eq!(b.get("slot-v1").unwrap().as_deref(), Some("x"));
        assert_eq!(rx.try_recv().unwrap().origin, origin);
    }

    #[test]
    fn test_quota_exceeded_keeps_old_value() {
        let storage = MemoryStorage::with_quota(20);
        let me = ContextId::new();

        storage.set("s-v1", "small", me).unwrap();
        let err = storage.set("s-v1", "this value is far too long", me).unwrap_err();

        assert!(matches!(err, StorageError::QuotaExceeded { limit: 20, .. }));
        assert_eq!(storage.get("s-v1").unwrap().as_deref(), Some("small"));
        assert_eq!(storage.used_bytes(), "s-v1".len() + "small".len());
    }

    #[test]
    fn test_failed_write_publishes_nothing() {
        let storage = MemoryStorage::with_quota(4);
        let mut rx = storage.watch();

        assert!(storage.set("s-v1", "too big", ContextId::new()).is_err());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_unavailable() {
        let storage = MemoryStorage::new();
        storage.set_available(false);

        assert!(matches!(
            storage.get("s-v1"),
            Err(StorageError::Unavailable(_))
        ));
        assert!(storage.set("s-v1", "x", ContextId::new()).is_err());

        storage.set_available(true);
        assert!(storage.get("s-v1").is_ok());
    }

    #[test]
    fn test_poke_is_silent() {
        let storage = MemoryStorage::new();
        let mut rx = storage.watch();
        storage.poke("s-v1", "raw");
        assert_eq!(storage.get("s-v1").unwrap().as_deref(), Some("raw"));
        assert!(rx.try_recv().is_err());
    }
}
