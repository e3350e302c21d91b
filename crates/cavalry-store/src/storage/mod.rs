//! # Durable Storage
//!
//! A string key-value interface over whatever survives a page reload, plus a
//! change feed shared by every handle on the same storage.
//!
//! ## Backend Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Storage Abstraction                                │
//! │                                                                         │
//! │  CartStore (context A)        CartStore (context B)                     │
//! │        │      ▲                     │      ▲                            │
//! │   get/set     │ SlotChange     get/set     │ SlotChange                 │
//! │        ▼      │                     ▼      │                            │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              dyn DurableStorage (trait object)                  │   │
//! │  │    get(slot)  set(slot, value, origin)  remove  watch()          │   │
//! │  └──────────────────────┬──────────────────────┬───────────────────┘   │
//! │                         │                      │                        │
//! │                ┌────────▼───────┐     ┌────────▼───────┐                │
//! │                │ MemoryStorage  │     │  FileStorage   │                │
//! │                │ quota, toggle  │     │ temp + rename  │                │
//! │                └────────────────┘     └────────────────┘                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Change Feed
//! Every successful `set`/`remove` publishes a [`SlotChange`] tagged with the
//! writer's [`ContextId`]. Receivers decide for themselves which changes are
//! foreign; the feed does not filter.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::StorageResult;

/// Buffered notifications per receiver before it starts lagging.
pub const CHANGE_FEED_CAPACITY: usize = 64;

// =============================================================================
// Context Identity
// =============================================================================

/// Identity of one browsing context (tab, window, process) using the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextId(Uuid);

impl ContextId {
    /// Generates a fresh random context id.
    pub fn new() -> Self {
        ContextId(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A slot was written or removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotChange {
    pub slot: String,
    pub origin: ContextId,
}

// =============================================================================
// Storage Trait
// =============================================================================

/// Durable string slots.
///
/// All methods take `&self`; backends use interior mutability so one handle
/// can be shared across threads.
///
/// ## Contract
/// - `set` replaces the whole value or fails; no partial writes
/// - a change is published only after the write succeeded
/// - `remove` of a missing slot succeeds
pub trait DurableStorage: Send + Sync + fmt::Debug {
    /// Reads a slot. `Ok(None)` when it was never written.
    fn get(&self, slot: &str) -> StorageResult<Option<String>>;

    /// Replaces a slot's value and publishes a change from `origin`.
    fn set(&self, slot: &str, value: &str, origin: ContextId) -> StorageResult<()>;

    /// Deletes a slot and publishes a change from `origin`.
    fn remove(&self, slot: &str, origin: ContextId) -> StorageResult<()>;

    /// Subscribes to changes published after this call.
    fn watch(&self) -> broadcast::Receiver<SlotChange>;
}

impl<T: DurableStorage + ?Sized> DurableStorage for Arc<T> {
    fn get(&self, slot: &str) -> StorageResult<Option<String>> {
        (**self).get(slot)
    }

    fn set(&self, slot: &str, value: &str, origin: ContextId) -> StorageResult<()> {
        (**self).set(slot, value, origin)
    }

    fn remove(&self, slot: &str, origin: ContextId) -> StorageResult<()> {
        (**self).remove(slot, origin)
    }

    fn watch(&self) -> broadcast::Receiver<SlotChange> {
        (**self).watch()
    }
}

// =============================================================================
// Change Feed
// =============================================================================

/// Fan-out of [`SlotChange`] notifications. Clones share one channel.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<SlotChange>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        ChangeFeed { sender }
    }

    /// Publishes a change. Having no receivers is not an error.
    pub fn publish(&self, slot: &str, origin: ContextId) {
        let _ = self.sender.send(SlotChange {
            slot: slot.to_string(),
            origin,
        });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SlotChange> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}
