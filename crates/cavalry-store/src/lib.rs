//! # cavalry-store: Durable Cart Store for Cavalry
//!
//! This crate owns the durable cart slot: reading it, writing it, telling
//! subscribers about it, and noticing when another context changed it.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cavalry Cart Data Flow                           │
//! │                                                                         │
//! │  Rendering layer (badge, cart page, add-to-cart forms)                 │
//! │       │ commands::{get_cart, add_to_cart, dispatch}                    │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  cavalry-store (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐   │   │
//! │  │   │  CartStore    │    │  Subscribers  │    │   Storage    │   │   │
//! │  │   │  (store.rs)   │───►│ (callbacks)   │    │  memory/file │   │   │
//! │  │   │ read / add /  │    └───────────────┘    │  + change    │   │   │
//! │  │   │ set_qty / ... │────────────────────────►│    feed      │   │   │
//! │  │   └───────────────┘                         └──────────────┘   │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  cavalry-core (keys, normalization, catalog, summary)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`store`] - The CartStore
//! - [`storage`] - `DurableStorage` trait, memory and file backends, change feed
//! - [`subscribers`] - Subscription handles
//! - [`commands`] - Command facade for the rendering layer
//! - [`config`] - cart.toml + environment configuration
//! - [`error`] - Storage, store and config error types
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use cavalry_core::Variant;
//! use cavalry_store::{CartStore, MemoryStorage};
//!
//! let storage = MemoryStorage::new();
//! let tab_a = CartStore::new(Arc::new(storage.clone()));
//! let tab_b = CartStore::new(Arc::new(storage));
//!
//! tab_a.add("tee", 1, Some(Variant::new().with("Size", "M"))).unwrap();
//! assert!(tab_b.sync_external());
//! assert_eq!(tab_b.read().items[0].key, "tee__Size:M");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod commands;
pub mod config;
pub mod error;
pub mod storage;
pub mod store;
pub mod subscribers;

// =============================================================================
// Re-exports
// =============================================================================

pub use commands::{ApiError, CartResponse, ErrorCode};
pub use config::{CartConfig, StorageBackend};
pub use error::{ConfigError, StorageError, StoreError};
pub use storage::{ContextId, DurableStorage, FileStorage, MemoryStorage, SlotChange};
pub use store::CartStore;
pub use subscribers::Subscription;

use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber.
///
/// Honors `RUST_LOG`; defaults to `info,cavalry=debug`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,cavalry=debug"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
