//! # cavalry-core: Pure Cart Logic for Cavalry
//!
//! This crate is the **heart** of the Cavalry cart. It contains the cart
//! data model and every rule that decides what a valid cart looks like, as
//! pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cavalry Cart Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Rendering layer (browser side)                  │   │
//! │  │    Cart list ──► Badge counter ──► Add-to-cart buttons          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ intents / subscriptions                │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 cavalry-store (CartStore)                       │   │
//! │  │    read, add, set_qty, remove, clear, subscribe                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ cavalry-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐   │   │
//! │  │   │   types   │  │    key    │  │ normalize │  │  catalog  │   │   │
//! │  │   │ LineItem  │  │ derive_key│  │  clamp    │  │  summary  │   │   │
//! │  │   │   Cart    │  │           │  │  coalesce │  │  intent   │   │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO STORAGE • NO NETWORK • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Cart, LineItem, Variant
//! - [`key`] - Stable line item key derivation
//! - [`normalize`] - The cleanup pass applied on every read and write
//! - [`quantity`] - Requested quantities and their clamping rules
//! - [`validation`] - Product id and slot name checks
//! - [`money`] - Integer-cents money type used for display totals
//! - [`catalog`] - Lazily loaded product lookup
//! - [`summary`] - Cart view model for the rendering layer
//! - [`intent`] - User intents and the add-to-cart form reader
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use cavalry_core::{derive_key, Variant};
//!
//! let a = Variant::new().with("Size", "M").with("Color", "Red");
//! let b = Variant::new().with("Color", "Red").with("Size", "M");
//!
//! assert_eq!(derive_key("tee", Some(&a)), "tee__Color:Red|Size:M");
//! assert_eq!(derive_key("tee", Some(&a)), derive_key("tee", Some(&b)));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod error;
pub mod intent;
pub mod key;
pub mod money;
pub mod normalize;
pub mod quantity;
pub mod summary;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use catalog::{CatalogIndex, CatalogProduct, CatalogState};
pub use error::{CoreError, CoreResult, ValidationError};
pub use intent::{AddToCartForm, CartIntent, Mutation};
pub use key::derive_key;
pub use money::Money;
pub use normalize::{normalize, normalize_value, parse_cart};
pub use quantity::RequestedQuantity;
pub use summary::{CartLine, CartSummary};
pub use types::{Cart, LineItem, Variant};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Name of the durable slot holding the serialized cart.
///
/// ## Versioning
/// The `-v1` suffix is part of the storage contract. An incompatible payload
/// layout must move to a new slot name (`cav-cart-v2`) instead of
/// reinterpreting data written under this one.
pub const DEFAULT_CART_SLOT: &str = "cav-cart-v1";

/// Separator between the product id and the variant signature in a key.
pub const KEY_SEPARATOR: &str = "__";

/// Separator between `name:value` pairs in a variant signature.
pub const VARIANT_FIELD_SEPARATOR: &str = "|";

/// Image shown for catalog products without any image.
pub const PLACEHOLDER_IMAGE: &str = "/assets/img/placeholder.svg";
