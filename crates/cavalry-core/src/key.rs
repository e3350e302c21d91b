//! # Line Item Keys
//!
//! Every line item is identified by a key derived from its product id and
//! variant selection. The derivation is part of the storage contract: carts
//! written by older builds must produce the same keys when read back.
//!
//! ## Derivation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  derive_key("tee", { Size: "M", Color: "Red" })                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  sort names:        Color, Size                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  render pairs:      "Color:Red", "Size:M"                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  join with "|":     "Color:Red|Size:M"                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  key:               "tee__Color:Red|Size:M"                             │
//! │                                                                         │
//! │  No variant (or empty variant) → key is the bare id: "tee"              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::types::Variant;
use crate::{KEY_SEPARATOR, VARIANT_FIELD_SEPARATOR};

/// Renders a variant as its sorted `name:value|name:value` signature.
///
/// Returns an empty string for `None` or an empty selection.
pub fn variant_signature(variant: Option<&Variant>) -> String {
    match variant {
        Some(v) => v
            .iter()
            .map(|(name, value)| format!("{}:{}", name, value))
            .collect::<Vec<_>>()
            .join(VARIANT_FIELD_SEPARATOR),
        None => String::new(),
    }
}

/// Derives the line item key for a product and variant selection.
///
/// ## Example
/// ```rust
/// use cavalry_core::{derive_key, Variant};
///
/// assert_eq!(derive_key("p1", None), "p1");
///
/// let red = Variant::new().with("Color", "Red");
/// assert_eq!(derive_key("p1", Some(&red)), "p1__Color:Red");
/// ```
pub fn derive_key(id: &str, variant: Option<&Variant>) -> String {
    let signature = variant_signature(variant);
    if signature.is_empty() {
        id.to_string()
    } else {
        format!("{}{}{}", id, KEY_SEPARATOR, signature)
    }
}
