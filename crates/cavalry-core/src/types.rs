//! # Domain Types
//!
//! The cart data model shared by the store and the rendering layer.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Cart       │   │    LineItem     │   │     Variant     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  items ─────────┼──►│  key            │   │  Color → Red    │       │
//! │  │  (unique key)   │   │  id (product)   │   │  Size  → M      │       │
//! │  │                 │   │  qty (≥ 1)      │   │  (sorted names) │       │
//! │  │                 │   │  variant? ──────┼──►│                 │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Persisted Shape
//! ```json
//! { "items": [ { "key": "tee__Color:Red", "id": "tee", "qty": 2, "variant": { "Color": "Red" } } ] }
//! ```
//!
//! The cart never holds product attributes (title, price, image). Those are
//! owned by the catalog and joined in by [`crate::summary::CartSummary`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::key::derive_key;

// =============================================================================
// Variant
// =============================================================================

/// A variant selection: dimension name → chosen value.
///
/// Backed by a `BTreeMap`, so iteration is always in sorted name order no
/// matter how the selection was assembled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Variant(BTreeMap<String, String>);

impl Variant {
    /// Creates an empty selection.
    pub fn new() -> Self {
        Variant(BTreeMap::new())
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Sets a dimension, returning the previous value if any.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(name.into(), value.into())
    }

    /// Returns the chosen value for a dimension.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates `(name, value)` pairs in sorted name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Human-readable label, e.g. `Color: Red, Size: M`.
    pub fn label(&self) -> String {
        self.iter()
            .map(|(name, value)| format!("{}: {}", name, value))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Collapses an empty selection to `None`.
    ///
    /// A present variant is never empty; "no dimensions" is spelled `None`.
    pub fn into_non_empty(self) -> Option<Self> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Variant {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Variant(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<BTreeMap<String, String>> for Variant {
    fn from(map: BTreeMap<String, String>) -> Self {
        Variant(map)
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// One entry in the cart: a product, an optional variant, and a quantity.
///
/// ## Invariants (after normalization)
/// - `id` is non-empty and trimmed
/// - `qty >= 1`
/// - `variant`, when present, is non-empty
/// - `key` is unique within its cart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    /// Identity of the (product, variant) pair. See [`derive_key`].
    pub key: String,

    /// Product id (foreign reference into the catalog).
    pub id: String,

    /// Quantity in cart.
    pub qty: u32,

    /// Variant selection, absent for products without dimensions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub variant: Option<Variant>,
}

impl LineItem {
    /// Creates a line item, deriving its key from `id` and `variant`.
    pub fn new(id: impl Into<String>, qty: u32, variant: Option<Variant>) -> Self {
        let id = id.into();
        let variant = variant.and_then(Variant::into_non_empty);
        LineItem {
            key: derive_key(&id, variant.as_ref()),
            id,
            qty,
            variant,
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The cart: an ordered list of line items, unique by key.
///
/// The mutation methods here operate on an in-memory value only. The store
/// wraps each of them in read → mutate → normalize → write → notify.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart {
    /// Items in the cart, in order of first appearance.
    #[serde(default)]
    pub items: Vec<LineItem>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart { items: Vec::new() }
    }

    /// Looks up an item by key.
    pub fn get(&self, key: &str) -> Option<&LineItem> {
        self.items.iter().find(|i| i.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Adds a product, or increases the quantity of the matching line item.
    ///
    /// ## Behavior
    /// - Same product + same variant selection: quantities add up
    /// - Otherwise: a new line item is appended at the end
    ///
    /// Returns the key of the touched item.
    pub fn add_item(&mut self, id: &str, qty: u32, variant: Option<Variant>) -> String {
        let item = LineItem::new(id, qty, variant);

        if let Some(existing) = self.items.iter_mut().find(|i| i.key == item.key) {
            existing.qty = existing.qty.saturating_add(qty);
            return item.key;
        }

        let key = item.key.clone();
        self.items.push(item);
        key
    }

    /// Sets the quantity of an item. Quantity 0 removes the item.
    ///
    /// Returns `false` if no item has this key.
    pub fn set_quantity(&mut self, key: &str, qty: u32) -> bool {
        if qty == 0 {
            return self.remove_item(key);
        }

        match self.items.iter_mut().find(|i| i.key == key) {
            Some(item) => {
                item.qty = qty;
                true
            }
            None => false,
        }
    }

    /// Removes an item by key. Returns `false` if nothing was removed.
    pub fn remove_item(&mut self, key: &str) -> bool {
        let initial_len = self.items.len();
        self.items.retain(|i| i.key != key);
        self.items.len() != initial_len
    }

    /// Removes every item.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Returns the number of distinct line items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the sum of all quantities (the badge count).
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.qty)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cart_add_item() {
        let mut cart = Cart::new();
        cart.add_item("p1", 2, None);

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 2);
        assert_eq!(cart.items[0].key, "p1");
    }

    #[test]
    fn test_cart_add_same_product_increases_quantity() {
        let mut cart = Cart::new();
        cart.add_item("p1", 2, None);
        cart.add_item("p1", 3, None);

        assert_eq!(cart.item_count(), 1); // Still one line item
        assert_eq!(cart.total_quantity(), 5);
    }

    #[test]
    fn test_cart_variants_are_separate_items() {
        let mut cart = Cart::new();
        cart.add_item("p1", 1, Some(Variant::new().with("Color", "Red")));
        cart.add_item("p1", 1, Some(Variant::new().with("Color", "Blue")));

        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.items[0].key, "p1__Color:Red");
        assert_eq!(cart.items[1].key, "p1__Color:Blue");
    }

    #[test]
    fn test_empty_variant_is_dropped() {
        let item = LineItem::new("p1", 1, Some(Variant::new()));
        assert_eq!(item.variant, None);
        assert_eq!(item.key, "p1");
    }

    #[test]
    fn test_add_saturates_quantity() {
        let mut cart = Cart::new();
        cart.add_item("p1", u32::MAX, None);
        cart.add_item("p1", 10, None);
        assert_eq!(cart.items[0].qty, u32::MAX);
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut cart = Cart::new();
        cart.add_item("p1", 2, None);

        assert!(cart.set_quantity("p1", 0));
        assert!(cart.is_empty());
        assert!(!cart.set_quantity("p1", 4));
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cart = Cart::new();
        cart.add_item("p1", 1, None);
        cart.add_item("p2", 1, None);

        assert!(cart.remove_item("p1"));
        assert!(!cart.remove_item("p1"));
        assert_eq!(cart.item_count(), 1);

        cart.clear();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_serialized_shape() {
        let mut cart = Cart::new();
        cart.add_item("p1", 2, None);
        cart.add_item("p2", 1, Some(Variant::new().with("Size", "M")));

        let json = serde_json::to_string(&cart).unwrap();
        assert_eq!(
            json,
            r#"{"items":[{"key":"p1","id":"p1","qty":2},{"key":"p2__Size:M","id":"p2","qty":1,"variant":{"Size":"M"}}]}"#
        );
    }

    #[test]
    fn test_variant_label_sorted() {
        let v: Variant = [("Size", "M"), ("Color", "Red")].into_iter().collect();
        assert_eq!(v.label(), "Color: Red, Size: M");
        assert_eq!(v.get("Size"), Some("M"));
    }
}
