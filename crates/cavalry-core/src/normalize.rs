//! # Normalization
//!
//! The deterministic cleanup pass applied to every cart on its way in from
//! storage and on its way out to storage.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Normalization Pipeline                               │
//! │                                                                         │
//! │  raw entries (JSON or typed)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. drop non-objects and entries whose trimmed id is empty              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  2. clamp qty to an integer ≥ 1 (never deletes)                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  3. re-derive key when the stored key is missing or blank               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  4. coalesce duplicate keys: sum qty into the first-seen entry          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  5. keep first-appearance order                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Normalizing an already normalized cart returns an identical cart.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::error::CoreResult;
use crate::key::derive_key;
use crate::quantity::clamp_stored;
use crate::types::{Cart, LineItem, Variant};

// =============================================================================
// Entry Points
// =============================================================================

/// Parses a stored payload into a normalized cart.
///
/// Only invalid JSON is an error. Valid JSON of the wrong shape (an array, a
/// string, `{"items": 5}`) yields an empty cart, and individual bad entries
/// are dropped.
pub fn parse_cart(raw: &str) -> CoreResult<Cart> {
    let value: Value = serde_json::from_str(raw)?;
    Ok(normalize_value(&value))
}

/// Normalizes an arbitrary JSON value into a cart.
///
/// Unknown top-level fields are ignored.
pub fn normalize_value(value: &Value) -> Cart {
    let Some(entries) = value.get("items").and_then(Value::as_array) else {
        return Cart::new();
    };

    let candidates = entries
        .iter()
        .filter_map(Value::as_object)
        .filter_map(line_item_from_fields);

    Cart {
        items: coalesce(candidates),
    }
}

/// Normalizes a typed cart.
///
/// Typed carts can still violate the invariants when assembled by hand
/// (blank key, zero quantity, padded id), so they get the same pass.
pub fn normalize(cart: &Cart) -> Cart {
    let candidates = cart.items.iter().filter_map(|item| {
        let id = item.id.trim();
        if id.is_empty() {
            return None;
        }

        let variant = item.variant.clone().and_then(Variant::into_non_empty);
        let key = if item.key.trim().is_empty() {
            derive_key(id, variant.as_ref())
        } else {
            item.key.clone()
        };

        Some(LineItem {
            key,
            id: id.to_string(),
            qty: item.qty.max(1),
            variant,
        })
    });

    Cart {
        items: coalesce(candidates),
    }
}

// =============================================================================
// Field Readers
// =============================================================================

fn line_item_from_fields(fields: &Map<String, Value>) -> Option<LineItem> {
    let id = read_id(fields.get("id"))?;
    let qty = read_qty(fields.get("qty"));
    let variant = read_variant(fields.get("variant"));
    let key = read_key(fields.get("key")).unwrap_or_else(|| derive_key(&id, variant.as_ref()));

    Some(LineItem {
        key,
        id,
        qty,
        variant,
    })
}

/// Ids are strings; numeric ids from older catalog exports are stringified.
fn read_id(value: Option<&Value>) -> Option<String> {
    let id = match value? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };

    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

fn read_qty(value: Option<&Value>) -> u32 {
    match value {
        Some(Value::Number(n)) => n.as_f64().map(clamp_stored).unwrap_or(1),
        Some(Value::String(s)) => s.trim().parse::<f64>().map(clamp_stored).unwrap_or(1),
        _ => 1,
    }
}

fn read_key(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn read_variant(value: Option<&Value>) -> Option<Variant> {
    let fields = value?.as_object()?;

    fields
        .iter()
        .filter_map(|(name, value)| match value {
            Value::String(s) => Some((name.clone(), s.clone())),
            Value::Number(n) => Some((name.clone(), n.to_string())),
            Value::Bool(b) => Some((name.clone(), b.to_string())),
            _ => None,
        })
        .collect::<Variant>()
        .into_non_empty()
}

// =============================================================================
// Coalescing
// =============================================================================

/// Merges entries sharing a key, keeping first-seen key/id/variant and order.
fn coalesce(candidates: impl IntoIterator<Item = LineItem>) -> Vec<LineItem> {
    let mut items: Vec<LineItem> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for item in candidates {
        match positions.get(&item.key) {
            Some(&pos) => {
                items[pos].qty = items[pos].qty.saturating_add(item.qty);
            }
            None => {
                positions.insert(item.key.clone(), items.len());
                items.push(item);
            }
        }
    }

    items
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_negative_qty_clamps_to_one() {
        let cart = normalize_value(&json!({
            "items": [{ "key": "p1", "id": "p1", "qty": -5 }]
        }));
        assert_eq!(cart.items[0].qty, 1);
    }

    #[test]
    fn test_qty_variants_clamp() {
        let cart = normalize_value(&json!({
            "items": [
                { "id": "a", "qty": 0 },
                { "id": "b", "qty": 2.9 },
                { "id": "c", "qty": "4" },
                { "id": "d", "qty": "lots" },
                { "id": "e" },
                { "id": "f", "qty": null }
            ]
        }));
        let qtys: Vec<u32> = cart.items.iter().map(|i| i.qty).collect();
        assert_eq!(qtys, vec![1, 2, 4, 1, 1, 1]);
    }

    #[test]
    fn test_invalid_entries_dropped() {
        let cart = normalize_value(&json!({
            "items": [
                null,
                "p1",
                42,
                { "qty": 3 },
                { "id": "   ", "qty": 3 },
                { "id": ["x"], "qty": 3 },
                { "id": " p2 ", "qty": 2 }
            ]
        }));
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].id, "p2");
        assert_eq!(cart.items[0].key, "p2");
    }

    #[test]
    fn test_wrong_shapes_yield_empty_cart() {
        assert!(normalize_value(&json!(null)).is_empty());
        assert!(normalize_value(&json!([1, 2, 3])).is_empty());
        assert!(normalize_value(&json!({ "items": 5 })).is_empty());
        assert!(normalize_value(&json!({ "things": [] })).is_empty());
    }

    #[test]
    fn test_missing_key_is_rederived() {
        let cart = normalize_value(&json!({
            "items": [{ "id": "p1", "qty": 1, "variant": { "Size": "M", "Color": "Red" } }]
        }));
        assert_eq!(cart.items[0].key, "p1__Color:Red|Size:M");
    }

    #[test]
    fn test_stored_key_is_kept() {
        let cart = normalize_value(&json!({
            "items": [{ "key": "legacy-key", "id": "p1", "qty": 1 }]
        }));
        assert_eq!(cart.items[0].key, "legacy-key");
    }

    #[test]
    fn test_duplicates_coalesce_in_first_seen_order() {
        let cart = normalize_value(&json!({
            "items": [
                { "id": "p2", "qty": 1 },
                { "id": "p1", "qty": 2, "variant": { "Color": "Red" } },
                { "id": "p2", "qty": 4 },
                { "key": "p1__Color:Red", "id": "p1", "qty": 3, "variant": { "Color": "Crimson" } }
            ]
        }));

        assert_eq!(cart.items.len(), 2);
        assert_eq!(cart.items[0].key, "p2");
        assert_eq!(cart.items[0].qty, 5);
        assert_eq!(cart.items[1].key, "p1__Color:Red");
        assert_eq!(cart.items[1].qty, 5);
        // First-seen variant wins.
        assert_eq!(
            cart.items[1].variant.as_ref().and_then(|v| v.get("Color")),
            Some("Red")
        );
    }

    #[test]
    fn test_variant_values_coerced() {
        let cart = normalize_value(&json!({
            "items": [
                { "id": "p1", "variant": { "Size": 42, "Gift": true, "Extra": { "x": 1 } } },
                { "id": "p2", "variant": {} },
                { "id": "p3", "variant": "Red" }
            ]
        }));

        let v = cart.items[0].variant.as_ref().unwrap();
        assert_eq!(v.get("Size"), Some("42"));
        assert_eq!(v.get("Gift"), Some("true"));
        assert_eq!(v.get("Extra"), None);
        assert_eq!(cart.items[1].variant, None);
        assert_eq!(cart.items[2].variant, None);
    }

    #[test]
    fn test_numeric_id_stringified() {
        let cart = normalize_value(&json!({ "items": [{ "id": 17, "qty": 1 }] }));
        assert_eq!(cart.items[0].id, "17");
        assert_eq!(cart.items[0].key, "17");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let messy = normalize_value(&json!({
            "items": [
                { "id": " p1 ", "qty": -1 },
                { "id": "p2", "qty": 3, "variant": { "b": "2", "a": "1" } },
                { "id": "p1", "qty": 2 },
                { "key": "", "id": "p3", "qty": 0 }
            ]
        }));

        let once = normalize(&messy);
        let twice = normalize(&once);
        assert_eq!(once, messy);
        assert_eq!(twice, once);
    }

    #[test]
    fn test_typed_normalize_repairs_hand_built_cart() {
        let cart = Cart {
            items: vec![
                LineItem {
                    key: String::new(),
                    id: " p1 ".to_string(),
                    qty: 0,
                    variant: Some(Variant::new()),
                },
                LineItem {
                    key: "p1".to_string(),
                    id: "p1".to_string(),
                    qty: 2,
                    variant: None,
                },
                LineItem {
                    key: "ghost".to_string(),
                    id: "".to_string(),
                    qty: 9,
                    variant: None,
                },
            ],
        };

        let normalized = normalize(&cart);
        assert_eq!(normalized.items, vec![LineItem::new("p1", 3, None)]);
    }

    #[test]
    fn test_parse_cart() {
        assert!(parse_cart("{not json").is_err());
        assert!(parse_cart("\"hello\"").unwrap().is_empty());

        let cart = parse_cart(r#"{"items":[{"key":"p1","id":"p1","qty":2}],"version":3}"#).unwrap();
        assert_eq!(cart.items, vec![LineItem::new("p1", 2, None)]);
    }

    #[test]
    fn test_roundtrip_through_json() {
        let mut cart = Cart::new();
        cart.add_item("p1", 2, Some(Variant::new().with("Size", "S")));
        cart.add_item("p2", 1, None);
        let normalized = normalize(&cart);

        let json = serde_json::to_string(&normalized).unwrap();
        assert_eq!(parse_cart(&json).unwrap(), normalized);
    }
}
