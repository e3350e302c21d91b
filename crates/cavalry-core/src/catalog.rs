//! # Catalog Index
//!
//! Maps product ids to the display data the cart itself never stores.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Catalog Index States                             │
//! │                                                                         │
//! │  ┌──────────┐  begin_loading()  ┌──────────┐  load_json()  ┌────────┐ │
//! │  │  Empty   │──────────────────►│ Loading  │──────────────►│ Loaded │ │
//! │  └──────────┘                   └──────────┘               └────────┘ │
//! │       │                                                        ▲       │
//! │       └──────────── load_json() / from_products() ────────────┘       │
//! │                                                                         │
//! │  Lookups before Loaded return None. A malformed data island still      │
//! │  ends in Loaded (with no products) so callers do not retry forever.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Input Shape
//! The static site embeds the catalog as a JSON array:
//! ```json
//! [ { "id": "tee", "title": "Classic Tee", "slug": "classic-tee", "sku": "TEE-01",
//!     "price": 24.5, "images": ["/img/tee.jpg"] } ]
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreResult;
use crate::money::Money;

// =============================================================================
// Catalog Product
// =============================================================================

/// Display data for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub sku: Option<String>,
    pub price: Money,
    pub images: Vec<String>,
}

impl CatalogProduct {
    /// Reads a product from one catalog entry.
    ///
    /// Returns `None` when the entry has no usable id. Missing or unparsable
    /// prices read as zero.
    pub fn from_fields(fields: &Map<String, Value>) -> Option<Self> {
        let id = match fields.get("id")? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        if id.is_empty() {
            return None;
        }

        let text = |name: &str| {
            fields
                .get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        let price = match fields.get("price") {
            Some(Value::Number(n)) => Money::parse_decimal(&n.to_string()),
            Some(Value::String(s)) => Money::parse_decimal(s),
            _ => None,
        }
        .unwrap_or_default();

        let images = fields
            .get("images")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Some(CatalogProduct {
            title: text("title").unwrap_or_else(|| id.clone()),
            slug: text("slug").unwrap_or_default(),
            sku: text("sku"),
            price,
            images,
            id,
        })
    }

    /// First image, if any.
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

// =============================================================================
// Catalog Index
// =============================================================================

/// Load state of a [`CatalogIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatalogState {
    /// Nothing requested yet.
    #[default]
    Empty,

    /// A load is in flight.
    Loading,

    /// Products are available (possibly zero of them).
    Loaded,
}

/// Product lookup owned by the rendering layer.
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    state: CatalogState,
    by_id: HashMap<String, CatalogProduct>,
}

impl CatalogIndex {
    /// Creates an empty, not-yet-loaded index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a loaded index from known products.
    pub fn from_products(products: impl IntoIterator<Item = CatalogProduct>) -> Self {
        CatalogIndex {
            state: CatalogState::Loaded,
            by_id: products.into_iter().map(|p| (p.id.clone(), p)).collect(),
        }
    }

    /// Marks a load as started. No-op once loaded.
    pub fn begin_loading(&mut self) {
        if self.state == CatalogState::Empty {
            self.state = CatalogState::Loading;
        }
    }

    /// Loads products from the embedded JSON array.
    ///
    /// ## Returns
    /// - `Ok(n)`: number of products indexed (a non-array payload indexes 0)
    /// - `Err(_)`: the text is not JSON; the index is still `Loaded`, empty
    pub fn load_json(&mut self, text: &str) -> CoreResult<usize> {
        self.by_id.clear();
        self.state = CatalogState::Loaded;

        let value: Value = serde_json::from_str(text)?;
        if let Some(entries) = value.as_array() {
            for product in entries
                .iter()
                .filter_map(Value::as_object)
                .filter_map(CatalogProduct::from_fields)
            {
                self.by_id.insert(product.id.clone(), product);
            }
        }

        Ok(self.by_id.len())
    }

    /// Looks up a product. Always `None` until loaded.
    pub fn get(&self, id: &str) -> Option<&CatalogProduct> {
        self.by_id.get(id)
    }

    pub fn state(&self) -> CatalogState {
        self.state
    }

    pub fn is_loaded(&self) -> bool {
        self.state == CatalogState::Loaded
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"[
        { "id": "tee", "title": "Classic Tee", "slug": "classic-tee", "sku": "TEE-01",
          "price": 24.5, "images": ["/img/tee.jpg", "/img/tee-back.jpg"] },
        { "id": 7, "title": "Cap", "price": "12" },
        { "title": "No id" },
        "garbage"
    ]"#;

    #[test]
    fn test_state_transitions() {
        let mut index = CatalogIndex::new();
        assert_eq!(index.state(), CatalogState::Empty);

        index.begin_loading();
        assert_eq!(index.state(), CatalogState::Loading);
        assert!(index.get("tee").is_none());

        assert_eq!(index.load_json(CATALOG).unwrap(), 2);
        assert_eq!(index.state(), CatalogState::Loaded);

        index.begin_loading();
        assert!(index.is_loaded());
    }

    #[test]
    fn test_products_parsed() {
        let mut index = CatalogIndex::new();
        index.load_json(CATALOG).unwrap();

        let tee = index.get("tee").unwrap();
        assert_eq!(tee.title, "Classic Tee");
        assert_eq!(tee.price, Money::from_cents(2450));
        assert_eq!(tee.sku.as_deref(), Some("TEE-01"));
        assert_eq!(tee.primary_image(), Some("/img/tee.jpg"));

        let cap = index.get("7").unwrap();
        assert_eq!(cap.price, Money::from_cents(1200));
        assert!(cap.images.is_empty());
    }

    #[test]
    fn test_malformed_json_still_loaded() {
        let mut index = CatalogIndex::new();
        assert!(index.load_json("<!-- oops -->").is_err());
        assert!(index.is_loaded());
        assert!(index.is_empty());
    }

    #[test]
    fn test_non_array_loads_nothing() {
        let mut index = CatalogIndex::new();
        assert_eq!(index.load_json(r#"{"id":"tee"}"#).unwrap(), 0);
        assert!(index.is_loaded());
    }
}
