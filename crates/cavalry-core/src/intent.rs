//! # Intents
//!
//! What the rendering layer asks for, expressed as data.
//!
//! ## Intent → Mutation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Intent                   Mutation (given the current cart)             │
//! │  ──────                   ─────────────────────────────────             │
//! │  add(id, qty?, variant?)  Add { qty defaults to 1 }                     │
//! │  increment(key)           SetQty { qty + 1 }                            │
//! │  decrement(key)           SetQty { max(1, qty - 1) }  never removes     │
//! │  setQuantity(key, n)      SetQty { max(1, n) }        row input         │
//! │  remove(key)              Remove                                        │
//! │  clear                    Clear                                         │
//! │                                                                         │
//! │  Row intents on a key that is not in the cart resolve to nothing.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Shape
//! ```json
//! { "type": "add", "productId": "tee", "qty": 2, "variant": { "Size": "M" } }
//! { "type": "decrement", "key": "tee__Size:M" }
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::quantity::RequestedQuantity;
use crate::types::{Cart, Variant};

// =============================================================================
// Cart Intent
// =============================================================================

/// A user action on the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "camelCase")]
#[ts(export)]
pub enum CartIntent {
    /// Add-to-cart button.
    Add {
        #[serde(rename = "productId")]
        product_id: String,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        #[ts(optional)]
        qty: Option<f64>,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        #[ts(optional)]
        variant: Option<Variant>,
    },

    /// `+` button on a cart row.
    Increment { key: String },

    /// `-` button on a cart row.
    Decrement { key: String },

    /// Quantity input on a cart row.
    SetQuantity { key: String, qty: f64 },

    /// Remove button on a cart row.
    Remove { key: String },

    /// Clear cart button.
    Clear,
}

/// A store-level mutation, ready to apply.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Add {
        product_id: String,
        qty: RequestedQuantity,
        variant: Option<Variant>,
    },
    SetQty {
        key: String,
        qty: RequestedQuantity,
    },
    Remove {
        key: String,
    },
    Clear,
}

impl CartIntent {
    /// Resolves this intent against the current cart.
    ///
    /// Returns `None` when a row intent names a key the cart does not hold.
    pub fn resolve(&self, cart: &Cart) -> Option<Mutation> {
        match self {
            CartIntent::Add {
                product_id,
                qty,
                variant,
            } => Some(Mutation::Add {
                product_id: product_id.clone(),
                qty: qty.map(RequestedQuantity::new).unwrap_or_default(),
                variant: variant.clone(),
            }),

            CartIntent::Increment { key } => {
                let item = cart.get(key)?;
                Some(Mutation::SetQty {
                    key: key.clone(),
                    qty: RequestedQuantity::from(u64::from(item.qty) + 1),
                })
            }

            CartIntent::Decrement { key } => {
                let item = cart.get(key)?;
                Some(Mutation::SetQty {
                    key: key.clone(),
                    qty: RequestedQuantity::from(item.qty.saturating_sub(1).max(1)),
                })
            }

            CartIntent::SetQuantity { key, qty } => {
                cart.get(key)?;
                // The row input never removes: blank or zero reads as 1.
                Some(Mutation::SetQty {
                    key: key.clone(),
                    qty: RequestedQuantity::from(RequestedQuantity::new(*qty).for_add()),
                })
            }

            CartIntent::Remove { key } => {
                cart.get(key)?;
                Some(Mutation::Remove { key: key.clone() })
            }

            CartIntent::Clear => Some(Mutation::Clear),
        }
    }
}

// =============================================================================
// Add-to-Cart Form
// =============================================================================

/// Prefix of form fields that carry a variant dimension.
pub const VARIANT_FIELD_PREFIX: &str = "variant:";

/// The add-to-cart form on a product page, read from its submitted fields.
#[derive(Debug, Clone, PartialEq)]
pub struct AddToCartForm {
    pub product_id: String,
    pub quantity: RequestedQuantity,
    pub variant: Option<Variant>,
}

impl AddToCartForm {
    /// Reads the form.
    ///
    /// ## Fields
    /// - `qty`: quantity text; missing or unparsable reads as 1
    /// - `variant:<Name>`: one variant dimension per select; blank values are
    ///   skipped
    ///
    /// Other fields are ignored.
    ///
    /// ## Example
    /// ```rust
    /// use cavalry_core::AddToCartForm;
    ///
    /// let form = AddToCartForm::from_fields(
    ///     "tee",
    ///     [("qty", "2"), ("variant:Size", "M"), ("variant:Color", "Red")],
    /// );
    /// assert_eq!(form.quantity.for_add(), 2);
    /// assert_eq!(form.variant.unwrap().label(), "Color: Red, Size: M");
    /// ```
    pub fn from_fields<I, K, V>(product_id: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut quantity = RequestedQuantity::ONE;
        let mut variant = Variant::new();

        for (name, value) in fields {
            let (name, value) = (name.as_ref(), value.as_ref().trim());

            if name == "qty" {
                let parsed = RequestedQuantity::lenient(value);
                quantity = if parsed.raw().is_finite() {
                    parsed
                } else {
                    RequestedQuantity::ONE
                };
            } else if let Some(dimension) = name.strip_prefix(VARIANT_FIELD_PREFIX) {
                let dimension = dimension.trim();
                if !dimension.is_empty() && !value.is_empty() {
                    variant.insert(dimension, value);
                }
            }
        }

        AddToCartForm {
            product_id: product_id.into(),
            quantity,
            variant: variant.into_non_empty(),
        }
    }

    /// Converts the form into an add mutation.
    pub fn into_mutation(self) -> Mutation {
        Mutation::Add {
            product_id: self.product_id,
            qty: self.quantity,
            variant: self.variant,
        }
    }
}
