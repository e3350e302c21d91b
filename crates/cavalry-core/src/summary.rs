//! # Cart Summary
//!
//! The view model the rendering layer draws the cart page from: the cart's
//! line items joined with catalog display data.
//!
//! ```text
//! Cart { items }  ──┐
//!                   ├──► CartSummary::build ──► lines + subtotal + count
//! CatalogIndex ─────┘
//! ```
//!
//! Items whose product is not in the catalog are left out of `lines` and of
//! the subtotal, but still count toward `count` (the badge must agree with
//! [`Cart::total_quantity`]).

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::catalog::CatalogIndex;
use crate::money::Money;
use crate::types::Cart;
use crate::PLACEHOLDER_IMAGE;

/// One rendered row of the cart page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    pub key: String,
    pub id: String,
    pub qty: u32,
    pub title: String,

    /// `Color: Red, Size: M`, empty for products without variants.
    pub variant_label: String,

    /// First catalog image, or the placeholder.
    pub image: String,

    pub unit_price: Money,
    pub line_total: Money,
}

/// Everything the cart page needs in one value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartSummary {
    pub lines: Vec<CartLine>,
    pub subtotal: Money,

    /// Sum of all quantities in the cart.
    #[ts(type = "number")]
    pub count: u64,

    /// True when the cart itself has no items.
    pub is_empty: bool,
}

impl CartSummary {
    /// Joins `cart` with `catalog`.
    pub fn build(cart: &Cart, catalog: &CatalogIndex) -> Self {
        let lines: Vec<CartLine> = cart
            .items
            .iter()
            .filter_map(|item| {
                let product = catalog.get(&item.id)?;
                Some(CartLine {
                    key: item.key.clone(),
                    id: item.id.clone(),
                    qty: item.qty,
                    title: product.title.clone(),
                    variant_label: item
                        .variant
                        .as_ref()
                        .map(|v| v.label())
                        .unwrap_or_default(),
                    image: product
                        .primary_image()
                        .unwrap_or(PLACEHOLDER_IMAGE)
                        .to_string(),
                    unit_price: product.price,
                    line_total: product.price.multiply_quantity(item.qty),
                })
            })
            .collect();

        CartSummary {
            subtotal: lines.iter().map(|line| line.line_total).sum(),
            count: cart.total_quantity(),
            is_empty: cart.is_empty(),
            lines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogProduct;
    use crate::types::Variant;
    use pretty_assertions::assert_eq;

    fn product(id: &str, cents: i64, images: &[&str]) -> CatalogProduct {
        CatalogProduct {
            id: id.to_string(),
            title: format!("Product {}", id),
            slug: id.to_string(),
            sku: None,
            price: Money::from_cents(cents),
            images: images.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_build_summary() {
        let catalog = CatalogIndex::from_products(vec![
            product("tee", 2450, &["/img/tee.jpg"]),
            product("cap", 1200, &[]),
        ]);

        let mut cart = Cart::new();
        cart.add_item("tee", 2, Some(Variant::new().with("Size", "M").with("Color", "Red")));
        cart.add_item("cap", 1, None);

        let summary = CartSummary::build(&cart, &catalog);

        assert_eq!(summary.lines.len(), 2);
        assert_eq!(summary.lines[0].variant_label, "Color: Red, Size: M");
        assert_eq!(summary.lines[0].image, "/img/tee.jpg");
        assert_eq!(summary.lines[0].line_total, Money::from_cents(4900));
        assert_eq!(summary.lines[1].variant_label, "");
        assert_eq!(summary.lines[1].image, PLACEHOLDER_IMAGE);
        assert_eq!(summary.subtotal, Money::from_cents(6100));
        assert_eq!(summary.count, 3);
        assert!(!summary.is_empty);
    }

    #[test]
    fn test_unknown_products_skipped_but_counted() {
        let catalog = CatalogIndex::from_products(vec![product("tee", 1000, &[])]);

        let mut cart = Cart::new();
        cart.add_item("tee", 1, None);
        cart.add_item("discontinued", 4, None);

        let summary = CartSummary::build(&cart, &catalog);
        assert_eq!(summary.lines.len(), 1);
        assert_eq!(summary.subtotal, Money::from_cents(1000));
        assert_eq!(summary.count, 5);
    }

    #[test]
    fn test_empty_cart() {
        let summary = CartSummary::build(&Cart::new(), &CatalogIndex::new());
        assert!(summary.is_empty);
        assert!(summary.lines.is_empty());
        assert_eq!(summary.subtotal, Money::zero());
        assert_eq!(summary.count, 0);
    }
}
