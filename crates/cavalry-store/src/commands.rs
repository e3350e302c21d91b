//! # Cart Commands
//!
//! The facade the rendering layer calls: plain functions taking the store and
//! catalog, returning serializable responses or [`ApiError`].
//!
//! ## Cart Page Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Page Flow                                       │
//! │                                                                         │
//! │  Product page                         Cart page                         │
//! │  ────────────                         ─────────                         │
//! │  form submit                          + / - / input / remove / clear    │
//! │      │                                      │                           │
//! │      ▼                                      ▼                           │
//! │  add_to_cart(form) ──┐          dispatch(intent) ──┐                   │
//! │                      ▼                             ▼                   │
//! │              CartStore mutation ◄──── intent.resolve(cart)              │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │        CartResponse { items, summary } ──► re-render, badge update     │
//! │                                                                         │
//! │  get_cart() ──► CartResponse (read only)                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use cavalry_core::validation::validate_product_id;
use cavalry_core::{
    AddToCartForm, Cart, CartIntent, CartSummary, CatalogIndex, LineItem, ValidationError,
};

use crate::error::{StorageError, StoreError};
use crate::store::CartStore;

// =============================================================================
// API Error
// =============================================================================

/// Error returned from cart commands.
///
/// ## Serialization
/// ```json
/// { "code": "NOT_FOUND", "message": "Product not found: tee" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for command responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Product is not in the catalog
    NotFound,

    /// Input validation failed
    ValidationError,

    /// The catalog has not finished loading
    CatalogUnavailable,

    /// The cart could not be saved. The rendering layer shows a one-time
    /// notice and keeps working from the last good cart.
    StorageError,

    /// Internal error
    Internal,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn catalog_unavailable() -> Self {
        ApiError::new(ErrorCode::CatalogUnavailable, "Catalog is still loading")
    }
}

/// Converts store errors to API errors.
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Storage(StorageError::QuotaExceeded { .. }) => ApiError::new(
                ErrorCode::StorageError,
                "Cart storage is full; the change was not saved",
            ),
            StoreError::Storage(e) => {
                error!("Cart write failed: {}", e);
                ApiError::new(ErrorCode::StorageError, "Cart could not be saved")
            }
            StoreError::Serialize(e) => {
                error!("Cart serialization failed: {}", e);
                ApiError::new(ErrorCode::Internal, "Cart could not be saved")
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// =============================================================================
// Responses
// =============================================================================

/// Cart contents plus the rendered summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub items: Vec<LineItem>,
    pub summary: CartSummary,
}

impl CartResponse {
    pub fn build(cart: Cart, catalog: &CatalogIndex) -> Self {
        CartResponse {
            summary: CartSummary::build(&cart, catalog),
            items: cart.items,
        }
    }
}

// =============================================================================
// Commands
// =============================================================================

/// Returns the current cart.
pub fn get_cart(store: &CartStore, catalog: &CatalogIndex) -> CartResponse {
    debug!("get_cart command");
    CartResponse::build(store.read(), catalog)
}

/// Adds a product from the add-to-cart form.
///
/// ## Errors
/// - `VALIDATION_ERROR`: blank product id
/// - `CATALOG_UNAVAILABLE`: catalog not loaded yet
/// - `NOT_FOUND`: product not in the catalog
/// - `STORAGE_ERROR`: the cart could not be saved
pub fn add_to_cart(
    store: &CartStore,
    catalog: &CatalogIndex,
    form: AddToCartForm,
) -> Result<CartResponse, ApiError> {
    debug!(product_id = %form.product_id, "add_to_cart command");

    check_product(catalog, &form.product_id)?;
    let cart = store.apply(form.into_mutation())?;
    Ok(CartResponse::build(cart, catalog))
}

/// Applies a cart intent.
///
/// Row intents on keys the cart no longer holds return the current cart
/// unchanged.
pub fn dispatch(
    store: &CartStore,
    catalog: &CatalogIndex,
    intent: &CartIntent,
) -> Result<CartResponse, ApiError> {
    debug!(?intent, "dispatch command");

    if let CartIntent::Add { product_id, .. } = intent {
        check_product(catalog, product_id)?;
    }

    let cart = store.read();
    let cart = match intent.resolve(&cart) {
        Some(mutation) => store.apply(mutation)?,
        None => cart,
    };
    Ok(CartResponse::build(cart, catalog))
}

fn check_product(catalog: &CatalogIndex, product_id: &str) -> Result<(), ApiError> {
    let id = validate_product_id(product_id)?;

    if !catalog.is_loaded() {
        return Err(ApiError::catalog_unavailable());
    }
    if catalog.get(id).is_none() {
        return Err(ApiError::not_found("Product", id));
    }
    Ok(())
}
