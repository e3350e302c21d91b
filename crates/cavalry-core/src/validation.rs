//! # Validation Module
//!
//! Input validation for the few values that are rejected rather than
//! clamped.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Command facade (cavalry-store::commands)                     │
//! │  └── validate_product_id → ApiError for the rendering layer            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: CartStore                                                     │
//! │  └── empty product id → silent no-op, quantities clamped               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Normalization                                                 │
//! │  └── repairs whatever reached storage anyway                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates a product id and returns it trimmed.
///
/// ## Example
/// ```rust
/// use cavalry_core::validation::validate_product_id;
///
/// assert_eq!(validate_product_id("  tee ").unwrap(), "tee");
/// assert!(validate_product_id("   ").is_err());
/// ```
pub fn validate_product_id(id: &str) -> ValidationResult<&str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ValidationError::required("product id"));
    }
    Ok(id)
}

/// Validates a durable slot name.
///
/// ## Rules
/// - Must not be empty
/// - Only ASCII letters, digits, `-`, `_` and `.` (the name doubles as a file
///   name for file-backed storage)
/// - Must end in a version suffix `-v<digits>`, e.g. `cav-cart-v1`
pub fn validate_slot_name(name: &str) -> ValidationResult<()> {
    if name.is_empty() {
        return Err(ValidationError::required("slot"));
    }

    if name.starts_with('.')
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(ValidationError::invalid_format(
            "slot",
            "must contain only letters, numbers, '-', '_' and '.' and not start with '.'",
        ));
    }

    let versioned = name
        .rsplit_once("-v")
        .map(|(stem, version)| {
            !stem.is_empty()
                && !version.is_empty()
                && version.chars().all(|c| c.is_ascii_digit())
        })
        .unwrap_or(false);

    if !versioned {
        return Err(ValidationError::invalid_format(
            "slot",
            "must end with a version suffix such as '-v1'",
        ));
    }

    Ok(())
}
