//! # Error Types
//!
//! Domain-specific error types for cavalry-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  cavalry-core errors (this file)                                       │
//! │  ├── CoreError        - Payload decoding failures                      │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  cavalry-store errors (separate crate)                                 │
//! │  ├── StorageError     - Durable slot failures (quota, I/O)             │
//! │  └── StoreError       - What a failed mutation returns                 │
//! │                                                                         │
//! │  Command errors (cavalry-store::commands)                              │
//! │  └── ApiError         - What the rendering layer sees (serialized)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## What Is NOT an Error
//! A corrupted cart payload never reaches callers of `CartStore::read`: the
//! store logs the [`CoreError`] and falls back to an empty cart. Quantities
//! out of range are clamped, not rejected.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core cart errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A cart or catalog payload is not valid JSON.
    ///
    /// ## When This Occurs
    /// - The durable slot was hand-edited and left truncated
    /// - A catalog data island contains a template rendering error
    #[error("Malformed payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Invalid format (e.g., non-numeric quantity text).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates a Required error for the given field.
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// Creates an InvalidFormat error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
