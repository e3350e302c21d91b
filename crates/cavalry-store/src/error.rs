//! # Store Error Types
//!
//! Error types for durable storage, the cart store and configuration.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  Backend failure (io::Error, quota, unavailable)                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StorageError ← Adds slot context and categorization                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreError (CartStore mutations) ← only writes surface errors         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (commands) ← Serialized for the rendering layer              │
//! │                                                                         │
//! │  Reads never reach this chain: a failed read is an empty cart.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use cavalry_core::ValidationError;

// =============================================================================
// Storage Errors
// =============================================================================

/// Durable storage failures.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The write would exceed the backend's byte quota.
    ///
    /// ## When This Occurs
    /// - Browser-style storage quotas (the memory backend models these)
    /// - A configured `quota_bytes` on the file backend
    #[error("Quota exceeded writing '{slot}': {needed} bytes needed, limit is {limit}")]
    QuotaExceeded {
        slot: String,
        needed: usize,
        limit: usize,
    },

    /// Storage is switched off or cannot be reached.
    ///
    /// ## When This Occurs
    /// - Private browsing modes that disable durable storage
    /// - Data directory missing and not creatable
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Slot name rejected by validation.
    #[error("Invalid slot name: {0}")]
    InvalidSlot(#[from] ValidationError),

    /// File system error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Creates a QuotaExceeded error.
    pub fn quota_exceeded(slot: impl Into<String>, needed: usize, limit: usize) -> Self {
        StorageError::QuotaExceeded {
            slot: slot.into(),
            needed,
            limit,
        }
    }

    /// Creates an Unavailable error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        StorageError::Unavailable(reason.into())
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

// =============================================================================
// Store Errors
// =============================================================================

/// Errors surfaced by [`crate::CartStore`] mutations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Writing the slot failed; the mutation did not happen.
    #[error("Failed to persist cart: {0}")]
    Storage(#[from] StorageError),

    /// The cart could not be serialized.
    #[error("Failed to serialize cart: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Config Errors
// =============================================================================

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A setting holds a value outside its allowed range.
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// Neither an explicit path nor a platform config dir is available.
    #[error("No config path available")]
    NoConfigPath,

    /// Opening the configured storage backend failed.
    #[error("Failed to open storage: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for config operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_message() {
        let err = StorageError::quota_exceeded("cav-cart-v1", 120, 64);
        assert_eq!(
            err.to_string(),
            "Quota exceeded writing 'cav-cart-v1': 120 bytes needed, limit is 64"
        );
    }

    #[test]
    fn test_storage_into_store_error() {
        let err: StoreError = StorageError::unavailable("disabled").into();
        assert!(matches!(err, StoreError::Storage(StorageError::Unavailable(_))));
        assert_eq!(
            err.to_string(),
            "Failed to persist cart: Storage unavailable: disabled"
        );
    }
}
