//! # Error Types
//!
//! Domain-specific error types for kasir-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  kasir-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  kasir-db errors (separate crate)                                      │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── CheckoutError    - CoreError | DbError from one unit of work      │
//! │                                                                         │
//! │  kasir-api errors (in app)                                             │
//! │  └── ApiError         - What the frontend sees ({"error": "..."})      │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CheckoutError → ApiError          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A missing or inactive discount is deliberately absent from this file:
//! it resolves to a zero discount rather than an error.

use thiserror::Error;

use crate::types::TransactionStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Every variant aborts the surrounding unit of work; none of them is ever
/// surfaced next to a partial commit.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The cart contained no lines.
    #[error("Cart cannot be empty")]
    EmptyCart,

    /// A cart line references an item id that does not exist.
    #[error("Item {0} not found")]
    ItemNotFound(i64),

    /// Not enough stock to reserve the requested quantity.
    ///
    /// ## User Workflow
    /// ```text
    /// Cart line (Kopi Susu, qty: 5)
    ///      │
    ///      ▼
    /// Reserve stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { name: "Kopi Susu", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// UI shows: "Stok kurang untuk: Kopi Susu"
    /// ```
    #[error("Stok kurang untuk: {name}")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// The transaction id does not resolve.
    #[error("Transaksi tidak ditemukan: {0}")]
    TransactionNotFound(i64),

    /// The requested status change is not in the transition table.
    #[error("Cannot change transaction status from {from} to {to}")]
    InvalidTransition {
        from: TransactionStatus,
        to: TransactionStatus,
    },

    /// Validation error (wraps ValidationError).
    #[error("{0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any unit of work begins.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g. a malformed date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_names_the_item() {
        let err = CoreError::InsufficientStock {
            name: "Kopi Susu".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(err.to_string(), "Stok kurang untuk: Kopi Susu");
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = CoreError::InvalidTransition {
            from: TransactionStatus::Success,
            to: TransactionStatus::Failed,
        };
        assert_eq!(
            err.to_string(),
            "Cannot change transaction status from SUCCESS to FAILED"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::TooLong {
            field: "note".to_string(),
            max: 500,
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.to_string(), "note must be at most 500 characters");
    }
}
