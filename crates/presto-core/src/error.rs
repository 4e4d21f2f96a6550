//! # Error Types
//!
//! Domain-specific error types for presto-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                 │
//! │                                                                     │
//! │  presto-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule violations                    │
//! │  └── ValidationError  - Input validation failures                   │
//! │                                                                     │
//! │  presto-db errors (separate crate)                                  │
//! │  └── DbError          - Database operation failures                 │
//! │                                                                     │
//! │  presto-engine errors (separate crate)                              │
//! │  └── EngineError      - Orchestration outcomes (wraps the above)    │
//! │                                                                     │
//! │  Flow: ValidationError → CoreError → EngineError → caller           │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product name, amounts, etc.)
//! 3. Errors are enum variants, never String
//! 4. Validation errors abort before any state is mutated

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business rule violations.
///
/// These abort an operation before anything is persisted and are surfaced
/// directly to the caller.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A required piece of context is missing (no store, no user, empty cart).
    #[error("Precondition failed: {reason}")]
    PreconditionFailed { reason: String },

    /// Requested quantity exceeds the stock level known to the cart.
    ///
    /// ## When This Occurs
    /// - Adding a stock-tracked product beyond its last-observed stock
    /// - Raising a line quantity past the level captured when the line
    ///   was created or last updated
    ///
    /// This is an advisory check against a snapshot, not a lock; the
    /// authoritative check happens at the stock write.
    #[error("Insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// Cash tendered does not cover the total.
    ///
    /// Only raised for cash payments; other methods settle externally and
    /// the paid-covers-total rule is relaxed for them.
    #[error("Insufficient payment: total {total}, paid {paid}")]
    InsufficientPayment { total: i64, paid: i64 },

    /// A stock-out would drive quantity on hand below zero.
    #[error("Stock for {name} cannot go negative: on hand {current}, requested out {requested}")]
    NegativeStock {
        name: String,
        current: i64,
        requested: i64,
    },

    /// Product is not in the cart.
    #[error("Product {0} is not in the cart")]
    NotInCart(String),

    /// Cart has exceeded maximum allowed distinct lines.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a PreconditionFailed with the given reason.
    pub fn precondition(reason: impl Into<String>) -> Self {
        CoreError::PreconditionFailed {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when user input doesn't meet requirements, before business
/// logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID).
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
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            name: "Kopi Susu 250ml".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Kopi Susu 250ml: available 3, requested 5"
        );

        let err = CoreError::InsufficientPayment {
            total: 50_000,
            paid: 40_000,
        };
        assert_eq!(err.to_string(), "Insufficient payment: total 50000, paid 40000");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
