//! # Engine Error Types
//!
//! Caller-facing error kinds for the orchestration layer.
//!
//! ## Propagation Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Validation errors (InsufficientPayment, NegativeStock,             │
//! │  PreconditionFailed) abort BEFORE any mutation.                     │
//! │                                                                     │
//! │  Partial failures DURING a multi-step flow (a line's stock update   │
//! │  after the sale committed, one item's restoration during reversal)  │
//! │  are captured per step, logged, and surfaced as warnings beside an  │
//! │  otherwise-successful result - never silently swallowed, never      │
//! │  aborting sibling steps.                                            │
//! │                                                                     │
//! │  PartialCommit is the one mid-flow abort: the header persisted but  │
//! │  its items did not, so the sale must not be shown as confirmed.     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use presto_core::CoreError;
use presto_db::DbError;

/// Errors surfaced by the engines.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Business rule violation from presto-core
    /// (InsufficientStock, InsufficientPayment, NegativeStock, ...).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Referenced transaction/product/shift does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The transaction header persisted but a dependent write did not.
    /// The sale is orphaned for manual reconciliation, not confirmed.
    #[error("Transaction {transaction_id} partially committed: {detail}")]
    PartialCommit {
        transaction_id: String,
        detail: String,
    },

    /// Optimistic concurrency lost too many rounds; the caller should
    /// retry the whole operation.
    #[error("Concurrent update on {entity} {id}, retry the operation")]
    ConflictRetry { entity: String, id: String },

    /// The backing store cannot be reached.
    #[error("Backing store unreachable: {0}")]
    Unreachable(String),

    /// Any other storage failure.
    #[error(transparent)]
    Db(DbError),
}

impl EngineError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        EngineError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a PreconditionFailed (via the core error kind).
    pub fn precondition(reason: impl Into<String>) -> Self {
        EngineError::Core(CoreError::precondition(reason))
    }
}

/// Map storage failures onto caller-facing kinds:
/// connection-level faults become `Unreachable`, missing rows `NotFound`,
/// everything else stays a storage error.
impl From<DbError> for EngineError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => EngineError::NotFound { entity, id },
            DbError::ConnectionFailed(msg) => EngineError::Unreachable(msg),
            DbError::PoolExhausted => {
                EngineError::Unreachable("connection pool exhausted".to_string())
            }
            other => EngineError::Db(other),
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_error_mapping() {
        let err: EngineError = DbError::ConnectionFailed("refused".to_string()).into();
        assert!(matches!(err, EngineError::Unreachable(_)));

        let err: EngineError = DbError::PoolExhausted.into();
        assert!(matches!(err, EngineError::Unreachable(_)));

        let err: EngineError = DbError::not_found("Shift", "sh1").into();
        assert!(matches!(err, EngineError::NotFound { .. }));

        let err: EngineError = DbError::QueryFailed("syntax".to_string()).into();
        assert!(matches!(err, EngineError::Db(_)));
    }

    #[test]
    fn test_precondition_helper() {
        let err = EngineError::precondition("cart is empty");
        assert_eq!(err.to_string(), "Precondition failed: cart is empty");
    }
}
