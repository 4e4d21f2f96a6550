//! # Audit Sink
//!
//! Fire-and-forget audit logging for every state-changing engine operation.
//!
//! The sink is an external collaborator: it must never block or fail the
//! calling operation. The default implementation writes structured
//! `tracing` events under the `presto::audit` target, which deployments can
//! route to whatever storage they use for audit trails.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::info;

// =============================================================================
// Action Vocabulary
// =============================================================================

/// Audit action tags. Kept as constants so queries over the audit trail
/// match on exact strings.
pub mod actions {
    // Transactions
    pub const TRANSACTION_CREATED: &str = "TRANSACTION_CREATED";
    pub const TRANSACTION_DELETED: &str = "TRANSACTION_DELETED";
    pub const TRANSACTION_RETURNED: &str = "TRANSACTION_RETURNED";
    pub const TRANSACTION_PARTIAL_COMMIT: &str = "TRANSACTION_PARTIAL_COMMIT";

    // Stock
    pub const STOCK_IN: &str = "STOCK_IN";
    pub const STOCK_OUT: &str = "STOCK_OUT";
    pub const STOCK_ADJUSTMENT: &str = "STOCK_ADJUSTMENT";

    // Shifts
    pub const CASH_REGISTER_OPENED: &str = "CASH_REGISTER_OPENED";
    pub const CASH_REGISTER_CLOSED: &str = "CASH_REGISTER_CLOSED";

    // Expenses
    pub const EXPENSE_RECORDED: &str = "EXPENSE_RECORDED";
    pub const EXPENSE_DELETED: &str = "EXPENSE_DELETED";
}

// =============================================================================
// Audit Entry
// =============================================================================

/// One audit record.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub store_id: String,
    pub user_id: Option<String>,
    /// Action tag from [`actions`].
    pub action: &'static str,
    /// Structured detail payload.
    pub details: Value,
    /// ID of the entity this record is about.
    pub related_id: Option<String>,
}

// =============================================================================
// Audit Sink
// =============================================================================

/// Destination for audit records.
///
/// Implementations must be cheap and infallible from the caller's point of
/// view - an audit failure is the sink's problem, never the sale's.
pub trait AuditSink: Send + Sync + fmt::Debug {
    fn record(&self, entry: AuditEntry);
}

/// Audit sink backed by structured tracing events.
#[derive(Debug, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, entry: AuditEntry) {
        info!(
            target: "presto::audit",
            store_id = %entry.store_id,
            user_id = entry.user_id.as_deref().unwrap_or("-"),
            action = entry.action,
            related_id = entry.related_id.as_deref().unwrap_or("-"),
            details = %entry.details,
            "audit"
        );
    }
}

/// Sink that drops everything. For tests.
#[derive(Debug, Default)]
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn record(&self, _entry: AuditEntry) {}
}

/// Convenience constructor for the default sink.
pub fn tracing_sink() -> Arc<dyn AuditSink> {
    Arc::new(TracingAuditSink)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sinks_accept_entries() {
        let entry = AuditEntry {
            store_id: "store-1".to_string(),
            user_id: Some("user-1".to_string()),
            action: actions::TRANSACTION_CREATED,
            details: json!({ "transaction_number": "TRX-20260806-001", "total": 50_000 }),
            related_id: Some("t1".to_string()),
        };

        // must not panic or block
        TracingAuditSink.record(entry.clone());
        NullAuditSink.record(entry);
    }
}
