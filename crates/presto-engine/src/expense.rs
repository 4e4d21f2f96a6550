//! # Expense Service
//!
//! Records cash leaving the drawer outside of sales. Every expense recorded
//! during a shift's open window subtracts from that shift's expected
//! closing balance.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::info;

use presto_core::error::ValidationError;
use presto_core::{CoreError, Expense};
use presto_db::repository::expense::generate_expense_id;
use presto_db::Database;

use crate::audit::{actions, AuditEntry, AuditSink};
use crate::context::SaleContext;
use crate::error::{EngineError, EngineResult};

/// Records and manages expenses.
#[derive(Debug, Clone)]
pub struct ExpenseService {
    db: Database,
    audit: Arc<dyn AuditSink>,
}

impl ExpenseService {
    /// Creates a new ExpenseService.
    pub fn new(db: Database, audit: Arc<dyn AuditSink>) -> Self {
        ExpenseService { db, audit }
    }

    /// Records an expense for the context's store.
    pub async fn record(
        &self,
        ctx: &SaleContext,
        category: impl Into<String>,
        amount: i64,
        note: Option<String>,
    ) -> EngineResult<Expense> {
        ctx.validate()?;

        if amount <= 0 {
            return Err(CoreError::Validation(ValidationError::MustBePositive {
                field: "amount".to_string(),
            })
            .into());
        }

        let expense = Expense {
            id: generate_expense_id(),
            store_id: ctx.store_id.clone(),
            category: category.into(),
            amount,
            note,
            created_by: Some(ctx.user_id.clone()),
            created_at: Utc::now(),
        };

        self.db.expenses().insert(&expense).await?;

        info!(expense_id = %expense.id, amount, "Expense recorded");
        self.audit.record(AuditEntry {
            store_id: ctx.store_id.clone(),
            user_id: Some(ctx.user_id.clone()),
            action: actions::EXPENSE_RECORDED,
            details: json!({ "category": expense.category, "amount": amount }),
            related_id: Some(expense.id.clone()),
        });

        Ok(expense)
    }

    /// Lists expenses for the context's store within a window, newest first.
    pub async fn list(
        &self,
        ctx: &SaleContext,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> EngineResult<Vec<Expense>> {
        ctx.validate()?;
        Ok(self.db.expenses().list_between(&ctx.store_id, from, to).await?)
    }

    /// Deletes an expense.
    pub async fn delete(&self, ctx: &SaleContext, id: &str) -> EngineResult<()> {
        ctx.validate()?;

        if !self.db.expenses().delete(id).await? {
            return Err(EngineError::not_found("Expense", id));
        }

        self.audit.record(AuditEntry {
            store_id: ctx.store_id.clone(),
            user_id: Some(ctx.user_id.clone()),
            action: actions::EXPENSE_DELETED,
            details: json!({}),
            related_id: Some(id.to_string()),
        });

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{test_ctx, test_db, test_sink};

    #[tokio::test]
    async fn test_record_and_list() {
        let db = test_db().await;
        let service = ExpenseService::new(db.clone(), test_sink());

        let expense = service
            .record(&test_ctx(), "operational", 20_000, Some("Ice refill".to_string()))
            .await
            .unwrap();
        assert_eq!(expense.amount, 20_000);
        assert_eq!(expense.created_by.as_deref(), Some("user-1"));

        let from = Utc::now() - chrono::Duration::hours(1);
        let to = Utc::now() + chrono::Duration::hours(1);
        assert_eq!(service.list(&test_ctx(), from, to).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_zero_or_negative_amount_rejected() {
        let db = test_db().await;
        let service = ExpenseService::new(db, test_sink());

        assert!(service.record(&test_ctx(), "misc", 0, None).await.is_err());
        assert!(service.record(&test_ctx(), "misc", -5, None).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let db = test_db().await;
        let service = ExpenseService::new(db, test_sink());

        let err = service.delete(&test_ctx(), "ghost").await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
    }
}
