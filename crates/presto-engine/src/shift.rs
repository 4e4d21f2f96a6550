//! # Shift Engine
//!
//! Cash-drawer shift lifecycle and reconciliation.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     none → open → closed                            │
//! │                                                                     │
//! │  open_shift(opening_balance)                                        │
//! │     ├── an open shift already exists → return IT, not an error      │
//! │     ├── INSERT hits the partial unique index (racing open)          │
//! │     │       → re-fetch and return the winner                        │
//! │     └── otherwise → new open shift                                  │
//! │                                                                     │
//! │  close_shift(actual, notes)                                         │
//! │     ├── expected = opening + Σ cash sales − Σ expenses              │
//! │     │              over [start_time, now]                           │
//! │     └── conditional UPDATE (status = open): terminal, exactly once  │
//! │                                                                     │
//! │  variance = actual − expected, derivable from the stored row.       │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, info};

use presto_core::validation::validate_amount;
use presto_core::{CoreError, Shift, ShiftStatus};
use presto_db::repository::shift::generate_shift_id;
use presto_db::Database;

use crate::audit::{actions, AuditEntry, AuditSink};
use crate::context::SaleContext;
use crate::error::{EngineError, EngineResult};

/// Orchestrates shift open/close and expected-balance reconciliation.
#[derive(Debug, Clone)]
pub struct ShiftEngine {
    db: Database,
    audit: Arc<dyn AuditSink>,
}

impl ShiftEngine {
    /// Creates a new ShiftEngine.
    pub fn new(db: Database, audit: Arc<dyn AuditSink>) -> Self {
        ShiftEngine { db, audit }
    }

    /// Opens a shift for the context's (store, user).
    ///
    /// Duplicate opens - including two racing ones - resolve to the single
    /// existing open shift instead of erroring blindly.
    pub async fn open_shift(
        &self,
        ctx: &SaleContext,
        opening_balance: i64,
        notes: Option<String>,
    ) -> EngineResult<Shift> {
        ctx.validate()?;
        validate_amount("opening_balance", opening_balance).map_err(CoreError::from)?;

        let shifts = self.db.shifts();

        // fast path: someone already opened for this (store, user)
        if let Some(existing) = shifts.find_open(&ctx.store_id, &ctx.user_id).await? {
            debug!(shift_id = %existing.id, "Open shift already exists, returning it");
            return Ok(existing);
        }

        let shift = Shift {
            id: generate_shift_id(),
            store_id: ctx.store_id.clone(),
            user_id: ctx.user_id.clone(),
            start_time: Utc::now(),
            end_time: None,
            opening_balance,
            closing_balance_actual: None,
            closing_balance_expected: None,
            status: ShiftStatus::Open,
            notes,
        };

        match shifts.insert_open(&shift).await {
            Ok(()) => {
                info!(shift_id = %shift.id, opening_balance, "Shift opened");
                self.audit.record(AuditEntry {
                    store_id: ctx.store_id.clone(),
                    user_id: Some(ctx.user_id.clone()),
                    action: actions::CASH_REGISTER_OPENED,
                    details: json!({ "opening_balance": opening_balance }),
                    related_id: Some(shift.id.clone()),
                });
                Ok(shift)
            }
            Err(err) if err.is_unique_violation() => {
                // lost the race: recover the winner instead of failing
                debug!("Shift open raced; re-fetching existing open shift");
                shifts
                    .find_open(&ctx.store_id, &ctx.user_id)
                    .await?
                    .ok_or_else(|| EngineError::ConflictRetry {
                        entity: "Shift".to_string(),
                        id: format!("{}/{}", ctx.store_id, ctx.user_id),
                    })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Returns the open shift for the context's (store, user), if any.
    pub async fn fetch_active(&self, ctx: &SaleContext) -> EngineResult<Option<Shift>> {
        ctx.validate()?;
        Ok(self
            .db
            .shifts()
            .find_open(&ctx.store_id, &ctx.user_id)
            .await?)
    }

    /// Computes the expected drawer balance for a shift:
    /// `opening_balance + Σ cash sales − Σ expenses` over
    /// `[start_time, end]`. `end` defaults to now for a still-open shift.
    pub async fn expected_balance(
        &self,
        shift: &Shift,
        end: Option<DateTime<Utc>>,
    ) -> EngineResult<i64> {
        let end = end.or(shift.end_time).unwrap_or_else(Utc::now);

        let cash_sales = self
            .db
            .transactions()
            .sum_cash_totals_between(&shift.store_id, shift.start_time, end)
            .await?;
        let expenses = self
            .db
            .expenses()
            .sum_between(&shift.store_id, shift.start_time, end)
            .await?;

        Ok(shift.opening_balance + cash_sales - expenses)
    }

    /// Closes the active shift, recording the counted balance next to the
    /// reconciled expectation.
    pub async fn close_shift(
        &self,
        ctx: &SaleContext,
        actual_balance: i64,
        notes: Option<String>,
    ) -> EngineResult<Shift> {
        ctx.validate()?;
        validate_amount("closing_balance", actual_balance).map_err(CoreError::from)?;

        let shifts = self.db.shifts();
        let shift = shifts
            .find_open(&ctx.store_id, &ctx.user_id)
            .await?
            .ok_or_else(|| {
                EngineError::not_found("Open shift", format!("{}/{}", ctx.store_id, ctx.user_id))
            })?;

        let now = Utc::now();
        let expected = self.expected_balance(&shift, Some(now)).await?;

        let closed = shifts
            .close(&shift.id, now, actual_balance, expected, notes.as_deref())
            .await?;
        if !closed {
            // raced with another close between fetch and update
            return Err(EngineError::ConflictRetry {
                entity: "Shift".to_string(),
                id: shift.id,
            });
        }

        let closed_shift = shifts
            .get_by_id(&shift.id)
            .await?
            .ok_or_else(|| EngineError::not_found("Shift", &shift.id))?;

        info!(
            shift_id = %closed_shift.id,
            actual = actual_balance,
            expected,
            variance = closed_shift.variance().unwrap_or(0),
            "Shift closed"
        );

        self.audit.record(AuditEntry {
            store_id: ctx.store_id.clone(),
            user_id: Some(ctx.user_id.clone()),
            action: actions::CASH_REGISTER_CLOSED,
            details: json!({
                "closing_balance_actual": actual_balance,
                "closing_balance_expected": expected,
                "variance": actual_balance - expected,
            }),
            related_id: Some(closed_shift.id.clone()),
        });

        Ok(closed_shift)
    }

    /// Updates the mutable fields (opening balance, notes) of a shift that
    /// has not yet closed.
    pub async fn update_shift(
        &self,
        ctx: &SaleContext,
        shift_id: &str,
        opening_balance: Option<i64>,
        notes: Option<String>,
    ) -> EngineResult<Shift> {
        ctx.validate()?;
        if let Some(balance) = opening_balance {
            validate_amount("opening_balance", balance).map_err(CoreError::from)?;
        }

        let shifts = self.db.shifts();
        let updated = shifts
            .update_open(shift_id, opening_balance, notes.as_deref())
            .await?;
        if !updated {
            return Err(EngineError::not_found("Open shift", shift_id));
        }

        shifts
            .get_by_id(shift_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Shift", shift_id))
    }

    /// Shift history for the context's store within a window, newest first.
    pub async fn list_shifts(
        &self,
        ctx: &SaleContext,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> EngineResult<Vec<Shift>> {
        ctx.validate()?;
        Ok(self.db.shifts().list_between(&ctx.store_id, from, to).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{
        insert_cash_sale, insert_expense, insert_sale_with_method, test_ctx, test_db, test_sink,
    };
    use presto_core::PaymentMethod;

    fn engine(db: &Database) -> ShiftEngine {
        ShiftEngine::new(db.clone(), test_sink())
    }

    #[tokio::test]
    async fn test_open_then_fetch_active() {
        let db = test_db().await;
        let shifts = engine(&db);

        let opened = shifts
            .open_shift(&test_ctx(), 100_000, Some("morning".to_string()))
            .await
            .unwrap();
        assert!(opened.is_open());
        assert_eq!(opened.opening_balance, 100_000);

        let active = shifts.fetch_active(&test_ctx()).await.unwrap().unwrap();
        assert_eq!(active.id, opened.id);
    }

    #[tokio::test]
    async fn test_duplicate_open_returns_existing_shift() {
        let db = test_db().await;
        let shifts = engine(&db);

        let first = shifts.open_shift(&test_ctx(), 100_000, None).await.unwrap();
        let second = shifts.open_shift(&test_ctx(), 999_999, None).await.unwrap();

        // same shift, original opening balance - no duplicate created
        assert_eq!(second.id, first.id);
        assert_eq!(second.opening_balance, 100_000);
    }

    #[tokio::test]
    async fn test_expected_balance_reconciliation() {
        let db = test_db().await;
        let shifts = engine(&db);

        let shift = shifts.open_shift(&test_ctx(), 100_000, None).await.unwrap();

        // cash sales totalling 250000 inside the window
        insert_cash_sale(&db, "t1", "store-1", 150_000).await;
        insert_cash_sale(&db, "t2", "store-1", 100_000).await;
        // non-cash sales don't touch the drawer
        insert_sale_with_method(&db, "t3", "store-1", 500_000, PaymentMethod::Transfer).await;
        // expenses totalling 30000
        insert_expense(&db, "e1", "store-1", 20_000).await;
        insert_expense(&db, "e2", "store-1", 10_000).await;

        let expected = shifts.expected_balance(&shift, None).await.unwrap();
        assert_eq!(expected, 100_000 + 250_000 - 30_000);
    }

    #[tokio::test]
    async fn test_close_records_both_balances_and_variance() {
        let db = test_db().await;
        let shifts = engine(&db);

        shifts.open_shift(&test_ctx(), 100_000, None).await.unwrap();
        insert_cash_sale(&db, "t1", "store-1", 250_000).await;
        insert_expense(&db, "e1", "store-1", 30_000).await;

        let closed = shifts
            .close_shift(&test_ctx(), 315_000, Some("drawer short".to_string()))
            .await
            .unwrap();

        assert_eq!(closed.status, ShiftStatus::Closed);
        assert_eq!(closed.closing_balance_actual, Some(315_000));
        assert_eq!(closed.closing_balance_expected, Some(320_000));
        assert_eq!(closed.variance(), Some(-5_000));
        assert!(closed.end_time.is_some());

        // no active shift remains; closing again is a NotFound
        assert!(shifts.fetch_active(&test_ctx()).await.unwrap().is_none());
        let err = shifts.close_shift(&test_ctx(), 0, None).await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_reopen_after_close() {
        let db = test_db().await;
        let shifts = engine(&db);

        let first = shifts.open_shift(&test_ctx(), 100_000, None).await.unwrap();
        shifts.close_shift(&test_ctx(), 100_000, None).await.unwrap();

        let second = shifts.open_shift(&test_ctx(), 50_000, None).await.unwrap();
        assert_ne!(second.id, first.id);
        assert_eq!(second.opening_balance, 50_000);
    }

    #[tokio::test]
    async fn test_update_only_while_open() {
        let db = test_db().await;
        let shifts = engine(&db);

        let shift = shifts.open_shift(&test_ctx(), 100_000, None).await.unwrap();

        let updated = shifts
            .update_shift(&test_ctx(), &shift.id, Some(120_000), None)
            .await
            .unwrap();
        assert_eq!(updated.opening_balance, 120_000);

        shifts.close_shift(&test_ctx(), 120_000, None).await.unwrap();
        let err = shifts
            .update_shift(&test_ctx(), &shift.id, Some(1), None)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_negative_opening_balance_rejected() {
        let db = test_db().await;
        let shifts = engine(&db);

        let err = shifts
            .open_shift(&test_ctx(), -1, None)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Core(_)));
    }
}
