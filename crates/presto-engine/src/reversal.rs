//! # Reversal Engine
//!
//! Undoes a committed sale: restores stock for every surviving, tracked
//! product and appends compensating ledger entries, then either deletes the
//! transaction or marks it returned.
//!
//! ## Compensation, Not Rollback
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  For each TransactionItem (product still exists AND tracks stock):  │
//! │      re-read current stock                                          │
//! │      guarded write: stock + quantity                                │
//! │      append ledger row (in, qty, note: "Return of TRX-…")           │
//! │      failure? → log, warn, CONTINUE with remaining items            │
//! │                                                                     │
//! │  delete_transaction: … then DELETE header (items cascade,           │
//! │                      ledger rows detach)                            │
//! │  return_transaction: check status marker FIRST, restore, then flip  │
//! │                      status - a second return sees the marker and   │
//! │                      does not double-restore                        │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use presto_core::{MovementType, Transaction, TransactionItem};
use presto_db::Database;

use crate::audit::{actions, AuditEntry, AuditSink};
use crate::context::SaleContext;
use crate::error::{EngineError, EngineResult};
use crate::stock::{movement_row, shift_stock, warn_stock_step, StockWarning};

// =============================================================================
// Reversal Report
// =============================================================================

/// What a reversal actually did.
#[derive(Debug, Clone, Serialize)]
pub struct ReversalReport {
    pub transaction_id: String,
    pub transaction_number: String,
    /// Lines whose stock was restored with a compensating ledger entry.
    pub restored_lines: usize,
    /// Per-line restoration failures (logged, non-blocking).
    pub warnings: Vec<StockWarning>,
    /// True when the transaction was already returned and nothing was
    /// restored again.
    pub already_returned: bool,
}

// =============================================================================
// Reversal Engine
// =============================================================================

/// Deletes or returns committed transactions.
#[derive(Debug, Clone)]
pub struct ReversalEngine {
    db: Database,
    audit: Arc<dyn AuditSink>,
}

impl ReversalEngine {
    /// Creates a new ReversalEngine.
    pub fn new(db: Database, audit: Arc<dyn AuditSink>) -> Self {
        ReversalEngine { db, audit }
    }

    /// Deletes a transaction after restoring stock for its items.
    ///
    /// Items cascade with the header; ledger rows detach and keep the
    /// audit trail. Already-returned transactions delete without a second
    /// restoration.
    pub async fn delete_transaction(
        &self,
        ctx: &SaleContext,
        id: &str,
    ) -> EngineResult<ReversalReport> {
        ctx.validate()?;

        let transactions = self.db.transactions();
        let transaction = transactions
            .get_by_id(id)
            .await?
            .ok_or_else(|| EngineError::not_found("Transaction", id))?;
        let items = transactions.get_items(id).await?;

        let already_returned = transaction.is_returned();
        let (restored_lines, mut warnings) = if already_returned {
            // stock already came back when the return was processed
            (0, Vec::new())
        } else {
            self.restore_items(ctx, &transaction, &items).await
        };

        if !transactions.delete(id).await? {
            // raced with another deletion after we restored
            warn!(transaction_id = %id, "Transaction vanished during deletion");
            warnings.push(StockWarning {
                product_id: String::new(),
                product_name: String::new(),
                detail: "transaction was deleted concurrently; verify stock via the ledger"
                    .to_string(),
            });
        }

        info!(
            transaction_id = %id,
            number = %transaction.transaction_number,
            restored_lines,
            warnings = warnings.len(),
            "Transaction deleted"
        );

        self.audit.record(AuditEntry {
            store_id: ctx.store_id.clone(),
            user_id: Some(ctx.user_id.clone()),
            action: actions::TRANSACTION_DELETED,
            details: json!({
                "transaction_number": transaction.transaction_number,
                "restored_lines": restored_lines,
            }),
            related_id: Some(id.to_string()),
        });

        Ok(ReversalReport {
            transaction_id: id.to_string(),
            transaction_number: transaction.transaction_number,
            restored_lines,
            warnings,
            already_returned,
        })
    }

    /// Marks a transaction returned after restoring stock for its items.
    ///
    /// Idempotent: the status marker is checked before restoring, so
    /// calling return twice never double-restores stock.
    pub async fn return_transaction(
        &self,
        ctx: &SaleContext,
        id: &str,
    ) -> EngineResult<ReversalReport> {
        ctx.validate()?;

        let transactions = self.db.transactions();
        let transaction = transactions
            .get_by_id(id)
            .await?
            .ok_or_else(|| EngineError::not_found("Transaction", id))?;

        if transaction.is_returned() {
            info!(transaction_id = %id, "Transaction already returned, nothing to restore");
            return Ok(ReversalReport {
                transaction_id: id.to_string(),
                transaction_number: transaction.transaction_number,
                restored_lines: 0,
                warnings: Vec::new(),
                already_returned: true,
            });
        }

        let items = transactions.get_items(id).await?;
        let (restored_lines, mut warnings) = self.restore_items(ctx, &transaction, &items).await;

        if !transactions.mark_returned(id).await? {
            // Someone else flipped the status between our check and now.
            // Their restoration plus ours may have doubled up; the ledger
            // has both entries for reconciliation.
            warn!(
                transaction_id = %id,
                "Lost the return race after restoring; reconcile stock via the ledger"
            );
            warnings.push(StockWarning {
                product_id: String::new(),
                product_name: String::new(),
                detail: "concurrent return detected; verify stock via the ledger".to_string(),
            });
        }

        info!(
            transaction_id = %id,
            number = %transaction.transaction_number,
            restored_lines,
            warnings = warnings.len(),
            "Transaction returned"
        );

        self.audit.record(AuditEntry {
            store_id: ctx.store_id.clone(),
            user_id: Some(ctx.user_id.clone()),
            action: actions::TRANSACTION_RETURNED,
            details: json!({
                "transaction_number": transaction.transaction_number,
                "restored_lines": restored_lines,
            }),
            related_id: Some(id.to_string()),
        });

        Ok(ReversalReport {
            transaction_id: id.to_string(),
            transaction_number: transaction.transaction_number,
            restored_lines,
            warnings,
            already_returned: false,
        })
    }

    /// Restores stock for every item whose product still exists and tracks
    /// stock. Per-item failures are collected, never propagated - one bad
    /// line must not block the others.
    async fn restore_items(
        &self,
        ctx: &SaleContext,
        transaction: &Transaction,
        items: &[TransactionItem],
    ) -> (usize, Vec<StockWarning>) {
        let products = self.db.products();
        let mut restored = 0;
        let mut warnings = Vec::new();

        for item in items {
            let Some(product_id) = item.product_id.as_deref() else {
                // product hard-deleted before the FK detached; nothing to restore
                continue;
            };

            let product = match products.get_by_id(product_id).await {
                Ok(Some(product)) => product,
                Ok(None) => continue, // product gone, stock no longer exists
                Err(err) => {
                    warnings.push(warn_stock_step(
                        product_id,
                        &item.product_name,
                        "product read during restore",
                        &err.into(),
                    ));
                    continue;
                }
            };

            if !product.has_stock {
                continue;
            }

            match shift_stock(&self.db, product_id, item.quantity).await {
                Ok((before, after)) => {
                    let movement = movement_row(
                        product_id,
                        Some(&transaction.id),
                        MovementType::In,
                        item.quantity,
                        before,
                        after,
                        Some(format!("Return of {}", transaction.transaction_number)),
                        &ctx.user_id,
                    );
                    match self.db.stock_movements().insert(&movement).await {
                        Ok(()) => restored += 1,
                        Err(err) => {
                            warnings.push(warn_stock_step(
                                product_id,
                                &item.product_name,
                                "ledger append after restore",
                                &err.into(),
                            ));
                        }
                    }
                }
                Err(err) => {
                    warnings.push(warn_stock_step(
                        product_id,
                        &item.product_name,
                        "stock restore",
                        &err,
                    ));
                }
            }
        }

        (restored, warnings)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::CheckoutEngine;
    use crate::testutil::{seed_product, test_ctx, test_db, test_sink};
    use presto_core::{Cart, CheckoutPayment, TransactionStatus};

    async fn committed_sale(db: &Database, products: &[(&str, i64, i64)], paid: i64) -> String {
        let checkout = CheckoutEngine::new(db.clone(), test_sink());
        let mut cart = Cart::new();
        for (id, _price, qty) in products {
            let product = db.products().get_by_id(id).await.unwrap().unwrap();
            cart.add(&product, *qty).unwrap();
        }
        let outcome = checkout
            .checkout(&test_ctx(), &mut cart, CheckoutPayment::cash(paid))
            .await
            .unwrap();
        outcome.sale().transaction.id.clone()
    }

    #[tokio::test]
    async fn test_delete_restores_stock_round_trip() {
        let db = test_db().await;
        seed_product(&db, "a", 25_000, true, 10).await;
        seed_product(&db, "b", 10_000, true, 7).await;
        let reversal = ReversalEngine::new(db.clone(), test_sink());

        let trx_id =
            committed_sale(&db, &[("a", 25_000, 2), ("b", 10_000, 3)], 80_000).await;
        assert_eq!(db.products().get_by_id("a").await.unwrap().unwrap().stock, 8);
        assert_eq!(db.products().get_by_id("b").await.unwrap().unwrap().stock, 4);

        let report = reversal
            .delete_transaction(&test_ctx(), &trx_id)
            .await
            .unwrap();

        // round-trip law: stock back to pre-checkout values
        assert_eq!(report.restored_lines, 2);
        assert!(report.warnings.is_empty());
        assert_eq!(db.products().get_by_id("a").await.unwrap().unwrap().stock, 10);
        assert_eq!(db.products().get_by_id("b").await.unwrap().unwrap().stock, 7);

        // header and items are gone
        assert!(db.transactions().get_by_id(&trx_id).await.unwrap().is_none());
        assert!(db.transactions().get_items(&trx_id).await.unwrap().is_empty());

        // the ledger keeps both sides of the story, detached from the sale
        let ledger = db.stock_movements().list_for_product("a", 10).await.unwrap();
        assert_eq!(ledger.len(), 2);
        assert!(ledger.iter().all(|m| m.transaction_id.is_none()));
        let restore = ledger
            .iter()
            .find(|m| m.movement_type == MovementType::In)
            .unwrap();
        assert_eq!(restore.stock_before, 8);
        assert_eq!(restore.stock_after, 10);
        assert!(restore.notes.as_deref().unwrap().starts_with("Return of TRX-"));
    }

    #[tokio::test]
    async fn test_return_marks_and_restores_once() {
        let db = test_db().await;
        seed_product(&db, "a", 25_000, true, 10).await;
        let reversal = ReversalEngine::new(db.clone(), test_sink());

        let trx_id = committed_sale(&db, &[("a", 25_000, 2)], 50_000).await;
        assert_eq!(db.products().get_by_id("a").await.unwrap().unwrap().stock, 8);

        let report = reversal
            .return_transaction(&test_ctx(), &trx_id)
            .await
            .unwrap();
        assert!(!report.already_returned);
        assert_eq!(report.restored_lines, 1);
        assert_eq!(db.products().get_by_id("a").await.unwrap().unwrap().stock, 10);

        let trx = db.transactions().get_by_id(&trx_id).await.unwrap().unwrap();
        assert_eq!(trx.status, TransactionStatus::Returned);

        // idempotence: the marker is checked before restoring
        let second = reversal
            .return_transaction(&test_ctx(), &trx_id)
            .await
            .unwrap();
        assert!(second.already_returned);
        assert_eq!(second.restored_lines, 0);
        assert_eq!(db.products().get_by_id("a").await.unwrap().unwrap().stock, 10);
    }

    #[tokio::test]
    async fn test_delete_after_return_does_not_double_restore() {
        let db = test_db().await;
        seed_product(&db, "a", 25_000, true, 10).await;
        let reversal = ReversalEngine::new(db.clone(), test_sink());

        let trx_id = committed_sale(&db, &[("a", 25_000, 2)], 50_000).await;
        reversal.return_transaction(&test_ctx(), &trx_id).await.unwrap();
        assert_eq!(db.products().get_by_id("a").await.unwrap().unwrap().stock, 10);

        let report = reversal
            .delete_transaction(&test_ctx(), &trx_id)
            .await
            .unwrap();
        assert!(report.already_returned);
        assert_eq!(report.restored_lines, 0);
        assert_eq!(db.products().get_by_id("a").await.unwrap().unwrap().stock, 10);
    }

    #[tokio::test]
    async fn test_missing_product_skipped_others_restored() {
        let db = test_db().await;
        seed_product(&db, "a", 25_000, true, 10).await;
        seed_product(&db, "b", 10_000, false, 0).await; // untracked
        let reversal = ReversalEngine::new(db.clone(), test_sink());

        let trx_id =
            committed_sale(&db, &[("a", 25_000, 1), ("b", 10_000, 1)], 35_000).await;

        let report = reversal
            .delete_transaction(&test_ctx(), &trx_id)
            .await
            .unwrap();

        // only the tracked line restores; the untracked one is silently skipped
        assert_eq!(report.restored_lines, 1);
        assert!(report.warnings.is_empty());
        assert_eq!(db.products().get_by_id("a").await.unwrap().unwrap().stock, 10);
    }

    #[tokio::test]
    async fn test_reversal_of_unknown_transaction() {
        let db = test_db().await;
        let reversal = ReversalEngine::new(db, test_sink());

        let err = reversal
            .delete_transaction(&test_ctx(), "ghost")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));

        // return of an unknown id behaves the same way
    }
}
