//! # Stock Ledger Service
//!
//! The single write path for quantity on hand. Every stock change goes
//! through a guarded (optimistic) product write followed immediately by an
//! append to the stock movement ledger.
//!
//! ## The Write Unit
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    One Stock Change                                 │
//! │                                                                     │
//! │  loop (≤ MAX_STOCK_WRITE_ATTEMPTS):                                 │
//! │      read product            → stock_before                         │
//! │      compute stock_after     → reject NegativeStock before writing  │
//! │      UPDATE … WHERE stock = stock_before                            │
//! │          applied?  ──► append ledger row (before/after as applied)  │
//! │          conflict? ──► re-read and retry                            │
//! │  exhausted → ConflictRetry                                          │
//! │                                                                     │
//! │  The write goes first so the before/after recorded in the ledger    │
//! │  are the values that actually applied; a ledger append failure      │
//! │  right after is the one tolerated (logged, surfaced) gap.           │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error, warn};

use presto_core::validation::{validate_amount, validate_quantity};
use presto_core::{CoreError, MovementType, StockMovement, MAX_STOCK_WRITE_ATTEMPTS};
use presto_db::repository::stock_movement::generate_movement_id;
use presto_db::Database;

use crate::audit::{actions, AuditEntry, AuditSink};
use crate::context::SaleContext;
use crate::error::{EngineError, EngineResult};

// =============================================================================
// Stock Warning
// =============================================================================

/// A non-fatal stock failure attached to an otherwise-successful result.
#[derive(Debug, Clone, Serialize)]
pub struct StockWarning {
    pub product_id: String,
    pub product_name: String,
    pub detail: String,
}

// =============================================================================
// Shared Write Helpers (used by checkout and reversal too)
// =============================================================================

/// Applies a signed delta to a product's stock with the guarded-write loop.
///
/// Returns the `(stock_before, stock_after)` pair that actually applied.
/// Rejects with `NegativeStock` before writing if the delta would push the
/// level below zero.
pub(crate) async fn shift_stock(
    db: &Database,
    product_id: &str,
    delta: i64,
) -> EngineResult<(i64, i64)> {
    let products = db.products();

    for attempt in 1..=MAX_STOCK_WRITE_ATTEMPTS {
        let product = products
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Product", product_id))?;

        let before = product.stock;
        let after = before + delta;

        if after < 0 {
            return Err(CoreError::NegativeStock {
                name: product.name,
                current: before,
                requested: -delta,
            }
            .into());
        }

        if products
            .update_stock_guarded(product_id, before, after)
            .await?
        {
            return Ok((before, after));
        }

        debug!(product_id, attempt, "Stock write conflicted, re-reading");
    }

    Err(EngineError::ConflictRetry {
        entity: "Product".to_string(),
        id: product_id.to_string(),
    })
}

/// Sets a product's stock to an absolute level with the guarded-write loop.
///
/// Returns the `(stock_before, stock_after)` pair that actually applied.
pub(crate) async fn set_stock(
    db: &Database,
    product_id: &str,
    new_level: i64,
) -> EngineResult<(i64, i64)> {
    let products = db.products();

    for attempt in 1..=MAX_STOCK_WRITE_ATTEMPTS {
        let product = products
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Product", product_id))?;

        let before = product.stock;
        if before == new_level {
            return Ok((before, new_level));
        }

        if products
            .update_stock_guarded(product_id, before, new_level)
            .await?
        {
            return Ok((before, new_level));
        }

        debug!(product_id, attempt, "Stock write conflicted, re-reading");
    }

    Err(EngineError::ConflictRetry {
        entity: "Product".to_string(),
        id: product_id.to_string(),
    })
}

/// Builds a ledger row for a change that just applied.
pub(crate) fn movement_row(
    product_id: &str,
    transaction_id: Option<&str>,
    movement_type: MovementType,
    quantity: i64,
    stock_before: i64,
    stock_after: i64,
    notes: Option<String>,
    created_by: &str,
) -> StockMovement {
    StockMovement {
        id: generate_movement_id(),
        product_id: product_id.to_string(),
        transaction_id: transaction_id.map(str::to_string),
        movement_type,
        quantity,
        stock_before,
        stock_after,
        notes,
        created_by: Some(created_by.to_string()),
        created_at: Utc::now(),
    }
}

// =============================================================================
// Stock Adjustment Request
// =============================================================================

/// A manual stock change as entered on the inventory screen.
#[derive(Debug, Clone)]
pub struct StockAdjustment {
    pub product_id: String,
    pub movement: MovementType,
    /// For `in`/`out`: the amount moved (positive).
    /// For `adjustment`: the new absolute stock level.
    pub quantity: i64,
    pub note: Option<String>,
}

// =============================================================================
// Stock Service
// =============================================================================

/// Manual stock operations: receive stock, book stock out, correct counts.
#[derive(Debug, Clone)]
pub struct StockService {
    db: Database,
    audit: Arc<dyn AuditSink>,
}

impl StockService {
    /// Creates a new StockService.
    pub fn new(db: Database, audit: Arc<dyn AuditSink>) -> Self {
        StockService { db, audit }
    }

    /// Applies a manual stock change and appends its ledger entry.
    ///
    /// ## Semantics
    /// - `in`: stock_after = stock_before + quantity
    /// - `out`: stock_after = stock_before − quantity;
    ///   rejected with `NegativeStock` (nothing written) if that goes below 0
    /// - `adjustment`: quantity is the new absolute level; the ledger row
    ///   records `|new − old|` and notes the derived direction
    ///
    /// Returns the appended ledger entry.
    pub async fn adjust(
        &self,
        ctx: &SaleContext,
        request: StockAdjustment,
    ) -> EngineResult<StockMovement> {
        ctx.validate()?;

        let (before, after, recorded_quantity, notes) = match request.movement {
            MovementType::In => {
                validate_quantity(request.quantity).map_err(CoreError::from)?;
                let (before, after) =
                    shift_stock(&self.db, &request.product_id, request.quantity).await?;
                (before, after, request.quantity, request.note.clone())
            }
            MovementType::Out => {
                validate_quantity(request.quantity).map_err(CoreError::from)?;
                let (before, after) =
                    shift_stock(&self.db, &request.product_id, -request.quantity).await?;
                (before, after, request.quantity, request.note.clone())
            }
            MovementType::Adjustment => {
                validate_amount("stock level", request.quantity).map_err(CoreError::from)?;
                let (before, after) =
                    set_stock(&self.db, &request.product_id, request.quantity).await?;

                // Direction of the correction goes into the note for audit.
                let direction = if after > before {
                    "in"
                } else if after < before {
                    "out"
                } else {
                    "unchanged"
                };
                let notes = match &request.note {
                    Some(note) => format!("Adjustment ({direction}): {note}"),
                    None => format!("Adjustment ({direction})"),
                };
                (before, after, (after - before).abs(), Some(notes))
            }
        };

        let movement = movement_row(
            &request.product_id,
            None,
            request.movement,
            recorded_quantity,
            before,
            after,
            notes,
            &ctx.user_id,
        );

        if let Err(err) = self.db.stock_movements().insert(&movement).await {
            // Stock already moved; a missing ledger row is surfaced, not hidden.
            error!(
                product_id = %request.product_id,
                error = %err,
                "Stock written but ledger append failed"
            );
            return Err(err.into());
        }

        self.audit.record(AuditEntry {
            store_id: ctx.store_id.clone(),
            user_id: Some(ctx.user_id.clone()),
            action: match request.movement {
                MovementType::In => actions::STOCK_IN,
                MovementType::Out => actions::STOCK_OUT,
                MovementType::Adjustment => actions::STOCK_ADJUSTMENT,
            },
            details: json!({
                "quantity": movement.quantity,
                "stock_before": movement.stock_before,
                "stock_after": movement.stock_after,
            }),
            related_id: Some(request.product_id.clone()),
        });

        Ok(movement)
    }

    /// Ledger history for one product, newest first.
    pub async fn history(
        &self,
        product_id: &str,
        limit: u32,
    ) -> EngineResult<Vec<StockMovement>> {
        Ok(self
            .db
            .stock_movements()
            .list_for_product(product_id, limit)
            .await?)
    }
}

// Warn-level helper shared by checkout/reversal when a line's stock step
// fails but the flow continues.
pub(crate) fn warn_stock_step(
    product_id: &str,
    product_name: &str,
    stage: &str,
    err: &EngineError,
) -> StockWarning {
    warn!(
        product_id,
        product_name,
        stage,
        error = %err,
        "Stock step failed; continuing with remaining lines"
    );
    StockWarning {
        product_id: product_id.to_string(),
        product_name: product_name.to_string(),
        detail: format!("{stage}: {err}"),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{seed_product, test_ctx, test_db, test_sink};
    use presto_core::MovementType;

    #[tokio::test]
    async fn test_stock_in_appends_ledger_row() {
        let db = test_db().await;
        seed_product(&db, "p1", 10_000, true, 10).await;
        let service = StockService::new(db.clone(), test_sink());

        let movement = service
            .adjust(
                &test_ctx(),
                StockAdjustment {
                    product_id: "p1".to_string(),
                    movement: MovementType::In,
                    quantity: 5,
                    note: Some("Restock".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(movement.stock_before, 10);
        assert_eq!(movement.stock_after, 15);
        assert_eq!(movement.quantity, 5);

        assert_eq!(db.products().get_by_id("p1").await.unwrap().unwrap().stock, 15);
        assert_eq!(service.history("p1", 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stock_out_beyond_hand_is_rejected_unchanged() {
        let db = test_db().await;
        seed_product(&db, "p1", 10_000, true, 3).await;
        let service = StockService::new(db.clone(), test_sink());

        let err = service
            .adjust(
                &test_ctx(),
                StockAdjustment {
                    product_id: "p1".to_string(),
                    movement: MovementType::Out,
                    quantity: 4,
                    note: None,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EngineError::Core(CoreError::NegativeStock {
                current: 3,
                requested: 4,
                ..
            })
        ));

        // nothing moved, nothing appended
        assert_eq!(db.products().get_by_id("p1").await.unwrap().unwrap().stock, 3);
        assert!(service.history("p1", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stock_out_to_exactly_zero_is_fine() {
        let db = test_db().await;
        seed_product(&db, "p1", 10_000, true, 3).await;
        let service = StockService::new(db.clone(), test_sink());

        let movement = service
            .adjust(
                &test_ctx(),
                StockAdjustment {
                    product_id: "p1".to_string(),
                    movement: MovementType::Out,
                    quantity: 3,
                    note: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(movement.stock_after, 0);
    }

    #[tokio::test]
    async fn test_adjustment_records_absolute_level_and_direction() {
        let db = test_db().await;
        seed_product(&db, "p1", 10_000, true, 10).await;
        let service = StockService::new(db.clone(), test_sink());

        let movement = service
            .adjust(
                &test_ctx(),
                StockAdjustment {
                    product_id: "p1".to_string(),
                    movement: MovementType::Adjustment,
                    quantity: 4,
                    note: Some("Opname count".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(movement.movement_type, MovementType::Adjustment);
        assert_eq!(movement.stock_before, 10);
        assert_eq!(movement.stock_after, 4);
        // recorded quantity is |new − old|
        assert_eq!(movement.quantity, 6);
        assert!(movement.notes.as_deref().unwrap().contains("(out)"));

        assert_eq!(db.products().get_by_id("p1").await.unwrap().unwrap().stock, 4);
    }

    #[tokio::test]
    async fn test_adjustment_unchanged_level() {
        let db = test_db().await;
        seed_product(&db, "p1", 10_000, true, 10).await;
        let service = StockService::new(db.clone(), test_sink());

        let movement = service
            .adjust(
                &test_ctx(),
                StockAdjustment {
                    product_id: "p1".to_string(),
                    movement: MovementType::Adjustment,
                    quantity: 10,
                    note: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(movement.quantity, 0);
        assert!(movement.notes.as_deref().unwrap().contains("unchanged"));
    }

    #[tokio::test]
    async fn test_adjust_unknown_product() {
        let db = test_db().await;
        let service = StockService::new(db, test_sink());

        let err = service
            .adjust(
                &test_ctx(),
                StockAdjustment {
                    product_id: "ghost".to_string(),
                    movement: MovementType::In,
                    quantity: 1,
                    note: None,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::NotFound { .. }));
    }
}
