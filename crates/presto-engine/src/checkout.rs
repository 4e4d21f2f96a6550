//! # Checkout Engine
//!
//! Turns a cart into a committed sale: totals, transaction number, header,
//! frozen line items, and per-line stock decrements with ledger entries.
//!
//! ## The Checkout Saga
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Checkout Steps                                 │
//! │                                                                     │
//! │  1. Preconditions      ctx valid, cart non-empty     ── abort       │
//! │  2. Price              discounts, tax, vat, change   ── abort       │
//! │  3. Cash check         change < 0 → Insufficient     ── abort       │
//! │     ───────────── nothing persisted above this line ─────────────   │
//! │  4. Number             count query, or fallback      ── never fails │
//! │  5. Header INSERT      the sale exists from here     ── abort       │
//! │  6. Item INSERTs       one per line                  ── PartialCommit│
//! │  7. Stock per line     guarded write + ledger row    ── warning     │
//! │  8. Clear cart         header + items are confirmed                 │
//! │                                                                     │
//! │  Steps are independent statements: there is no multi-row            │
//! │  transaction to lean on. Step 7 failures never roll anything back   │
//! │  and never abort sibling lines - they surface as warnings on a      │
//! │  PartiallyCommitted outcome.                                        │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::{error, info};

use presto_core::pricing::price_sale;
use presto_core::{
    Cart, CheckoutPayment, MovementType, Transaction, TransactionItem, TransactionStatus,
    TransactionWithItems,
};
use presto_db::repository::transaction::{generate_item_id, generate_transaction_id};
use presto_db::Database;

use crate::audit::{actions, AuditEntry, AuditSink};
use crate::context::SaleContext;
use crate::error::{EngineError, EngineResult};
use crate::numbering::allocate_transaction_number;
use crate::stock::{movement_row, shift_stock, warn_stock_step, StockWarning};

// =============================================================================
// Checkout Outcome
// =============================================================================

/// The result of a checkout that committed.
///
/// Partial success is explicit, not an exception: stock-side failures ride
/// along as warnings next to the committed sale. The abort case is the
/// `Err` side of [`CheckoutEngine::checkout`].
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CheckoutOutcome {
    /// Everything applied: header, items, every stock decrement and ledger
    /// append.
    Committed { sale: TransactionWithItems },

    /// The sale committed but one or more stock side effects did not;
    /// the cashier sees success plus a stock reconciliation warning.
    PartiallyCommitted {
        sale: TransactionWithItems,
        warnings: Vec<StockWarning>,
    },
}

impl CheckoutOutcome {
    /// The committed sale, whichever variant.
    pub fn sale(&self) -> &TransactionWithItems {
        match self {
            CheckoutOutcome::Committed { sale } => sale,
            CheckoutOutcome::PartiallyCommitted { sale, .. } => sale,
        }
    }

    /// Stock warnings (empty when fully committed).
    pub fn warnings(&self) -> &[StockWarning] {
        match self {
            CheckoutOutcome::Committed { .. } => &[],
            CheckoutOutcome::PartiallyCommitted { warnings, .. } => warnings,
        }
    }

    /// True when any stock side effect is pending reconciliation.
    pub fn is_partial(&self) -> bool {
        matches!(self, CheckoutOutcome::PartiallyCommitted { .. })
    }
}

// =============================================================================
// Checkout Engine
// =============================================================================

/// Orchestrates cart → committed sale.
#[derive(Debug, Clone)]
pub struct CheckoutEngine {
    db: Database,
    audit: Arc<dyn AuditSink>,
}

impl CheckoutEngine {
    /// Creates a new CheckoutEngine.
    pub fn new(db: Database, audit: Arc<dyn AuditSink>) -> Self {
        CheckoutEngine { db, audit }
    }

    /// Commits the cart as a sale.
    ///
    /// On success the cart is cleared and the hydrated transaction is
    /// returned, possibly with stock warnings. On any `Err` before the
    /// header insert, nothing was persisted; `Err(PartialCommit)` means the
    /// header exists but the sale must not be presented as confirmed.
    pub async fn checkout(
        &self,
        ctx: &SaleContext,
        cart: &mut Cart,
        payment: CheckoutPayment,
    ) -> EngineResult<CheckoutOutcome> {
        // -- Steps 1-3: validate and price; abort with no side effects ------
        ctx.validate()?;

        if cart.is_empty() {
            return Err(EngineError::precondition("cart is empty"));
        }

        let totals = price_sale(cart.subtotal(), &payment)?;

        // -- Step 4: allocate the display number -----------------------------
        let now = Utc::now();
        let number =
            allocate_transaction_number(&self.db.transactions(), &ctx.store_id, now).await;

        // -- Step 5: persist the header --------------------------------------
        let transaction = Transaction {
            id: generate_transaction_id(),
            store_id: ctx.store_id.clone(),
            transaction_number: number.clone(),
            status: TransactionStatus::Completed,
            subtotal: totals.subtotal,
            discount: totals.discount,
            discount_type: totals.discount_type,
            discount_from_settings: totals.discount_from_settings,
            tax: totals.tax,
            vat: totals.vat,
            total: totals.total,
            paid: totals.paid,
            change: totals.change,
            payment_method: payment.method,
            customer_name: payment.customer_name.clone(),
            customer_phone: payment.customer_phone.clone(),
            notes: payment.notes.clone(),
            created_by: ctx.user_id.clone(),
            created_at: now,
        };

        let transactions = self.db.transactions();
        transactions.insert(&transaction).await?;

        // -- Step 6: persist the frozen line items ---------------------------
        // A failure here orphans the header: surface PartialCommit for manual
        // reconciliation instead of confirming the sale.
        let mut items = Vec::with_capacity(cart.lines.len());
        for line in &cart.lines {
            let item = TransactionItem {
                id: generate_item_id(),
                transaction_id: transaction.id.clone(),
                product_id: Some(line.product_id.clone()),
                product_name: line.product_name.clone(),
                product_sku: line.product_sku.clone(),
                product_price: line.product_price,
                quantity: line.quantity,
                subtotal: line.subtotal(),
                created_at: now,
            };

            if let Err(err) = transactions.insert_item(&item).await {
                error!(
                    transaction_id = %transaction.id,
                    product_id = %line.product_id,
                    error = %err,
                    "Item persistence failed after header commit"
                );
                self.audit.record(AuditEntry {
                    store_id: ctx.store_id.clone(),
                    user_id: Some(ctx.user_id.clone()),
                    action: actions::TRANSACTION_PARTIAL_COMMIT,
                    details: json!({ "transaction_number": number, "error": err.to_string() }),
                    related_id: Some(transaction.id.clone()),
                });
                return Err(EngineError::PartialCommit {
                    transaction_id: transaction.id.clone(),
                    detail: format!("item persistence failed after header commit: {err}"),
                });
            }

            items.push(item);
        }

        // -- Step 7: stock decrement + ledger append per tracked line --------
        // Each line is independent; failures are warnings, not rollbacks.
        let mut warnings = Vec::new();
        for line in cart.lines.iter().filter(|l| l.has_stock) {
            match shift_stock(&self.db, &line.product_id, -line.quantity).await {
                Ok((before, after)) => {
                    let movement = movement_row(
                        &line.product_id,
                        Some(&transaction.id),
                        MovementType::Out,
                        line.quantity,
                        before,
                        after,
                        Some(format!("Sale {number}")),
                        &ctx.user_id,
                    );
                    if let Err(err) = self.db.stock_movements().insert(&movement).await {
                        warnings.push(warn_stock_step(
                            &line.product_id,
                            &line.product_name,
                            "ledger append after stock write",
                            &err.into(),
                        ));
                    }
                }
                Err(err) => {
                    warnings.push(warn_stock_step(
                        &line.product_id,
                        &line.product_name,
                        "stock decrement",
                        &err,
                    ));
                }
            }
        }

        // -- Step 8: the sale is confirmed; release the cart -----------------
        cart.clear();

        info!(
            transaction_id = %transaction.id,
            number = %number,
            total = totals.total,
            items = items.len(),
            warnings = warnings.len(),
            "Sale committed"
        );

        self.audit.record(AuditEntry {
            store_id: ctx.store_id.clone(),
            user_id: Some(ctx.user_id.clone()),
            action: actions::TRANSACTION_CREATED,
            details: json!({
                "transaction_number": number,
                "total": totals.total,
                "paid": totals.paid,
                "change": totals.change,
                "items": items.len(),
            }),
            related_id: Some(transaction.id.clone()),
        });

        let sale = TransactionWithItems { transaction, items };

        if warnings.is_empty() {
            Ok(CheckoutOutcome::Committed { sale })
        } else {
            Ok(CheckoutOutcome::PartiallyCommitted { sale, warnings })
        }
    }

    /// Fetches a committed sale with its items.
    pub async fn get_sale(&self, id: &str) -> EngineResult<TransactionWithItems> {
        let transactions = self.db.transactions();
        let transaction = transactions
            .get_by_id(id)
            .await?
            .ok_or_else(|| EngineError::not_found("Transaction", id))?;
        let items = transactions.get_items(id).await?;

        Ok(TransactionWithItems { transaction, items })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
