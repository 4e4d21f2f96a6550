//! # Transaction Repository
//!
//! Database operations for sale headers and their line items.
//!
//! ## Persistence Order at Checkout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  1. insert(header)          - the sale exists from here on          │
//! │  2. insert_item(line) × N   - frozen snapshots, cascade on delete   │
//! │  3. (engine) stock writes   - per line, best-effort                 │
//! │                                                                     │
//! │  Each call is one statement. If 2 fails after 1 succeeded, the      │
//! │  header is an orphan: the engine signals PartialCommit and the      │
//! │  sale is never shown as confirmed.                                  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use presto_core::{PaymentMethod, Transaction, TransactionItem, TransactionStatus};

const TRANSACTION_COLUMNS: &str = "id, store_id, transaction_number, status, subtotal, \
     discount, discount_type, discount_from_settings, tax, vat, total, paid, \
     change, payment_method, customer_name, customer_phone, notes, created_by, created_at";

const ITEM_COLUMNS: &str = "id, transaction_id, product_id, product_name, product_sku, \
     product_price, quantity, subtotal, created_at";

/// Per-window sales summary (dashboard / end-of-day view).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SalesSummary {
    pub total_sales: i64,
    pub transaction_count: i64,
    pub cash_sales: i64,
    pub non_cash_sales: i64,
    pub average_transaction: i64,
}

/// Repository for transaction database operations.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Inserts a sale header.
    pub async fn insert(&self, trx: &Transaction) -> DbResult<()> {
        debug!(id = %trx.id, number = %trx.transaction_number, "Inserting transaction");

        sqlx::query(
            "INSERT INTO transactions ( \
                 id, store_id, transaction_number, status, subtotal, \
                 discount, discount_type, discount_from_settings, tax, vat, \
                 total, paid, change, payment_method, \
                 customer_name, customer_phone, notes, created_by, created_at \
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, \
                       ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
        )
        .bind(&trx.id)
        .bind(&trx.store_id)
        .bind(&trx.transaction_number)
        .bind(trx.status)
        .bind(trx.subtotal)
        .bind(trx.discount)
        .bind(trx.discount_type)
        .bind(trx.discount_from_settings)
        .bind(trx.tax)
        .bind(trx.vat)
        .bind(trx.total)
        .bind(trx.paid)
        .bind(trx.change)
        .bind(trx.payment_method)
        .bind(&trx.customer_name)
        .bind(&trx.customer_phone)
        .bind(&trx.notes)
        .bind(&trx.created_by)
        .bind(trx.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts one frozen line item.
    ///
    /// ## Snapshot Pattern
    /// Product details (name, sku, price) were copied into the item at
    /// add-to-cart time; the sale history stays intact even if the product
    /// changes or is deleted later.
    pub async fn insert_item(&self, item: &TransactionItem) -> DbResult<()> {
        debug!(transaction_id = %item.transaction_id, product = %item.product_name, "Inserting item");

        sqlx::query(
            "INSERT INTO transaction_items ( \
                 id, transaction_id, product_id, product_name, product_sku, \
                 product_price, quantity, subtotal, created_at \
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&item.id)
        .bind(&item.transaction_id)
        .bind(&item.product_id)
        .bind(&item.product_name)
        .bind(&item.product_sku)
        .bind(item.product_price)
        .bind(item.quantity)
        .bind(item.subtotal)
        .bind(item.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a transaction header by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Transaction>> {
        let trx = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(trx)
    }

    /// Gets all items for a transaction, in insertion order.
    pub async fn get_items(&self, transaction_id: &str) -> DbResult<Vec<TransactionItem>> {
        let items = sqlx::query_as::<_, TransactionItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM transaction_items \
             WHERE transaction_id = ?1 ORDER BY created_at, id"
        ))
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists transactions for a store within a window, newest first.
    pub async fn list_between(
        &self,
        store_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: u32,
    ) -> DbResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions \
             WHERE store_id = ?1 AND created_at >= ?2 AND created_at <= ?3 \
             ORDER BY created_at DESC LIMIT ?4"
        ))
        .bind(store_id)
        .bind(from)
        .bind(to)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Counts transactions recorded for a store within a window.
    ///
    /// Drives the daily sequence of transaction numbers.
    pub async fn count_between(
        &self,
        store_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM transactions \
             WHERE store_id = ?1 AND created_at >= ?2 AND created_at <= ?3",
        )
        .bind(store_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Sums cash-method transaction totals within a window.
    ///
    /// The cash-sales leg of shift reconciliation.
    pub async fn sum_cash_totals_between(
        &self,
        store_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<i64> {
        let total: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(total) FROM transactions \
             WHERE store_id = ?1 AND payment_method = 'cash' \
               AND created_at >= ?2 AND created_at <= ?3",
        )
        .bind(store_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(0))
    }

    /// Computes the per-window sales summary.
    pub async fn summary_between(
        &self,
        store_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<SalesSummary> {
        let rows: Vec<(i64, PaymentMethod)> = sqlx::query_as(
            "SELECT total, payment_method FROM transactions \
             WHERE store_id = ?1 AND created_at >= ?2 AND created_at <= ?3",
        )
        .bind(store_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        let total_sales: i64 = rows.iter().map(|(total, _)| total).sum();
        let cash_sales: i64 = rows
            .iter()
            .filter(|(_, method)| method.is_cash())
            .map(|(total, _)| total)
            .sum();
        let transaction_count = rows.len() as i64;

        Ok(SalesSummary {
            total_sales,
            transaction_count,
            cash_sales,
            non_cash_sales: total_sales - cash_sales,
            average_transaction: if transaction_count > 0 {
                total_sales / transaction_count
            } else {
                0
            },
        })
    }

    /// Marks a completed transaction as returned.
    ///
    /// Conditional on the current status so a concurrent return loses
    /// cleanly instead of double-marking.
    ///
    /// ## Returns
    /// * `Ok(true)` - marked now
    /// * `Ok(false)` - was not in `completed` state (already returned/voided,
    ///   or missing)
    pub async fn mark_returned(&self, id: &str) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE transactions SET status = ?2 WHERE id = ?1 AND status = ?3",
        )
        .bind(id)
        .bind(TransactionStatus::Returned)
        .bind(TransactionStatus::Completed)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Hard-deletes a transaction; items cascade via FK, ledger rows detach.
    ///
    /// ## Returns
    /// * `Ok(true)` - deleted
    /// * `Ok(false)` - no such transaction
    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        debug!(id = %id, "Deleting transaction");

        let result = sqlx::query("DELETE FROM transactions WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}

/// Generates a new transaction ID.
pub fn generate_transaction_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a new transaction item ID.
pub fn generate_item_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
