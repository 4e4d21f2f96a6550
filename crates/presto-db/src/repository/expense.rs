//! # Expense Repository
//!
//! Database operations for expenses. Expenses are cash leaving the drawer
//! outside of sales; shift reconciliation subtracts their window sum from
//! the expected closing balance.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use presto_core::Expense;

const EXPENSE_COLUMNS: &str = "id, store_id, category, amount, note, created_by, created_at";

/// Repository for expense database operations.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    /// Creates a new ExpenseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    /// Inserts a new expense.
    pub async fn insert(&self, expense: &Expense) -> DbResult<()> {
        debug!(id = %expense.id, category = %expense.category, amount = expense.amount, "Inserting expense");

        sqlx::query(
            "INSERT INTO expenses (id, store_id, category, amount, note, created_by, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&expense.id)
        .bind(&expense.store_id)
        .bind(&expense.category)
        .bind(expense.amount)
        .bind(&expense.note)
        .bind(&expense.created_by)
        .bind(expense.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Sums expense amounts for a store within a window.
    ///
    /// The expense leg of shift reconciliation.
    pub async fn sum_between(
        &self,
        store_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<i64> {
        let total: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(amount) FROM expenses \
             WHERE store_id = ?1 AND created_at >= ?2 AND created_at <= ?3",
        )
        .bind(store_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(0))
    }

    /// Lists expenses for a store within a window, newest first.
    pub async fn list_between(
        &self,
        store_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<Vec<Expense>> {
        let rows = sqlx::query_as::<_, Expense>(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses \
             WHERE store_id = ?1 AND created_at >= ?2 AND created_at <= ?3 \
             ORDER BY created_at DESC"
        ))
        .bind(store_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Deletes an expense.
    ///
    /// ## Returns
    /// * `Ok(true)` - deleted
    /// * `Ok(false)` - no such expense
    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}

/// Generates a new expense ID.
pub fn generate_expense_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
