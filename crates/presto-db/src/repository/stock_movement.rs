//! # Stock Movement Repository
//!
//! The append-only stock ledger.
//!
//! Every successful stock write appends exactly one row here, in the same
//! logical operation, recording the before/after quantities and the cause.
//! Rows are never updated or deleted; reversals append compensating `in`
//! entries instead, and deleted transactions detach (`ON DELETE SET NULL`)
//! rather than take their ledger history with them.

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use presto_core::StockMovement;

const MOVEMENT_COLUMNS: &str = "id, product_id, transaction_id, type, quantity, \
     stock_before, stock_after, notes, created_by, created_at";

/// Repository for the stock movement ledger.
#[derive(Debug, Clone)]
pub struct StockMovementRepository {
    pool: SqlitePool,
}

impl StockMovementRepository {
    /// Creates a new StockMovementRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockMovementRepository { pool }
    }

    /// Appends one ledger entry.
    pub async fn insert(&self, movement: &StockMovement) -> DbResult<()> {
        debug!(
            product_id = %movement.product_id,
            movement_type = ?movement.movement_type,
            quantity = movement.quantity,
            stock_before = movement.stock_before,
            stock_after = movement.stock_after,
            "Appending stock movement"
        );

        sqlx::query(
            "INSERT INTO stock_movements ( \
                 id, product_id, transaction_id, type, quantity, \
                 stock_before, stock_after, notes, created_by, created_at \
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&movement.id)
        .bind(&movement.product_id)
        .bind(&movement.transaction_id)
        .bind(movement.movement_type)
        .bind(movement.quantity)
        .bind(movement.stock_before)
        .bind(movement.stock_after)
        .bind(&movement.notes)
        .bind(&movement.created_by)
        .bind(movement.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Lists ledger entries for a product, newest first.
    pub async fn list_for_product(
        &self,
        product_id: &str,
        limit: u32,
    ) -> DbResult<Vec<StockMovement>> {
        let rows = sqlx::query_as::<_, StockMovement>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements \
             WHERE product_id = ?1 \
             ORDER BY created_at DESC, id DESC LIMIT ?2"
        ))
        .bind(product_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Lists ledger entries caused by a transaction (sale or reversal).
    pub async fn list_for_transaction(
        &self,
        transaction_id: &str,
    ) -> DbResult<Vec<StockMovement>> {
        let rows = sqlx::query_as::<_, StockMovement>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements \
             WHERE transaction_id = ?1 \
             ORDER BY created_at, id"
        ))
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

/// Generates a new stock movement ID.
pub fn generate_movement_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Utc;
    use presto_core::{MovementType, Product};

    async fn seed_product(db: &Database, id: &str, stock: i64) {
        db.products()
            .insert(&Product {
                id: id.to_string(),
                store_id: "store-1".to_string(),
                name: format!("Product {}", id),
                sku: None,
                price: 10_000,
                buy_price: 0,
                has_stock: true,
                stock,
                min_stock: 0,
                unit: None,
                is_active: true,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .await
            .unwrap();
    }

    fn movement(id: &str, product_id: &str, mt: MovementType, qty: i64, before: i64, after: i64) -> StockMovement {
        StockMovement {
            id: id.to_string(),
            product_id: product_id.to_string(),
            transaction_id: None,
            movement_type: mt,
            quantity: qty,
            stock_before: before,
            stock_after: after,
            notes: Some("Restock".to_string()),
            created_by: Some("user-1".to_string()),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_append_and_list_round_trip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_product(&db, "p1", 10).await;
        let repo = db.stock_movements();

        repo.insert(&movement("m1", "p1", MovementType::In, 5, 10, 15))
            .await
            .unwrap();
        repo.insert(&movement("m2", "p1", MovementType::Out, 3, 15, 12))
            .await
            .unwrap();

        let rows = repo.list_for_product("p1", 50).await.unwrap();
        assert_eq!(rows.len(), 2);

        let out_row = rows.iter().find(|m| m.id == "m2").unwrap();
        assert_eq!(out_row.movement_type, MovementType::Out);
        assert_eq!(out_row.quantity, 3);
        assert_eq!(out_row.stock_before, 15);
        assert_eq!(out_row.stock_after, 12);
    }

    #[tokio::test]
    async fn test_list_for_transaction_filters() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_product(&db, "p1", 10).await;
        let repo = db.stock_movements();

        let mut with_trx = movement("m1", "p1", MovementType::Out, 2, 10, 8);
        with_trx.transaction_id = None;
        repo.insert(&with_trx).await.unwrap();

        assert!(repo.list_for_transaction("t1").await.unwrap().is_empty());
    }
}
