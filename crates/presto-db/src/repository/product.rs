//! # Product Repository
//!
//! Database operations for products.
//!
//! ## The Guarded Stock Write
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                            │
//! │                                                                     │
//! │  ❌ WRONG: blind read-then-write (races silently)                   │
//! │     read stock = 10                                                 │
//! │     UPDATE products SET stock = 8 WHERE id = ?                      │
//! │                                                                     │
//! │  ✅ CORRECT: conditional write (optimistic concurrency)             │
//! │     read stock = 10                                                 │
//! │     UPDATE products SET stock = 8 WHERE id = ? AND stock = 10       │
//! │     rows_affected == 0 → someone moved stock first → re-read, retry │
//! │                                                                     │
//! │  Two cashiers selling the same product cannot both win the same     │
//! │  before-value; the loser observes the conflict instead of           │
//! │  overwriting the winner.                                            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The retry loop lives in the engine layer; this repository only exposes
//! the single conditional statement.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use presto_core::Product;

const PRODUCT_COLUMNS: &str = "id, store_id, name, sku, price, buy_price, \
     has_stock, stock, min_stock, unit, is_active, created_at, updated_at";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists active products for a store, sorted by name.
    pub async fn list_active(&self, store_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE store_id = ?1 AND is_active = 1 \
             ORDER BY name"
        ))
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Lists active, stock-tracked products at or below their low-stock
    /// threshold.
    pub async fn list_low_stock(&self, store_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE store_id = ?1 AND is_active = 1 AND has_stock = 1 \
               AND stock <= min_stock \
             ORDER BY name"
        ))
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Inserts a new product.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            "INSERT INTO products ( \
                 id, store_id, name, sku, price, buy_price, \
                 has_stock, stock, min_stock, unit, is_active, \
                 created_at, updated_at \
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        )
        .bind(&product.id)
        .bind(&product.store_id)
        .bind(&product.name)
        .bind(&product.sku)
        .bind(product.price)
        .bind(product.buy_price)
        .bind(product.has_stock)
        .bind(product.stock)
        .bind(product.min_stock)
        .bind(&product.unit)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an existing product's catalog fields.
    ///
    /// Deliberately does NOT touch `stock` - quantity on hand changes only
    /// through [`update_stock_guarded`](Self::update_stock_guarded) so that
    /// every change has a ledger entry.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE products SET \
                 name = ?2, sku = ?3, price = ?4, buy_price = ?5, \
                 has_stock = ?6, min_stock = ?7, unit = ?8, is_active = ?9, \
                 updated_at = ?10 \
             WHERE id = ?1",
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.sku)
        .bind(product.price)
        .bind(product.buy_price)
        .bind(product.has_stock)
        .bind(product.min_stock)
        .bind(&product.unit)
        .bind(product.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Conditionally writes a new stock level, verifying the caller's
    /// observed value is still current.
    ///
    /// ## Returns
    /// * `Ok(true)` - the write applied (observed value matched)
    /// * `Ok(false)` - no row matched: either the product is gone or the
    ///   stock moved since it was read. The caller re-reads to tell the
    ///   two apart and retries on a conflict.
    pub async fn update_stock_guarded(
        &self,
        id: &str,
        observed_stock: i64,
        new_stock: i64,
    ) -> DbResult<bool> {
        debug!(
            id = %id,
            observed = observed_stock,
            new = new_stock,
            "Guarded stock write"
        );

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE products SET stock = ?3, updated_at = ?4 \
             WHERE id = ?1 AND stock = ?2",
        )
        .bind(id)
        .bind(observed_stock)
        .bind(new_stock)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Soft-deletes a product by setting `is_active = false`.
    ///
    /// Historical transaction items and ledger rows keep referencing it.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products for a store (for diagnostics).
    pub async fn count_active(&self, store_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE store_id = ?1 AND is_active = 1",
        )
        .bind(store_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
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

    fn product(id: &str, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            store_id: "store-1".to_string(),
            name: format!("Product {}", id),
            sku: Some(format!("SKU-{}", id)),
            price: 25_000,
            buy_price: 15_000,
            has_stock: true,
            stock,
            min_stock: 2,
            unit: Some("pcs".to_string()),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.insert(&product("p1", 10)).await.unwrap();

        let loaded = repo.get_by_id("p1").await.unwrap().unwrap();
        assert_eq!(loaded.name, "Product p1");
        assert_eq!(loaded.stock, 10);
        assert!(loaded.has_stock);

        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_guarded_write_applies_on_match() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();
        repo.insert(&product("p1", 10)).await.unwrap();

        assert!(repo.update_stock_guarded("p1", 10, 8).await.unwrap());
        assert_eq!(repo.get_by_id("p1").await.unwrap().unwrap().stock, 8);
    }

    #[tokio::test]
    async fn test_guarded_write_rejects_stale_observation() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();
        repo.insert(&product("p1", 10)).await.unwrap();

        // a competing writer got there first
        assert!(repo.update_stock_guarded("p1", 10, 7).await.unwrap());

        // our observation (10) is now stale: the write must not apply
        assert!(!repo.update_stock_guarded("p1", 10, 8).await.unwrap());
        assert_eq!(repo.get_by_id("p1").await.unwrap().unwrap().stock, 7);
    }

    #[tokio::test]
    async fn test_low_stock_listing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.insert(&product("low", 1)).await.unwrap(); // min_stock 2
        repo.insert(&product("ok", 10)).await.unwrap();

        let low = repo.list_low_stock("store-1").await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].id, "low");
    }

    #[tokio::test]
    async fn test_soft_delete_hides_from_active_list() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.insert(&product("p1", 5)).await.unwrap();
        assert_eq!(repo.count_active("store-1").await.unwrap(), 1);

        repo.soft_delete("p1").await.unwrap();
        assert_eq!(repo.count_active("store-1").await.unwrap(), 0);
        assert!(repo.list_active("store-1").await.unwrap().is_empty());

        // still reachable by id for history
        assert!(repo.get_by_id("p1").await.unwrap().is_some());
    }
}
