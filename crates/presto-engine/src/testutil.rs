//! Shared fixtures for engine tests: an in-memory database, a default
//! context, and seeded rows.

use std::sync::Arc;

use chrono::Utc;

use presto_core::{
    DiscountKind, Expense, PaymentMethod, Product, Transaction, TransactionStatus,
};
use presto_db::{Database, DbConfig};

use crate::audit::{AuditSink, NullAuditSink};
use crate::context::SaleContext;

/// Fresh in-memory database with migrations applied.
pub(crate) async fn test_db() -> Database {
    Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database")
}

/// The default test context.
pub(crate) fn test_ctx() -> SaleContext {
    SaleContext::new("store-1", "user-1")
}

/// Audit sink that drops everything.
pub(crate) fn test_sink() -> Arc<dyn AuditSink> {
    Arc::new(NullAuditSink)
}

/// Inserts a product and returns it.
pub(crate) async fn seed_product(
    db: &Database,
    id: &str,
    price: i64,
    has_stock: bool,
    stock: i64,
) -> Product {
    let now = Utc::now();
    let product = Product {
        id: id.to_string(),
        store_id: "store-1".to_string(),
        name: format!("Product {}", id),
        sku: Some(format!("SKU-{}", id)),
        price,
        buy_price: 0,
        has_stock,
        stock,
        min_stock: 0,
        unit: Some("pcs".to_string()),
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    db.products().insert(&product).await.expect("seed product");
    product
}

/// Inserts a bare completed sale header with the given payment method.
pub(crate) async fn insert_sale_with_method(
    db: &Database,
    id: &str,
    store_id: &str,
    total: i64,
    method: PaymentMethod,
) {
    let trx = Transaction {
        id: id.to_string(),
        store_id: store_id.to_string(),
        transaction_number: format!("TRX-TEST-{}", id),
        status: TransactionStatus::Completed,
        subtotal: total,
        discount: 0,
        discount_type: DiscountKind::Nominal,
        discount_from_settings: 0,
        tax: 0,
        vat: 0,
        total,
        paid: total,
        change: 0,
        payment_method: method,
        customer_name: None,
        customer_phone: None,
        notes: None,
        created_by: "user-1".to_string(),
        created_at: Utc::now(),
    };
    db.transactions().insert(&trx).await.expect("seed sale");
}

/// Inserts a bare completed cash sale header.
pub(crate) async fn insert_cash_sale(db: &Database, id: &str, store_id: &str, total: i64) {
    insert_sale_with_method(db, id, store_id, total, PaymentMethod::Cash).await;
}

/// Inserts an expense.
pub(crate) async fn insert_expense(db: &Database, id: &str, store_id: &str, amount: i64) {
    let expense = Expense {
        id: id.to_string(),
        store_id: store_id.to_string(),
        category: "operational".to_string(),
        amount,
        note: None,
        created_by: Some("user-1".to_string()),
        created_at: Utc::now(),
    };
    db.expenses().insert(&expense).await.expect("seed expense");
}
