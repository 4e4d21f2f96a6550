//! # Seed Data Generator
//!
//! Populates the database with demo products for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default database
//! cargo run -p presto-db --bin seed
//!
//! # Specify database path and store
//! cargo run -p presto-db --bin seed -- --db ./data/presto.db --store store-demo
//! ```
//!
//! Each product gets a deterministic SKU (`{CATEGORY}-{INDEX}`), a price in
//! whole minor units, and a starting stock level so the checkout and ledger
//! flows have something to decrement.

use chrono::Utc;
use std::env;

use presto_core::Product;
use presto_db::repository::product::generate_product_id;
use presto_db::{Database, DbConfig};

/// Demo catalog: (category code, name, price, has_stock, stock, min_stock)
const DEMO_PRODUCTS: &[(&str, &str, i64, bool, i64, i64)] = &[
    ("BEV", "Teh Botol 450ml", 5_000, true, 48, 12),
    ("BEV", "Kopi Susu 250ml", 12_000, true, 36, 10),
    ("BEV", "Air Mineral 600ml", 4_000, true, 96, 24),
    ("BEV", "Jus Jeruk 300ml", 10_000, true, 20, 6),
    ("BEV", "Es Teh Manis", 3_000, false, 0, 0),
    ("SNK", "Keripik Singkong 80g", 8_000, true, 40, 10),
    ("SNK", "Kacang Goreng 100g", 7_000, true, 30, 8),
    ("SNK", "Roti Cokelat", 6_000, true, 24, 6),
    ("SNK", "Biskuit Gandum", 9_000, true, 18, 5),
    ("FOOD", "Nasi Goreng Spesial", 25_000, false, 0, 0),
    ("FOOD", "Mie Ayam Bakso", 18_000, false, 0, 0),
    ("FOOD", "Ayam Geprek", 22_000, false, 0, 0),
    ("GRO", "Beras Premium 5kg", 75_000, true, 12, 3),
    ("GRO", "Minyak Goreng 1L", 19_000, true, 25, 6),
    ("GRO", "Gula Pasir 1kg", 15_000, true, 30, 8),
    ("GRO", "Telur Ayam 1kg", 28_000, true, 15, 4),
];

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let db_path = arg_value(&args, "--db").unwrap_or_else(|| "./presto.db".to_string());
    let store_id = arg_value(&args, "--store").unwrap_or_else(|| "store-demo".to_string());

    tracing::info!(db = %db_path, store = %store_id, "Seeding demo products");

    let db = match Database::new(DbConfig::new(&db_path)).await {
        Ok(db) => db,
        Err(err) => {
            tracing::error!(error = %err, "Failed to open database");
            std::process::exit(1);
        }
    };

    let products = db.products();
    let now = Utc::now();
    let mut inserted = 0u32;

    for (idx, (category, name, price, has_stock, stock, min_stock)) in
        DEMO_PRODUCTS.iter().enumerate()
    {
        let product = Product {
            id: generate_product_id(),
            store_id: store_id.clone(),
            name: (*name).to_string(),
            sku: Some(format!("{}-{:03}", category, idx + 1)),
            price: *price,
            buy_price: *price * 6 / 10,
            has_stock: *has_stock,
            stock: *stock,
            min_stock: *min_stock,
            unit: Some("pcs".to_string()),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        match products.insert(&product).await {
            Ok(()) => inserted += 1,
            Err(err) => {
                tracing::warn!(name = %name, error = %err, "Skipping product");
            }
        }
    }

    let total = products.count_active(&store_id).await.unwrap_or(0);
    tracing::info!(inserted, total, "Seed complete");

    db.close().await;
}

/// Returns the value following `flag` in `args`, if present.
fn arg_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
