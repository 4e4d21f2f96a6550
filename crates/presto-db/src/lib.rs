//! # presto-db: Database Layer for Presto POS
//!
//! This crate provides database access for the Presto POS system.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       Presto POS Data Flow                          │
//! │                                                                     │
//! │  Engine call (checkout, adjust stock, close shift)                  │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  ┌───────────────────────────────────────────────────────────────┐  │
//! │  │                     presto-db (THIS CRATE)                    │  │
//! │  │                                                               │  │
//! │  │   ┌──────────────┐   ┌───────────────┐   ┌───────────────┐   │  │
//! │  │   │   Database   │   │ Repositories  │   │  Migrations   │   │  │
//! │  │   │  (pool.rs)   │   │ (one per      │   │  (embedded)   │   │  │
//! │  │   │              │   │  collection)  │   │               │   │  │
//! │  │   │  SqlitePool  │◄──│ Product       │   │ 001_initial…  │   │  │
//! │  │   │  Connection  │   │ Transaction   │   │ 002_indexes   │   │  │
//! │  │   │  Management  │   │ StockMovement │   │               │   │  │
//! │  │   │              │   │ Shift/Expense │   │               │   │  │
//! │  │   └──────────────┘   └───────────────┘   └───────────────┘   │  │
//! │  │                                                               │  │
//! │  └───────────────────────────────────────────────────────────────┘  │
//! │       │                                                             │
//! │       ▼                                                             │
//! │                       SQLite Database (WAL)                         │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## One Statement Per Call
//!
//! Every repository method issues a single independent statement. The
//! multi-record flows above this crate (checkout, reversal) are sagas of
//! such statements with per-step failure capture - there is deliberately
//! no cross-row transaction on those paths, and conditional updates
//! (`rows_affected` guards) carry the concurrency story instead.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use presto_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/presto.db")).await?;
//! let product = db.products().get_by_id("uuid-here").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::expense::ExpenseRepository;
pub use repository::product::ProductRepository;
pub use repository::shift::ShiftRepository;
pub use repository::stock_movement::StockMovementRepository;
pub use repository::transaction::{SalesSummary, TransactionRepository};
