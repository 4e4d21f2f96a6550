//! # Repository Module
//!
//! Database repository implementations for Presto POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                     │
//! │                                                                     │
//! │  Engine code                                                        │
//! │       │                                                             │
//! │       │  db.products().get_by_id(id)                                │
//! │       ▼                                                             │
//! │  ProductRepository                                                  │
//! │  ├── get_by_id(&self, id)                                           │
//! │  ├── insert(&self, product)                                         │
//! │  └── update_stock_guarded(&self, id, expected, new)                 │
//! │       │                                                             │
//! │       │  SQL statement                                              │
//! │       ▼                                                             │
//! │  SQLite Database                                                    │
//! │                                                                     │
//! │  Benefits:                                                          │
//! │  • SQL is isolated in one place per collection                      │
//! │  • Engines read as orchestration, not query soup                    │
//! │  • Conditional-update guards live next to their statements          │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Product CRUD and the guarded stock write
//! - [`transaction::TransactionRepository`] - Sale headers, items, summaries
//! - [`stock_movement::StockMovementRepository`] - Append-only ledger
//! - [`shift::ShiftRepository`] - Cash-drawer shift lifecycle
//! - [`expense::ExpenseRepository`] - Expenses feeding reconciliation

pub mod expense;
pub mod product;
pub mod shift;
pub mod stock_movement;
pub mod transaction;
