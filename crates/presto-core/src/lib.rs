//! # presto-core: Pure Business Logic for Presto POS
//!
//! This crate is the **heart** of Presto POS. It contains all business rules
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Presto POS Architecture                        │
//! │                                                                     │
//! │  ┌───────────────────────────────────────────────────────────────┐  │
//! │  │                  presto-engine (Orchestration)                │  │
//! │  │   Checkout ──► Reversal ──► Stock Ledger ──► Shifts           │  │
//! │  └────────────────────────────┬──────────────────────────────────┘  │
//! │                               │                                     │
//! │  ┌────────────────────────────▼──────────────────────────────────┐  │
//! │  │               ★ presto-core (THIS CRATE) ★                    │  │
//! │  │                                                               │  │
//! │  │  ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌───────────┐          │  │
//! │  │  │  types  │ │  money  │ │   cart   │ │  pricing  │          │  │
//! │  │  │ Product │ │  Money  │ │   Cart   │ │ SaleTotals│          │  │
//! │  │  │  Shift  │ │ percent │ │ CartLine │ │ Discount  │          │  │
//! │  │  └─────────┘ └─────────┘ └──────────┘ └───────────┘          │  │
//! │  │                                                               │  │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS          │  │
//! │  └────────────────────────────┬──────────────────────────────────┘  │
//! │                               │                                     │
//! │  ┌────────────────────────────▼──────────────────────────────────┐  │
//! │  │                   presto-db (Database Layer)                  │  │
//! │  │            SQLite queries, migrations, repositories           │  │
//! │  └───────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Transaction, StockMovement, Shift, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`cart`] - In-memory cart with frozen price snapshots
//! - [`pricing`] - Checkout totals: discounts, tax, VAT, change
//! - [`numbering`] - Transaction number formatting and fallback
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are integer minor units (i64)
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod numbering;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use presto_core::Money` instead of
// `use presto_core::money::Money`

pub use cart::{Cart, CartLine};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::{CheckoutPayment, Discount, SaleTotals};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart
///
/// ## Business Reason
/// Prevents runaway carts and keeps a single receipt printable.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single line in a cart
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Retry budget for optimistic stock writes before giving up with a
/// conflict error. Two cashiers racing the same product resolve within
/// one or two retries in practice.
pub const MAX_STOCK_WRITE_ATTEMPTS: u32 = 3;
