//! # presto-engine: Transaction & Stock Ledger Engines
//!
//! The orchestration layer of Presto POS. Where presto-core knows the
//! rules and presto-db knows the statements, this crate knows the *order*:
//! which reads and writes make up a checkout, a reversal, a stock
//! adjustment, or a shift close - and what happens when a step in the
//! middle fails.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Presto POS Engine Layer                          │
//! │                                                                     │
//! │   Cart ──► CheckoutEngine ──► (Transaction, Items,                  │
//! │                                Stock writes + Ledger)               │
//! │                                      │                              │
//! │            ReversalEngine ◄──────────┘  compensating `in` entries   │
//! │                                                                     │
//! │            StockService   ──► guarded writes + ledger appends       │
//! │                                                                     │
//! │            ShiftEngine    ──► reads Transactions + Expenses to      │
//! │                               reconcile the cash drawer             │
//! │                                                                     │
//! │   SessionGate / SaleContext: explicit who-and-where for each call   │
//! │   AuditSink: fire-and-forget trail of every state change            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Consistency Model
//!
//! The backing store offers no multi-row transaction on these paths, so
//! each flow is an explicit saga of single statements:
//!
//! - Validation failures abort before any write.
//! - The checkout header+items pair is atomic *from the caller's view*:
//!   an item failure after the header commit surfaces as `PartialCommit`
//!   and the sale is never confirmed.
//! - Stock side effects are best-effort per line: failures are logged,
//!   collected as warnings on the outcome, and never roll back the sale
//!   or block sibling lines.
//! - Stock arithmetic uses optimistic guarded writes
//!   (`UPDATE … WHERE stock = observed`) with bounded retries.
//!
//! ## Example
//!
//! ```rust,ignore
//! use presto_engine::{CheckoutEngine, SaleContext, tracing_sink};
//!
//! let checkout = CheckoutEngine::new(db.clone(), tracing_sink());
//! let ctx = gate.wait_ready(Duration::from_secs(5)).await?;
//! let outcome = checkout.checkout(&ctx, &mut cart, payment).await?;
//! for warning in outcome.warnings() {
//!     // surfaced next to the success confirmation, never swallowed
//! }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod audit;
pub mod checkout;
pub mod context;
pub mod error;
pub mod expense;
pub mod numbering;
pub mod reversal;
pub mod shift;
pub mod stock;

#[cfg(test)]
mod testutil;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use audit::{tracing_sink, AuditEntry, AuditSink, NullAuditSink, TracingAuditSink};
pub use checkout::{CheckoutEngine, CheckoutOutcome};
pub use context::{SaleContext, SessionGate};
pub use error::{EngineError, EngineResult};
pub use expense::ExpenseService;
pub use reversal::{ReversalEngine, ReversalReport};
pub use shift::ShiftEngine;
pub use stock::{StockAdjustment, StockService, StockWarning};
