//! # Domain Types
//!
//! Core domain types used throughout Presto POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                │
//! │                                                                     │
//! │  ┌────────────────┐  ┌──────────────────┐  ┌──────────────────┐    │
//! │  │    Product     │  │   Transaction    │  │  StockMovement   │    │
//! │  │  ────────────  │  │  ──────────────  │  │  ──────────────  │    │
//! │  │  id (UUID)     │  │  id (UUID)       │  │  id (UUID)       │    │
//! │  │  stock         │  │  transaction_    │  │  type in/out/adj │    │
//! │  │  has_stock     │  │    number        │  │  stock_before    │    │
//! │  │  min_stock     │  │  status          │  │  stock_after     │    │
//! │  └────────────────┘  └──────────────────┘  └──────────────────┘    │
//! │                                                                     │
//! │  ┌────────────────┐  ┌──────────────────┐  ┌──────────────────┐    │
//! │  │     Shift      │  │ TransactionItem  │  │     Expense      │    │
//! │  │  ────────────  │  │  (frozen line    │  │  (cash-out rows  │    │
//! │  │  open → closed │  │   snapshot)      │  │   for reconcile) │    │
//! │  └────────────────┘  └──────────────────┘  └──────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Transactions have:
//! - `id`: UUID v4 - immutable, used for database relations
//! - `transaction_number`: human-readable display identifier, advisory only;
//!   a collision can never corrupt identity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Payment Method
// =============================================================================

/// How a transaction was settled.
///
/// Only `Cash` moves money through the drawer; the others settle externally,
/// which is why shift reconciliation filters on cash and why the
/// paid-covers-total rule is relaxed off the cash path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash through the drawer.
    Cash,
    /// QRIS / QR wallet payment.
    Qris,
    /// Bank transfer.
    Transfer,
    /// Card payment on an external terminal.
    Card,
}

impl PaymentMethod {
    /// True for payments that move cash through the drawer.
    #[inline]
    pub const fn is_cash(&self) -> bool {
        matches!(self, PaymentMethod::Cash)
    }
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

// =============================================================================
// Transaction Status
// =============================================================================

/// The status of a committed transaction.
///
/// An explicit enum rather than a marker encoded into free-text notes, so
/// that return idempotence and querying are well-defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Sale committed normally.
    Completed,
    /// Goods came back; stock was restored by compensating movements.
    Returned,
    /// Cancelled by an operator; kept for audit.
    Voided,
}

impl Default for TransactionStatus {
    fn default() -> Self {
        TransactionStatus::Completed
    }
}

// =============================================================================
// Discount Kind
// =============================================================================

/// How a manual discount was entered (persisted for audit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// Flat amount off the subtotal.
    Nominal,
    /// Percentage of the subtotal.
    Percent,
}

impl Default for DiscountKind {
    fn default() -> Self {
        DiscountKind::Nominal
    }
}

// =============================================================================
// Movement Type
// =============================================================================

/// Direction of a stock movement.
///
/// Movement quantities are stored positive; the type carries the sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    /// Stock received (restock, return restoration).
    In,
    /// Stock leaving (sale, manual out).
    Out,
    /// Absolute correction to a counted level.
    Adjustment,
}

impl MovementType {
    /// Signed delta this movement applies to stock on hand.
    ///
    /// `Adjustment` rows record `|new − old|` with the target level in
    /// `stock_after`, so their delta is not derivable from quantity alone
    /// and this returns 0 for them.
    #[inline]
    pub const fn signed(&self, quantity: i64) -> i64 {
        match self {
            MovementType::In => quantity,
            MovementType::Out => -quantity,
            MovementType::Adjustment => 0,
        }
    }
}

// =============================================================================
// Shift Status
// =============================================================================

/// Lifecycle state of a cash-drawer shift: `open` → `closed`, terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum ShiftStatus {
    Open,
    Closed,
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Store this product belongs to.
    pub store_id: String,

    /// Display name shown to cashier and on receipts.
    pub name: String,

    /// Stock Keeping Unit - optional business identifier.
    pub sku: Option<String>,

    /// Selling price in minor units.
    pub price: i64,

    /// Purchase cost in minor units (for margin reporting).
    pub buy_price: i64,

    /// Whether quantity on hand is tracked for this product.
    pub has_stock: bool,

    /// Current quantity on hand. Only meaningful when `has_stock` is true.
    /// Mutated exclusively through the stock ledger write path.
    pub stock: i64,

    /// Low-stock warning threshold.
    pub min_stock: i64,

    /// Sales unit label ("pcs", "kg", ...).
    pub unit: Option<String>,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the selling price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::new(self.price)
    }

    /// Checks if `quantity` can be sold against the current stock level.
    /// Products that don't track stock can always be sold.
    pub fn can_sell(&self, quantity: i64) -> bool {
        !self.has_stock || self.stock >= quantity
    }

    /// True when stock tracking is on and quantity on hand has fallen to
    /// or below the warning threshold.
    pub fn is_low_stock(&self) -> bool {
        self.has_stock && self.stock <= self.min_stock
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// A committed sale.
///
/// Invariant: `total = subtotal − discount − discount_from_settings + tax + vat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Transaction {
    pub id: String,
    pub store_id: String,

    /// Advisory display identifier, e.g. `TRX-20260806-001`.
    pub transaction_number: String,

    pub status: TransactionStatus,
    pub subtotal: i64,

    /// Manual discount amount actually applied.
    pub discount: i64,
    /// How the manual discount was entered.
    pub discount_type: DiscountKind,
    /// Store-settings discount applied on top of the manual one.
    pub discount_from_settings: i64,

    pub tax: i64,
    pub vat: i64,
    pub total: i64,
    pub paid: i64,
    pub change: i64,
    pub payment_method: PaymentMethod,

    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,

    /// Cashier who rang the sale.
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// True once the transaction has been marked returned.
    #[inline]
    pub fn is_returned(&self) -> bool {
        self.status == TransactionStatus::Returned
    }

    /// Recomputes the total from the stored components.
    /// Equal to `total` for any row written by the checkout engine.
    pub fn derived_total(&self) -> i64 {
        self.subtotal - self.discount - self.discount_from_settings + self.tax + self.vat
    }
}

// =============================================================================
// Transaction Item
// =============================================================================

/// A line item in a transaction.
/// Uses the snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TransactionItem {
    pub id: String,
    pub transaction_id: String,

    /// Nullable so the line survives product deletion.
    pub product_id: Option<String>,

    /// Name at time of sale (frozen).
    pub product_name: String,
    /// SKU at time of sale (frozen).
    pub product_sku: Option<String>,
    /// Unit price at time of sale (frozen).
    pub product_price: i64,

    pub quantity: i64,
    /// `product_price × quantity`.
    pub subtotal: i64,

    pub created_at: DateTime<Utc>,
}

/// A transaction hydrated with its line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionWithItems {
    pub transaction: Transaction,
    pub items: Vec<TransactionItem>,
}

// =============================================================================
// Stock Movement
// =============================================================================

/// One append-only ledger entry recording a stock change and its cause.
///
/// Invariant for `in`/`out` rows: `stock_after = stock_before ± quantity`.
/// `adjustment` rows carry `|new − old|` as quantity with the direction
/// noted in `notes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockMovement {
    pub id: String,
    pub product_id: String,

    /// Set when the movement was caused by a sale or its reversal.
    pub transaction_id: Option<String>,

    #[serde(rename = "type")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "type"))]
    pub movement_type: MovementType,

    /// Always positive; `movement_type` carries the direction.
    pub quantity: i64,

    pub stock_before: i64,
    pub stock_after: i64,

    pub notes: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Shift
// =============================================================================

/// A bounded cash-drawer session from open to close.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Shift {
    pub id: String,
    pub store_id: String,
    pub user_id: String,

    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,

    /// Cash in the drawer when the shift opened.
    pub opening_balance: i64,
    /// Counted cash at close.
    pub closing_balance_actual: Option<i64>,
    /// Reconciled expectation at close:
    /// `opening + cash sales − expenses` over the shift window.
    pub closing_balance_expected: Option<i64>,

    pub status: ShiftStatus,
    pub notes: Option<String>,
}

impl Shift {
    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == ShiftStatus::Open
    }

    /// Cash-drawer variance: `actual − expected`.
    ///
    /// Derivable by any caller from the stored row, without recomputation.
    /// `None` until the shift has closed.
    pub fn variance(&self) -> Option<i64> {
        match (self.closing_balance_actual, self.closing_balance_expected) {
            (Some(actual), Some(expected)) => Some(actual - expected),
            _ => None,
        }
    }
}

// =============================================================================
// Expense
// =============================================================================

/// A cash expense recorded during operation; subtracts from the expected
/// drawer balance of any shift whose window covers it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Expense {
    pub id: String,
    pub store_id: String,
    pub category: String,
    pub amount: i64,
    pub note: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(has_stock: bool, stock: i64, min_stock: i64) -> Product {
        Product {
            id: "p1".to_string(),
            store_id: "s1".to_string(),
            name: "Teh Botol".to_string(),
            sku: Some("TEH-450".to_string()),
            price: 5_000,
            buy_price: 3_500,
            has_stock,
            stock,
            min_stock,
            unit: Some("pcs".to_string()),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_can_sell() {
        assert!(product(false, 0, 0).can_sell(100));
        assert!(product(true, 10, 0).can_sell(10));
        assert!(!product(true, 10, 0).can_sell(11));
    }

    #[test]
    fn test_is_low_stock() {
        assert!(product(true, 2, 5).is_low_stock());
        assert!(product(true, 5, 5).is_low_stock());
        assert!(!product(true, 6, 5).is_low_stock());
        // untracked products never warn
        assert!(!product(false, 0, 5).is_low_stock());
    }

    #[test]
    fn test_movement_signed_delta() {
        assert_eq!(MovementType::In.signed(3), 3);
        assert_eq!(MovementType::Out.signed(3), -3);
        assert_eq!(MovementType::Adjustment.signed(3), 0);
    }

    #[test]
    fn test_shift_variance() {
        let mut shift = Shift {
            id: "sh1".to_string(),
            store_id: "s1".to_string(),
            user_id: "u1".to_string(),
            start_time: Utc::now(),
            end_time: None,
            opening_balance: 100_000,
            closing_balance_actual: None,
            closing_balance_expected: None,
            status: ShiftStatus::Open,
            notes: None,
        };
        assert!(shift.is_open());
        assert_eq!(shift.variance(), None);

        shift.status = ShiftStatus::Closed;
        shift.closing_balance_actual = Some(315_000);
        shift.closing_balance_expected = Some(320_000);
        assert_eq!(shift.variance(), Some(-5_000));
    }

    #[test]
    fn test_payment_method_is_cash() {
        assert!(PaymentMethod::Cash.is_cash());
        assert!(!PaymentMethod::Qris.is_cash());
        assert!(!PaymentMethod::Transfer.is_cash());
        assert!(!PaymentMethod::Card.is_cash());
    }

    #[test]
    fn test_derived_total_matches_components() {
        let trx = Transaction {
            id: "t1".to_string(),
            store_id: "s1".to_string(),
            transaction_number: "TRX-20260806-001".to_string(),
            status: TransactionStatus::Completed,
            subtotal: 100_000,
            discount: 10_000,
            discount_type: DiscountKind::Percent,
            discount_from_settings: 2_000,
            tax: 5_000,
            vat: 11_000,
            total: 104_000,
            paid: 110_000,
            change: 6_000,
            payment_method: PaymentMethod::Cash,
            customer_name: None,
            customer_phone: None,
            notes: None,
            created_by: "u1".to_string(),
            created_at: Utc::now(),
        };
        assert_eq!(trx.derived_total(), trx.total);
        assert!(!trx.is_returned());
    }
}
