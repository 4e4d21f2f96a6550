//! # Pricing
//!
//! Pure checkout totals computation: manual discount, settings discount,
//! tax, value-added tax, change due.
//!
//! ## Totals Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  subtotal        Σ line subtotals (from the cart)                   │
//! │  − discount      manual: flat nominal, or percent of subtotal       │
//! │  − settings      store-settings discount amount                     │
//! │  + tax           service/tax amount                                 │
//! │  + vat           value-added tax amount                             │
//! │  ─────────────                                                      │
//! │  = total                                                            │
//! │                                                                     │
//! │  change = paid − total                                              │
//! │     cash:     change < 0 → InsufficientPayment, nothing persisted   │
//! │     non-cash: settles externally, change clamps at 0                │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Runs before anything touches the database, so a rejection here has no
//! side effects by construction.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{DiscountKind, PaymentMethod};

// =============================================================================
// Discount
// =============================================================================

/// A manual discount as entered by the cashier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum Discount {
    /// Flat amount off the subtotal, in minor units.
    Nominal(i64),
    /// Percentage of the subtotal, in basis points (1000 = 10%).
    /// Rounded half up when applied.
    Percent(u32),
}

impl Discount {
    /// The amount this discount takes off the given subtotal.
    pub fn amount_on(&self, subtotal: Money) -> Money {
        match *self {
            Discount::Nominal(amount) => Money::new(amount),
            Discount::Percent(bps) => subtotal.percent_bps(bps),
        }
    }

    /// The persisted audit kind for this discount.
    pub fn kind(&self) -> DiscountKind {
        match self {
            Discount::Nominal(_) => DiscountKind::Nominal,
            Discount::Percent(_) => DiscountKind::Percent,
        }
    }
}

// =============================================================================
// Checkout Payment
// =============================================================================

/// Payment details handed to the checkout engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutPayment {
    /// Amount tendered, in minor units.
    pub paid: i64,

    pub method: PaymentMethod,

    /// Optional manual discount.
    pub discount: Option<Discount>,

    /// Store-settings discount amount (already resolved by the caller).
    pub discount_from_settings: i64,

    /// Tax amount.
    pub tax: i64,

    /// Value-added tax amount.
    pub vat: i64,

    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
}

impl CheckoutPayment {
    /// A plain cash payment with no discount or tax.
    pub fn cash(paid: i64) -> Self {
        CheckoutPayment {
            paid,
            method: PaymentMethod::Cash,
            discount: None,
            discount_from_settings: 0,
            tax: 0,
            vat: 0,
            customer_name: None,
            customer_phone: None,
            notes: None,
        }
    }

    /// Sets the manual discount.
    pub fn with_discount(mut self, discount: Discount) -> Self {
        self.discount = Some(discount);
        self
    }
}

// =============================================================================
// Sale Totals
// =============================================================================

/// The priced result of a checkout, before persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleTotals {
    pub subtotal: i64,
    /// Manual discount amount actually applied.
    pub discount: i64,
    pub discount_type: DiscountKind,
    pub discount_from_settings: i64,
    pub tax: i64,
    pub vat: i64,
    pub total: i64,
    pub paid: i64,
    pub change: i64,
}

/// Computes sale totals from a cart subtotal and payment details.
///
/// Pure and side-effect free. Fails with [`CoreError::InsufficientPayment`]
/// when a cash payment doesn't cover the total - the caller must not have
/// persisted anything yet at that point.
///
/// ## Example
/// ```rust
/// use presto_core::pricing::{price_sale, CheckoutPayment};
///
/// let totals = price_sale(50_000, &CheckoutPayment::cash(60_000)).unwrap();
/// assert_eq!(totals.total, 50_000);
/// assert_eq!(totals.change, 10_000);
/// ```
pub fn price_sale(subtotal: i64, payment: &CheckoutPayment) -> CoreResult<SaleTotals> {
    let subtotal = Money::new(subtotal);

    let discount = payment
        .discount
        .map(|d| d.amount_on(subtotal))
        .unwrap_or_else(Money::zero);
    let discount_type = payment
        .discount
        .map(|d| d.kind())
        .unwrap_or(DiscountKind::Nominal);

    let total = subtotal - discount - Money::new(payment.discount_from_settings)
        + Money::new(payment.tax)
        + Money::new(payment.vat);

    let mut change = Money::new(payment.paid) - total;

    if payment.method.is_cash() {
        if change.is_negative() {
            return Err(CoreError::InsufficientPayment {
                total: total.amount(),
                paid: payment.paid,
            });
        }
    } else if change.is_negative() {
        // Non-cash methods settle externally; there is no drawer change.
        change = Money::zero();
    }

    Ok(SaleTotals {
        subtotal: subtotal.amount(),
        discount: discount.amount(),
        discount_type,
        discount_from_settings: payment.discount_from_settings,
        tax: payment.tax,
        vat: payment.vat,
        total: total.amount(),
        paid: payment.paid,
        change: change.amount(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_cash_sale() {
        // 2 × 25000 paid with 60000 → total 50000, change 10000
        let totals = price_sale(50_000, &CheckoutPayment::cash(60_000)).unwrap();

        assert_eq!(totals.total, 50_000);
        assert_eq!(totals.change, 10_000);
        assert_eq!(totals.discount, 0);
    }

    #[test]
    fn test_cash_short_pay_rejected() {
        let err = price_sale(50_000, &CheckoutPayment::cash(40_000)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientPayment {
                total: 50_000,
                paid: 40_000
            }
        ));
    }

    #[test]
    fn test_exact_cash_is_fine() {
        let totals = price_sale(50_000, &CheckoutPayment::cash(50_000)).unwrap();
        assert_eq!(totals.change, 0);
    }

    #[test]
    fn test_percent_discount_half_up() {
        // 10% on 100000 → discount 10000, total 90000
        let payment = CheckoutPayment::cash(100_000).with_discount(Discount::Percent(1_000));
        let totals = price_sale(100_000, &payment).unwrap();

        assert_eq!(totals.discount, 10_000);
        assert_eq!(totals.discount_type, DiscountKind::Percent);
        assert_eq!(totals.total, 90_000);
        assert_eq!(totals.change, 10_000);
    }

    #[test]
    fn test_nominal_discount() {
        let payment = CheckoutPayment::cash(50_000).with_discount(Discount::Nominal(5_000));
        let totals = price_sale(50_000, &payment).unwrap();

        assert_eq!(totals.discount, 5_000);
        assert_eq!(totals.discount_type, DiscountKind::Nominal);
        assert_eq!(totals.total, 45_000);
        assert_eq!(totals.change, 5_000);
    }

    #[test]
    fn test_settings_discount_tax_and_vat() {
        let payment = CheckoutPayment {
            paid: 110_000,
            method: PaymentMethod::Cash,
            discount: Some(Discount::Percent(1_000)),
            discount_from_settings: 2_000,
            tax: 5_000,
            vat: 11_000,
            customer_name: None,
            customer_phone: None,
            notes: None,
        };
        let totals = price_sale(100_000, &payment).unwrap();

        // 100000 − 10000 − 2000 + 5000 + 11000 = 104000
        assert_eq!(totals.total, 104_000);
        assert_eq!(totals.change, 6_000);
    }

    #[test]
    fn test_non_cash_short_pay_allowed() {
        let payment = CheckoutPayment {
            method: PaymentMethod::Qris,
            ..CheckoutPayment::cash(40_000)
        };
        let totals = price_sale(50_000, &payment).unwrap();

        assert_eq!(totals.total, 50_000);
        // relaxed rule: no error, and change never goes negative
        assert_eq!(totals.change, 0);
    }
}
