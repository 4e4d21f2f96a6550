//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                         │
//! │                                                                     │
//! │  In JavaScript/floating point:                                      │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                       │
//! │                                                                     │
//! │  A 10% discount on 100000:                                          │
//! │    100000 * (10 / 100) is exact only by luck of the inputs          │
//! │                                                                     │
//! │  OUR SOLUTION: Integer minor units + basis-point math               │
//! │    percent is basis points (1000 bps = 10%)                         │
//! │    (100000 × 1000 + 5000) / 10000 = 10000, rounded half up          │
//! │                                                                     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use presto_core::money::Money;
//!
//! let subtotal = Money::new(100_000);
//!
//! // 10% manual discount, expressed in basis points
//! let discount = subtotal.percent_bps(1_000);
//! assert_eq!(discount.amount(), 10_000);
//!
//! let total = subtotal - discount;
//! assert_eq!(total.amount(), 90_000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for refunds and variances
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **No float constructor**: There is deliberately no `from_float`
///
/// Every monetary value in the system - prices, subtotals, discounts,
/// change, opening balances, cash variances - flows through this type in
/// pure code. Entities persist the raw `i64`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from an amount in minor units.
    #[inline]
    pub const fn new(amount: i64) -> Self {
        Money(amount)
    }

    /// Returns the raw amount in minor units.
    #[inline]
    pub const fn amount(&self) -> i64 {
        self.0
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Calculates a percentage of this amount, expressed in basis points,
    /// rounded half up.
    ///
    /// ## Why Basis Points?
    /// 1 basis point = 0.01% = 1/10000. 1000 bps = 10%. Integer all the way
    /// down: no float ever touches a price.
    ///
    /// ## Rounding
    /// Half up, via `(amount × bps + 5000) / 10000` in i128 to prevent
    /// overflow on large amounts. This is the documented rounding policy
    /// for percent discounts.
    ///
    /// ## Example
    /// ```rust
    /// use presto_core::money::Money;
    ///
    /// let subtotal = Money::new(100_000);
    /// assert_eq!(subtotal.percent_bps(1_000).amount(), 10_000); // 10%
    ///
    /// // 2.5% of 999 = 24.975 → rounds up to 25
    /// assert_eq!(Money::new(999).percent_bps(250).amount(), 25);
    /// ```
    pub fn percent_bps(&self, bps: u32) -> Money {
        let value = (self.0 as i128 * bps as i128 + 5000) / 10000;
        Money(value as i64)
    }

    /// Multiplies money by a quantity (line totals).
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money with thousands separators.
///
/// ## Note
/// This is for logs and debugging. UI display formatting (locale, symbol
/// placement) is an external concern.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let digits = self.0.abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }
        write!(f, "{}Rp{}", sign, grouped)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_and_amount() {
        let money = Money::new(25_000);
        assert_eq!(money.amount(), 25_000);
    }

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(format!("{}", Money::new(1_000)), "Rp1.000");
        assert_eq!(format!("{}", Money::new(25_000)), "Rp25.000");
        assert_eq!(format!("{}", Money::new(1_250_000)), "Rp1.250.000");
        assert_eq!(format!("{}", Money::new(-550)), "-Rp550");
        assert_eq!(format!("{}", Money::new(0)), "Rp0");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::new(1_000);
        let b = Money::new(500);

        assert_eq!((a + b).amount(), 1_500);
        assert_eq!((a - b).amount(), 500);
        assert_eq!((a * 3).amount(), 3_000);
        assert_eq!((-a).amount(), -1_000);
    }

    #[test]
    fn test_percent_bps_exact() {
        // 10% of 100000 = 10000
        let subtotal = Money::new(100_000);
        assert_eq!(subtotal.percent_bps(1_000).amount(), 10_000);
    }

    #[test]
    fn test_percent_bps_rounds_half_up() {
        // 2.5% of 999 = 24.975 → 25
        assert_eq!(Money::new(999).percent_bps(250).amount(), 25);
        // 5% of 10 = 0.5 → rounds up to 1
        assert_eq!(Money::new(10).percent_bps(500).amount(), 1);
        // 4% of 10 = 0.4 → rounds down to 0
        assert_eq!(Money::new(10).percent_bps(400).amount(), 0);
    }

    #[test]
    fn test_percent_bps_large_amount_no_overflow() {
        // Near-i64 subtotal must not overflow the intermediate product
        let big = Money::new(900_000_000_000_000_000);
        assert_eq!(big.percent_bps(1_000).amount(), 90_000_000_000_000_000);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        assert!(Money::new(100).is_positive());
        assert!(Money::new(-100).is_negative());
        assert_eq!(Money::new(-100).abs().amount(), 100);
    }

    #[test]
    fn test_multiply_quantity() {
        let unit_price = Money::new(25_000);
        assert_eq!(unit_price.multiply_quantity(2).amount(), 50_000);
    }
}
