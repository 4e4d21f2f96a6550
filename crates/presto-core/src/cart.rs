//! # Cart
//!
//! In-memory staging area for one pending sale.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Cart Operations                                │
//! │                                                                     │
//! │  Cashier Action            Operation              Cart Change       │
//! │  ──────────────            ─────────              ───────────       │
//! │                                                                     │
//! │  Tap product ────────────► add() ───────────────► merge or push     │
//! │                                                                     │
//! │  Edit quantity ──────────► set_quantity() ──────► qty = n, or       │
//! │                                                    remove if n ≤ 0  │
//! │                                                                     │
//! │  Tap remove ─────────────► remove() ────────────► line dropped      │
//! │                                                                     │
//! │  Checkout done ──────────► clear() ─────────────► empty             │
//! │                                                                     │
//! │  subtotal()/item_count() are recomputed from the lines on every     │
//! │  call - never cached, so they can't go stale after a mutation.      │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Stock checks are advisory
//! The ceiling enforced here is the stock level observed when the line was
//! created or last updated - a snapshot, not a lock. The authoritative
//! check happens at the conditional stock write during checkout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::Product;
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY};

// =============================================================================
// Cart Line
// =============================================================================

/// One line in the cart.
///
/// ## Price Freezing
/// Name, SKU and unit price are copied from the product when the line is
/// created. If the product changes in the store afterwards, this line keeps
/// displaying (and later persists) what the cashier saw.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    /// Product ID (UUID), used for the stock write at checkout.
    pub product_id: String,

    /// Name at time of adding (frozen).
    pub product_name: String,

    /// SKU at time of adding (frozen).
    pub product_sku: Option<String>,

    /// Unit price at time of adding (frozen).
    pub product_price: i64,

    /// Quantity in cart. Always ≥ 1; a zero-quantity update removes the line.
    pub quantity: i64,

    /// Whether the product tracks stock (drives the decrement at checkout).
    pub has_stock: bool,

    /// Stock level observed when the line was created or last refreshed.
    /// The advisory ceiling for quantity changes, and the `stock_before`
    /// hint carried into checkout.
    pub known_stock: i64,

    /// When this line was added.
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    /// Creates a new cart line from a product, freezing its snapshot fields.
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        CartLine {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            product_sku: product.sku.clone(),
            product_price: product.price,
            quantity,
            has_stock: product.has_stock,
            known_stock: product.stock,
            added_at: Utc::now(),
        }
    }

    /// Line subtotal: `unit price × quantity`.
    #[inline]
    pub fn subtotal(&self) -> i64 {
        self.product_price * self.quantity
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The shopping cart.
///
/// ## Invariants
/// - Lines are unique by `product_id` (adding the same product merges)
/// - Quantity per line is ≥ 1 (set_quantity with ≤ 0 removes the line)
/// - At most [`MAX_CART_LINES`] lines, [`MAX_LINE_QUANTITY`] per line
/// - No persisted identity: lines exist only until checkout succeeds
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    /// Lines in the cart.
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart { lines: Vec::new() }
    }

    /// Adds a product to the cart, or increases quantity if already present.
    ///
    /// ## Stock Check
    /// For stock-tracked products the resulting quantity may not exceed the
    /// product's current stock level; the line's `known_stock` is refreshed
    /// from the product on every add, so repeated adds check against the
    /// freshest figure the cashier has seen.
    pub fn add(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            return Err(CoreError::Validation(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }));
        }

        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product.id) {
            let new_qty = line.quantity + quantity;
            if new_qty > MAX_LINE_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_LINE_QUANTITY,
                });
            }
            line.known_stock = product.stock;
            if product.has_stock && new_qty > line.known_stock {
                return Err(CoreError::InsufficientStock {
                    name: line.product_name.clone(),
                    available: line.known_stock,
                    requested: new_qty,
                });
            }
            line.quantity = new_qty;
            return Ok(());
        }

        if self.lines.len() >= MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }

        if product.has_stock && quantity > product.stock {
            return Err(CoreError::InsufficientStock {
                name: product.name.clone(),
                available: product.stock,
                requested: quantity,
            });
        }

        self.lines.push(CartLine::from_product(product, quantity));
        Ok(())
    }

    /// Sets the quantity of an existing line.
    ///
    /// ## Behavior
    /// - `quantity ≤ 0` removes the line
    /// - Otherwise the same advisory stock check as `add`, against the
    ///   stock level captured on the line
    pub fn set_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            return self.remove(product_id);
        }

        if quantity > MAX_LINE_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_LINE_QUANTITY,
            });
        }

        let line = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == product_id)
            .ok_or_else(|| CoreError::NotInCart(product_id.to_string()))?;

        if line.has_stock && quantity > line.known_stock {
            return Err(CoreError::InsufficientStock {
                name: line.product_name.clone(),
                available: line.known_stock,
                requested: quantity,
            });
        }

        line.quantity = quantity;
        Ok(())
    }

    /// Removes a line by product ID.
    pub fn remove(&mut self, product_id: &str) -> CoreResult<()> {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);

        if self.lines.len() == before {
            Err(CoreError::NotInCart(product_id.to_string()))
        } else {
            Ok(())
        }
    }

    /// Clears all lines.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Cart subtotal: sum of line subtotals, recomputed live.
    pub fn subtotal(&self) -> i64 {
        self.lines.iter().map(|l| l.subtotal()).sum()
    }

    /// Total quantity across all lines, recomputed live.
    pub fn item_count(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Number of distinct lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
