//! # Cart
//!
//! The mutable aggregate for one in-progress transaction.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       Cart Operations                           │
//! │                                                                 │
//! │  Scan / click product ──► add_line()      ──► line qty += n     │
//! │  Change quantity      ──► set_quantity()  ──► qty = n (0 ⇒ rm)  │
//! │  Remove button        ──► remove_line()   ──► line dropped      │
//! │  New transaction      ──► clear()         ──► empty cart        │
//! │  Price / commit       ──► snapshot()      ──► ordered lines     │
//! │                                                                 │
//! │  The cart is session-local state. It is never persisted; a      │
//! │  checkout abandoned before commit leaves no trace anywhere.     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The cart is an explicit value owned by the checkout session and passed
//! by reference into pricing/discount/commit calls. There is no process-wide
//! cart singleton; concurrent registers each hold their own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Product;
use crate::validation::validate_quantity;
use crate::MAX_CART_LINES;

// =============================================================================
// Cart Line
// =============================================================================

/// One product-and-quantity pair in the cart.
///
/// ## Price Freezing
/// The unit price is captured when the product is added. If the catalog
/// price changes mid-checkout, this line (and the eventual SaleItem)
/// retains the price the operator quoted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    /// Product ID (UUID), the line's identity within the cart.
    pub product_id: String,

    /// Product name at time of adding (frozen, for display and receipts).
    pub name: String,

    /// SKU at time of adding (frozen).
    pub sku: Option<String>,

    /// Unit price in cents at time of adding (frozen).
    pub unit_price_cents: i64,

    /// Quantity in cart. Always >= 1; a zero-quantity line is removed,
    /// never kept.
    pub quantity: i64,

    /// When this line was first added.
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    fn from_product(product: &Product, quantity: i64) -> Self {
        CartLine {
            product_id: product.id.clone(),
            name: product.name.clone(),
            sku: product.sku.clone(),
            unit_price_cents: product.price_cents,
            quantity,
            added_at: Utc::now(),
        }
    }

    /// Line total (unit price × quantity), before discount and tax.
    #[inline]
    pub fn line_total_cents(&self) -> i64 {
        self.unit_price_cents * self.quantity
    }

    /// Line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents())
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The in-progress transaction.
///
/// ## Invariants
/// - Lines are unique by `product_id`; adding the same product again
///   increases quantity instead of duplicating the line
/// - Every line has quantity >= 1
/// - Insertion order is preserved (relevant for display only; totals are
///   order-independent)
/// - At most [`MAX_CART_LINES`] distinct lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,

    /// Selected loyalty customer, if any.
    pub customer_id: Option<String>,

    /// When the cart was created or last cleared.
    pub created_at: DateTime<Utc>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart {
            lines: Vec::new(),
            customer_id: None,
            created_at: Utc::now(),
        }
    }

    /// Adds a product to the cart, or increases quantity if a line for it
    /// already exists.
    ///
    /// ## Errors
    /// - [`CoreError::InvalidReference`] if the product is inactive
    /// - [`CoreError::QuantityTooLarge`] if the resulting quantity exceeds
    ///   the per-line maximum
    /// - [`CoreError::CartTooLarge`] if the cart is at its line limit
    pub fn add_line(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        if !product.is_active {
            return Err(CoreError::InvalidReference {
                entity: "product",
                id: product.id.clone(),
            });
        }
        validate_quantity(quantity)?;

        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == product.id)
        {
            let new_qty = line.quantity + quantity;
            validate_quantity(new_qty).map_err(|_| CoreError::QuantityTooLarge {
                requested: new_qty,
                max: crate::MAX_LINE_QUANTITY,
            })?;
            line.quantity = new_qty;
            return Ok(());
        }

        if self.lines.len() >= MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }

        self.lines.push(CartLine::from_product(product, quantity));
        Ok(())
    }

    /// Sets the quantity of a line. Quantity <= 0 is equivalent to
    /// [`Cart::remove_line`].
    ///
    /// ## Errors
    /// [`CoreError::InvalidReference`] if no line exists for `product_id`.
    pub fn set_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            return self.remove_line(product_id);
        }
        validate_quantity(quantity)?;

        match self.lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => {
                line.quantity = quantity;
                Ok(())
            }
            None => Err(CoreError::InvalidReference {
                entity: "cart line",
                id: product_id.to_string(),
            }),
        }
    }

    /// Removes a line by product ID.
    ///
    /// ## Errors
    /// [`CoreError::InvalidReference`] if no line exists for `product_id`.
    pub fn remove_line(&mut self, product_id: &str) -> CoreResult<()> {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);

        if self.lines.len() == before {
            return Err(CoreError::InvalidReference {
                entity: "cart line",
                id: product_id.to_string(),
            });
        }
        Ok(())
    }

    /// Clears all lines and the selected customer.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.customer_id = None;
        self.created_at = Utc::now();
    }

    /// Attaches a loyalty customer to this transaction.
    pub fn set_customer(&mut self, customer_id: impl Into<String>) {
        self.customer_id = Some(customer_id.into());
    }

    /// The lines in insertion order. This is the authoritative input to
    /// pricing and commit.
    #[inline]
    pub fn snapshot(&self) -> &[CartLine] {
        &self.lines
    }

    /// Number of distinct lines.
    #[inline]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Total quantity across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Pre-discount subtotal in cents.
    pub fn subtotal_cents(&self) -> i64 {
        self.lines.iter().map(|l| l.line_total_cents()).sum()
    }

    /// Pre-discount subtotal as Money.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
