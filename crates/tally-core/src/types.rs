//! # Domain Types
//!
//! Core domain types used throughout Tally POS.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  Catalog side             Checkout side          Ledger side    │
//! │                                                                 │
//! │  Product ───snapshot───►  CartLine               Sale           │
//! │  DiscountRule ─────────►  AppliedDiscounts  ──►  SaleItem       │
//! │  Store (tax rate)  ────►  PricingResult          Customer       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every persistent entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where one exists (sku, barcode, receipt_number) -
//!   human-readable and unique per store
//!
//! All monetary fields are integer cents; all rates are basis points.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate in basis points (bps). 1 bp = 0.01%, so 800 = 8%.
///
/// The rate is store configuration, read by the pricing calculator and
/// never owned by the checkout core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (convenience for configuration).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale in one store's catalog.
///
/// Mutated only by inventory operations (manual edit, import, sale commit).
/// Never hard-deleted while referenced by historical sales; `is_active`
/// is the soft-delete flag owned by the catalog side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Store this product belongs to.
    pub store_id: String,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Stock Keeping Unit - optional business identifier, unique per store.
    pub sku: Option<String>,

    /// Barcode (EAN-13, UPC-A, ...) - optional, unique per store. Decoding
    /// is out of scope; this is only a lookup key.
    pub barcode: Option<String>,

    /// Unit price in cents. Non-negative.
    pub price_cents: i64,

    /// Unit cost in cents (for margin reporting downstream).
    pub cost_cents: i64,

    /// On-hand quantity. Never below zero.
    pub stock_quantity: i64,

    /// Reorder threshold for low-stock alerts.
    pub min_stock_level: i64,

    /// Whether the product appears in the catalog index.
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the unit price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// True when on-hand quantity is at or below the reorder threshold.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity <= self.min_stock_level
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer loyalty aggregate.
///
/// `total_spent_cents`, `visit_count`, and `loyalty_points` are monotonically
/// non-decreasing under normal operation and are mutated only by a successful
/// commit that references this customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: String,
    pub store_id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub loyalty_points: i64,
    pub total_spent_cents: i64,
    pub visit_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Returns lifetime spend as Money.
    #[inline]
    pub fn total_spent(&self) -> Money {
        Money::from_cents(self.total_spent_cents)
    }
}

/// Loyalty points earned for a charged total.
///
/// One point per whole currency unit actually charged, floored - the same
/// deterministic function the committer applies, exposed so callers can
/// preview accrual before commit.
#[inline]
pub fn loyalty_points_for(total: Money) -> i64 {
    total.cents().max(0) / 100
}

// =============================================================================
// Discount Rules
// =============================================================================

/// The kind of promotional rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// Percentage off the pre-discount subtotal. `value` is basis points.
    Percentage,
    /// Flat amount off. `value` is cents.
    FixedAmount,
}

/// A store-scoped promotional rule.
///
/// Immutable from the cart's perspective during one checkout: the evaluator
/// holds a clone of the rule as it looked when applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DiscountRule {
    pub id: String,
    pub store_id: String,
    pub name: String,
    pub kind: DiscountKind,

    /// Magnitude: basis points for [`DiscountKind::Percentage`]
    /// (1000 = 10% off), cents for [`DiscountKind::FixedAmount`].
    pub value: i64,

    /// Minimum pre-discount subtotal (cents) required for eligibility.
    pub min_order_cents: Option<i64>,

    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Payment
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on an external terminal.
    Card,
}

/// Payment status on the sale record.
///
/// A commit always writes `Completed`; later corrections (refunds) are
/// handled outside this core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Completed,
    Refunded,
}

// =============================================================================
// Sale
// =============================================================================

/// A committed sale - the durable record of one checkout.
///
/// Created exactly once per successful commit and immutable thereafter,
/// except for payment-status corrections handled outside this core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    pub store_id: String,
    pub staff_id: String,
    pub customer_id: Option<String>,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    /// Human-presentable identifier, unique per store for all time.
    pub receipt_number: String,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the grand total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// One line of a committed sale.
///
/// Uses the snapshot pattern: `unit_price_cents` is the price recorded in
/// the cart at add time, so the sale history is decoupled from any later
/// product price change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub quantity: i64,
    /// Unit price in cents at sale time (frozen).
    pub unit_price_cents: i64,
    /// Line total before discount/tax (unit_price × quantity).
    pub line_total_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Store Configuration
// =============================================================================

/// Read-only store configuration consumed by the pricing calculator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Store {
    pub id: String,
    pub name: String,
    /// Sales tax rate in basis points (800 = 8%).
    pub tax_rate_bps: u32,
    /// ISO 4217 currency code, display-only for this core.
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

impl Store {
    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }
}

// =============================================================================
// Stock Policy
// =============================================================================

/// What the committer does when a sale would drive stock negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StockPolicy {
    /// Allow the sale and floor on-hand quantity at zero, emitting a
    /// stock-discrepancy warning for out-of-band reconciliation. This is
    /// the retail-reality default.
    #[default]
    ClampToZero,
    /// Reject the whole commit with an insufficient-stock error. Strict
    /// inventory integrity; nothing is applied.
    Reject,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_from_bps() {
        let rate = TaxRate::from_bps(825);
        assert_eq!(rate.bps(), 825);
        assert!((rate.percentage() - 8.25).abs() < 0.001);
    }

    #[test]
    fn test_tax_rate_from_percentage() {
        assert_eq!(TaxRate::from_percentage(8.0).bps(), 800);
        assert_eq!(TaxRate::from_percentage(8.25).bps(), 825);
    }

    #[test]
    fn test_loyalty_points_floor() {
        // $27.00 → 27 points, $27.99 → 27 points
        assert_eq!(loyalty_points_for(Money::from_cents(2700)), 27);
        assert_eq!(loyalty_points_for(Money::from_cents(2799)), 27);
        assert_eq!(loyalty_points_for(Money::from_cents(99)), 0);
        assert_eq!(loyalty_points_for(Money::zero()), 0);
    }

    #[test]
    fn test_stock_policy_default_is_clamp() {
        assert_eq!(StockPolicy::default(), StockPolicy::ClampToZero);
    }
}
