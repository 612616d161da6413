//! # Pricing Calculator
//!
//! Derives subtotal, discount amount, tax, and grand total from a cart and
//! its applied discounts. Pure: same cart, same discounts, same rate -
//! same result, every time.
//!
//! ## Derivation
//! ```text
//! subtotal            = Σ line.quantity × line.unit_price
//! discount            = clamp(Σ effect(rule, subtotal), 0, subtotal)
//! discounted subtotal = subtotal − discount
//! tax                 = discounted subtotal × tax rate     (post-discount!)
//! total               = discounted subtotal + tax
//! ```
//!
//! ## Rounding
//! Line totals and the subtotal are exact integer cents. Each *derived*
//! component (the summed discount, the tax) is computed in i128 at
//! basis-point scale and rounded half-up exactly once - never per
//! intermediate step - so stacked percentage discounts cannot compound
//! rounding error.

use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::discount::AppliedDiscounts;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{DiscountKind, TaxRate};

// =============================================================================
// Pricing Result
// =============================================================================

/// The priced breakdown of a cart. This is the only input the Transaction
/// Committer accepts for monetary fields - it never recomputes totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingResult {
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
}

impl PricingResult {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }

    #[inline]
    pub fn tax(&self) -> Money {
        Money::from_cents(self.tax_cents)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Pricing
// =============================================================================

/// Prices a cart against its applied discounts and the store tax rate.
///
/// ## Errors
/// [`CoreError::EmptyCart`] if the cart has zero lines. Callers must not
/// attempt to commit an empty cart.
///
/// ```rust
/// use tally_core::{price, AppliedDiscounts, Cart, TaxRate};
/// # use tally_core::types::Product;
/// # use chrono::Utc;
/// # let product = Product {
/// #     id: "p1".into(), store_id: "s1".into(), name: "Widget".into(),
/// #     sku: None, barcode: None, price_cents: 1000, cost_cents: 0,
/// #     stock_quantity: 10, min_stock_level: 0, is_active: true,
/// #     created_at: Utc::now(), updated_at: Utc::now(),
/// # };
///
/// let mut cart = Cart::new();
/// cart.add_line(&product, 2).unwrap();
///
/// let pricing = price(&cart, &AppliedDiscounts::new(), TaxRate::from_bps(800)).unwrap();
/// assert_eq!(pricing.subtotal_cents, 2000);
/// assert_eq!(pricing.total_cents, 2160); // $20.00 + 8% tax
/// ```
pub fn price(
    cart: &Cart,
    discounts: &AppliedDiscounts,
    tax_rate: TaxRate,
) -> CoreResult<PricingResult> {
    if cart.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    let subtotal_cents = cart.subtotal_cents();

    // Sum all discount effects at bps scale (cents × 10_000), then round
    // the summed amount to cents once. Each effect is evaluated against
    // the pre-discount subtotal (additive stacking).
    let mut discount_scaled: i128 = 0;
    for rule in discounts.rules() {
        discount_scaled += match rule.kind {
            DiscountKind::Percentage => subtotal_cents as i128 * rule.value as i128,
            DiscountKind::FixedAmount => rule.value as i128 * 10_000,
        };
    }
    let discount_cents = ((discount_scaled + 5_000) / 10_000) as i64;
    let discount = Money::from_cents(discount_cents)
        .clamp_between(Money::zero(), Money::from_cents(subtotal_cents));

    let discounted_subtotal = Money::from_cents(subtotal_cents) - discount;

    // Tax is charged on the post-discount amount.
    let tax = discounted_subtotal.calculate_tax(tax_rate);
    let total = discounted_subtotal + tax;

    Ok(PricingResult {
        subtotal_cents,
        discount_cents: discount.cents(),
        tax_cents: tax.cents(),
        total_cents: total.cents(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
