//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                     │
//! │                                                                 │
//! │  In floating point:  0.1 + 0.2 = 0.30000000000000004  ❌        │
//! │                                                                 │
//! │  OUR SOLUTION: integer cents.                                   │
//! │    $10.99 is Money(1099). The database, the pricing             │
//! │    calculator, and the committer all agree on the same          │
//! │    integer; only a front end ever renders dollars.              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Percentages (discounts, tax rates) are expressed in basis points
//! (1 bp = 0.01%), so `825` means 8.25%. Derived amounts are computed in
//! i128 and rounded half-up exactly once per component.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents for USD).
///
/// ## Design Decisions
/// - **i64 (signed)**: allows negative values for refunds and corrections
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Derives**: full serde support for JSON serialization
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion, truncated toward zero.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion, always 0-99.
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies by a quantity (line total = unit price × qty).
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Returns this amount's share at a basis-point rate, rounded half-up.
    ///
    /// Used for percentage discounts and tax. The i128 intermediate keeps
    /// large subtotals from overflowing; the `+ 5000` term rounds the
    /// fractional bps product to the nearest cent in one step.
    ///
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let subtotal = Money::from_cents(10000); // $100.00
    /// assert_eq!(subtotal.at_bps(1000).cents(), 1000); // 10% = $10.00
    /// assert_eq!(subtotal.at_bps(825).cents(), 825);   // 8.25% = $8.25
    /// ```
    pub fn at_bps(&self, bps: u32) -> Money {
        let scaled = (self.0 as i128 * bps as i128 + 5000) / 10000;
        Money::from_cents(scaled as i64)
    }

    /// Calculates the tax charged on this amount at the given rate.
    ///
    /// Tax is charged on the post-discount amount, so callers pass the
    /// discounted subtotal here, never the raw subtotal.
    ///
    /// ```rust
    /// use tally_core::money::Money;
    /// use tally_core::types::TaxRate;
    ///
    /// let amount = Money::from_cents(2500);      // $25.00
    /// let tax = amount.calculate_tax(TaxRate::from_bps(800)); // 8%
    /// assert_eq!(tax.cents(), 200);              // $2.00
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        self.at_bps(rate.bps())
    }

    /// Clamps this value into `[lo, hi]`.
    ///
    /// The pricing calculator uses this to keep the summed discount inside
    /// `[0, subtotal]` no matter how many rules are stacked.
    #[inline]
    pub fn clamp_between(&self, lo: Money, hi: Money) -> Money {
        Money(self.0.clamp(lo.0, hi.0))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-friendly display. Front ends do their own localized formatting.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
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

// =============================================================================
// Unit Tests
// =============================================================================
