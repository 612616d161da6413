//! # tally-core: Pure Checkout Logic for Tally POS
//!
//! This crate is the **heart** of the checkout pipeline. It contains the
//! cart, discount, pricing, and receipt-numbering logic as pure code with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Tally POS Architecture                      │
//! │                                                                 │
//! │   Register front end / service endpoint (external)              │
//! │                          │                                      │
//! │   ┌──────────────────────▼──────────────────────────────────┐   │
//! │   │              ★ tally-core (THIS CRATE) ★                │   │
//! │   │                                                         │   │
//! │   │   Catalog Index ──► Cart ──► Discounts ──► Pricing      │   │
//! │   │                                                         │   │
//! │   │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS    │   │
//! │   └──────────────────────┬──────────────────────────────────┘   │
//! │                          │ PricingResult                        │
//! │   ┌──────────────────────▼──────────────────────────────────┐   │
//! │   │            tally-db (Transaction Committer)             │   │
//! │   │      One atomic unit of work per completed sale         │   │
//! │   └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, Customer, DiscountRule, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`cart`] - The in-progress transaction aggregate
//! - [`discount`] - Discount eligibility and the applied-rule set
//! - [`pricing`] - Subtotal / discount / tax / total derivation
//! - [`receipt`] - Collision-resistant receipt number generation
//! - [`validation`] - Input validation helpers
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: pricing is deterministic - same cart, same result
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: all monetary values are cents (i64); rates are
//!    basis points; no floats anywhere near a total
//! 4. **Explicit Errors**: all errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod discount;
pub mod error;
pub mod money;
pub mod pricing;
pub mod receipt;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartLine};
pub use discount::AppliedDiscounts;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::{price, PricingResult};
pub use receipt::ReceiptSequence;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart.
///
/// Prevents runaway carts and keeps a single transaction a reasonable size.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single line in the cart.
///
/// Guards against fat-finger entry (e.g. typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;

/// How many times a commit is retried when the allocated receipt number
/// collides with one already recorded for the store.
pub const MAX_RECEIPT_RETRIES: u32 = 3;
