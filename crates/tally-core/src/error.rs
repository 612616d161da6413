//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Error Types                             │
//! │                                                                 │
//! │  tally-core errors (this file)                                  │
//! │  ├── CoreError        - cart/discount/pricing failures          │
//! │  └── ValidationError  - input validation failures               │
//! │                                                                 │
//! │  tally-db errors (separate crate)                               │
//! │  ├── StoreError       - persistence failures                    │
//! │  └── CommitError      - checkout commit failures                │
//! │                                                                 │
//! │  Flow: ValidationError → CoreError → CommitError → caller       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Propagation Policy
//! Cart/discount/pricing errors are recoverable: the operator is shown the
//! reason ("minimum order not met") and keeps working with the same cart.
//! Commit-phase errors (in tally-db) surface as a failed transaction with
//! no partial state change.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Checkout business-logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced entity does not exist or is not usable.
    ///
    /// Raised for unknown product ids in cart operations and for inactive
    /// products/discount rules offered to the pipeline.
    #[error("{entity} reference is invalid: {id}")]
    InvalidReference { entity: &'static str, id: String },

    /// Pricing or commit was invoked against a cart with zero lines.
    #[error("cart is empty")]
    EmptyCart,

    /// The discount rule is already in the applied set. A rule may be
    /// applied at most once per transaction.
    #[error("discount {rule_id} is already applied")]
    AlreadyApplied { rule_id: String },

    /// The cart's pre-discount subtotal is below the rule's minimum.
    ///
    /// Non-fatal: surfaced to the operator as a recoverable choice.
    #[error(
        "minimum order of {min_order_cents} cents not met (subtotal {subtotal_cents} cents)"
    )]
    MinimumNotMet {
        min_order_cents: i64,
        subtotal_cents: i64,
    },

    /// Cart has exceeded the maximum allowed distinct lines.
    #[error("cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds the maximum allowed.
    #[error("quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Validation error (wraps ValidationError).
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors, raised before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: &'static str },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
    },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: &'static str },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: &'static str },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
