//! # Validation Module
//!
//! Input validation for checkout operations.
//!
//! ## Validation Strategy
//! ```text
//! Layer 1: caller (front end)     - format checks, immediate feedback
//! Layer 2: THIS MODULE            - business-rule validation
//! Layer 3: database (tally-db)    - NOT NULL / UNIQUE / FK constraints
//!
//! Defense in depth: each layer catches different mistakes.
//! ```

use crate::error::ValidationError;
use crate::types::{DiscountKind, DiscountRule};
use crate::MAX_LINE_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates a cart line quantity.
///
/// ## Rules
/// - Must be at least 1 (zero means "remove the line", handled upstream)
/// - Must not exceed [`MAX_LINE_QUANTITY`]
///
/// ```rust
/// use tally_core::validation::validate_quantity;
///
/// assert!(validate_quantity(5).is_ok());
/// assert!(validate_quantity(0).is_err());
/// assert!(validate_quantity(1_000).is_err());
/// ```
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity < 1 {
        return Err(ValidationError::MustBePositive { field: "quantity" });
    }
    if quantity > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity",
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }
    Ok(())
}

/// Validates a unit price in cents. Prices are non-negative; refunds are
/// modeled as corrections outside this core, never as negative catalog
/// prices.
pub fn validate_unit_price(price_cents: i64) -> ValidationResult<()> {
    if price_cents < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "unit_price_cents",
        });
    }
    Ok(())
}

/// Validates a discount rule's magnitude.
///
/// ## Rules
/// - Percentage rules: 1..=10000 bps (more than 100% off is never valid)
/// - Fixed-amount rules: positive cents
pub fn validate_discount_rule(rule: &DiscountRule) -> ValidationResult<()> {
    if rule.name.trim().is_empty() {
        return Err(ValidationError::Required { field: "name" });
    }

    match rule.kind {
        DiscountKind::Percentage => {
            if rule.value < 1 || rule.value > 10_000 {
                return Err(ValidationError::OutOfRange {
                    field: "value",
                    min: 1,
                    max: 10_000,
                });
            }
        }
        DiscountKind::FixedAmount => {
            if rule.value < 1 {
                return Err(ValidationError::MustBePositive { field: "value" });
            }
        }
    }

    if let Some(min) = rule.min_order_cents {
        if min < 0 {
            return Err(ValidationError::MustBeNonNegative {
                field: "min_order_cents",
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn rule(kind: DiscountKind, value: i64) -> DiscountRule {
        DiscountRule {
            id: "d-1".into(),
            store_id: "s-1".into(),
            name: "Test".into(),
            kind,
            value,
            min_order_cents: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_quantity_bounds() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_LINE_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
        assert!(validate_quantity(MAX_LINE_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_unit_price_non_negative() {
        assert!(validate_unit_price(0).is_ok());
        assert!(validate_unit_price(999).is_ok());
        assert!(validate_unit_price(-1).is_err());
    }

    #[test]
    fn test_percentage_rule_bounds() {
        assert!(validate_discount_rule(&rule(DiscountKind::Percentage, 1000)).is_ok());
        assert!(validate_discount_rule(&rule(DiscountKind::Percentage, 10_000)).is_ok());
        assert!(validate_discount_rule(&rule(DiscountKind::Percentage, 0)).is_err());
        assert!(validate_discount_rule(&rule(DiscountKind::Percentage, 10_001)).is_err());
    }

    #[test]
    fn test_fixed_amount_rule_bounds() {
        assert!(validate_discount_rule(&rule(DiscountKind::FixedAmount, 500)).is_ok());
        assert!(validate_discount_rule(&rule(DiscountKind::FixedAmount, 0)).is_err());
    }

    #[test]
    fn test_blank_name_rejected() {
        let mut r = rule(DiscountKind::Percentage, 1000);
        r.name = "   ".into();
        assert!(validate_discount_rule(&r).is_err());
    }
}
