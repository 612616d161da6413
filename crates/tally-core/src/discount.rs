//! # Discount Evaluator
//!
//! Decides which promotional rules are eligible against a cart and tracks
//! the applied set. The monetary effect of each rule is *not* computed
//! here: percentage discounts depend on the final subtotal, which can
//! change as lines are edited, so effects are derived in [`crate::pricing`]
//! at pricing time.
//!
//! ## Stacking Policy
//! Discounts are **stacking and additive**: each applied rule's effect is
//! computed independently against the pre-discount subtotal and summed,
//! and the sum is clamped so the discounted subtotal never goes below
//! zero. Sequential (compounding) application would give different totals
//! whenever more than one percentage rule is applied; this codebase
//! deliberately uses the additive interpretation.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cart::Cart;
use crate::error::{CoreError, CoreResult};
use crate::types::DiscountRule;
use crate::validation::validate_discount_rule;

// =============================================================================
// Applied Discounts
// =============================================================================

/// The set of discount rules applied to the current transaction.
///
/// Set membership is by rule id: a rule may be applied at most once.
/// Holds clones of the rules as they looked when applied, so a catalog
/// edit mid-checkout cannot change an already-applied discount.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppliedDiscounts {
    rules: Vec<DiscountRule>,
}

impl AppliedDiscounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to apply a rule to the cart.
    ///
    /// ## Errors
    /// - [`CoreError::InvalidReference`] if the rule is inactive or
    ///   malformed
    /// - [`CoreError::AlreadyApplied`] if the rule id is already in the set
    /// - [`CoreError::MinimumNotMet`] if the rule declares a minimum order
    ///   amount and the cart's pre-discount subtotal is below it
    ///
    /// Both rejection variants are recoverable: the operator keeps the
    /// cart and may retry after adding items.
    pub fn apply(&mut self, cart: &Cart, rule: &DiscountRule) -> CoreResult<()> {
        if !rule.is_active {
            return Err(CoreError::InvalidReference {
                entity: "discount",
                id: rule.id.clone(),
            });
        }
        validate_discount_rule(rule)?;

        if self.rules.iter().any(|r| r.id == rule.id) {
            return Err(CoreError::AlreadyApplied {
                rule_id: rule.id.clone(),
            });
        }

        let subtotal = cart.subtotal_cents();
        if let Some(min) = rule.min_order_cents {
            if subtotal < min {
                return Err(CoreError::MinimumNotMet {
                    min_order_cents: min,
                    subtotal_cents: subtotal,
                });
            }
        }

        debug!(rule_id = %rule.id, name = %rule.name, "Discount applied");
        self.rules.push(rule.clone());
        Ok(())
    }

    /// Removes a rule from the applied set. Removing an id that is not in
    /// the set is a no-op (the operator clicked twice).
    pub fn remove(&mut self, rule_id: &str) {
        self.rules.retain(|r| r.id != rule_id);
    }

    /// The applied rules in application order.
    #[inline]
    pub fn rules(&self) -> &[DiscountRule] {
        &self.rules
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rules.len()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
