//! # Discount Repository
//!
//! Storage for promotional rules. The evaluator in `tally-core` works on
//! in-memory [`DiscountRule`] values; this repository is where a register
//! loads the store's active rules from before a checkout session.

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use tally_core::{validation::validate_discount_rule, DiscountRule};

const DISCOUNT_COLUMNS: &str =
    "id, store_id, name, kind, value, min_order_cents, is_active, created_at, updated_at";

/// Repository for discount rule database operations.
#[derive(Debug, Clone)]
pub struct DiscountRepository {
    pool: SqlitePool,
}

impl DiscountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DiscountRepository { pool }
    }

    /// Lists the active rules for a store, ordered by name.
    pub async fn list_active(&self, store_id: &str) -> StoreResult<Vec<DiscountRule>> {
        let rules = sqlx::query_as::<_, DiscountRule>(&format!(
            "SELECT {DISCOUNT_COLUMNS} FROM discounts \
             WHERE store_id = ?1 AND is_active = 1 ORDER BY name"
        ))
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rules)
    }

    /// Gets a rule by ID.
    pub async fn get_by_id(&self, id: &str) -> StoreResult<Option<DiscountRule>> {
        let rule = sqlx::query_as::<_, DiscountRule>(&format!(
            "SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(rule)
    }

    /// Inserts a new rule after validating its shape (percentage within
    /// 100%, positive magnitudes, non-blank name).
    pub async fn insert(&self, rule: &DiscountRule) -> StoreResult<()> {
        validate_discount_rule(rule).map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        debug!(id = %rule.id, name = %rule.name, "Inserting discount rule");

        sqlx::query(
            "INSERT INTO discounts ( \
                id, store_id, name, kind, value, min_order_cents, is_active, \
                created_at, updated_at \
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&rule.id)
        .bind(&rule.store_id)
        .bind(&rule.name)
        .bind(rule.kind)
        .bind(rule.value)
        .bind(rule.min_order_cents)
        .bind(rule.is_active)
        .bind(rule.created_at)
        .bind(rule.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Retires a rule. Sales that already used it keep their recorded
    /// discount amounts.
    pub async fn deactivate(&self, id: &str) -> StoreResult<()> {
        debug!(id = %id, "Deactivating discount rule");

        let result = sqlx::query(
            "UPDATE discounts SET is_active = 0, updated_at = ?2 WHERE id = ?1",
        )
        .bind(id)
        .bind(chrono::Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("DiscountRule", id));
        }
        Ok(())
    }
}

/// Helper to generate a new discount rule ID.
pub fn generate_discount_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::store::test_support::seed_store;
    use chrono::Utc;
    use tally_core::DiscountKind;

    fn rule(store_id: &str, name: &str, kind: DiscountKind, value: i64) -> DiscountRule {
        let now = Utc::now();
        DiscountRule {
            id: generate_discount_id(),
            store_id: store_id.to_string(),
            name: name.to_string(),
            kind,
            value,
            min_order_cents: Some(5000),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_list_active() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let store_id = seed_store(&db).await;
        let repo = db.discounts();

        let ten_off = rule(&store_id, "10% off", DiscountKind::Percentage, 1000);
        let five_bucks = rule(&store_id, "$5 off", DiscountKind::FixedAmount, 500);
        repo.insert(&ten_off).await.unwrap();
        repo.insert(&five_bucks).await.unwrap();

        repo.deactivate(&five_bucks.id).await.unwrap();

        let active = repo.list_active(&store_id).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, ten_off.id);
        assert_eq!(active[0].kind, DiscountKind::Percentage);
        assert_eq!(active[0].min_order_cents, Some(5000));
    }

    #[tokio::test]
    async fn test_invalid_rule_rejected_before_insert() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let store_id = seed_store(&db).await;

        // 150% off is not a percentage discount.
        let bad = rule(&store_id, "oops", DiscountKind::Percentage, 15_000);
        assert!(db.discounts().insert(&bad).await.is_err());
    }
}
