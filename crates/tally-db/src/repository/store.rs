//! # Store Repository
//!
//! Store configuration reads. The pricing calculator consumes the tax
//! rate from here; it never owns the rate itself.

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use tally_core::{Store, TaxRate};

const STORE_COLUMNS: &str = "id, name, tax_rate_bps, currency, created_at";

/// Repository for store configuration.
#[derive(Debug, Clone)]
pub struct StoreRepository {
    pool: SqlitePool,
}

impl StoreRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StoreRepository { pool }
    }

    /// Gets a store by its ID.
    pub async fn get_by_id(&self, id: &str) -> StoreResult<Option<Store>> {
        let store =
            sqlx::query_as::<_, Store>(&format!("SELECT {STORE_COLUMNS} FROM stores WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(store)
    }

    /// Reads the configured tax rate for a store.
    pub async fn tax_rate(&self, id: &str) -> StoreResult<TaxRate> {
        let store = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| StoreError::not_found("Store", id))?;

        Ok(store.tax_rate())
    }

    /// Inserts a new store.
    pub async fn insert(&self, store: &Store) -> StoreResult<()> {
        debug!(id = %store.id, name = %store.name, "Inserting store");

        sqlx::query(
            "INSERT INTO stores (id, name, tax_rate_bps, currency, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&store.id)
        .bind(&store.name)
        .bind(store.tax_rate_bps)
        .bind(&store.currency)
        .bind(store.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates the tax rate for a store (configuration change).
    pub async fn set_tax_rate(&self, id: &str, rate: TaxRate) -> StoreResult<()> {
        debug!(id = %id, bps = rate.bps(), "Updating store tax rate");

        let result = sqlx::query("UPDATE stores SET tax_rate_bps = ?2 WHERE id = ?1")
            .bind(id)
            .bind(rate.bps())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Store", id));
        }
        Ok(())
    }
}

/// Helper to generate a new store ID.
pub fn generate_store_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Test Support
// =============================================================================

#[cfg(test)]
pub mod test_support {
    use chrono::Utc;

    use super::generate_store_id;
    use crate::pool::Database;
    use tally_core::Store;

    /// Inserts a store with an 8% tax rate and returns its ID.
    pub async fn seed_store(db: &Database) -> String {
        let store = Store {
            id: generate_store_id(),
            name: "Test Store".to_string(),
            tax_rate_bps: 800,
            currency: "USD".to_string(),
            created_at: Utc::now(),
        };
        db.stores().insert(&store).await.unwrap();
        store.id
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::test_support::seed_store;
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_tax_rate_roundtrip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let store_id = seed_store(&db).await;
        let repo = db.stores();

        assert_eq!(repo.tax_rate(&store_id).await.unwrap().bps(), 800);

        repo.set_tax_rate(&store_id, TaxRate::from_bps(825))
            .await
            .unwrap();
        assert_eq!(repo.tax_rate(&store_id).await.unwrap().bps(), 825);
    }

    #[tokio::test]
    async fn test_unknown_store_is_not_found() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db.stores().tax_rate("missing").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }
}
