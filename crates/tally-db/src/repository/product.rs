//! # Product Repository
//!
//! The Catalog Index adapter: read-only product lookups for the checkout
//! pipeline, plus the inventory adjustments the catalog side performs.
//!
//! Stock changes are always expressed as atomic deltas
//! (`stock_quantity = stock_quantity + ?`), never as read-then-write
//! round trips - two registers restocking or selling the same product
//! concurrently must both land.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use tally_core::Product;

const PRODUCT_COLUMNS: &str = "id, store_id, name, sku, barcode, price_cents, cost_cents, \
     stock_quantity, min_stock_level, is_active, created_at, updated_at";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists the active products for a store, ordered by name.
    ///
    /// This is the `listActiveProducts` read contract the checkout front
    /// end uses to populate its product grid.
    pub async fn list_active(&self, store_id: &str) -> StoreResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE store_id = ?1 AND is_active = 1 ORDER BY name"
        ))
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> StoreResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Resolves a scanned barcode to an active product.
    ///
    /// Barcode *decoding* happens upstream; by the time a code reaches
    /// this call it is an opaque lookup key.
    pub async fn find_by_barcode(&self, store_id: &str, code: &str) -> StoreResult<Option<Product>> {
        debug!(store_id = %store_id, code = %code, "Barcode lookup");

        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE store_id = ?1 AND barcode = ?2 AND is_active = 1"
        ))
        .bind(store_id)
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Finds an active product by SKU.
    pub async fn find_by_sku(&self, store_id: &str, sku: &str) -> StoreResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE store_id = ?1 AND sku = ?2 AND is_active = 1"
        ))
        .bind(store_id)
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Searches active products by name, SKU, or barcode substring.
    pub async fn search(
        &self,
        store_id: &str,
        query: &str,
        limit: u32,
    ) -> StoreResult<Vec<Product>> {
        let query = query.trim();
        debug!(store_id = %store_id, query = %query, limit = %limit, "Searching products");

        if query.is_empty() {
            return self.list_active(store_id).await;
        }

        let pattern = format!("%{}%", query);
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE store_id = ?1 AND is_active = 1 \
               AND (name LIKE ?2 OR sku LIKE ?2 OR barcode LIKE ?2) \
             ORDER BY name LIMIT ?3"
        ))
        .bind(store_id)
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Inserts a new product.
    ///
    /// ## Errors
    /// [`StoreError::UniqueViolation`] if the SKU or barcode already
    /// exists within the store.
    pub async fn insert(&self, product: &Product) -> StoreResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            "INSERT INTO products ( \
                id, store_id, name, sku, barcode, price_cents, cost_cents, \
                stock_quantity, min_stock_level, is_active, created_at, updated_at \
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )
        .bind(&product.id)
        .bind(&product.store_id)
        .bind(&product.name)
        .bind(&product.sku)
        .bind(&product.barcode)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(product.stock_quantity)
        .bind(product.min_stock_level)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Adds received stock as an atomic delta (manual edit or import).
    ///
    /// Sale-time *decrements* do not go through here - they belong to the
    /// committer's transaction so they land together with the sale record.
    pub async fn restock(&self, id: &str, delta: i64) -> StoreResult<()> {
        debug!(id = %id, delta = %delta, "Restocking product");

        let result = sqlx::query(
            "UPDATE products \
             SET stock_quantity = stock_quantity + ?2, updated_at = ?3 \
             WHERE id = ?1",
        )
        .bind(id)
        .bind(delta)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Product", id));
        }
        Ok(())
    }

    /// Soft-deletes a product. Historical sales keep referencing it; it
    /// just disappears from the catalog index.
    pub async fn deactivate(&self, id: &str) -> StoreResult<()> {
        debug!(id = %id, "Deactivating product");

        let result =
            sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1")
                .bind(id)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Product", id));
        }
        Ok(())
    }

    /// Counts active products for a store (diagnostics/seed).
    pub async fn count(&self, store_id: &str) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE store_id = ?1 AND is_active = 1",
        )
        .bind(store_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
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

    fn product(store_id: &str, name: &str, barcode: Option<&str>) -> Product {
        let now = Utc::now();
        Product {
            id: generate_product_id(),
            store_id: store_id.to_string(),
            name: name.to_string(),
            sku: Some(format!("SKU-{}", name.to_uppercase().replace(' ', "-"))),
            barcode: barcode.map(String::from),
            price_cents: 499,
            cost_cents: 250,
            stock_quantity: 20,
            min_stock_level: 5,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let store_id = seed_store(&db).await;
        let repo = db.products();

        let p = product(&store_id, "Cola 330ml", Some("5901234123457"));
        repo.insert(&p).await.unwrap();

        let by_id = repo.get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(by_id.name, "Cola 330ml");

        let by_barcode = repo
            .find_by_barcode(&store_id, "5901234123457")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_barcode.id, p.id);

        let by_sku = repo
            .find_by_sku(&store_id, p.sku.as_deref().unwrap())
            .await
            .unwrap();
        assert!(by_sku.is_some());

        assert!(repo
            .find_by_barcode(&store_id, "0000000000000")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_list_active_excludes_deactivated() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let store_id = seed_store(&db).await;
        let repo = db.products();

        let keep = product(&store_id, "Keep", None);
        let drop = product(&store_id, "Drop", None);
        repo.insert(&keep).await.unwrap();
        repo.insert(&drop).await.unwrap();

        repo.deactivate(&drop.id).await.unwrap();

        let active = repo.list_active(&store_id).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, keep.id);
        assert_eq!(repo.count(&store_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_barcode_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let store_id = seed_store(&db).await;
        let repo = db.products();

        repo.insert(&product(&store_id, "First", Some("111")))
            .await
            .unwrap();
        let err = repo
            .insert(&product(&store_id, "Second", Some("111")))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation_on("barcode"));
    }

    #[tokio::test]
    async fn test_restock_is_additive() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let store_id = seed_store(&db).await;
        let repo = db.products();

        let p = product(&store_id, "Widget", None);
        repo.insert(&p).await.unwrap();

        repo.restock(&p.id, 30).await.unwrap();
        let after = repo.get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(after.stock_quantity, 50);
    }

    #[tokio::test]
    async fn test_search_matches_name_and_sku() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let store_id = seed_store(&db).await;
        let repo = db.products();

        repo.insert(&product(&store_id, "Cola 330ml", None))
            .await
            .unwrap();
        repo.insert(&product(&store_id, "Lemonade", None))
            .await
            .unwrap();

        let hits = repo.search(&store_id, "cola", 10).await.unwrap();
        assert_eq!(hits.len(), 1);

        let hits = repo.search(&store_id, "SKU-LEM", 10).await.unwrap();
        assert_eq!(hits.len(), 1);

        // Empty query falls back to the full active list.
        let hits = repo.search(&store_id, "  ", 10).await.unwrap();
        assert_eq!(hits.len(), 2);
    }
}
