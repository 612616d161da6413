//! # Sale Repository
//!
//! The read side of committed sales, plus the transaction-scoped write
//! helpers the committer uses. The helpers take `&mut SqliteConnection`
//! so the header and its lines always land inside the caller's open
//! transaction; nothing here commits on its own.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::StoreResult;
use tally_core::{Sale, SaleItem};

const SALE_COLUMNS: &str = "id, store_id, staff_id, customer_id, subtotal_cents, \
     discount_cents, tax_cents, total_cents, payment_method, payment_status, \
     receipt_number, created_at";

const ITEM_COLUMNS: &str =
    "id, sale_id, product_id, quantity, unit_price_cents, line_total_cents, created_at";

/// Repository for reading committed sales.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by its ID.
    pub async fn get_by_id(&self, id: &str) -> StoreResult<Option<Sale>> {
        let sale =
            sqlx::query_as::<_, Sale>(&format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(sale)
    }

    /// Looks a sale up by its receipt number within a store.
    pub async fn get_by_receipt(
        &self,
        store_id: &str,
        receipt_number: &str,
    ) -> StoreResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales \
             WHERE store_id = ?1 AND receipt_number = ?2"
        ))
        .bind(store_id)
        .bind(receipt_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Returns the line items of a sale in insertion order.
    pub async fn items(&self, sale_id: &str) -> StoreResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY rowid"
        ))
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists the most recent sales for a store, newest first.
    pub async fn list_recent(&self, store_id: &str, limit: u32) -> StoreResult<Vec<Sale>> {
        debug!(store_id = %store_id, limit = %limit, "Listing recent sales");

        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales \
             WHERE store_id = ?1 ORDER BY created_at DESC, rowid DESC LIMIT ?2"
        ))
        .bind(store_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Counts committed sales for a store (diagnostics/seed).
    pub async fn count(&self, store_id: &str) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE store_id = ?1")
            .bind(store_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Inserts the sale header inside an open transaction.
pub(crate) async fn insert_sale(conn: &mut SqliteConnection, sale: &Sale) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO sales ( \
            id, store_id, staff_id, customer_id, subtotal_cents, discount_cents, \
            tax_cents, total_cents, payment_method, payment_status, receipt_number, \
            created_at \
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
    )
    .bind(&sale.id)
    .bind(&sale.store_id)
    .bind(&sale.staff_id)
    .bind(&sale.customer_id)
    .bind(sale.subtotal_cents)
    .bind(sale.discount_cents)
    .bind(sale.tax_cents)
    .bind(sale.total_cents)
    .bind(sale.payment_method)
    .bind(sale.payment_status)
    .bind(&sale.receipt_number)
    .bind(sale.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Inserts one sale line inside an open transaction.
pub(crate) async fn insert_item(conn: &mut SqliteConnection, item: &SaleItem) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO sale_items ( \
            id, sale_id, product_id, quantity, unit_price_cents, line_total_cents, \
            created_at \
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )
    .bind(&item.id)
    .bind(&item.sale_id)
    .bind(&item.product_id)
    .bind(item.quantity)
    .bind(item.unit_price_cents)
    .bind(item.line_total_cents)
    .bind(item.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Helper to generate a new sale or sale-item ID.
pub fn generate_sale_id() -> String {
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
    use tally_core::{PaymentMethod, PaymentStatus};

    fn sale(store_id: &str, receipt: &str) -> Sale {
        Sale {
            id: generate_sale_id(),
            store_id: store_id.to_string(),
            staff_id: "staff-1".to_string(),
            customer_id: None,
            subtotal_cents: 2500,
            discount_cents: 0,
            tax_cents: 200,
            total_cents: 2700,
            payment_method: PaymentMethod::Cash,
            payment_status: PaymentStatus::Completed,
            receipt_number: receipt.to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_read_back() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let store_id = seed_store(&db).await;

        let s = sale(&store_id, "R-20260824-120000-0001");
        let mut txn = db.pool().begin().await.unwrap();
        insert_sale(&mut txn, &s).await.unwrap();
        txn.commit().await.unwrap();

        let repo = db.sales();
        let by_id = repo.get_by_id(&s.id).await.unwrap().unwrap();
        assert_eq!(by_id.total_cents, 2700);
        assert_eq!(by_id.payment_status, PaymentStatus::Completed);

        let by_receipt = repo
            .get_by_receipt(&store_id, "R-20260824-120000-0001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_receipt.id, s.id);
    }

    #[tokio::test]
    async fn test_duplicate_receipt_rejected_per_store() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let store_id = seed_store(&db).await;

        let mut txn = db.pool().begin().await.unwrap();
        insert_sale(&mut txn, &sale(&store_id, "R-20260824-120000-0001"))
            .await
            .unwrap();
        let err = insert_sale(&mut txn, &sale(&store_id, "R-20260824-120000-0001"))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation_on("receipt_number"));
    }

    #[tokio::test]
    async fn test_list_recent_orders_newest_first() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let store_id = seed_store(&db).await;

        let mut txn = db.pool().begin().await.unwrap();
        for i in 0..3 {
            insert_sale(&mut txn, &sale(&store_id, &format!("R-0000000{i}")))
                .await
                .unwrap();
        }
        txn.commit().await.unwrap();

        let recent = db.sales().list_recent(&store_id, 2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].receipt_number, "R-00000002");
        assert_eq!(db.sales().count(&store_id).await.unwrap(), 3);
    }
}
