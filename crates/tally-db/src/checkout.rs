//! # Transaction Committer
//!
//! Turns a priced cart into durable records. One call, one SQLite
//! transaction: the sale header, its line items, the stock decrements,
//! and the loyalty accrual all become visible together or not at all.
//! A register crash mid-commit leaves either a complete sale or nothing.
//!
//! ## Commit Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                          │
//! │    INSERT sale header        ← first statement is a write, so   │
//! │                                the txn takes the write lock     │
//! │                                up front instead of upgrading    │
//! │                                from a read mid-flight           │
//! │    per cart line:                                               │
//! │      check product liveness  → StaleProduct on miss             │
//! │      decrement stock         → policy decides on shortfall      │
//! │      INSERT sale item                                           │
//! │    if loyalty customer:                                         │
//! │      accrue points/spend/visit → StaleCustomer on miss          │
//! │  COMMIT                                                         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Receipt Conflicts
//! The receipt number comes from a shared in-process sequence and is
//! additionally guarded by a `UNIQUE(store_id, receipt_number)` index.
//! On the (rare) constraint hit the whole commit is retried with a
//! fresh number, bounded by [`MAX_RECEIPT_RETRIES`].

use std::sync::Arc;

use chrono::Utc;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info, warn};

use tally_core::{
    loyalty_points_for, Cart, PaymentMethod, PaymentStatus, PricingResult, ReceiptSequence, Sale,
    SaleItem, StockPolicy, MAX_RECEIPT_RETRIES,
};

use crate::error::StoreError;
use crate::repository::{customer, sale};

// =============================================================================
// Commit Request
// =============================================================================

/// The non-cart inputs to a commit: who is selling, where, and how the
/// customer paid.
#[derive(Debug, Clone)]
pub struct CommitRequest {
    pub store_id: String,
    pub staff_id: String,
    pub payment_method: PaymentMethod,
    /// What to do when a line would drive stock negative.
    pub stock_policy: StockPolicy,
}

impl CommitRequest {
    pub fn new(
        store_id: impl Into<String>,
        staff_id: impl Into<String>,
        payment_method: PaymentMethod,
    ) -> Self {
        CommitRequest {
            store_id: store_id.into(),
            staff_id: staff_id.into(),
            payment_method,
            stock_policy: StockPolicy::default(),
        }
    }

    pub fn stock_policy(mut self, policy: StockPolicy) -> Self {
        self.stock_policy = policy;
        self
    }
}

// =============================================================================
// Commit Error
// =============================================================================

/// Commit failure modes. Every variant means the database is untouched:
/// the transaction rolled back and no partial sale exists.
#[derive(Debug, Error)]
pub enum CommitError {
    /// The cart has no lines; there is nothing to commit.
    #[error("cannot commit an empty cart")]
    EmptyCart,

    /// A cart line references a product that was deleted or deactivated
    /// after it was added.
    #[error("product no longer available: {product_id}")]
    StaleProduct { product_id: String },

    /// The attached loyalty customer was deleted after being selected.
    #[error("customer no longer exists: {customer_id}")]
    StaleCustomer { customer_id: String },

    /// Under [`StockPolicy::Reject`]: on-hand stock cannot cover a line.
    #[error("insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        requested: i64,
        available: i64,
    },

    /// Receipt number collided on every bounded retry. Practically
    /// unreachable with the sequence-based allocator; surfaced rather
    /// than silently overwriting history.
    #[error("could not allocate a unique receipt number after {attempts} attempts")]
    ReceiptConflict { attempts: u32 },

    /// Underlying persistence failure (connection, timeout, constraint).
    #[error(transparent)]
    Persistence(#[from] StoreError),
}

// =============================================================================
// Committer
// =============================================================================

/// The one component allowed to open a database transaction for a sale.
///
/// Cheap to clone; clones share the pool and the receipt sequence.
#[derive(Debug, Clone)]
pub struct Committer {
    pool: SqlitePool,
    receipts: Arc<ReceiptSequence>,
}

impl Committer {
    pub fn new(pool: SqlitePool, receipts: Arc<ReceiptSequence>) -> Self {
        Committer { pool, receipts }
    }

    /// Commits a priced cart as a sale.
    ///
    /// Monetary fields are taken verbatim from `pricing` - the committer
    /// never recomputes totals. On success the returned [`Sale`] is
    /// durable; the caller typically clears its cart and prints the
    /// receipt.
    pub async fn commit(
        &self,
        cart: &Cart,
        pricing: &PricingResult,
        request: &CommitRequest,
    ) -> Result<Sale, CommitError> {
        if cart.is_empty() {
            return Err(CommitError::EmptyCart);
        }

        for attempt in 1..=MAX_RECEIPT_RETRIES {
            let receipt_number = self.receipts.next();

            match self
                .try_commit(cart, pricing, request, &receipt_number)
                .await
            {
                Err(CommitError::Persistence(e))
                    if e.is_unique_violation_on("receipt_number") =>
                {
                    warn!(
                        receipt = %receipt_number,
                        attempt,
                        "Receipt number collision, retrying with a fresh number"
                    );
                    continue;
                }
                other => return other,
            }
        }

        Err(CommitError::ReceiptConflict {
            attempts: MAX_RECEIPT_RETRIES,
        })
    }

    /// One commit attempt under a single transaction.
    async fn try_commit(
        &self,
        cart: &Cart,
        pricing: &PricingResult,
        request: &CommitRequest,
        receipt_number: &str,
    ) -> Result<Sale, CommitError> {
        let now = Utc::now();
        let sale_record = Sale {
            id: sale::generate_sale_id(),
            store_id: request.store_id.clone(),
            staff_id: request.staff_id.clone(),
            customer_id: cart.customer_id.clone(),
            subtotal_cents: pricing.subtotal_cents,
            discount_cents: pricing.discount_cents,
            tax_cents: pricing.tax_cents,
            total_cents: pricing.total_cents,
            payment_method: request.payment_method,
            payment_status: PaymentStatus::Completed,
            receipt_number: receipt_number.to_string(),
            created_at: now,
        };

        let mut txn = self.pool.begin().await.map_err(StoreError::from)?;

        // Header first: the transaction's opening statement is a write.
        sale::insert_sale(&mut txn, &sale_record).await?;

        for line in cart.snapshot() {
            // Liveness check under the write lock. The frozen cart price
            // stays authoritative even if the row changed meanwhile.
            let row: Option<(i64, bool)> = sqlx::query_as(
                "SELECT stock_quantity, is_active FROM products WHERE id = ?1",
            )
            .bind(&line.product_id)
            .fetch_optional(&mut *txn)
            .await
            .map_err(StoreError::from)?;

            let (stock, is_active) = match row {
                Some(r) => r,
                None => {
                    return Err(CommitError::StaleProduct {
                        product_id: line.product_id.clone(),
                    })
                }
            };
            if !is_active {
                return Err(CommitError::StaleProduct {
                    product_id: line.product_id.clone(),
                });
            }

            let new_stock = if stock >= line.quantity {
                stock - line.quantity
            } else {
                match request.stock_policy {
                    StockPolicy::Reject => {
                        return Err(CommitError::InsufficientStock {
                            product_id: line.product_id.clone(),
                            requested: line.quantity,
                            available: stock,
                        });
                    }
                    StockPolicy::ClampToZero => {
                        warn!(
                            product_id = %line.product_id,
                            on_hand = stock,
                            sold = line.quantity,
                            "Stock discrepancy: sale exceeds on-hand quantity, flooring at zero"
                        );
                        0
                    }
                }
            };

            sqlx::query(
                "UPDATE products SET stock_quantity = ?2, updated_at = ?3 WHERE id = ?1",
            )
            .bind(&line.product_id)
            .bind(new_stock)
            .bind(now)
            .execute(&mut *txn)
            .await
            .map_err(StoreError::from)?;

            sale::insert_item(
                &mut txn,
                &SaleItem {
                    id: sale::generate_sale_id(),
                    sale_id: sale_record.id.clone(),
                    product_id: line.product_id.clone(),
                    quantity: line.quantity,
                    unit_price_cents: line.unit_price_cents,
                    line_total_cents: line.line_total_cents(),
                    created_at: now,
                },
            )
            .await?;
        }

        if let Some(customer_id) = &cart.customer_id {
            let points = loyalty_points_for(pricing.total());
            debug!(customer_id = %customer_id, points, "Accruing loyalty");

            customer::accrue_loyalty(&mut txn, customer_id, pricing.total_cents, points)
                .await
                .map_err(|e| match e {
                    StoreError::NotFound { .. } => CommitError::StaleCustomer {
                        customer_id: customer_id.clone(),
                    },
                    other => CommitError::Persistence(other),
                })?;
        }

        txn.commit().await.map_err(StoreError::from)?;

        info!(
            sale_id = %sale_record.id,
            receipt = %sale_record.receipt_number,
            total_cents = sale_record.total_cents,
            lines = cart.line_count(),
            "Sale committed"
        );

        Ok(sale_record)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::customer::generate_customer_id;
    use crate::repository::product::generate_product_id;
    use crate::repository::store::test_support::seed_store;
    use tally_core::{price, AppliedDiscounts, Customer, Product, TaxRate};
    use uuid::Uuid;

    async fn mem_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_product(db: &Database, store_id: &str, price_cents: i64, stock: i64) -> Product {
        let now = Utc::now();
        let p = Product {
            id: generate_product_id(),
            store_id: store_id.to_string(),
            name: "Widget".to_string(),
            sku: None,
            barcode: None,
            price_cents,
            cost_cents: 0,
            stock_quantity: stock,
            min_stock_level: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&p).await.unwrap();
        p
    }

    async fn seed_customer(db: &Database, store_id: &str) -> Customer {
        let now = Utc::now();
        let c = Customer {
            id: generate_customer_id(),
            store_id: store_id.to_string(),
            name: "Ada".to_string(),
            email: None,
            phone: None,
            loyalty_points: 0,
            total_spent_cents: 0,
            visit_count: 0,
            created_at: now,
            updated_at: now,
        };
        db.customers().insert(&c).await.unwrap();
        c
    }

    fn priced(cart: &Cart) -> PricingResult {
        price(cart, &AppliedDiscounts::new(), TaxRate::from_bps(800)).unwrap()
    }

    #[tokio::test]
    async fn test_commit_happy_path() {
        let db = mem_db().await;
        let store_id = seed_store(&db).await;
        let product = seed_product(&db, &store_id, 1000, 10).await;

        let mut cart = Cart::new();
        cart.add_line(&product, 2).unwrap();
        let pricing = priced(&cart);

        let request = CommitRequest::new(&store_id, "staff-1", PaymentMethod::Cash);
        let sale = db.committer().commit(&cart, &pricing, &request).await.unwrap();

        assert_eq!(sale.subtotal_cents, 2000);
        assert_eq!(sale.total_cents, 2160);
        assert_eq!(sale.payment_status, PaymentStatus::Completed);
        assert!(sale.receipt_number.starts_with("R-"));
        // Sale and item IDs follow the UUID scheme all entities use.
        assert!(Uuid::parse_str(&sale.id).is_ok());

        // Durable and complete.
        let stored = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(stored.receipt_number, sale.receipt_number);

        let items = db.sales().items(&sale.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert!(Uuid::parse_str(&items[0].id).is_ok());
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[0].unit_price_cents, 1000);
        assert_eq!(items[0].line_total_cents, 2000);

        // Stock decremented.
        let after = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(after.stock_quantity, 8);
    }

    #[tokio::test]
    async fn test_commit_accrues_loyalty() {
        let db = mem_db().await;
        let store_id = seed_store(&db).await;
        let product = seed_product(&db, &store_id, 2500, 10).await;
        let customer = seed_customer(&db, &store_id).await;

        let mut cart = Cart::new();
        cart.add_line(&product, 1).unwrap();
        cart.set_customer(&customer.id);
        let pricing = priced(&cart);
        // $25.00 + 8% tax = $27.00 charged → 27 points

        let request = CommitRequest::new(&store_id, "staff-1", PaymentMethod::Card);
        let sale = db.committer().commit(&cart, &pricing, &request).await.unwrap();
        assert_eq!(sale.customer_id.as_deref(), Some(customer.id.as_str()));

        let after = db.customers().get_by_id(&customer.id).await.unwrap().unwrap();
        assert_eq!(after.loyalty_points, 27);
        assert_eq!(after.total_spent_cents, 2700);
        assert_eq!(after.visit_count, 1);
    }

    #[tokio::test]
    async fn test_empty_cart_rejected() {
        let db = mem_db().await;
        let store_id = seed_store(&db).await;

        let cart = Cart::new();
        let pricing = PricingResult {
            subtotal_cents: 0,
            discount_cents: 0,
            tax_cents: 0,
            total_cents: 0,
        };
        let request = CommitRequest::new(&store_id, "staff-1", PaymentMethod::Cash);

        let err = db.committer().commit(&cart, &pricing, &request).await.unwrap_err();
        assert!(matches!(err, CommitError::EmptyCart));
    }

    #[tokio::test]
    async fn test_stale_product_rolls_back_everything() {
        let db = mem_db().await;
        let store_id = seed_store(&db).await;
        let good = seed_product(&db, &store_id, 1000, 10).await;
        let doomed = seed_product(&db, &store_id, 500, 10).await;

        let mut cart = Cart::new();
        cart.add_line(&good, 1).unwrap();
        cart.add_line(&doomed, 1).unwrap();
        let pricing = priced(&cart);

        // Product deactivated between add and commit.
        db.products().deactivate(&doomed.id).await.unwrap();

        let request = CommitRequest::new(&store_id, "staff-1", PaymentMethod::Cash);
        let err = db.committer().commit(&cart, &pricing, &request).await.unwrap_err();
        assert!(matches!(err, CommitError::StaleProduct { .. }));

        // All-or-nothing: the first line's decrement rolled back too.
        let after = db.products().get_by_id(&good.id).await.unwrap().unwrap();
        assert_eq!(after.stock_quantity, 10);
        assert_eq!(db.sales().count(&store_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_oversell_clamps_to_zero_by_default() {
        let db = mem_db().await;
        let store_id = seed_store(&db).await;
        let product = seed_product(&db, &store_id, 1000, 1).await;

        let mut cart = Cart::new();
        cart.add_line(&product, 3).unwrap();
        let pricing = priced(&cart);

        let request = CommitRequest::new(&store_id, "staff-1", PaymentMethod::Cash);
        db.committer().commit(&cart, &pricing, &request).await.unwrap();

        let after = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(after.stock_quantity, 0);
    }

    #[tokio::test]
    async fn test_oversell_rejected_under_strict_policy() {
        let db = mem_db().await;
        let store_id = seed_store(&db).await;
        let product = seed_product(&db, &store_id, 1000, 1).await;

        let mut cart = Cart::new();
        cart.add_line(&product, 3).unwrap();
        let pricing = priced(&cart);

        let request = CommitRequest::new(&store_id, "staff-1", PaymentMethod::Cash)
            .stock_policy(StockPolicy::Reject);
        let err = db.committer().commit(&cart, &pricing, &request).await.unwrap_err();

        match err {
            CommitError::InsufficientStock {
                requested,
                available,
                ..
            } => {
                assert_eq!(requested, 3);
                assert_eq!(available, 1);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        // Nothing applied.
        let after = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(after.stock_quantity, 1);
        assert_eq!(db.sales().count(&store_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_stale_customer_rolls_back() {
        let db = mem_db().await;
        let store_id = seed_store(&db).await;
        let product = seed_product(&db, &store_id, 1000, 10).await;

        let mut cart = Cart::new();
        cart.add_line(&product, 1).unwrap();
        cart.set_customer("deleted-customer");
        let pricing = priced(&cart);

        let request = CommitRequest::new(&store_id, "staff-1", PaymentMethod::Cash);
        let err = db.committer().commit(&cart, &pricing, &request).await.unwrap_err();
        assert!(matches!(err, CommitError::StaleCustomer { .. }));

        let after = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(after.stock_quantity, 10);
        assert_eq!(db.sales().count(&store_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sequential_commits_get_distinct_receipts() {
        let db = mem_db().await;
        let store_id = seed_store(&db).await;
        let product = seed_product(&db, &store_id, 1000, 100).await;

        let mut cart = Cart::new();
        cart.add_line(&product, 1).unwrap();
        let pricing = priced(&cart);
        let request = CommitRequest::new(&store_id, "staff-1", PaymentMethod::Cash);

        let committer = db.committer();
        let mut receipts = std::collections::HashSet::new();
        for _ in 0..10 {
            let sale = committer.commit(&cart, &pricing, &request).await.unwrap();
            assert!(receipts.insert(sale.receipt_number));
        }
        assert_eq!(db.sales().count(&store_id).await.unwrap(), 10);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_commits_cannot_oversell() {
        // In-memory SQLite is per-connection, so a real file is needed
        // for two connections to contend on the same data.
        let path = std::env::temp_dir().join(format!("tally-race-{}.db", Uuid::new_v4()));
        let db = Database::new(DbConfig::new(&path)).await.unwrap();

        let store_id = seed_store(&db).await;
        let product = seed_product(&db, &store_id, 1000, 1).await;

        let mut cart = Cart::new();
        cart.add_line(&product, 1).unwrap();
        let pricing = priced(&cart);
        let request = CommitRequest::new(&store_id, "staff-1", PaymentMethod::Cash)
            .stock_policy(StockPolicy::Reject);

        let mut handles = Vec::new();
        for _ in 0..2 {
            let committer = db.committer();
            let cart = cart.clone();
            let request = request.clone();
            handles.push(tokio::spawn(async move {
                committer.commit(&cart, &pricing, &request).await
            }));
        }

        let mut successes = 0;
        let mut rejections = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(CommitError::InsufficientStock { .. }) => rejections += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(rejections, 1);

        let after = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(after.stock_quantity, 0);
        assert_eq!(db.sales().count(&store_id).await.unwrap(), 1);

        db.close().await;
        let _ = std::fs::remove_file(&path);
    }
}
