//! # Customer Repository
//!
//! Loyalty aggregates. The three counters (`loyalty_points`,
//! `total_spent_cents`, `visit_count`) move together and only forward,
//! always as a single atomic UPDATE - never read-modify-write from the
//! application, so two registers finishing sales for the same customer
//! both land.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use tally_core::Customer;

const CUSTOMER_COLUMNS: &str = "id, store_id, name, email, phone, loyalty_points, \
     total_spent_cents, visit_count, created_at, updated_at";

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Gets a customer by ID.
    pub async fn get_by_id(&self, id: &str) -> StoreResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Lists customers for a store, ordered by name.
    pub async fn list(&self, store_id: &str) -> StoreResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE store_id = ?1 ORDER BY name"
        ))
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Inserts a new customer with zeroed loyalty counters.
    pub async fn insert(&self, customer: &Customer) -> StoreResult<()> {
        debug!(id = %customer.id, name = %customer.name, "Inserting customer");

        sqlx::query(
            "INSERT INTO customers ( \
                id, store_id, name, email, phone, loyalty_points, \
                total_spent_cents, visit_count, created_at, updated_at \
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&customer.id)
        .bind(&customer.store_id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(customer.loyalty_points)
        .bind(customer.total_spent_cents)
        .bind(customer.visit_count)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Applies a loyalty accrual outside a commit (corrections, imports).
    ///
    /// Sale-time accrual does not go through here - the committer uses
    /// the transaction-scoped helper so the counters land together with
    /// the sale record.
    pub async fn apply_loyalty_accrual(
        &self,
        id: &str,
        total_cents: i64,
        points: i64,
    ) -> StoreResult<()> {
        debug!(id = %id, total_cents, points, "Applying loyalty accrual");

        let mut conn = self.pool.acquire().await?;
        accrue_loyalty(&mut conn, id, total_cents, points).await
    }
}

/// Applies one sale's loyalty accrual inside an open transaction.
///
/// All three counters advance in a single UPDATE: points by the floored
/// whole-currency-units of the charged total, spend by the total, visits
/// by one.
pub(crate) async fn accrue_loyalty(
    conn: &mut SqliteConnection,
    customer_id: &str,
    total_cents: i64,
    points: i64,
) -> StoreResult<()> {
    let result = sqlx::query(
        "UPDATE customers \
         SET loyalty_points = loyalty_points + ?2, \
             total_spent_cents = total_spent_cents + ?3, \
             visit_count = visit_count + 1, \
             updated_at = ?4 \
         WHERE id = ?1",
    )
    .bind(customer_id)
    .bind(points)
    .bind(total_cents)
    .bind(Utc::now())
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::not_found("Customer", customer_id));
    }
    Ok(())
}

/// Helper to generate a new customer ID.
pub fn generate_customer_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
