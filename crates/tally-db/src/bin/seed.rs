//! Seeds a database with demo data and runs one demonstration checkout.
//!
//! ```text
//! TALLY_DB=/tmp/tally.db cargo run -p tally-db --bin seed
//! ```

use chrono::Utc;
use serde_json::json;
use tracing::info;

use tally_core::{
    price, AppliedDiscounts, Cart, Customer, DiscountKind, DiscountRule, PaymentMethod, Product,
    Store, TaxRate,
};
use tally_db::repository::customer::generate_customer_id;
use tally_db::repository::discount::generate_discount_id;
use tally_db::repository::product::generate_product_id;
use tally_db::repository::store::generate_store_id;
use tally_db::{CommitRequest, Database, DbConfig};

fn now_pair() -> (chrono::DateTime<Utc>, chrono::DateTime<Utc>) {
    let now = Utc::now();
    (now, now)
}

fn product(store_id: &str, name: &str, sku: &str, barcode: &str, price: i64, stock: i64) -> Product {
    let (created_at, updated_at) = now_pair();
    Product {
        id: generate_product_id(),
        store_id: store_id.to_string(),
        name: name.to_string(),
        sku: Some(sku.to_string()),
        barcode: Some(barcode.to_string()),
        price_cents: price,
        cost_cents: price / 2,
        stock_quantity: stock,
        min_stock_level: 10,
        is_active: true,
        created_at,
        updated_at,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let path = std::env::var("TALLY_DB").unwrap_or_else(|_| "tally.db".to_string());
    info!(path = %path, "Seeding demo database");

    let db = Database::new(DbConfig::new(&path)).await?;

    let store = Store {
        id: generate_store_id(),
        name: "Demo Corner Store".to_string(),
        tax_rate_bps: 800,
        currency: "USD".to_string(),
        created_at: Utc::now(),
    };
    db.stores().insert(&store).await?;

    let products = vec![
        product(&store.id, "Cola 330ml", "BEV-001", "5901234123457", 150, 120),
        product(&store.id, "Sparkling Water 500ml", "BEV-002", "5901234123464", 120, 80),
        product(&store.id, "Potato Chips", "SNK-001", "5901234123471", 299, 60),
        product(&store.id, "Chocolate Bar", "SNK-002", "5901234123488", 199, 90),
        product(&store.id, "Whole Milk 1L", "GRO-001", "5901234123495", 249, 40),
        product(&store.id, "Sourdough Loaf", "GRO-002", "5901234123501", 549, 15),
    ];
    for p in &products {
        db.products().insert(p).await?;
    }

    let (created_at, updated_at) = now_pair();
    let customer = Customer {
        id: generate_customer_id(),
        store_id: store.id.clone(),
        name: "Sam Regular".to_string(),
        email: Some("sam@example.com".to_string()),
        phone: None,
        loyalty_points: 0,
        total_spent_cents: 0,
        visit_count: 0,
        created_at,
        updated_at,
    };
    db.customers().insert(&customer).await?;

    let (created_at, updated_at) = now_pair();
    let ten_percent = DiscountRule {
        id: generate_discount_id(),
        store_id: store.id.clone(),
        name: "10% over $20".to_string(),
        kind: DiscountKind::Percentage,
        value: 1000,
        min_order_cents: Some(2000),
        is_active: true,
        created_at,
        updated_at,
    };
    db.discounts().insert(&ten_percent).await?;

    // One demonstration checkout end to end.
    let mut cart = Cart::new();
    cart.add_line(&products[0], 4)?;
    cart.add_line(&products[2], 2)?;
    cart.add_line(&products[5], 1)?;
    cart.set_customer(&customer.id);

    let mut discounts = AppliedDiscounts::new();
    discounts.apply(&cart, &ten_percent)?;

    let pricing = price(&cart, &discounts, TaxRate::from_bps(store.tax_rate_bps))?;
    let sale = db
        .committer()
        .commit(
            &cart,
            &pricing,
            &CommitRequest::new(&store.id, "staff-demo", PaymentMethod::Cash),
        )
        .await?;

    let summary = json!({
        "store_id": store.id,
        "products": db.products().count(&store.id).await?,
        "customer_id": customer.id,
        "demo_sale": {
            "receipt": sale.receipt_number,
            "subtotal_cents": sale.subtotal_cents,
            "discount_cents": sale.discount_cents,
            "tax_cents": sale.tax_cents,
            "total_cents": sale.total_cents,
        },
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    db.close().await;
    Ok(())
}
