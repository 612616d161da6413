//! # tally-db: Persistence Layer for Tally POS
//!
//! SQLite-backed persistence for the checkout pipeline, plus the
//! Transaction Committer - the one component in the system allowed to
//! open a database transaction.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Tally POS Data Flow                        │
//! │                                                                 │
//! │  Checkout session (tally-core Cart + PricingResult)             │
//! │       │                                                         │
//! │       ▼                                                         │
//! │  ┌───────────────────────────────────────────────────────────┐  │
//! │  │                 tally-db (THIS CRATE)                     │  │
//! │  │                                                           │  │
//! │  │  ┌────────────┐  ┌──────────────┐  ┌──────────────────┐   │  │
//! │  │  │  Database  │  │ Repositories │  │    Committer     │   │  │
//! │  │  │ (pool.rs)  │  │ product/sale │  │  (checkout.rs)   │   │  │
//! │  │  │            │◄─│ customer/    │◄─│  one transaction │   │  │
//! │  │  │ SqlitePool │  │ store        │  │  per sale        │   │  │
//! │  │  └────────────┘  └──────────────┘  └──────────────────┘   │  │
//! │  └───────────────────────────────────────────────────────────┘  │
//! │       │                                                         │
//! │       ▼                                                         │
//! │  SQLite database (WAL mode, embedded migrations)                │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Persistence error types
//! - [`repository`] - Repository implementations (product, customer, ...)
//! - [`checkout`] - The Transaction Committer
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tally_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("tally.db")).await?;
//!
//! let products = db.products().list_active("store-1").await?;
//! // ... build a Cart, apply discounts, call tally_core::price() ...
//! let sale = db.committer().commit(&cart, &pricing, request).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use checkout::{CommitError, CommitRequest, Committer};
pub use error::{StoreError, StoreResult};
pub use pool::{Database, DbConfig};

pub use repository::customer::CustomerRepository;
pub use repository::discount::DiscountRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;
pub use repository::store::StoreRepository;
