//! # Repository Module
//!
//! Database repository implementations for Tally POS.
//!
//! ## Repository Pattern
//! ```text
//! Checkout session / front end
//!      │   db.products().find_by_barcode("store-1", "5901234123457")
//!      ▼
//! ProductRepository ── SQL ──► SQLite
//!
//! Benefits:
//! • SQL is isolated in one place per entity
//! • The committer reuses the same write helpers inside its transaction
//! • Read contracts match the external interfaces the core consumes
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - catalog index + inventory adjustments
//! - [`customer::CustomerRepository`] - loyalty aggregates
//! - [`discount::DiscountRepository`] - promotional rule storage
//! - [`sale::SaleRepository`] - committed sale records (read side)
//! - [`store::StoreRepository`] - store configuration (tax rate)

pub mod customer;
pub mod discount;
pub mod product;
pub mod sale;
pub mod store;
