//! # Repository Module
//!
//! Database repositories for the storefront.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HTTP handler                                                           │
//! │       │                                                                 │
//! │       │  db.products().list_featured(6)                                │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── list / list_featured / related                                    │
//! │  ├── get_by_id                                                         │
//! │  ├── insert / update / delete                                          │
//! │  └── adjust_stock                                                      │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`] - Catalog CRUD and stock adjustments
//! - [`CustomerRepository`] - Customer CRUD
//! - [`OrderRepository`] - Atomic order placement, status updates, aggregates
//! - [`UserRepository`] - Staff accounts
//! - [`ActivityLogRepository`] - Audit trail
//! - [`ReportRepository`] - Dashboard and sales report
//!
//! [`ProductRepository`]: product::ProductRepository
//! [`CustomerRepository`]: customer::CustomerRepository
//! [`OrderRepository`]: order::OrderRepository
//! [`UserRepository`]: user::UserRepository
//! [`ActivityLogRepository`]: activity::ActivityLogRepository
//! [`ReportRepository`]: report::ReportRepository

pub mod activity;
pub mod customer;
pub mod order;
pub mod product;
pub mod report;
pub mod user;

/// New UUID v4 string for a primary key.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
