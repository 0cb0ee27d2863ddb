//! # barkas-core: Pure Business Logic for the BarkasBali88 Storefront
//!
//! This crate holds everything the storefront decides without touching a
//! database, a socket or a file.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     BarkasBali88 Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/storefront (axum JSON API)                 │   │
//! │  │    catalog ──► cart ──► checkout        admin: products, orders │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ barkas-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │  types  │ │  money  │ │  cart   │ │ session │ │ report  │  │   │
//! │  │   │ Product │ │  Money  │ │  Cart   │ │ Session │ │ monthly │  │   │
//! │  │   │  Order  │ │ (IDR)   │ │CartItem │ │  Store  │ │ top-10  │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │   observe · catalog · validation · error                       │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 barkas-db (data + auth service)                 │   │
//! │  │           SQLite queries, migrations, repositories, JWT         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Order, Customer, User, ActivityLog)
//! - [`money`] - Integer rupiah
//! - [`observe`] - Listener registry with unsubscribe handles
//! - [`cart`] - Cart store
//! - [`session`] - Session store
//! - [`catalog`] - Search and list filters
//! - [`report`] - Dashboard and sales report aggregation
//! - [`error`] - Domain error types
//! - [`validation`] - Form rules
//!
//! ## Features
//!
//! - `sqlx`: derives `sqlx::Type` / `sqlx::FromRow` on the enums and row
//!   types so `barkas-db` can bind and decode them directly.
//!
//! ## Example Usage
//!
//! ```rust
//! use barkas_core::{Cart, Money};
//! # use barkas_core::Product;
//! # use chrono::Utc;
//! # let jacket = Product {
//! #     id: "p-1".into(), name: "Jaket Denim".into(), description: String::new(),
//! #     price: 10_000, image_url: None, category: "Fashion".into(), stock: 5,
//! #     tags: vec![], is_featured: false, is_limited_stock: false, barcode: None,
//! #     created_at: Utc::now(), updated_at: Utc::now(),
//! # };
//!
//! let mut cart = Cart::new();
//! cart.add_item(&jacket, 2);
//!
//! assert_eq!(cart.total(), Money::from_rupiah(20_000));
//! assert_eq!(cart.total().to_string(), "Rp 20.000");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod catalog;
pub mod error;
pub mod money;
pub mod observe;
pub mod report;
pub mod session;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use barkas_core::Money` instead of
// `use barkas_core::money::Money`

pub use cart::{Cart, CartItem, CartSummary};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use observe::{Observers, Subscription};
pub use report::{DashboardStats, DateRange, MonthlyRevenue, SalesReport, TopProduct};
pub use session::{Session, SessionEvent, SessionStore};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Products with stock below this count show up as "low stock" on the
/// dashboard. The storefront config can override it.
pub const LOW_STOCK_THRESHOLD: i64 = 10;

/// Featured products shown on the home page.
pub const FEATURED_PRODUCTS_LIMIT: i64 = 6;

/// Related products shown on a product page.
pub const RELATED_PRODUCTS_LIMIT: i64 = 4;

/// Recent orders listed on the dashboard.
pub const DASHBOARD_RECENT_ORDERS: i64 = 5;

/// Recent orders listed on the sales report.
pub const REPORT_RECENT_ORDERS: i64 = 10;

/// Best sellers listed on the sales report.
pub const TOP_PRODUCTS_LIMIT: usize = 10;

/// Entries returned by the activity feed.
pub const ACTIVITY_LOG_LIMIT: i64 = 50;
