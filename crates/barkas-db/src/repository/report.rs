//! # Report Repository
//!
//! Gathers counts and rows for the dashboard and sales report; the
//! grouping math lives in `barkas_core::report`.

use barkas_core::report::{monthly_revenue, paid_revenue, start_of_day, top_products};
use barkas_core::{
    DashboardStats, DateRange, OrderStatus, SalesReport, DASHBOARD_RECENT_ORDERS,
    REPORT_RECENT_ORDERS, TOP_PRODUCTS_LIMIT,
};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use super::customer::CustomerRepository;
use super::order::OrderRepository;
use super::product::ProductRepository;
use crate::error::DbResult;

/// Read-only aggregation over products, customers and orders.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    products: ProductRepository,
    customers: CustomerRepository,
    orders: OrderRepository,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository {
            products: ProductRepository::new(pool.clone()),
            customers: CustomerRepository::new(pool.clone()),
            orders: OrderRepository::new(pool),
        }
    }

    /// Dashboard cards as of `now`.
    ///
    /// ## Arguments
    /// * `low_stock_threshold` - products with `stock < threshold` count as low
    /// * `now` - "today" starts at 00:00 UTC of this instant
    pub async fn dashboard(
        &self,
        low_stock_threshold: i64,
        now: DateTime<Utc>,
    ) -> DbResult<DashboardStats> {
        let stats = DashboardStats {
            total_products: self.products.count().await?,
            total_orders: self.orders.count().await?,
            total_customers: self.customers.count().await?,
            total_revenue: self.orders.paid_revenue().await?,
            pending_orders: self.orders.count_by_status(OrderStatus::Pending).await?,
            low_stock_products: self.products.count_low_stock(low_stock_threshold).await?,
            today_orders: self.orders.count_created_since(start_of_day(now)).await?,
            completed_orders: self.orders.count_by_status(OrderStatus::Delivered).await?,
            recent_orders: self.orders.list_recent(DASHBOARD_RECENT_ORDERS).await?,
        };

        debug!(orders = stats.total_orders, revenue = %stats.total_revenue, "Dashboard computed");
        Ok(stats)
    }

    /// Sales report for an inclusive day range.
    pub async fn sales_report(&self, range: DateRange) -> DbResult<SalesReport> {
        let (start, end) = range.bounds();

        let orders = self.orders.list_between(start, end).await?;
        let items = self.orders.items_between(start, end).await?;

        let recent_orders = orders
            .iter()
            .take(usize::try_from(REPORT_RECENT_ORDERS).unwrap_or(usize::MAX))
            .cloned()
            .collect();

        let report = SalesReport {
            range,
            total_revenue: paid_revenue(&orders),
            total_orders: i64::try_from(orders.len()).unwrap_or(i64::MAX),
            total_products: self.products.count().await?,
            total_customers: self.customers.count().await?,
            monthly_revenue: monthly_revenue(&orders),
            top_products: top_products(&items, TOP_PRODUCTS_LIMIT),
            recent_orders,
        };

        debug!(
            start = %range.start,
            end = %range.end,
            orders = report.total_orders,
            "Sales report computed"
        );
        Ok(report)
    }
}
