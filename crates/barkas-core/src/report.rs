//! # Reports
//!
//! Pure aggregation behind the admin dashboard and sales report.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  barkas-db ReportRepository                                             │
//! │    orders in range ──────────► monthly_revenue() ──► [MonthlyRevenue]   │
//! │    order items in range ─────► top_products()    ──► [TopProduct]       │
//! │    counts + sums ────────────► DashboardStats / SalesReport             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Revenue only counts orders whose payment status is `paid`; order counts
//! include every order regardless of payment.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Order, OrderItem, PaymentStatus};

// =============================================================================
// Date Range
// =============================================================================

/// An inclusive range of calendar days (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DateRange {
    #[ts(as = "String")]
    pub start: NaiveDate,
    #[ts(as = "String")]
    pub end: NaiveDate,
}

impl DateRange {
    /// Builds a range, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> CoreResult<Self> {
        if start > end {
            return Err(CoreError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// First day of `today`'s month through `today`.
    pub fn month_to_date(today: NaiveDate) -> Self {
        let start = today.with_day(1).unwrap_or(today);
        Self { start, end: today }
    }

    /// Half-open `[start 00:00, day after end 00:00)` in UTC.
    pub fn bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let after_end = self.end.succ_opt().unwrap_or(NaiveDate::MAX);
        (
            Utc.from_utc_datetime(&self.start.and_time(NaiveTime::MIN)),
            Utc.from_utc_datetime(&after_end.and_time(NaiveTime::MIN)),
        )
    }
}

/// Midnight UTC of the day containing `now`.
pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&now.date_naive().and_time(NaiveTime::MIN))
}

// =============================================================================
// Aggregates
// =============================================================================

/// Revenue and order count for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MonthlyRevenue {
    /// `YYYY-MM`
    pub month: String,
    pub revenue: Money,
    pub orders: i64,
}

/// A best seller, grouped by the product name frozen on order items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TopProduct {
    pub name: String,
    pub quantity: i64,
    pub revenue: Money,
}

/// Σ total over paid orders.
pub fn paid_revenue(orders: &[Order]) -> Money {
    orders
        .iter()
        .filter(|o| o.payment_status == PaymentStatus::Paid)
        .map(Order::total)
        .sum()
}

/// Groups orders by `YYYY-MM`, ascending.
///
/// Every order counts towards `orders`; only paid orders add revenue.
pub fn monthly_revenue(orders: &[Order]) -> Vec<MonthlyRevenue> {
    let mut months: BTreeMap<String, (Money, i64)> = BTreeMap::new();

    for order in orders {
        let entry = months
            .entry(order.created_at.format("%Y-%m").to_string())
            .or_insert((Money::zero(), 0));
        entry.1 += 1;
        if order.payment_status == PaymentStatus::Paid {
            entry.0 += order.total();
        }
    }

    months
        .into_iter()
        .map(|(month, (revenue, orders))| MonthlyRevenue {
            month,
            revenue,
            orders,
        })
        .collect()
}

/// Best sellers by revenue, highest first, at most `limit`.
///
/// Ties are broken by name so the order is stable.
pub fn top_products(items: &[OrderItem], limit: usize) -> Vec<TopProduct> {
    let mut stats: HashMap<&str, (i64, Money)> = HashMap::new();

    for item in items {
        let entry = stats
            .entry(item.product_name.as_str())
            .or_insert((0, Money::zero()));
        entry.0 += item.quantity;
        entry.1 += Money::from_rupiah(item.total);
    }

    let mut ranked: Vec<TopProduct> = stats
        .into_iter()
        .map(|(name, (quantity, revenue))| TopProduct {
            name: name.to_string(),
            quantity,
            revenue,
        })
        .collect();

    ranked.sort_by(|a, b| b.revenue.cmp(&a.revenue).then_with(|| a.name.cmp(&b.name)));
    ranked.truncate(limit);
    ranked
}

// =============================================================================
// Report DTOs
// =============================================================================

/// Admin dashboard cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DashboardStats {
    pub total_products: i64,
    pub total_orders: i64,
    pub total_customers: i64,
    /// Paid orders only.
    pub total_revenue: Money,
    pub pending_orders: i64,
    pub low_stock_products: i64,
    /// Orders created since 00:00 UTC.
    pub today_orders: i64,
    /// Orders with status `delivered`.
    pub completed_orders: i64,
    pub recent_orders: Vec<Order>,
}

/// Sales report for a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SalesReport {
    pub range: DateRange,
    /// Paid orders in range.
    pub total_revenue: Money,
    /// All orders in range.
    pub total_orders: i64,
    pub total_products: i64,
    pub total_customers: i64,
    pub monthly_revenue: Vec<MonthlyRevenue>,
    pub top_products: Vec<TopProduct>,
    pub recent_orders: Vec<Order>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OrderStatus, PaymentMethod};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn order(created: &str, total: i64, status: PaymentStatus) -> Order {
        let created_at = DateTime::parse_from_rfc3339(created)
            .unwrap()
            .with_timezone(&Utc);
        Order {
            id: format!("o-{}", created),
            customer_name: "Made".to_string(),
            customer_phone: "0811".to_string(),
            customer_address: "Ubud".to_string(),
            subtotal: total,
            discount: 0,
            shipping_cost: 0,
            total,
            payment_method: PaymentMethod::Transfer,
            payment_status: status,
            order_status: OrderStatus::Pending,
            notes: None,
            voucher_code: None,
            created_by: None,
            created_at,
            updated_at: created_at,
        }
    }

    fn item(name: &str, quantity: i64, price: i64) -> OrderItem {
        OrderItem {
            id: format!("i-{}-{}", name, quantity),
            order_id: "o".to_string(),
            product_id: None,
            product_name: name.to_string(),
            quantity,
            price,
            total: price * quantity,
        }
    }

    #[test]
    fn test_range_rejects_inverted() {
        assert!(DateRange::new(date(2024, 3, 2), date(2024, 3, 1)).is_err());
        assert!(DateRange::new(date(2024, 3, 1), date(2024, 3, 1)).is_ok());
    }

    #[test]
    fn test_month_to_date() {
        let range = DateRange::month_to_date(date(2024, 2, 29));
        assert_eq!(range.start, date(2024, 2, 1));
        assert_eq!(range.end, date(2024, 2, 29));
    }

    #[test]
    fn test_bounds_cover_whole_days() {
        let (start, end) = DateRange::new(date(2024, 1, 1), date(2024, 1, 31))
            .unwrap()
            .bounds();
        assert_eq!(start.to_rfc3339(), "2024-01-01T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2024-02-01T00:00:00+00:00");

        let last_instant = DateTime::parse_from_rfc3339("2024-01-31T23:59:59.999999Z")
            .unwrap()
            .with_timezone(&Utc);
        assert!(last_instant < end);
    }

    #[test]
    fn test_monthly_revenue_counts_all_orders_sums_paid() {
        let orders = vec![
            order("2024-02-10T08:00:00Z", 50_000, PaymentStatus::Paid),
            order("2024-01-05T08:00:00Z", 20_000, PaymentStatus::Paid),
            order("2024-01-20T08:00:00Z", 99_000, PaymentStatus::Pending),
            order("2024-01-21T08:00:00Z", 10_000, PaymentStatus::DpPaid),
        ];

        let monthly = monthly_revenue(&orders);
        assert_eq!(monthly.len(), 2);
        assert_eq!(monthly[0].month, "2024-01");
        assert_eq!(monthly[0].orders, 3);
        assert_eq!(monthly[0].revenue.rupiah(), 20_000);
        assert_eq!(monthly[1].month, "2024-02");
        assert_eq!(monthly[1].revenue.rupiah(), 50_000);

        assert_eq!(paid_revenue(&orders).rupiah(), 70_000);
    }

    #[test]
    fn test_top_products_grouped_by_name() {
        let items = vec![
            item("Kamera", 1, 300_000),
            item("Jaket", 3, 50_000),
            item("Kamera", 2, 300_000),
            item("Topi", 1, 150_000),
        ];

        let top = top_products(&items, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].name, "Kamera");
        assert_eq!(top[0].quantity, 3);
        assert_eq!(top[0].revenue.rupiah(), 900_000);
        // Jaket and Topi tie at 150.000; name breaks the tie
        assert_eq!(top[1].name, "Jaket");
    }

    #[test]
    fn test_start_of_day() {
        let now = DateTime::parse_from_rfc3339("2024-05-06T17:45:12Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(start_of_day(now).to_rfc3339(), "2024-05-06T00:00:00+00:00");
    }
}
