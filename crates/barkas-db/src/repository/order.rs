//! # Order Repository
//!
//! Order placement, status changes and the aggregates behind reports.
//!
//! ## Order Placement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    place_order (ONE transaction)                        │
//! │                                                                         │
//! │  cart empty? ──► EmptyCart (nothing written)                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │   1. INSERT orders        subtotal = Σ line totals, status pending     │
//! │   2. INSERT order_items   name + price frozen from the cart snapshot   │
//! │   3. UPDATE products      stock = stock - qty  WHERE stock >= qty      │
//! │        │                                                                │
//! │        ├── 0 rows, product gone   ──► ROLLBACK, NotFound               │
//! │        └── 0 rows, stock too low  ──► ROLLBACK, InsufficientStock      │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Either every write lands or none does, and stock never goes negative.

use std::collections::HashMap;

use barkas_core::{
    CartItem, CheckoutForm, CoreError, Money, Order, OrderItem, OrderStatus, OrderWithItems,
    PaymentStatus,
};
use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info, warn};

use super::new_id;
use crate::error::{DbError, DbResult};

const ORDER_COLUMNS: &str = "id, customer_name, customer_phone, customer_address, subtotal, \
     discount, shipping_cost, total, payment_method, payment_status, order_status, notes, \
     voucher_code, created_by, created_at, updated_at";

const ITEM_COLUMNS: &str = "oi.id, oi.order_id, oi.product_id, oi.product_name, oi.quantity, \
     oi.price, oi.total";

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    // =========================================================================
    // Placement
    // =========================================================================

    /// Places an order for the cart contents.
    ///
    /// ## Arguments
    /// * `form` - Checkout form (validated here)
    /// * `items` - Cart lines; prices come from the cart snapshot
    /// * `created_by` - Signed-in staff member, if any
    ///
    /// ## Errors
    /// - `EmptyCart` before any write
    /// - `Validation` for a bad form
    /// - `NotFound` / `InsufficientStock` from the stock step (rolled back)
    pub async fn place_order(
        &self,
        form: &CheckoutForm,
        items: &[CartItem],
        created_by: Option<&str>,
    ) -> DbResult<OrderWithItems> {
        if items.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }
        let form = form.validate()?;

        let order_id = new_id();
        let now = Utc::now();
        let subtotal: Money = items.iter().map(CartItem::line_total).sum();
        let discount = Money::zero();
        let shipping = Money::zero();
        let total = subtotal - discount + shipping;

        debug!(order_id = %order_id, lines = items.len(), total = %total, "Placing order");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO orders (
                id, customer_name, customer_phone, customer_address, subtotal, discount,
                shipping_cost, total, payment_method, payment_status, order_status, notes,
                voucher_code, created_by, created_at, updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&order_id)
        .bind(&form.customer_name)
        .bind(&form.customer_phone)
        .bind(&form.customer_address)
        .bind(subtotal.rupiah())
        .bind(discount.rupiah())
        .bind(shipping.rupiah())
        .bind(total.rupiah())
        .bind(form.payment_method)
        .bind(PaymentStatus::Pending)
        .bind(OrderStatus::Pending)
        .bind(&form.notes)
        .bind(&form.voucher_code)
        .bind(created_by)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        for item in items {
            if let Err(err) = insert_item(&mut tx, &order_id, item).await {
                warn!(order_id = %order_id, error = %err, "Order item insert failed, rolling back");
                tx.rollback().await?;
                return Err(err);
            }
        }

        for item in items {
            if let Err(err) = take_stock(&mut tx, item).await {
                warn!(order_id = %order_id, error = %err, "Stock decrement failed, rolling back");
                tx.rollback().await?;
                return Err(err);
            }
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(order_id = %order_id, total = %total, "Order placed");

        self.get_with_items(&order_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", order_id))
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(order)
    }

    /// An order with its lines.
    pub async fn get_with_items(&self, id: &str) -> DbResult<Option<OrderWithItems>> {
        let Some(order) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items oi WHERE oi.order_id = ? ORDER BY oi.rowid"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(OrderWithItems { order, items }))
    }

    /// Every order with its lines, newest first.
    pub async fn list_with_items(&self) -> DbResult<Vec<OrderWithItems>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items oi ORDER BY oi.rowid"
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut by_order: HashMap<String, Vec<OrderItem>> = HashMap::new();
        for item in items {
            by_order.entry(item.order_id.clone()).or_default().push(item);
        }

        Ok(orders
            .into_iter()
            .map(|order| {
                let items = by_order.remove(&order.id).unwrap_or_default();
                OrderWithItems { order, items }
            })
            .collect())
    }

    /// The `limit` newest orders.
    pub async fn list_recent(&self, limit: i64) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id LIMIT ?"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    /// Orders created within `[start, end)`, newest first.
    pub async fn list_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders
             WHERE created_at >= ? AND created_at < ?
             ORDER BY created_at DESC, id"
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    /// Lines of orders created within `[start, end)`.
    pub async fn items_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items oi
             JOIN orders o ON o.id = oi.order_id
             WHERE o.created_at >= ? AND o.created_at < ?
             ORDER BY oi.rowid"
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    // =========================================================================
    // Status updates
    // =========================================================================

    /// ## Errors
    /// `NotFound` when no order has this id.
    pub async fn update_order_status(&self, id: &str, status: OrderStatus) -> DbResult<Order> {
        self.set_status("order_status", id, status.as_str()).await
    }

    /// ## Errors
    /// `NotFound` when no order has this id.
    pub async fn update_payment_status(&self, id: &str, status: PaymentStatus) -> DbResult<Order> {
        self.set_status("payment_status", id, status.as_str()).await
    }

    async fn set_status(&self, column: &'static str, id: &str, status: &'static str) -> DbResult<Order> {
        let result = sqlx::query(&format!(
            "UPDATE orders SET {column} = ?, updated_at = ? WHERE id = ?"
        ))
        .bind(status)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        info!(order_id = %id, column, status, "Order status updated");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id))
    }

    // =========================================================================
    // Aggregates
    // =========================================================================

    pub async fn count(&self) -> DbResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count_by_status(&self, status: OrderStatus) -> DbResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders WHERE order_status = ?")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count_created_since(&self, since: DateTime<Utc>) -> DbResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders WHERE created_at >= ?")
            .bind(since)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Σ total over paid orders.
    pub async fn paid_revenue(&self) -> DbResult<Money> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(total), 0) FROM orders WHERE payment_status = ?",
        )
        .bind(PaymentStatus::Paid)
        .fetch_one(&self.pool)
        .await?;
        Ok(Money::from_rupiah(total))
    }
}

// =============================================================================
// Transaction steps
// =============================================================================

async fn insert_item(
    tx: &mut Transaction<'_, Sqlite>,
    order_id: &str,
    item: &CartItem,
) -> DbResult<()> {
    let product = &item.product;

    sqlx::query(
        "INSERT INTO order_items (id, order_id, product_id, product_name, quantity, price, total)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(new_id())
    .bind(order_id)
    .bind(&product.id)
    .bind(&product.name)
    .bind(item.quantity)
    .bind(product.price)
    .bind(item.line_total().rupiah())
    .execute(&mut **tx)
    .await
    .map_err(|e| match DbError::from(e) {
        DbError::ForeignKeyViolation { .. } => DbError::not_found("Product", product.id.clone()),
        other => other,
    })?;

    Ok(())
}

/// Decrements stock, refusing to go below zero.
async fn take_stock(tx: &mut Transaction<'_, Sqlite>, item: &CartItem) -> DbResult<()> {
    let product = &item.product;

    let result = sqlx::query(
        "UPDATE products SET stock = stock - ?, updated_at = ?
         WHERE id = ? AND stock >= ?",
    )
    .bind(item.quantity)
    .bind(Utc::now())
    .bind(&product.id)
    .bind(item.quantity)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 1 {
        return Ok(());
    }

    let available = sqlx::query_scalar::<_, i64>("SELECT stock FROM products WHERE id = ?")
        .bind(&product.id)
        .fetch_optional(&mut **tx)
        .await?;

    Err(match available {
        None => DbError::not_found("Product", product.id.clone()),
        Some(available) => CoreError::InsufficientStock {
            product: product.name.clone(),
            available,
            requested: item.quantity,
        }
        .into(),
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use barkas_core::{Cart, PaymentMethod, Product, ProductInput};

    async fn seeded() -> (Database, Product, Product) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let camera = db
            .products()
            .insert(&ProductInput {
                name: "Kamera Analog".to_string(),
                price: 10_000,
                stock: 5,
                category: "Elektronik".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let hat = db
            .products()
            .insert(&ProductInput {
                name: "Topi".to_string(),
                price: 5_000,
                stock: 1,
                category: "Fashion".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        (db, camera, hat)
    }

    fn form() -> CheckoutForm {
        CheckoutForm {
            customer_name: "Made Wirawan".to_string(),
            customer_phone: "081234567890".to_string(),
            customer_address: "Jl. Gatot Subroto 12, Denpasar".to_string(),
            payment_method: PaymentMethod::Transfer,
            notes: Some("Kirim sore".to_string()),
            voucher_code: None,
        }
    }

    #[tokio::test]
    async fn test_place_order_snapshots_and_decrements() {
        let (db, camera, hat) = seeded().await;
        let mut cart = Cart::new();
        cart.add_item(&camera, 2);
        cart.add_item(&hat, 1);

        let placed = db.orders().place_order(&form(), cart.items(), None).await.unwrap();

        assert_eq!(placed.order.subtotal, 25_000);
        assert_eq!(placed.order.total, 25_000);
        assert_eq!(placed.order.order_status, OrderStatus::Pending);
        assert_eq!(placed.order.payment_status, PaymentStatus::Pending);
        assert_eq!(placed.order.payment_method, PaymentMethod::Transfer);
        assert_eq!(placed.items.len(), 2);
        assert_eq!(placed.items[0].product_name, "Kamera Analog");
        assert_eq!(placed.items[0].total, 20_000);

        let camera = db.products().get_by_id(&camera.id).await.unwrap().unwrap();
        let hat = db.products().get_by_id(&hat.id).await.unwrap().unwrap();
        assert_eq!(camera.stock, 3);
        assert_eq!(hat.stock, 0);
    }

    #[tokio::test]
    async fn test_empty_cart_writes_nothing() {
        let (db, _, _) = seeded().await;

        let err = db.orders().place_order(&form(), &[], None).await.unwrap_err();
        assert!(matches!(err, DbError::Rule(CoreError::EmptyCart)));
        assert_eq!(db.orders().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back() {
        let (db, camera, hat) = seeded().await;
        let mut cart = Cart::new();
        cart.add_item(&camera, 2);
        cart.add_item(&hat, 3);

        let err = db.orders().place_order(&form(), cart.items(), None).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Rule(CoreError::InsufficientStock { available: 1, requested: 3, .. })
        ));

        assert_eq!(db.orders().count().await.unwrap(), 0);
        let camera = db.products().get_by_id(&camera.id).await.unwrap().unwrap();
        assert_eq!(camera.stock, 5);
    }

    #[tokio::test]
    async fn test_deleted_product_rolls_back() {
        let (db, camera, hat) = seeded().await;
        let mut cart = Cart::new();
        cart.add_item(&camera, 1);
        cart.add_item(&hat, 1);
        db.products().delete(&hat.id).await.unwrap();

        let err = db.orders().place_order(&form(), cart.items(), None).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(db.orders().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_status_updates_and_aggregates() {
        let (db, camera, _) = seeded().await;
        let mut cart = Cart::new();
        cart.add_item(&camera, 1);
        let placed = db.orders().place_order(&form(), cart.items(), None).await.unwrap();
        let id = placed.order.id;

        let order = db.orders().update_order_status(&id, OrderStatus::Delivered).await.unwrap();
        assert_eq!(order.order_status, OrderStatus::Delivered);
        assert_eq!(db.orders().paid_revenue().await.unwrap(), Money::zero());

        let order = db.orders().update_payment_status(&id, PaymentStatus::Paid).await.unwrap();
        assert!(order.is_paid());
        assert_eq!(db.orders().paid_revenue().await.unwrap().rupiah(), 10_000);
        assert_eq!(db.orders().count_by_status(OrderStatus::Delivered).await.unwrap(), 1);
        assert_eq!(db.orders().count_by_status(OrderStatus::Pending).await.unwrap(), 0);

        let err = db
            .orders()
            .update_order_status("missing", OrderStatus::Shipped)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_deleting_product_keeps_order_history() {
        let (db, camera, _) = seeded().await;
        let mut cart = Cart::new();
        cart.add_item(&camera, 1);
        let placed = db.orders().place_order(&form(), cart.items(), None).await.unwrap();

        db.products().delete(&camera.id).await.unwrap();

        let order = db.orders().get_with_items(&placed.order.id).await.unwrap().unwrap();
        assert_eq!(order.items[0].product_id, None);
        assert_eq!(order.items[0].product_name, "Kamera Analog");
        assert_eq!(order.items[0].price, 10_000);
    }

    #[tokio::test]
    async fn test_list_with_items_and_ranges() {
        let (db, camera, hat) = seeded().await;
        for product in [&camera, &hat] {
            let mut cart = Cart::new();
            cart.add_item(product, 1);
            db.orders().place_order(&form(), cart.items(), None).await.unwrap();
        }

        let all = db.orders().list_with_items().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|o| o.items.len() == 1));

        let now = Utc::now();
        let hour = chrono::Duration::hours(1);
        assert_eq!(db.orders().list_between(now - hour, now + hour).await.unwrap().len(), 2);
        assert_eq!(db.orders().items_between(now - hour, now + hour).await.unwrap().len(), 2);
        assert!(db.orders().list_between(now + hour, now + hour * 2).await.unwrap().is_empty());
        assert_eq!(db.orders().count_created_since(now - hour).await.unwrap(), 2);
        assert_eq!(db.orders().list_recent(1).await.unwrap().len(), 1);
    }
}
