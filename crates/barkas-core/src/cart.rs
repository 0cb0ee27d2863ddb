//! # Cart Store
//!
//! The visitor's in-memory shopping cart.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Cart Lifecycle                                 │
//! │                                                                         │
//! │   ┌──────────┐   add_item     ┌──────────┐   checkout    ┌──────────┐  │
//! │   │  Empty   │ ─────────────► │  Items   │ ────────────► │  Order   │  │
//! │   └──────────┘                └──────────┘               └──────────┘  │
//! │        ▲                          │    ▲                      │        │
//! │        │     clear / qty → 0      │    │ update_quantity      │        │
//! │        └──────────────────────────┘    └──────────────        │        │
//! │        ▲                                                      │        │
//! │        └───────────────── remove_ordered() after order ───────┘        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Every line has `quantity >= 1`; a change that would go to zero or
//!   below removes the line instead.
//! - A product id appears at most once.
//! - `item_count` and `total` are computed on read, never cached.
//!
//! No operation here fails. The stock ceiling is enforced by the caller
//! before `add_item`, against the product it just fetched.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::observe::{Observers, Subscription};
use crate::types::Product;

// =============================================================================
// Cart Item
// =============================================================================

/// A line in the cart: a product snapshot and a quantity.
///
/// The snapshot is taken when the product is first added and is not
/// refreshed when stock or price change in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartItem {
    pub product: Product,
    pub quantity: i64,
}

impl CartItem {
    /// price × quantity.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.product.price() * self.quantity
    }
}

/// Aggregates broadcast to observers after every change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartSummary {
    /// Distinct products.
    pub line_count: usize,
    /// Σ quantity.
    pub item_count: i64,
    /// Σ price × quantity.
    pub total: Money,
}

// =============================================================================
// Cart
// =============================================================================

/// The cart store.
///
/// ## Example
/// ```rust
/// use barkas_core::cart::Cart;
/// # use barkas_core::types::Product;
/// # use chrono::Utc;
/// # let product = Product {
/// #     id: "p-1".into(), name: "Kamera".into(), description: String::new(),
/// #     price: 10_000, image_url: None, category: "Elektronik".into(), stock: 5,
/// #     tags: vec![], is_featured: false, is_limited_stock: false, barcode: None,
/// #     created_at: Utc::now(), updated_at: Utc::now(),
/// # };
///
/// let mut cart = Cart::new();
/// cart.add_item(&product, 2);
/// cart.add_item(&product, 3);
///
/// assert_eq!(cart.item_count(), 5);
/// assert_eq!(cart.total().rupiah(), 50_000);
///
/// cart.update_quantity("p-1", 0);
/// assert!(cart.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct Cart {
    items: Vec<CartItem>,
    observers: Observers<CartSummary>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    /// Adds `quantity` of `product`.
    ///
    /// ## Behavior
    /// - Product already in cart: quantities are summed (saturating). A sum
    ///   of zero or less removes the line.
    /// - New product: inserted when `quantity >= 1`, otherwise ignored.
    pub fn add_item(&mut self, product: &Product, quantity: i64) {
        let changed = match self.position(&product.id) {
            Some(index) => {
                let new_quantity = self.items[index].quantity.saturating_add(quantity);
                if new_quantity <= 0 {
                    self.items.remove(index);
                    true
                } else if new_quantity != self.items[index].quantity {
                    self.items[index].quantity = new_quantity;
                    true
                } else {
                    false
                }
            }
            None if quantity >= 1 => {
                self.items.push(CartItem {
                    product: product.clone(),
                    quantity,
                });
                true
            }
            None => false,
        };

        if changed {
            self.emit();
        }
    }

    /// Sets the quantity of a line.
    ///
    /// `quantity <= 0` removes the line. Unknown ids are ignored.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(product_id);
            return;
        }

        if let Some(index) = self.position(product_id) {
            if self.items[index].quantity != quantity {
                self.items[index].quantity = quantity;
                self.emit();
            }
        }
    }

    /// Removes a line. Unknown ids are ignored.
    pub fn remove_item(&mut self, product_id: &str) {
        if let Some(index) = self.position(product_id) {
            self.items.remove(index);
            self.emit();
        }
    }

    /// Empties the cart.
    pub fn clear(&mut self) {
        if !self.items.is_empty() {
            self.items.clear();
            self.emit();
        }
    }

    /// Takes lines that were just ordered out of the cart.
    ///
    /// Each matching line drops by the ordered quantity and is removed at
    /// zero. Lines added, or quantity added, after `ordered` was copied
    /// stay in the cart. Observers are notified once.
    pub fn remove_ordered(&mut self, ordered: &[CartItem]) {
        let mut changed = false;
        for line in ordered {
            let Some(index) = self.position(&line.product.id) else {
                continue;
            };
            let left = self.items[index].quantity.saturating_sub(line.quantity);
            if left <= 0 {
                self.items.remove(index);
            } else {
                self.items[index].quantity = left;
            }
            changed = true;
        }

        if changed {
            self.emit();
        }
    }

    // -------------------------------------------------------------------------
    // Derived values
    // -------------------------------------------------------------------------

    /// Σ quantity across all lines.
    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Σ price × quantity across all lines.
    pub fn total(&self) -> Money {
        self.items.iter().map(CartItem::line_total).sum()
    }

    pub fn line_count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Lines in insertion order.
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn get(&self, product_id: &str) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product.id == product_id)
    }

    pub fn summary(&self) -> CartSummary {
        CartSummary {
            line_count: self.line_count(),
            item_count: self.item_count(),
            total: self.total(),
        }
    }

    // -------------------------------------------------------------------------
    // Observation
    // -------------------------------------------------------------------------

    /// Registers a listener called with the new summary after each change.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&CartSummary) + Send + Sync + 'static,
    {
        self.observers.subscribe(listener)
    }

    fn position(&self, product_id: &str) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.product.id == product_id)
    }

    fn emit(&self) {
        self.observers.notify(&self.summary());
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::{Arc, Mutex};

    fn product(id: &str, price: i64, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Produk {}", id),
            description: String::new(),
            price,
            image_url: None,
            category: "Fashion".to_string(),
            stock,
            tags: vec![],
            is_featured: false,
            is_limited_stock: false,
            barcode: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn recorder(cart: &Cart) -> Arc<Mutex<Vec<CartSummary>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _ = cart.subscribe(move |s| sink.lock().unwrap().push(*s));
        seen
    }

    #[test]
    fn test_add_merges_same_product() {
        let a = product("a", 10_000, 5);
        let mut cart = Cart::new();

        cart.add_item(&a, 2);
        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.total().rupiah(), 20_000);

        cart.add_item(&a, 3);
        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.get("a").unwrap().quantity, 5);
        assert_eq!(cart.total().rupiah(), 50_000);

        cart.update_quantity("a", 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_two_products() {
        let a = product("a", 12_500, 5);
        let b = product("b", 5_000, 1);
        let mut cart = Cart::new();

        cart.add_item(&a, 1);
        cart.add_item(&b, 1);

        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.total().rupiah(), 17_500);
    }

    #[test]
    fn test_update_zero_equals_remove() {
        let a = product("a", 1_000, 9);
        let b = product("b", 2_000, 9);

        let mut updated = Cart::new();
        updated.add_item(&a, 2);
        updated.add_item(&b, 1);
        updated.update_quantity("a", 0);

        let mut removed = Cart::new();
        removed.add_item(&a, 2);
        removed.add_item(&b, 1);
        removed.remove_item("a");

        assert_eq!(updated.items(), removed.items());
        assert!(updated.get("a").is_none());
    }

    #[test]
    fn test_negative_add_removes_when_depleted() {
        let a = product("a", 1_000, 9);
        let mut cart = Cart::new();

        cart.add_item(&a, 3);
        cart.add_item(&a, -1);
        assert_eq!(cart.get("a").unwrap().quantity, 2);

        cart.add_item(&a, -5);
        assert!(cart.is_empty());

        cart.add_item(&a, 0);
        cart.add_item(&a, -2);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_saturates_instead_of_wrapping() {
        let a = product("a", 1_000, 9);
        let mut cart = Cart::new();

        cart.add_item(&a, 1);
        cart.add_item(&a, i64::MAX);
        assert_eq!(cart.get("a").unwrap().quantity, i64::MAX);

        cart.add_item(&a, i64::MIN);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_ordered_keeps_later_additions() {
        let a = product("a", 1_000, 9);
        let b = product("b", 2_000, 9);
        let c = product("c", 3_000, 9);
        let mut cart = Cart::new();
        cart.add_item(&a, 2);
        cart.add_item(&b, 1);
        let ordered = cart.items().to_vec();

        // changes made while the order was being placed
        cart.add_item(&a, 3);
        cart.add_item(&c, 1);
        let seen = recorder(&cart);

        cart.remove_ordered(&ordered);

        assert_eq!(cart.get("a").unwrap().quantity, 3);
        assert!(cart.get("b").is_none());
        assert_eq!(cart.get("c").unwrap().quantity, 1);
        assert_eq!(seen.lock().unwrap().len(), 1);

        cart.remove_ordered(&[]);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_snapshot_taken_on_first_add() {
        let mut a = product("a", 1_000, 9);
        let mut cart = Cart::new();
        cart.add_item(&a, 1);

        a.price = 99_000;
        cart.add_item(&a, 1);

        assert_eq!(cart.get("a").unwrap().product.price, 1_000);
        assert_eq!(cart.total().rupiah(), 2_000);
    }

    #[test]
    fn test_totals_follow_remaining_lines() {
        let mut cart = Cart::new();
        for (id, price, qty) in [("a", 1_500, 2), ("b", 700, 3), ("c", 10_000, 1)] {
            cart.add_item(&product(id, price, 10), qty);
        }
        cart.remove_item("b");
        cart.update_quantity("c", 4);

        let expected: i64 = cart
            .items()
            .iter()
            .map(|i| i.product.price * i.quantity)
            .sum();
        assert_eq!(cart.total().rupiah(), expected);
        assert_eq!(cart.item_count(), 6);
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add_item(&product("a", 1_000, 2), 2);
        cart.clear();

        assert!(cart.items().is_empty());
        assert!(cart.total().is_zero());
        assert_eq!(cart.item_count(), 0);
    }

    #[test]
    fn test_observers_see_changes_only() {
        let a = product("a", 10_000, 5);
        let mut cart = Cart::new();
        let seen = recorder(&cart);

        cart.add_item(&a, 2);
        cart.update_quantity("a", 2); // unchanged
        cart.remove_item("missing");
        cart.add_item(&a, 1);
        cart.clear();
        cart.clear(); // already empty

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].item_count, 2);
        assert_eq!(seen[1].total.rupiah(), 30_000);
        assert_eq!(seen[2], CartSummary::default());
    }
}
