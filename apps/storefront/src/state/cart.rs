//! # Cart State
//!
//! One cart per visitor, shared by the cart and checkout handlers.
//!
//! ## Thread Safety
//! Carts live in a [`VisitorMap`] (`Arc<Mutex<_>>`) because:
//! 1. Several handlers read and modify carts
//! 2. Only one handler should modify the map at a time
//! 3. axum runs handlers concurrently
//!
//! The lock is never held across an `.await`: handlers fetch what they need
//! from the database first, then apply the change in one `with_cart_mut`.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Client Action            Route                      Cart Change        │
//! │  ─────────────            ─────                      ───────────        │
//! │  Add to cart ────────────► POST /api/cart/items ───► add_item          │
//! │  Change quantity ────────► PUT  /api/cart/items/x ─► update_quantity   │
//! │  Remove ─────────────────► DELETE /api/cart/items/x► remove_item       │
//! │  Checkout ───────────────► POST /api/checkout ─────► remove_ordered    │
//! │  View cart ──────────────► GET  /api/cart ─────────► (read only)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use barkas_core::{Cart, CartSummary, Observers, Subscription};
use chrono::Duration;

use super::visitors::VisitorMap;

/// A cart change, tagged with the visitor whose cart it was.
#[derive(Debug, Clone, PartialEq)]
pub struct CartEvent {
    pub visitor_id: String,
    pub summary: CartSummary,
}

#[derive(Debug, Clone)]
pub struct CartState {
    carts: VisitorMap<Cart>,
    events: Arc<Observers<CartEvent>>,
}

impl CartState {
    pub fn new(idle: Duration) -> Self {
        CartState {
            carts: VisitorMap::new(idle),
            events: Arc::new(Observers::new()),
        }
    }

    /// Executes a read-only function with the visitor's cart.
    ///
    /// A visitor without a cart sees an empty one.
    pub fn with_cart<F, R>(&self, visitor: &str, f: F) -> R
    where
        F: FnOnce(&Cart) -> R,
    {
        self.carts.read(visitor, |cart| match cart {
            Some(cart) => f(cart),
            None => f(&Cart::new()),
        })
    }

    /// Executes a mutating function with the visitor's cart, creating it on
    /// first use.
    ///
    /// Observers run inside `f` while the lock is held; they must not call
    /// back into this state.
    pub fn with_cart_mut<F, R>(&self, visitor: &str, f: F) -> R
    where
        F: FnOnce(&mut Cart) -> R,
    {
        self.carts.write(visitor, || self.new_cart(visitor), f)
    }

    /// Listens to changes in every visitor's cart.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&CartEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(listener)
    }

    fn new_cart(&self, visitor: &str) -> Cart {
        let cart = Cart::new();
        let events = Arc::clone(&self.events);
        let visitor_id = visitor.to_string();
        // Lives as long as the cart.
        let _forward = cart.subscribe(move |summary| {
            events.notify(&CartEvent {
                visitor_id: visitor_id.clone(),
                summary: *summary,
            });
        });
        cart
    }
}
