//! # Routes
//!
//! One module per page family. Every handler returns
//! `Result<_, ApiError>` and extracts only the state it needs.
//!
//! ```text
//! /health                     catalog::health
//! /api/home, /api/products…   catalog
//! /api/cart…                  cart
//! /api/checkout               checkout
//! /api/auth/…                 auth
//! /api/admin/…                admin (signed-in staff only)
//! ```
//!
//! [`visitor`] holds the extractors that tell visitors apart.

pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod visitor;

use barkas_core::{ActivityAction, User};
use serde_json::Value;
use tracing::warn;

use crate::state::DbState;

/// Appends an activity log entry. Failures are logged and swallowed so the
/// action that triggered them still succeeds.
pub(crate) async fn log_activity(db: &DbState, user: &User, action: ActivityAction, details: Value) {
    if let Err(e) = db.inner().activity().record(&user.id, action, details).await {
        warn!(user_id = %user.id, action = %action, error = %e, "Activity log write failed");
    }
}
