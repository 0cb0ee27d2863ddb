//! # Database State
//!
//! Wraps the `Database` handle for use in handlers.
//!
//! ## Usage in Handlers
//! ```rust,ignore
//! async fn list_categories(State(db): State<DbState>) -> Result<Json<Vec<String>>, ApiError> {
//!     Ok(Json(db.inner().products().categories().await?))
//! }
//! ```

use barkas_db::Database;

/// Cheap-to-clone wrapper around `Database`.
#[derive(Debug, Clone)]
pub struct DbState {
    db: Database,
}

impl DbState {
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    pub fn inner(&self) -> &Database {
        &self.db
    }
}
