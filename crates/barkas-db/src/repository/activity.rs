//! # Activity Log Repository
//!
//! Audit trail of staff actions, shown in the admin settings page.

use barkas_core::{ActivityAction, ActivityLog};
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::SqlitePool;
use tracing::debug;

use super::new_id;
use crate::error::DbResult;

#[derive(Debug, sqlx::FromRow)]
struct ActivityRow {
    id: String,
    user_id: String,
    action: ActivityAction,
    details: Json<Value>,
    user_name: Option<String>,
    user_email: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ActivityRow> for ActivityLog {
    fn from(row: ActivityRow) -> Self {
        ActivityLog {
            id: row.id,
            user_id: row.user_id,
            action: row.action,
            details: row.details.0,
            user_name: row.user_name,
            user_email: row.user_email,
            created_at: row.created_at,
        }
    }
}

/// Repository for activity log operations.
#[derive(Debug, Clone)]
pub struct ActivityLogRepository {
    pool: SqlitePool,
}

impl ActivityLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ActivityLogRepository { pool }
    }

    /// Appends an entry.
    ///
    /// ## Example
    /// ```rust,ignore
    /// db.activity()
    ///     .record(&user.id, ActivityAction::DeleteProduct, json!({ "product_id": id }))
    ///     .await?;
    /// ```
    pub async fn record(&self, user_id: &str, action: ActivityAction, details: Value) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO activity_logs (id, user_id, action, details, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(new_id())
        .bind(user_id)
        .bind(action)
        .bind(Json(&details))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        debug!(user_id = %user_id, action = %action, "Activity recorded");
        Ok(())
    }

    /// The `limit` newest entries, optionally only those of `only_user`.
    pub async fn list_recent(&self, limit: i64, only_user: Option<&str>) -> DbResult<Vec<ActivityLog>> {
        let rows = sqlx::query_as::<_, ActivityRow>(
            "SELECT a.id, a.user_id, a.action, a.details, a.created_at,
                    u.name AS user_name, u.email AS user_email
             FROM activity_logs a
             LEFT JOIN users u ON u.id = a.user_id
             WHERE ?1 IS NULL OR a.user_id = ?1
             ORDER BY a.created_at DESC, a.rowid DESC
             LIMIT ?2",
        )
        .bind(only_user)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ActivityLog::from).collect())
    }
}
