//! # User Repository
//!
//! Staff accounts. Password hashes are read only through
//! [`UserRepository::get_credentials`], which is used by the auth service.

use barkas_core::{Role, User};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::info;

use super::new_id;
use crate::error::{DbError, DbResult};

const USER_COLUMNS: &str = "id, email, name, role, created_at, updated_at";

/// A user row including the stored password hash.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct CredentialRow {
    id: String,
    email: String,
    name: String,
    role: Role,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CredentialRow {
    pub(crate) fn into_parts(self) -> (User, String) {
        (
            User {
                id: self.id,
                email: self.email,
                name: self.name,
                role: self.role,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            self.password_hash,
        )
    }
}

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Looks up a user by email, ignoring case.
    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ? COLLATE NOCASE"
        ))
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// User plus password hash, for sign-in.
    pub(crate) async fn get_credentials(&self, email: &str) -> DbResult<Option<(User, String)>> {
        let row = sqlx::query_as::<_, CredentialRow>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = ? COLLATE NOCASE"
        ))
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(CredentialRow::into_parts))
    }

    /// Creates a user with an already-hashed password.
    ///
    /// ## Errors
    /// `UniqueViolation` when the email is taken.
    pub async fn insert(
        &self,
        email: &str,
        name: &str,
        role: Role,
        password_hash: &str,
    ) -> DbResult<User> {
        let id = new_id();
        let now = Utc::now();
        let email = email.trim().to_lowercase();

        sqlx::query(
            "INSERT INTO users (id, email, name, role, password_hash, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&email)
        .bind(name.trim())
        .bind(role)
        .bind(password_hash)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("email", email.clone()),
            other => other,
        })?;

        info!(user_id = %id, role = %role, "User created");

        self.get_by_id(&id)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    /// Updates name and email.
    ///
    /// ## Errors
    /// - `NotFound` when the user does not exist
    /// - `UniqueViolation` when the email belongs to someone else
    pub async fn update_profile(&self, id: &str, name: &str, email: &str) -> DbResult<User> {
        let email = email.trim().to_lowercase();

        let result = sqlx::query("UPDATE users SET name = ?, email = ?, updated_at = ? WHERE id = ?")
            .bind(name.trim())
            .bind(&email)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { .. } => DbError::duplicate("email", email.clone()),
                other => other,
            })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        info!(user_id = %id, "Profile updated");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_email_lookup_is_case_insensitive() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();

        let user = repo
            .insert("Admin@BarkasBali88.com", "Admin", Role::Admin, "hash")
            .await
            .unwrap();
        assert_eq!(user.email, "admin@barkasbali88.com");

        let found = repo.get_by_email("ADMIN@barkasbali88.com").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.role, Role::Admin);

        let (_, hash) = repo.get_credentials("admin@barkasbali88.com").await.unwrap().unwrap();
        assert_eq!(hash, "hash");
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();

        repo.insert("kasir@barkas.id", "Kasir", Role::Employee, "h").await.unwrap();
        let err = repo
            .insert("KASIR@barkas.id", "Kasir 2", Role::Employee, "h")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "email"));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_profile() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();
        let user = repo.insert("a@barkas.id", "A", Role::Manager, "h").await.unwrap();

        let updated = repo.update_profile(&user.id, "Ayu", "ayu@barkas.id").await.unwrap();
        assert_eq!(updated.name, "Ayu");
        assert_eq!(updated.email, "ayu@barkas.id");

        assert!(repo
            .update_profile("missing", "X", "x@barkas.id")
            .await
            .unwrap_err()
            .is_not_found());
    }
}
