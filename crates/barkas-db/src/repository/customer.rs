//! # Customer Repository
//!
//! CRUD for the back-office customer list.

use barkas_core::{Customer, CustomerInput};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use super::new_id;
use crate::error::{DbError, DbResult};

const CUSTOMER_COLUMNS: &str = "id, name, phone, email, address, created_at, updated_at";

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Lists every customer, newest first.
    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY created_at DESC, id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(customers)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(customer)
    }

    pub async fn insert(&self, input: &CustomerInput) -> DbResult<Customer> {
        let input = input.validate()?;
        let id = new_id();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO customers (id, name, phone, email, address, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&input.name)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.address)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        info!(customer_id = %id, "Customer created");

        self.get_by_id(&id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))
    }

    /// ## Errors
    /// `NotFound` when no customer has this id.
    pub async fn update(&self, id: &str, input: &CustomerInput) -> DbResult<Customer> {
        let input = input.validate()?;

        let result = sqlx::query(
            "UPDATE customers SET name = ?, phone = ?, email = ?, address = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&input.name)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.address)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        info!(customer_id = %id, "Customer updated");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM customers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        info!(customer_id = %id, "Customer deleted");
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn wayan() -> CustomerInput {
        CustomerInput {
            name: " Wayan ".to_string(),
            phone: "081234567890".to_string(),
            email: Some("wayan@example.com".to_string()),
            address: "Jl. Raya Kuta 1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_customer_crud() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        let created = repo.insert(&wayan()).await.unwrap();
        assert_eq!(created.name, "Wayan");
        assert_eq!(repo.count().await.unwrap(), 1);

        let mut edit = wayan();
        edit.email = None;
        edit.address = "Jl. Legian 7".to_string();
        let updated = repo.update(&created.id, &edit).await.unwrap();
        assert_eq!(updated.email, None);
        assert_eq!(updated.address, "Jl. Legian 7");

        assert_eq!(repo.list().await.unwrap().len(), 1);

        repo.delete(&created.id).await.unwrap();
        assert!(repo.get_by_id(&created.id).await.unwrap().is_none());
        assert!(repo.delete(&created.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_customer_requires_phone() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut input = wayan();
        input.phone = String::new();

        assert!(db.customers().insert(&input).await.is_err());
        assert_eq!(db.customers().count().await.unwrap(), 0);
    }
}
