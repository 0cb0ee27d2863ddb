//! # Product Repository
//!
//! Database operations for the catalog.
//!
//! ## Key Operations
//! - Catalog listings (all, featured, related, categories)
//! - Admin CRUD
//! - Stock adjustments that never go below zero
//!
//! Tags are stored as a JSON array in a TEXT column and decoded through
//! [`ProductRow`]. Text search happens in `barkas_core::catalog` over the
//! listed products.

use barkas_core::{CoreError, Product, ProductInput};
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::new_id;
use crate::error::{DbError, DbResult};

const PRODUCT_COLUMNS: &str = "id, name, description, price, image_url, category, stock, tags, \
     is_featured, is_limited_stock, barcode, created_at, updated_at";

/// Row shape of the `products` table.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductRow {
    id: String,
    name: String,
    description: String,
    price: i64,
    image_url: Option<String>,
    category: String,
    stock: i64,
    tags: Json<Vec<String>>,
    is_featured: bool,
    is_limited_stock: bool,
    barcode: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            image_url: row.image_url,
            category: row.category,
            stock: row.stock,
            tags: row.tags.0,
            is_featured: row.is_featured,
            is_limited_stock: row.is_limited_stock,
            barcode: row.barcode,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let featured = repo.list_featured(6).await?;
/// let product = repo.get_by_id("uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists every product, newest first.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Listed products");
        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Lists featured products, newest first.
    pub async fn list_featured(&self, limit: i64) -> DbResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE is_featured = 1
             ORDER BY created_at DESC, id
             LIMIT ?"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Products in the same category as `product`, excluding it, newest first.
    pub async fn related(&self, product: &Product, limit: i64) -> DbResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE category = ? AND id <> ?
             ORDER BY created_at DESC, id
             LIMIT ?"
        ))
        .bind(&product.category)
        .bind(&product.id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Distinct non-empty categories, ascending.
    pub async fn categories(&self) -> DbResult<Vec<String>> {
        let categories = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT category FROM products WHERE TRIM(category) <> '' ORDER BY category",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Inserts a new product from the admin form.
    ///
    /// The input is validated and normalised first.
    pub async fn insert(&self, input: &ProductInput) -> DbResult<Product> {
        let input = input.validate()?;
        let id = new_id();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO products (
                id, name, description, price, image_url, category, stock, tags,
                is_featured, is_limited_stock, barcode, created_at, updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(&input.image_url)
        .bind(&input.category)
        .bind(input.stock)
        .bind(Json(&input.tags))
        .bind(input.is_featured)
        .bind(input.is_limited_stock)
        .bind(&input.barcode)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| barcode_conflict(e.into(), &input))?;

        info!(product_id = %id, name = %input.name, "Product created");

        self.get_by_id(&id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Replaces a product's editable fields.
    ///
    /// ## Errors
    /// `NotFound` when no product has this id.
    pub async fn update(&self, id: &str, input: &ProductInput) -> DbResult<Product> {
        let input = input.validate()?;

        let result = sqlx::query(
            "UPDATE products SET
                name = ?, description = ?, price = ?, image_url = ?, category = ?,
                stock = ?, tags = ?, is_featured = ?, is_limited_stock = ?, barcode = ?,
                updated_at = ?
             WHERE id = ?",
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(&input.image_url)
        .bind(&input.category)
        .bind(input.stock)
        .bind(Json(&input.tags))
        .bind(input.is_featured)
        .bind(input.is_limited_stock)
        .bind(&input.barcode)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| barcode_conflict(e.into(), &input))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        info!(product_id = %id, "Product updated");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Deletes a product.
    ///
    /// Order items keep their name/price snapshot; their `product_id` is
    /// set to NULL by the foreign key.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        info!(product_id = %id, "Product deleted");
        Ok(())
    }

    /// Adds `delta` (negative to remove) to a product's stock.
    ///
    /// ## Errors
    /// - `NotFound` when the product does not exist
    /// - `InsufficientStock` when the result would be negative
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> DbResult<Product> {
        let result = sqlx::query(
            "UPDATE products SET stock = stock + ?, updated_at = ?
             WHERE id = ? AND stock + ? >= 0",
        )
        .bind(delta)
        .bind(Utc::now())
        .bind(id)
        .bind(delta)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let product = self
                .get_by_id(id)
                .await?
                .ok_or_else(|| DbError::not_found("Product", id))?;
            return Err(CoreError::InsufficientStock {
                product: product.name,
                available: product.stock,
                requested: -delta,
            }
            .into());
        }

        debug!(product_id = %id, delta, "Stock adjusted");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Total number of products.
    pub async fn count(&self) -> DbResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Products with `stock < threshold`.
    pub async fn count_low_stock(&self, threshold: i64) -> DbResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products WHERE stock < ?")
            .bind(threshold)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Attaches the offending barcode to a unique violation.
fn barcode_conflict(err: DbError, input: &ProductInput) -> DbError {
    match (&err, &input.barcode) {
        (DbError::UniqueViolation { field, .. }, Some(barcode)) if field.ends_with("barcode") => {
            DbError::duplicate("barcode", barcode.clone())
        }
        _ => err,
    }
}

// =============================================================================
// Tests
// =============================================================================
