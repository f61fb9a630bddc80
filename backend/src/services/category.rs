//! Category management service

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Category service
#[derive(Clone)]
pub struct CategoryService {
    db: PgPool,
}

/// Category with the number of products filed under it
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CategorySummary {
    pub id: Uuid,
    pub name: String,
    pub product_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product row embedded in category and supplier details
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CatalogProduct {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub stock_quantity: i32,
    pub purchase_price: Decimal,
    pub selling_price: Decimal,
}

/// Category detail with its products
#[derive(Debug, Serialize)]
pub struct CategoryDetail {
    #[serde(flatten)]
    pub category: CategorySummary,
    pub products: Vec<CatalogProduct>,
}

/// Input for creating or renaming a category
#[derive(Debug, Deserialize, Validate)]
pub struct CategoryInput {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
}

const SUMMARY_QUERY: &str = r#"
    SELECT c.id, c.name, COUNT(p.id) AS product_count, c.created_at, c.updated_at
    FROM categories c
    LEFT JOIN products p ON p.category_id = c.id
"#;

impl CategoryService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List all categories with product counts, ordered by name
    pub async fn list(&self) -> AppResult<Vec<CategorySummary>> {
        let categories = sqlx::query_as::<_, CategorySummary>(&format!(
            "{SUMMARY_QUERY} GROUP BY c.id ORDER BY c.name"
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(categories)
    }

    async fn summary(&self, category_id: Uuid) -> AppResult<CategorySummary> {
        sqlx::query_as::<_, CategorySummary>(&format!(
            "{SUMMARY_QUERY} WHERE c.id = $1 GROUP BY c.id"
        ))
        .bind(category_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Category".to_string()))
    }

    /// Get a category with its products
    pub async fn get(&self, category_id: Uuid) -> AppResult<CategoryDetail> {
        let category = self.summary(category_id).await?;

        let products = sqlx::query_as::<_, CatalogProduct>(
            r#"
            SELECT id, sku, name, stock_quantity, purchase_price, selling_price
            FROM products
            WHERE category_id = $1
            ORDER BY name
            "#,
        )
        .bind(category_id)
        .fetch_all(&self.db)
        .await?;

        Ok(CategoryDetail { category, products })
    }

    /// Create a category
    pub async fn create(&self, input: CategoryInput) -> AppResult<CategorySummary> {
        let name = Self::clean_name(&input)?;

        let id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO categories (name) VALUES ($1) RETURNING id",
        )
        .bind(&name)
        .fetch_one(&self.db)
        .await
        .map_err(|e| Self::map_duplicate(e, "name"))?;

        tracing::info!(category_id = %id, name = %name, "Category created");
        self.summary(id).await
    }

    /// Rename a category
    pub async fn update(&self, category_id: Uuid, input: CategoryInput) -> AppResult<CategorySummary> {
        let name = Self::clean_name(&input)?;

        let result = sqlx::query("UPDATE categories SET name = $1, updated_at = NOW() WHERE id = $2")
            .bind(&name)
            .bind(category_id)
            .execute(&self.db)
            .await
            .map_err(|e| Self::map_duplicate(e, "name"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Category".to_string()));
        }

        self.summary(category_id).await
    }

    /// Delete a category. Rejected while products still reference it.
    pub async fn delete(&self, category_id: Uuid) -> AppResult<String> {
        let category = self.summary(category_id).await?;

        if category.product_count > 0 {
            return Err(AppError::Conflict {
                resource: "category".to_string(),
                message: format!(
                    "Category '{}' still has {} product(s)",
                    category.name, category.product_count
                ),
            });
        }

        // The FK still guards a product inserted since the count
        sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(category_id)
            .execute(&self.db)
            .await?;

        tracing::info!(category_id = %category_id, name = %category.name, "Category deleted");
        Ok(category.name)
    }

    fn clean_name(input: &CategoryInput) -> AppResult<String> {
        input.validate()?;
        let name = input.name.trim().to_string();
        shared::validate_name(&name, shared::CATEGORY_NAME_MAX_LEN)
            .map_err(|m| AppError::invalid("name", m))?;
        Ok(name)
    }

    fn map_duplicate(err: sqlx::Error, field: &str) -> AppError {
        match AppError::from(err) {
            AppError::DuplicateEntry(_) => AppError::DuplicateEntry(field.to_string()),
            other => other,
        }
    }
}
