//! Supplier management service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::category::CatalogProduct;

/// Supplier service
#[derive(Clone)]
pub struct SupplierService {
    db: PgPool,
}

/// Supplier with the number of products it delivers
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SupplierSummary {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub product_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Supplier detail with its products
#[derive(Debug, Serialize)]
pub struct SupplierDetail {
    #[serde(flatten)]
    pub supplier: SupplierSummary,
    pub products: Vec<CatalogProduct>,
}

/// Input for creating or updating a supplier
#[derive(Debug, Deserialize, Validate)]
pub struct SupplierInput {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 20, message = "Phone must be at most 20 characters"))]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

const SUMMARY_QUERY: &str = r#"
    SELECT s.id, s.name, s.phone, s.address, COUNT(p.id) AS product_count,
           s.created_at, s.updated_at
    FROM suppliers s
    LEFT JOIN products p ON p.supplier_id = s.id
"#;

impl SupplierService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List all suppliers with product counts, ordered by name
    pub async fn list(&self) -> AppResult<Vec<SupplierSummary>> {
        let suppliers = sqlx::query_as::<_, SupplierSummary>(&format!(
            "{SUMMARY_QUERY} GROUP BY s.id ORDER BY s.name"
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(suppliers)
    }

    async fn summary(&self, supplier_id: Uuid) -> AppResult<SupplierSummary> {
        sqlx::query_as::<_, SupplierSummary>(&format!(
            "{SUMMARY_QUERY} WHERE s.id = $1 GROUP BY s.id"
        ))
        .bind(supplier_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Supplier".to_string()))
    }

    /// Get a supplier with its products
    pub async fn get(&self, supplier_id: Uuid) -> AppResult<SupplierDetail> {
        let supplier = self.summary(supplier_id).await?;

        let products = sqlx::query_as::<_, CatalogProduct>(
            r#"
            SELECT id, sku, name, stock_quantity, purchase_price, selling_price
            FROM products
            WHERE supplier_id = $1
            ORDER BY name
            "#,
        )
        .bind(supplier_id)
        .fetch_all(&self.db)
        .await?;

        Ok(SupplierDetail { supplier, products })
    }

    /// Create a supplier
    pub async fn create(&self, input: SupplierInput) -> AppResult<SupplierSummary> {
        let input = Self::clean(input)?;

        let id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO suppliers (name, phone, address) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&input.name)
        .bind(&input.phone)
        .bind(&input.address)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(supplier_id = %id, name = %input.name, "Supplier created");
        self.summary(id).await
    }

    /// Update a supplier's name and contact details
    pub async fn update(&self, supplier_id: Uuid, input: SupplierInput) -> AppResult<SupplierSummary> {
        let input = Self::clean(input)?;

        let result = sqlx::query(
            r#"
            UPDATE suppliers
            SET name = $1, phone = $2, address = $3, updated_at = NOW()
            WHERE id = $4
            "#,
        )
        .bind(&input.name)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(supplier_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Supplier".to_string()));
        }

        self.summary(supplier_id).await
    }

    /// Delete a supplier. Rejected while products still reference it.
    pub async fn delete(&self, supplier_id: Uuid) -> AppResult<String> {
        let supplier = self.summary(supplier_id).await?;

        if supplier.product_count > 0 {
            return Err(AppError::Conflict {
                resource: "supplier".to_string(),
                message: format!(
                    "Supplier '{}' still has {} product(s)",
                    supplier.name, supplier.product_count
                ),
            });
        }

        sqlx::query("DELETE FROM suppliers WHERE id = $1")
            .bind(supplier_id)
            .execute(&self.db)
            .await?;

        tracing::info!(supplier_id = %supplier_id, name = %supplier.name, "Supplier deleted");
        Ok(supplier.name)
    }

    fn clean(input: SupplierInput) -> AppResult<SupplierInput> {
        input.validate()?;
        let cleaned = SupplierInput {
            name: input.name.trim().to_string(),
            phone: input.phone.trim().to_string(),
            address: input.address.trim().to_string(),
        };
        shared::validate_name(&cleaned.name, shared::SUPPLIER_NAME_MAX_LEN)
            .map_err(|m| AppError::invalid("name", m))?;
        if !cleaned.phone.is_empty() {
            shared::validate_phone(&cleaned.phone).map_err(|m| AppError::invalid("phone", m))?;
        }
        Ok(cleaned)
    }
}
