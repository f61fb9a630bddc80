//! Product catalogue service
//!
//! Products are created and edited here, but their stock balance is only
//! moved through the ledger in `services::stock`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::services::stock::{post_entry, LedgerEntry, StockService, StockTransaction};
use shared::{
    correction_for, EntityRef, PaginatedResponse, Pagination, ProductMetrics, SupplierRef,
    TransactionType,
};

/// Product service
#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
    default_minimum_stock: i32,
    recent_transactions_limit: i64,
    max_page_size: u32,
}

/// Product row joined with its category and supplier
#[derive(Debug, Clone, FromRow)]
pub(crate) struct ProductRow {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub category_id: Uuid,
    pub category_name: String,
    pub supplier_id: Uuid,
    pub supplier_name: String,
    pub supplier_phone: String,
    pub purchase_price: Decimal,
    pub selling_price: Decimal,
    pub stock_quantity: i32,
    pub minimum_stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductRow {
    fn metrics(&self) -> ProductMetrics {
        ProductMetrics::compute(
            self.stock_quantity,
            self.minimum_stock,
            self.purchase_price,
            self.selling_price,
        )
    }
}

/// Product as listed by the API
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub category: EntityRef,
    pub supplier: EntityRef,
    pub purchase_price: Decimal,
    pub selling_price: Decimal,
    pub stock_quantity: i32,
    pub minimum_stock: i32,
    #[serde(flatten)]
    pub metrics: ProductMetrics,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductRow> for ProductView {
    fn from(row: ProductRow) -> Self {
        let metrics = row.metrics();
        Self {
            id: row.id,
            sku: row.sku,
            name: row.name,
            category: EntityRef::new(row.category_id, row.category_name),
            supplier: EntityRef::new(row.supplier_id, row.supplier_name),
            purchase_price: row.purchase_price,
            selling_price: row.selling_price,
            stock_quantity: row.stock_quantity,
            minimum_stock: row.minimum_stock,
            metrics,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Product detail with supplier contact and recent ledger entries
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub category: EntityRef,
    pub supplier: SupplierRef,
    pub purchase_price: Decimal,
    pub selling_price: Decimal,
    pub stock_quantity: i32,
    pub minimum_stock: i32,
    #[serde(flatten)]
    pub metrics: ProductMetrics,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub recent_transactions: Vec<StockTransaction>,
}

/// Query parameters for listing products
#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    pub search: Option<String>,
    pub category_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    #[serde(default)]
    pub low_stock: bool,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Input for creating a product
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductInput {
    #[validate(length(min = 1, max = 50, message = "SKU must be 1-50 characters"))]
    pub sku: String,
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
    pub category_id: Uuid,
    pub supplier_id: Uuid,
    pub purchase_price: Decimal,
    pub selling_price: Decimal,
    /// Starting stock, recorded as an opening IN entry
    #[serde(default)]
    #[validate(range(min = 0, message = "Stock quantity cannot be negative"))]
    pub stock_quantity: i32,
    #[validate(range(min = 0, message = "Minimum stock cannot be negative"))]
    pub minimum_stock: Option<i32>,
}

/// Input for updating a product. Stock is not editable here.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProductInput {
    #[validate(length(min = 1, max = 50, message = "SKU must be 1-50 characters"))]
    pub sku: String,
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
    pub category_id: Uuid,
    pub supplier_id: Uuid,
    pub purchase_price: Decimal,
    pub selling_price: Decimal,
    #[validate(range(min = 0, message = "Minimum stock cannot be negative"))]
    pub minimum_stock: Option<i32>,
}

/// Input for a stock correction
#[derive(Debug, Deserialize)]
pub struct StockCorrectionInput {
    pub stock_quantity: i32,
    pub notes: Option<String>,
}

/// Result of a stock correction
#[derive(Debug, Serialize)]
pub struct StockCorrection {
    pub product_id: Uuid,
    pub sku: String,
    pub previous_stock: i32,
    pub new_stock: i32,
    /// None when the stock already matched
    pub transaction: Option<StockTransaction>,
}

/// Products grouped under a category
#[derive(Debug, Serialize)]
pub struct ProductsByCategory {
    pub category_id: Uuid,
    pub product_count: usize,
    pub products: Vec<ProductView>,
}

/// Products grouped under a supplier
#[derive(Debug, Serialize)]
pub struct ProductsBySupplier {
    pub supplier_id: Uuid,
    pub product_count: usize,
    pub products: Vec<ProductView>,
}

/// Search result
#[derive(Debug, Serialize)]
pub struct ProductSearchResult {
    pub query: String,
    pub result_count: usize,
    pub products: Vec<ProductView>,
}

/// Fields shared by create and update after trimming and validation
#[derive(Debug)]
pub(crate) struct ProductFields {
    pub sku: String,
    pub name: String,
    pub category_id: Uuid,
    pub supplier_id: Uuid,
    pub purchase_price: Decimal,
    pub selling_price: Decimal,
    pub minimum_stock: Option<i32>,
}

impl ProductFields {
    pub(crate) fn clean(
        sku: &str,
        name: &str,
        category_id: Uuid,
        supplier_id: Uuid,
        purchase_price: Decimal,
        selling_price: Decimal,
        minimum_stock: Option<i32>,
    ) -> AppResult<Self> {
        let sku = sku.trim().to_string();
        let name = name.trim().to_string();

        shared::validate_sku(&sku).map_err(|m| AppError::invalid("sku", m))?;
        shared::validate_name(&name, shared::PRODUCT_NAME_MAX_LEN)
            .map_err(|m| AppError::invalid("name", m))?;
        shared::validate_price(purchase_price)
            .map_err(|m| AppError::invalid("purchase_price", m))?;
        shared::validate_price(selling_price).map_err(|m| AppError::invalid("selling_price", m))?;
        shared::validate_pricing(purchase_price, selling_price)
            .map_err(|m| AppError::invalid("selling_price", m))?;
        if let Some(level) = minimum_stock {
            shared::validate_stock_level(level)
                .map_err(|m| AppError::invalid("minimum_stock", m))?;
        }

        Ok(Self {
            sku,
            name,
            category_id,
            supplier_id,
            purchase_price,
            selling_price,
            minimum_stock,
        })
    }
}

pub(crate) const PRODUCT_SELECT: &str = r#"
    SELECT p.id, p.sku, p.name,
           p.category_id, c.name AS category_name,
           p.supplier_id, s.name AS supplier_name, s.phone AS supplier_phone,
           p.purchase_price, p.selling_price, p.stock_quantity, p.minimum_stock,
           p.created_at, p.updated_at
    FROM products p
    JOIN categories c ON c.id = p.category_id
    JOIN suppliers s ON s.id = p.supplier_id
"#;

const LIST_WHERE: &str = r#"
    WHERE ($1::text IS NULL OR p.name ILIKE $1 OR p.sku ILIKE $1)
      AND ($2::uuid IS NULL OR p.category_id = $2)
      AND ($3::uuid IS NULL OR p.supplier_id = $3)
      AND (NOT $4 OR p.stock_quantity <= p.minimum_stock)
"#;

/// `ILIKE` pattern matching `term` anywhere, with wildcards escaped
pub(crate) fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

impl ProductService {
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            default_minimum_stock: config.inventory.default_minimum_stock,
            recent_transactions_limit: config.inventory.recent_transactions_limit,
            max_page_size: config.inventory.max_page_size,
        }
    }

    /// List products with optional filters, ordered by name
    pub async fn list(&self, query: &ProductListQuery) -> AppResult<PaginatedResponse<ProductView>> {
        let pagination = Pagination::from_query(query.page, query.per_page, self.max_page_size);
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(contains_pattern);

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM products p {LIST_WHERE}"
        ))
        .bind(&search)
        .bind(query.category_id)
        .bind(query.supplier_id)
        .bind(query.low_stock)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{PRODUCT_SELECT} {LIST_WHERE} ORDER BY p.name, p.sku LIMIT $5 OFFSET $6"
        ))
        .bind(&search)
        .bind(query.category_id)
        .bind(query.supplier_id)
        .bind(query.low_stock)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse::new(
            rows.into_iter().map(ProductView::from).collect(),
            pagination,
            total.max(0) as u64,
        ))
    }

    async fn row(&self, product_id: Uuid) -> AppResult<ProductRow> {
        sqlx::query_as::<_, ProductRow>(&format!("{PRODUCT_SELECT} WHERE p.id = $1"))
            .bind(product_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }

    /// Get a single product in list form
    pub async fn get_view(&self, product_id: Uuid) -> AppResult<ProductView> {
        Ok(self.row(product_id).await?.into())
    }

    /// Get product detail with its most recent ledger entries
    pub async fn get(&self, product_id: Uuid) -> AppResult<ProductDetail> {
        let row = self.row(product_id).await?;
        let recent_transactions = StockService::new(self.db.clone())
            .recent_for_product(product_id, self.recent_transactions_limit)
            .await?;

        let metrics = row.metrics();
        Ok(ProductDetail {
            id: row.id,
            sku: row.sku,
            name: row.name,
            category: EntityRef::new(row.category_id, row.category_name),
            supplier: SupplierRef {
                id: row.supplier_id,
                name: row.supplier_name,
                phone: row.supplier_phone,
            },
            purchase_price: row.purchase_price,
            selling_price: row.selling_price,
            stock_quantity: row.stock_quantity,
            minimum_stock: row.minimum_stock,
            metrics,
            created_at: row.created_at,
            updated_at: row.updated_at,
            recent_transactions,
        })
    }

    /// Create a product. A non-zero starting stock is booked as an opening IN entry.
    pub async fn create(&self, user: &AuthUser, input: CreateProductInput) -> AppResult<ProductView> {
        input.validate()?;
        let fields = ProductFields::clean(
            &input.sku,
            &input.name,
            input.category_id,
            input.supplier_id,
            input.purchase_price,
            input.selling_price,
            input.minimum_stock,
        )?;
        shared::validate_stock_level(input.stock_quantity)
            .map_err(|m| AppError::invalid("stock_quantity", m))?;

        self.ensure_references(fields.category_id, fields.supplier_id).await?;

        let mut tx = self.db.begin().await?;

        let product_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO products
                (sku, name, category_id, supplier_id, purchase_price, selling_price,
                 stock_quantity, minimum_stock)
            VALUES ($1, $2, $3, $4, $5, $6, 0, $7)
            RETURNING id
            "#,
        )
        .bind(&fields.sku)
        .bind(&fields.name)
        .bind(fields.category_id)
        .bind(fields.supplier_id)
        .bind(fields.purchase_price)
        .bind(fields.selling_price)
        .bind(fields.minimum_stock.unwrap_or(self.default_minimum_stock))
        .fetch_one(&mut *tx)
        .await
        .map_err(map_duplicate_sku)?;

        if input.stock_quantity > 0 {
            post_entry(
                &mut tx,
                LedgerEntry {
                    product_id,
                    transaction_type: TransactionType::In,
                    quantity: input.stock_quantity,
                    notes: "Opening stock",
                    created_by: user.user_id,
                    idempotency_key: None,
                },
            )
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            product_id = %product_id,
            sku = %fields.sku,
            opening_stock = input.stock_quantity,
            created_by = %user.user_id,
            "Product created"
        );

        self.get_view(product_id).await
    }

    /// Update product attributes
    pub async fn update(&self, product_id: Uuid, input: UpdateProductInput) -> AppResult<ProductView> {
        input.validate()?;
        let fields = ProductFields::clean(
            &input.sku,
            &input.name,
            input.category_id,
            input.supplier_id,
            input.purchase_price,
            input.selling_price,
            input.minimum_stock,
        )?;

        self.ensure_references(fields.category_id, fields.supplier_id).await?;

        let result = sqlx::query(
            r#"
            UPDATE products
            SET sku = $1, name = $2, category_id = $3, supplier_id = $4,
                purchase_price = $5, selling_price = $6,
                minimum_stock = COALESCE($7, minimum_stock),
                updated_at = NOW()
            WHERE id = $8
            "#,
        )
        .bind(&fields.sku)
        .bind(&fields.name)
        .bind(fields.category_id)
        .bind(fields.supplier_id)
        .bind(fields.purchase_price)
        .bind(fields.selling_price)
        .bind(fields.minimum_stock)
        .bind(product_id)
        .execute(&self.db)
        .await
        .map_err(map_duplicate_sku)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }

        tracing::info!(product_id = %product_id, sku = %fields.sku, "Product updated");
        self.get_view(product_id).await
    }

    /// Delete a product that has no ledger entries. Returns its name.
    pub async fn delete(&self, product_id: Uuid) -> AppResult<String> {
        let row = self.row(product_id).await?;

        let entries = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM stock_transactions WHERE product_id = $1",
        )
        .bind(product_id)
        .fetch_one(&self.db)
        .await?;

        if entries > 0 {
            return Err(AppError::Conflict {
                resource: "product".to_string(),
                message: format!(
                    "Product '{}' has {} stock transaction(s) and cannot be deleted",
                    row.sku, entries
                ),
            });
        }

        sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(product_id)
            .execute(&self.db)
            .await?;

        tracing::info!(product_id = %product_id, sku = %row.sku, "Product deleted");
        Ok(row.name)
    }

    /// All products in a category
    pub async fn by_category(&self, category_id: Uuid) -> AppResult<ProductsByCategory> {
        self.ensure_exists("categories", "Category", category_id).await?;

        let products = self
            .fetch_views(&format!("{PRODUCT_SELECT} WHERE p.category_id = $1 ORDER BY p.name"), category_id)
            .await?;

        Ok(ProductsByCategory {
            category_id,
            product_count: products.len(),
            products,
        })
    }

    /// All products delivered by a supplier
    pub async fn by_supplier(&self, supplier_id: Uuid) -> AppResult<ProductsBySupplier> {
        self.ensure_exists("suppliers", "Supplier", supplier_id).await?;

        let products = self
            .fetch_views(&format!("{PRODUCT_SELECT} WHERE p.supplier_id = $1 ORDER BY p.name"), supplier_id)
            .await?;

        Ok(ProductsBySupplier {
            supplier_id,
            product_count: products.len(),
            products,
        })
    }

    /// Case-insensitive search on name or SKU
    pub async fn search(&self, query: &str) -> AppResult<ProductSearchResult> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::invalid("q", "Search query is required"));
        }

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{PRODUCT_SELECT} WHERE p.name ILIKE $1 OR p.sku ILIKE $1 ORDER BY p.name"
        ))
        .bind(contains_pattern(query))
        .fetch_all(&self.db)
        .await?;

        let products: Vec<ProductView> = rows.into_iter().map(ProductView::from).collect();
        Ok(ProductSearchResult {
            query: query.to_string(),
            result_count: products.len(),
            products,
        })
    }

    /// Bring the stock balance to a counted value by writing a correction entry
    pub async fn correct_stock(
        &self,
        user: &AuthUser,
        product_id: Uuid,
        input: StockCorrectionInput,
    ) -> AppResult<StockCorrection> {
        shared::validate_stock_level(input.stock_quantity)
            .map_err(|m| AppError::invalid("stock_quantity", m))?;

        let mut tx = self.db.begin().await?;

        let (sku, current) = sqlx::query_as::<_, (String, i32)>(
            "SELECT sku, stock_quantity FROM products WHERE id = $1 FOR UPDATE",
        )
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let Some((transaction_type, quantity)) = correction_for(current, input.stock_quantity)? else {
            tx.commit().await?;
            return Ok(StockCorrection {
                product_id,
                sku,
                previous_stock: current,
                new_stock: current,
                transaction: None,
            });
        };

        let notes = input
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or("Stock correction");

        let posted = post_entry(
            &mut tx,
            LedgerEntry {
                product_id,
                transaction_type,
                quantity,
                notes,
                created_by: user.user_id,
                idempotency_key: None,
            },
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            product_id = %product_id,
            sku = %sku,
            previous_stock = posted.previous_stock,
            new_stock = posted.new_stock,
            corrected_by = %user.user_id,
            "Stock corrected"
        );

        Ok(StockCorrection {
            product_id,
            sku,
            previous_stock: posted.previous_stock,
            new_stock: posted.new_stock,
            transaction: Some(posted.transaction),
        })
    }

    async fn fetch_views(&self, sql: &str, id: Uuid) -> AppResult<Vec<ProductView>> {
        let rows = sqlx::query_as::<_, ProductRow>(sql)
            .bind(id)
            .fetch_all(&self.db)
            .await?;
        Ok(rows.into_iter().map(ProductView::from).collect())
    }

    async fn ensure_references(&self, category_id: Uuid, supplier_id: Uuid) -> AppResult<()> {
        self.ensure_exists("categories", "Category", category_id).await?;
        self.ensure_exists("suppliers", "Supplier", supplier_id).await
    }

    async fn ensure_exists(&self, table: &str, label: &str, id: Uuid) -> AppResult<()> {
        let exists = sqlx::query_scalar::<_, bool>(&format!(
            "SELECT EXISTS(SELECT 1 FROM {table} WHERE id = $1)"
        ))
        .bind(id)
        .fetch_one(&self.db)
        .await?;

        if exists {
            Ok(())
        } else {
            Err(AppError::NotFound(label.to_string()))
        }
    }
}

fn map_duplicate_sku(err: sqlx::Error) -> AppError {
    match AppError::from(err) {
        AppError::DuplicateEntry(_) => AppError::DuplicateEntry("sku".to_string()),
        other => other,
    }
}
