//! CSV bulk import of categories, suppliers and products
//!
//! Each data row is imported in its own database transaction. A failing row
//! is reported with its line number and the rest of the file still imports.

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::services::product::ProductFields;
use crate::services::stock::{post_entry, LedgerEntry};
use shared::{correction_for, TransactionType};

/// CSV import service
#[derive(Clone)]
pub struct ImportService {
    db: PgPool,
    default_minimum_stock: i32,
}

/// A row that could not be imported
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportError {
    pub line: u64,
    pub message: String,
}

/// Outcome of an import
#[derive(Debug, Default, Serialize)]
pub struct ImportSummary {
    pub created: usize,
    pub updated: usize,
    /// Rows naming a record that already existed unchanged
    pub skipped: usize,
    pub errors: Vec<ImportError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CategoryRecord {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SupplierRecord {
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductRecord {
    pub sku: String,
    pub name: String,
    pub category: String,
    pub supplier: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub purchase_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub selling_price: Decimal,
    pub stock_quantity: i32,
    #[serde(default)]
    pub minimum_stock: Option<i32>,
}

/// Data rows of a CSV file paired with their line numbers
#[derive(Debug)]
pub(crate) struct ParsedCsv<T> {
    pub rows: Vec<(u64, T)>,
    pub errors: Vec<ImportError>,
}

pub(crate) const CATEGORY_COLUMNS: &[&str] = &["name"];
pub(crate) const SUPPLIER_COLUMNS: &[&str] = &["name"];
pub(crate) const PRODUCT_COLUMNS: &[&str] = &[
    "sku",
    "name",
    "category",
    "supplier",
    "purchase_price",
    "selling_price",
    "stock_quantity",
];

/// Parse CSV text with a header row into typed records.
///
/// A missing required column fails the whole file; a malformed row is
/// collected as an error.
pub(crate) fn parse_csv<T: DeserializeOwned>(
    data: &str,
    required_columns: &[&str],
) -> AppResult<ParsedCsv<T>> {
    let data = data.strip_prefix('\u{feff}').unwrap_or(data);
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| AppError::invalid("file", format!("Unreadable CSV header: {}", e)))?
        .clone();

    if headers.is_empty() {
        return Err(AppError::invalid("file", "CSV file is empty"));
    }
    for column in required_columns {
        if !headers.iter().any(|h| h == *column) {
            return Err(AppError::invalid(
                "file",
                format!("Missing required column '{}'", column),
            ));
        }
    }

    let mut parsed = ParsedCsv {
        rows: Vec::new(),
        errors: Vec::new(),
    };

    for result in reader.records() {
        match result {
            Ok(record) => {
                let line = record.position().map(|p| p.line()).unwrap_or_default();
                if record.iter().all(str::is_empty) {
                    continue;
                }
                match record.deserialize::<T>(Some(&headers)) {
                    Ok(row) => parsed.rows.push((line, row)),
                    Err(e) => parsed.errors.push(ImportError {
                        line,
                        message: describe_csv_error(&e),
                    }),
                }
            }
            Err(e) => parsed.errors.push(ImportError {
                line: e.position().map(|p| p.line()).unwrap_or_default(),
                message: describe_csv_error(&e),
            }),
        }
    }

    Ok(parsed)
}

fn describe_csv_error(err: &csv::Error) -> String {
    match err.kind() {
        csv::ErrorKind::Deserialize { err, .. } => match err.field() {
            Some(index) => format!("column {}: {}", index + 1, err.kind()),
            None => err.kind().to_string(),
        },
        csv::ErrorKind::UnequalLengths {
            expected_len, len, ..
        } => format!("expected {} fields, found {}", expected_len, len),
        _ => err.to_string(),
    }
}

/// Row error message, naming the field for validation failures
fn describe(err: &AppError) -> String {
    match err {
        AppError::Validation { field, message } => format!("{}: {}", field, message),
        other => other.to_string(),
    }
}

enum RowOutcome {
    Created,
    Updated,
    Skipped,
}

impl RowOutcome {
    fn created_or_skipped(created: bool) -> Self {
        if created {
            RowOutcome::Created
        } else {
            RowOutcome::Skipped
        }
    }
}

impl ImportSummary {
    fn record(&mut self, line: u64, outcome: AppResult<RowOutcome>) {
        match outcome {
            Ok(RowOutcome::Created) => self.created += 1,
            Ok(RowOutcome::Updated) => self.updated += 1,
            Ok(RowOutcome::Skipped) => self.skipped += 1,
            Err(err) => self.errors.push(ImportError {
                line,
                message: describe(&err),
            }),
        }
    }

    fn finish(mut self, parse_errors: Vec<ImportError>) -> Self {
        self.errors.extend(parse_errors);
        self.errors.sort_by_key(|e| e.line);
        self
    }
}

/// Find a category by name or create it. Returns the id and whether it was created.
async fn get_or_create_category(conn: &mut PgConnection, name: &str) -> AppResult<(Uuid, bool)> {
    shared::validate_name(name, shared::CATEGORY_NAME_MAX_LEN)
        .map_err(|m| AppError::invalid("category", m))?;

    let inserted = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO categories (name) VALUES ($1) ON CONFLICT (name) DO NOTHING RETURNING id",
    )
    .bind(name)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(id) = inserted {
        return Ok((id, true));
    }

    let id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM categories WHERE name = $1")
        .bind(name)
        .fetch_one(&mut *conn)
        .await?;
    Ok((id, false))
}

/// Find a supplier by name or create it with the given contact details
async fn get_or_create_supplier(
    conn: &mut PgConnection,
    name: &str,
    phone: &str,
    address: &str,
) -> AppResult<(Uuid, bool)> {
    shared::validate_name(name, shared::SUPPLIER_NAME_MAX_LEN)
        .map_err(|m| AppError::invalid("supplier", m))?;

    // Supplier names are not unique in the schema; take the oldest match
    let existing = sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM suppliers WHERE name = $1 ORDER BY created_at LIMIT 1",
    )
    .bind(name)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(id) = existing {
        return Ok((id, false));
    }

    if !phone.is_empty() {
        shared::validate_phone(phone).map_err(|m| AppError::invalid("phone", m))?;
    }

    let id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO suppliers (name, phone, address) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(name)
    .bind(phone)
    .bind(address)
    .fetch_one(&mut *conn)
    .await?;
    Ok((id, true))
}

impl ImportService {
    pub fn new(db: PgPool, default_minimum_stock: i32) -> Self {
        Self {
            db,
            default_minimum_stock,
        }
    }

    /// Import categories; existing names are skipped
    pub async fn import_categories(&self, data: &str) -> AppResult<ImportSummary> {
        let parsed = parse_csv::<CategoryRecord>(data, CATEGORY_COLUMNS)?;
        let mut summary = ImportSummary::default();

        for (line, record) in parsed.rows {
            let outcome = self.import_category(&record).await;
            summary.record(line, outcome);
        }

        let summary = summary.finish(parsed.errors);
        tracing::info!(
            created = summary.created,
            skipped = summary.skipped,
            errors = summary.errors.len(),
            "Categories imported"
        );
        Ok(summary)
    }

    /// Import suppliers; existing names are skipped
    pub async fn import_suppliers(&self, data: &str) -> AppResult<ImportSummary> {
        let parsed = parse_csv::<SupplierRecord>(data, SUPPLIER_COLUMNS)?;
        let mut summary = ImportSummary::default();

        for (line, record) in parsed.rows {
            let outcome = self.import_supplier(&record).await;
            summary.record(line, outcome);
        }

        let summary = summary.finish(parsed.errors);
        tracing::info!(
            created = summary.created,
            skipped = summary.skipped,
            errors = summary.errors.len(),
            "Suppliers imported"
        );
        Ok(summary)
    }

    /// Upsert products by SKU. Stock differences are booked as ledger entries.
    pub async fn import_products(&self, user: &AuthUser, data: &str) -> AppResult<ImportSummary> {
        let parsed = parse_csv::<ProductRecord>(data, PRODUCT_COLUMNS)?;
        let mut summary = ImportSummary::default();

        for (line, record) in parsed.rows {
            let outcome = self.import_product(user, &record).await;
            if let Err(err) = &outcome {
                tracing::debug!(line, sku = %record.sku, error = %err, "Product row rejected");
            }
            summary.record(line, outcome);
        }

        let summary = summary.finish(parsed.errors);
        tracing::info!(
            created = summary.created,
            updated = summary.updated,
            errors = summary.errors.len(),
            imported_by = %user.user_id,
            "Products imported"
        );
        Ok(summary)
    }

    async fn import_category(&self, record: &CategoryRecord) -> AppResult<RowOutcome> {
        let mut tx = self.db.begin().await?;
        let (_, created) = get_or_create_category(&mut tx, &record.name).await?;
        tx.commit().await?;
        Ok(RowOutcome::created_or_skipped(created))
    }

    async fn import_supplier(&self, record: &SupplierRecord) -> AppResult<RowOutcome> {
        let mut tx = self.db.begin().await?;
        let (_, created) =
            get_or_create_supplier(&mut tx, &record.name, &record.phone, &record.address).await?;
        tx.commit().await?;
        Ok(RowOutcome::created_or_skipped(created))
    }

    async fn import_product(&self, user: &AuthUser, record: &ProductRecord) -> AppResult<RowOutcome> {
        shared::validate_stock_level(record.stock_quantity)
            .map_err(|m| AppError::invalid("stock_quantity", m))?;

        let mut tx = self.db.begin().await?;

        let (category_id, _) = get_or_create_category(&mut tx, &record.category).await?;
        let (supplier_id, _) = get_or_create_supplier(&mut tx, &record.supplier, "", "").await?;

        let fields = ProductFields::clean(
            &record.sku,
            &record.name,
            category_id,
            supplier_id,
            record.purchase_price,
            record.selling_price,
            record.minimum_stock,
        )?;

        let existing = sqlx::query_as::<_, (Uuid, i32)>(
            "SELECT id, stock_quantity FROM products WHERE sku = $1 FOR UPDATE",
        )
        .bind(&fields.sku)
        .fetch_optional(&mut *tx)
        .await?;

        let outcome = match existing {
            None => {
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
                .bind(category_id)
                .bind(supplier_id)
                .bind(fields.purchase_price)
                .bind(fields.selling_price)
                .bind(fields.minimum_stock.unwrap_or(self.default_minimum_stock))
                .fetch_one(&mut *tx)
                .await?;

                if record.stock_quantity > 0 {
                    post_entry(
                        &mut tx,
                        LedgerEntry {
                            product_id,
                            transaction_type: TransactionType::In,
                            quantity: record.stock_quantity,
                            notes: "Opening stock (CSV import)",
                            created_by: user.user_id,
                            idempotency_key: None,
                        },
                    )
                    .await?;
                }
                RowOutcome::Created
            }
            Some((product_id, current)) => {
                sqlx::query(
                    r#"
                    UPDATE products
                    SET name = $1, category_id = $2, supplier_id = $3,
                        purchase_price = $4, selling_price = $5,
                        minimum_stock = COALESCE($6, minimum_stock),
                        updated_at = NOW()
                    WHERE id = $7
                    "#,
                )
                .bind(&fields.name)
                .bind(category_id)
                .bind(supplier_id)
                .bind(fields.purchase_price)
                .bind(fields.selling_price)
                .bind(fields.minimum_stock)
                .bind(product_id)
                .execute(&mut *tx)
                .await?;

                if let Some((transaction_type, quantity)) =
                    correction_for(current, record.stock_quantity)?
                {
                    post_entry(
                        &mut tx,
                        LedgerEntry {
                            product_id,
                            transaction_type,
                            quantity,
                            notes: "Stock correction (CSV import)",
                            created_by: user.user_id,
                            idempotency_key: None,
                        },
                    )
                    .await?;
                }
                RowOutcome::Updated
            }
        };

        tx.commit().await?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const PRODUCTS: &str = "\
sku,name,category,supplier,purchase_price,selling_price,stock_quantity,minimum_stock
ELK001,Laptop ASUS ROG,Elektronik,PT Sumber Makmur,15000000.00,18000000.00,5,3
ELK002,Mouse Logitech,Elektronik,PT Sumber Makmur,abc,250000.00,40,10
PKN001, Kemeja Flanel ,Pakaian,CV Maju Jaya,85000.00,120000.00,25,
";

    #[test]
    fn test_parse_products_with_line_numbers() {
        let parsed = parse_csv::<ProductRecord>(PRODUCTS, PRODUCT_COLUMNS).unwrap();

        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0].0, 2);
        assert_eq!(parsed.rows[1].0, 4);
        assert_eq!(parsed.errors.len(), 1);
        assert_eq!(parsed.errors[0].line, 3);

        let laptop = &parsed.rows[0].1;
        assert_eq!(laptop.purchase_price, Decimal::from_str("15000000.00").unwrap());
        assert_eq!(laptop.minimum_stock, Some(3));

        let shirt = &parsed.rows[1].1;
        assert_eq!(shirt.name, "Kemeja Flanel");
        assert_eq!(shirt.minimum_stock, None);
    }

    #[test]
    fn test_missing_column_fails_whole_file() {
        let err = parse_csv::<ProductRecord>("sku,name\nA,B\n", PRODUCT_COLUMNS).unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "file"));
    }

    #[test]
    fn test_suppliers_without_optional_columns() {
        let parsed = parse_csv::<SupplierRecord>("name\nCV Maju Jaya\n", SUPPLIER_COLUMNS).unwrap();
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].1.phone, "");
    }

    #[test]
    fn test_byte_order_mark_and_blank_rows_are_ignored() {
        let parsed =
            parse_csv::<CategoryRecord>("\u{feff}name\nElektronik\n\nPakaian\n", CATEGORY_COLUMNS)
                .unwrap();
        let names: Vec<&str> = parsed.rows.iter().map(|(_, r)| r.name.as_str()).collect();
        assert_eq!(names, vec!["Elektronik", "Pakaian"]);
        assert!(parsed.errors.is_empty());
    }

    #[test]
    fn test_summary_orders_errors_by_line() {
        let mut summary = ImportSummary::default();
        summary.record(5, Err(AppError::invalid("sku", "SKU is required")));
        summary.record(2, Ok(RowOutcome::Created));
        let summary = summary.finish(vec![ImportError {
            line: 3,
            message: "column 5: invalid".to_string(),
        }]);

        assert_eq!(summary.created, 1);
        assert_eq!(summary.errors[0].line, 3);
        assert_eq!(summary.errors[1].message, "sku: SKU is required");
    }
}
