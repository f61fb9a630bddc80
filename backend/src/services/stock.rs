//! Stock ledger service
//!
//! `products.stock_quantity` is only ever written here, in the same database
//! transaction that appends the matching `stock_transactions` row. The product
//! row is locked with `SELECT ... FOR UPDATE` first, so concurrent movements on
//! one product are applied one after another.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use shared::{
    apply_movement, reverse_movement, DateRange, PaginatedResponse, Pagination, TransactionType,
};

/// Stock ledger service
#[derive(Clone)]
pub struct StockService {
    db: PgPool,
}

/// Product reference embedded in a ledger entry
#[derive(Debug, Clone, Serialize)]
pub struct TransactionProduct {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
}

/// A ledger entry as returned by the API
#[derive(Debug, Clone, Serialize)]
pub struct StockTransaction {
    pub id: Uuid,
    pub product: TransactionProduct,
    pub transaction_type: TransactionType,
    pub type_display: &'static str,
    pub quantity: i32,
    pub notes: String,
    pub created_by: Uuid,
    pub created_by_username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Row for ledger entry queries
#[derive(Debug, FromRow)]
pub(crate) struct TransactionRow {
    id: Uuid,
    product_id: Uuid,
    product_sku: String,
    product_name: String,
    transaction_type: String,
    quantity: i32,
    notes: String,
    created_by: Uuid,
    created_by_username: String,
    idempotency_key: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for StockTransaction {
    type Error = AppError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        let transaction_type: TransactionType = row.transaction_type.parse().map_err(|_| {
            AppError::Internal(format!(
                "Stored transaction {} has unknown type '{}'",
                row.id, row.transaction_type
            ))
        })?;

        Ok(Self {
            id: row.id,
            product: TransactionProduct {
                id: row.product_id,
                sku: row.product_sku,
                name: row.product_name,
            },
            transaction_type,
            type_display: transaction_type.display_name(),
            quantity: row.quantity,
            notes: row.notes,
            created_by: row.created_by,
            created_by_username: row.created_by_username,
            idempotency_key: row.idempotency_key,
            created_at: row.created_at,
        })
    }
}

pub(crate) const TRANSACTION_SELECT: &str = r#"
    SELECT t.id, t.product_id, p.sku AS product_sku, p.name AS product_name,
           t.transaction_type, t.quantity, t.notes, t.created_by,
           u.username AS created_by_username, t.idempotency_key, t.created_at
    FROM stock_transactions t
    JOIN products p ON p.id = t.product_id
    JOIN users u ON u.id = t.created_by
"#;

pub(crate) fn into_transactions(rows: Vec<TransactionRow>) -> AppResult<Vec<StockTransaction>> {
    rows.into_iter().map(StockTransaction::try_from).collect()
}

/// Input for recording a stock movement
#[derive(Debug, Deserialize, Validate)]
pub struct RecordTransactionInput {
    pub product_id: Uuid,
    pub transaction_type: TransactionType,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
    pub notes: Option<String>,
    /// Retrying with the same key returns the original entry
    #[validate(length(min = 1, max = 100, message = "Idempotency key must be 1-100 characters"))]
    pub idempotency_key: Option<String>,
}

/// Ledger entry to append
#[derive(Debug)]
pub(crate) struct LedgerEntry<'a> {
    pub product_id: Uuid,
    pub transaction_type: TransactionType,
    pub quantity: i32,
    pub notes: &'a str,
    pub created_by: Uuid,
    pub idempotency_key: Option<&'a str>,
}

/// Outcome of appending a ledger entry
#[derive(Debug)]
pub(crate) struct PostedEntry {
    pub transaction: StockTransaction,
    pub previous_stock: i32,
    pub new_stock: i32,
    /// True when an idempotency key matched an existing entry
    pub replayed: bool,
}

/// Filters for listing ledger entries
#[derive(Debug, Default, Deserialize)]
pub struct TransactionFilter {
    pub product_id: Option<Uuid>,
    pub transaction_type: Option<TransactionType>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl TransactionFilter {
    pub fn date_range(&self) -> AppResult<DateRange> {
        DateRange::new(self.start_date, self.end_date).map_err(|m| AppError::invalid("start_date", m))
    }
}

/// IN/OUT totals over a set of ledger entries
#[derive(Debug, Clone, Default, Serialize, FromRow)]
pub struct MovementTotals {
    pub total_transactions: i64,
    pub total_in: i64,
    pub total_out: i64,
}

/// Product summary in a history response
#[derive(Debug, Serialize, FromRow)]
pub struct HistoryProduct {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub current_stock: i32,
}

/// Full ledger of a single product
#[derive(Debug, Serialize)]
pub struct ProductHistory {
    pub product: HistoryProduct,
    pub stats: MovementTotals,
    pub transactions: Vec<StockTransaction>,
}

/// A product whose balance disagrees with its ledger
#[derive(Debug, Serialize, FromRow)]
pub struct ReconciliationIssue {
    pub product_id: Uuid,
    pub sku: String,
    pub name: String,
    pub stock_quantity: i32,
    pub ledger_balance: i64,
}

/// Reconciliation result
#[derive(Debug, Serialize)]
pub struct ReconciliationReport {
    pub checked_products: i64,
    pub balanced: bool,
    pub discrepancies: Vec<ReconciliationDiscrepancy>,
}

#[derive(Debug, Serialize)]
pub struct ReconciliationDiscrepancy {
    #[serde(flatten)]
    pub issue: ReconciliationIssue,
    /// stock_quantity - ledger_balance
    pub difference: i64,
}

/// Response after deleting a ledger entry
#[derive(Debug, Serialize)]
pub struct DeletedTransaction {
    pub transaction: StockTransaction,
    pub previous_stock: i32,
    pub new_stock: i32,
}

/// Totals SQL fragment shared by history and reports
pub(crate) const TOTALS_COLUMNS: &str = r#"
    COUNT(*) AS total_transactions,
    COALESCE(SUM(quantity) FILTER (WHERE transaction_type = 'IN'), 0)::BIGINT AS total_in,
    COALESCE(SUM(quantity) FILTER (WHERE transaction_type = 'OUT'), 0)::BIGINT AS total_out
"#;

/// A reused idempotency key replays only the movement it was first used for
fn replay_or_conflict(existing: &StockTransaction, entry: &LedgerEntry<'_>) -> AppResult<()> {
    if existing.product.id != entry.product_id
        || existing.transaction_type != entry.transaction_type
        || existing.quantity != entry.quantity
    {
        return Err(AppError::Conflict {
            resource: "idempotency_key".to_string(),
            message: "Idempotency key was already used for a different movement".to_string(),
        });
    }
    Ok(())
}

/// Balance once a deleted entry's effect is undone
fn stock_after_removal(current: i32, removed: &StockTransaction) -> AppResult<i32> {
    Ok(reverse_movement(current, removed.transaction_type, removed.quantity)?)
}

/// Append a ledger entry and move the product balance with it.
///
/// Must run inside a database transaction; the caller commits.
pub(crate) async fn post_entry(
    conn: &mut PgConnection,
    entry: LedgerEntry<'_>,
) -> AppResult<PostedEntry> {
    let current = sqlx::query_scalar::<_, i32>(
        "SELECT stock_quantity FROM products WHERE id = $1 FOR UPDATE",
    )
    .bind(entry.product_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

    // Checked after the lock so a concurrent retry sees the committed original
    if let Some(key) = entry.idempotency_key {
        let existing = sqlx::query_as::<_, TransactionRow>(&format!(
            "{TRANSACTION_SELECT} WHERE t.idempotency_key = $1"
        ))
        .bind(key)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(row) = existing {
            let transaction = StockTransaction::try_from(row)?;
            replay_or_conflict(&transaction, &entry)?;
            return Ok(PostedEntry {
                transaction,
                previous_stock: current,
                new_stock: current,
                replayed: true,
            });
        }
    }

    let new_stock = apply_movement(current, entry.transaction_type, entry.quantity)?;

    sqlx::query("UPDATE products SET stock_quantity = $1, updated_at = NOW() WHERE id = $2")
        .bind(new_stock)
        .bind(entry.product_id)
        .execute(&mut *conn)
        .await?;

    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO stock_transactions
            (product_id, transaction_type, quantity, notes, created_by, idempotency_key)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(entry.product_id)
    .bind(entry.transaction_type.as_str())
    .bind(entry.quantity)
    .bind(entry.notes)
    .bind(entry.created_by)
    .bind(entry.idempotency_key)
    .fetch_one(&mut *conn)
    .await?;

    let row = sqlx::query_as::<_, TransactionRow>(&format!("{TRANSACTION_SELECT} WHERE t.id = $1"))
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;

    tracing::info!(
        transaction_id = %id,
        product_id = %entry.product_id,
        transaction_type = %entry.transaction_type,
        quantity = entry.quantity,
        previous_stock = current,
        new_stock,
        "Stock movement recorded"
    );

    Ok(PostedEntry {
        transaction: StockTransaction::try_from(row)?,
        previous_stock: current,
        new_stock,
        replayed: false,
    })
}

impl StockService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a stock movement
    pub async fn record_transaction(
        &self,
        user: &AuthUser,
        input: RecordTransactionInput,
    ) -> AppResult<(StockTransaction, bool)> {
        input.validate()?;

        let notes = input.notes.as_deref().map(str::trim).unwrap_or_default();

        let mut tx = self.db.begin().await?;
        let posted = post_entry(
            &mut tx,
            LedgerEntry {
                product_id: input.product_id,
                transaction_type: input.transaction_type,
                quantity: input.quantity,
                notes,
                created_by: user.user_id,
                idempotency_key: input.idempotency_key.as_deref(),
            },
        )
        .await?;
        tx.commit().await?;

        if posted.replayed {
            tracing::debug!(transaction_id = %posted.transaction.id, "Idempotent replay");
        }

        Ok((posted.transaction, posted.replayed))
    }

    /// List ledger entries, newest first
    pub async fn list_transactions(
        &self,
        filter: &TransactionFilter,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<StockTransaction>> {
        let range = filter.date_range()?;
        let transaction_type = filter.transaction_type.map(|t| t.as_str());

        const WHERE: &str = r#"
            WHERE ($1::uuid IS NULL OR t.product_id = $1)
              AND ($2::varchar IS NULL OR t.transaction_type = $2)
              AND ($3::date IS NULL OR t.created_at::date >= $3)
              AND ($4::date IS NULL OR t.created_at::date <= $4)
        "#;

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM stock_transactions t {WHERE}"
        ))
        .bind(filter.product_id)
        .bind(transaction_type)
        .bind(range.start)
        .bind(range.end)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            "{TRANSACTION_SELECT} {WHERE} ORDER BY t.created_at DESC, t.id DESC LIMIT $5 OFFSET $6"
        ))
        .bind(filter.product_id)
        .bind(transaction_type)
        .bind(range.start)
        .bind(range.end)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse::new(
            into_transactions(rows)?,
            pagination,
            total.max(0) as u64,
        ))
    }

    /// Get a single ledger entry
    pub async fn get_transaction(&self, transaction_id: Uuid) -> AppResult<StockTransaction> {
        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            "{TRANSACTION_SELECT} WHERE t.id = $1"
        ))
        .bind(transaction_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock transaction".to_string()))?;

        StockTransaction::try_from(row)
    }

    /// Most recent entries of one product
    pub async fn recent_for_product(
        &self,
        product_id: Uuid,
        limit: i64,
    ) -> AppResult<Vec<StockTransaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            "{TRANSACTION_SELECT} WHERE t.product_id = $1 ORDER BY t.created_at DESC, t.id DESC LIMIT $2"
        ))
        .bind(product_id)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        into_transactions(rows)
    }

    /// Complete ledger of a product with IN/OUT totals
    pub async fn product_history(&self, product_id: Uuid) -> AppResult<ProductHistory> {
        let product = sqlx::query_as::<_, HistoryProduct>(
            "SELECT id, sku, name, stock_quantity AS current_stock FROM products WHERE id = $1",
        )
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let stats = sqlx::query_as::<_, MovementTotals>(&format!(
            "SELECT {TOTALS_COLUMNS} FROM stock_transactions WHERE product_id = $1"
        ))
        .bind(product_id)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            "{TRANSACTION_SELECT} WHERE t.product_id = $1 ORDER BY t.created_at DESC, t.id DESC"
        ))
        .bind(product_id)
        .fetch_all(&self.db)
        .await?;

        Ok(ProductHistory {
            product,
            stats,
            transactions: into_transactions(rows)?,
        })
    }

    /// Delete a ledger entry for audit correction and undo its stock effect.
    /// Superusers only.
    pub async fn delete_transaction(
        &self,
        user: &AuthUser,
        transaction_id: Uuid,
    ) -> AppResult<DeletedTransaction> {
        user.require_superuser()?;

        let mut tx = self.db.begin().await?;

        let product_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT product_id FROM stock_transactions WHERE id = $1",
        )
        .bind(transaction_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock transaction".to_string()))?;

        // Same lock order as post_entry: product row first
        let current = sqlx::query_scalar::<_, i32>(
            "SELECT stock_quantity FROM products WHERE id = $1 FOR UPDATE",
        )
        .bind(product_id)
        .fetch_one(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            "{TRANSACTION_SELECT} WHERE t.id = $1 FOR UPDATE OF t"
        ))
        .bind(transaction_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock transaction".to_string()))?;
        let transaction = StockTransaction::try_from(row)?;

        let new_stock = stock_after_removal(current, &transaction)?;

        sqlx::query("UPDATE products SET stock_quantity = $1, updated_at = NOW() WHERE id = $2")
            .bind(new_stock)
            .bind(product_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM stock_transactions WHERE id = $1")
            .bind(transaction_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::warn!(
            transaction_id = %transaction_id,
            product_id = %product_id,
            deleted_by = %user.user_id,
            previous_stock = current,
            new_stock,
            "Stock transaction deleted and reversed"
        );

        Ok(DeletedTransaction {
            transaction,
            previous_stock: current,
            new_stock,
        })
    }

    /// Compare every product balance with the sum of its ledger
    pub async fn reconcile(&self) -> AppResult<ReconciliationReport> {
        let checked_products = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
            .fetch_one(&self.db)
            .await?;

        let issues = sqlx::query_as::<_, ReconciliationIssue>(
            r#"
            SELECT p.id AS product_id, p.sku, p.name, p.stock_quantity,
                   COALESCE(SUM(CASE WHEN t.transaction_type = 'IN' THEN t.quantity
                                     ELSE -t.quantity END), 0)::BIGINT AS ledger_balance
            FROM products p
            LEFT JOIN stock_transactions t ON t.product_id = p.id
            GROUP BY p.id, p.sku, p.name, p.stock_quantity
            HAVING p.stock_quantity <> COALESCE(SUM(CASE WHEN t.transaction_type = 'IN' THEN t.quantity
                                                         ELSE -t.quantity END), 0)
            ORDER BY p.sku
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        if !issues.is_empty() {
            tracing::warn!(count = issues.len(), "Ledger reconciliation found discrepancies");
        }

        let discrepancies: Vec<ReconciliationDiscrepancy> = issues
            .into_iter()
            .map(|issue| ReconciliationDiscrepancy {
                difference: issue.stock_quantity as i64 - issue.ledger_balance,
                issue,
            })
            .collect();

        Ok(ReconciliationReport {
            checked_products,
            balanced: discrepancies.is_empty(),
            discrepancies,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(transaction_type: &str) -> TransactionRow {
        TransactionRow {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            product_sku: "ELK001".to_string(),
            product_name: "Laptop ASUS ROG".to_string(),
            transaction_type: transaction_type.to_string(),
            quantity: 3,
            notes: String::new(),
            created_by: Uuid::new_v4(),
            created_by_username: "admin".to_string(),
            idempotency_key: None,
            created_at: Utc::now(),
        }
    }

    fn recorded(transaction_type: &str, quantity: i32) -> StockTransaction {
        StockTransaction::try_from(TransactionRow {
            quantity,
            idempotency_key: Some("pos-0042".to_string()),
            ..row(transaction_type)
        })
        .unwrap()
    }

    fn entry_like(tx: &StockTransaction) -> LedgerEntry<'static> {
        LedgerEntry {
            product_id: tx.product.id,
            transaction_type: tx.transaction_type,
            quantity: tx.quantity,
            notes: "",
            created_by: Uuid::new_v4(),
            idempotency_key: Some("pos-0042"),
        }
    }

    fn is_key_conflict(result: AppResult<()>) -> bool {
        matches!(result, Err(AppError::Conflict { ref resource, .. }) if resource == "idempotency_key")
    }

    #[test]
    fn test_same_movement_with_reused_key_is_replayed() {
        let original = recorded("OUT", 3);
        let retry = LedgerEntry {
            notes: "retried by the till",
            ..entry_like(&original)
        };
        assert!(replay_or_conflict(&original, &retry).is_ok());
    }

    #[test]
    fn test_reused_key_for_another_product_conflicts() {
        let original = recorded("OUT", 3);
        let entry = LedgerEntry {
            product_id: Uuid::new_v4(),
            ..entry_like(&original)
        };
        assert!(is_key_conflict(replay_or_conflict(&original, &entry)));
    }

    #[test]
    fn test_reused_key_for_another_direction_conflicts() {
        let original = recorded("OUT", 3);
        let entry = LedgerEntry {
            transaction_type: TransactionType::In,
            ..entry_like(&original)
        };
        assert!(is_key_conflict(replay_or_conflict(&original, &entry)));
    }

    #[test]
    fn test_reused_key_for_another_quantity_conflicts() {
        let original = recorded("OUT", 3);
        let entry = LedgerEntry {
            quantity: 4,
            ..entry_like(&original)
        };
        assert!(is_key_conflict(replay_or_conflict(&original, &entry)));
    }

    #[test]
    fn test_removing_an_out_entry_returns_the_stock() {
        assert_eq!(stock_after_removal(5, &recorded("OUT", 3)).unwrap(), 8);
    }

    #[test]
    fn test_removing_an_in_entry_takes_the_stock_back() {
        assert_eq!(stock_after_removal(10, &recorded("IN", 3)).unwrap(), 7);
    }

    #[test]
    fn test_removing_an_already_shipped_receipt_is_rejected() {
        assert!(matches!(
            stock_after_removal(2, &recorded("IN", 3)),
            Err(AppError::Ledger(shared::LedgerError::InsufficientStock {
                available: 2,
                requested: 3
            }))
        ));
    }

    #[test]
    fn test_row_conversion_sets_display_name() {
        let tx = StockTransaction::try_from(row("OUT")).unwrap();
        assert_eq!(tx.transaction_type, TransactionType::Out);
        assert_eq!(tx.type_display, "Stock Out");
    }

    #[test]
    fn test_row_with_unknown_type_is_an_internal_error() {
        assert!(matches!(
            StockTransaction::try_from(row("ADJ")),
            Err(AppError::Internal(_))
        ));
    }

    #[test]
    fn test_record_input_validation() {
        let input = RecordTransactionInput {
            product_id: Uuid::new_v4(),
            transaction_type: TransactionType::In,
            quantity: 0,
            notes: None,
            idempotency_key: None,
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_inverted_date_filter_is_rejected() {
        let filter = TransactionFilter {
            start_date: NaiveDate::from_ymd_opt(2024, 6, 2),
            end_date: NaiveDate::from_ymd_opt(2024, 6, 1),
            ..Default::default()
        };
        assert!(filter.date_range().is_err());
    }
}
