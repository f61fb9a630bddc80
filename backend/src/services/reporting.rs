//! Reporting service for inventory analytics and data export
//! Provides stock statistics, valuation, ledger summaries and CSV reports

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::product::{ProductRow, ProductView, PRODUCT_SELECT};
use crate::services::stock::{
    into_transactions, MovementTotals, StockTransaction, TransactionRow, TOTALS_COLUMNS,
    TRANSACTION_SELECT,
};
use shared::{restock_quantity, shortage, DateRange, PaginatedResponse, Pagination, ProductMetrics};

pub const DEFAULT_MOVEMENT_DAYS: u32 = 7;
pub const MAX_MOVEMENT_DAYS: u32 = 90;

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    db: PgPool,
    max_page_size: u32,
}

/// Inventory overview figures
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct InventoryOverview {
    pub total_products: i64,
    pub total_stock_value: Decimal,
    pub low_stock_count: i64,
    pub total_items_in_stock: i64,
}

/// Average prices
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct PriceStats {
    pub avg_purchase_price: Option<Decimal>,
    pub avg_selling_price: Option<Decimal>,
}

/// Stock level extremes
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct StockStats {
    pub max_stock: Option<i32>,
    pub min_stock: Option<i32>,
}

#[derive(Debug, sqlx::FromRow)]
struct HighlightRow {
    id: Uuid,
    sku: String,
    name: String,
    stock_quantity: i32,
    minimum_stock: i32,
    purchase_price: Decimal,
    selling_price: Decimal,
}

/// Compact product entry used in rankings
#[derive(Debug, Serialize)]
pub struct ProductHighlight {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub stock_quantity: i32,
    pub purchase_price: Decimal,
    pub selling_price: Decimal,
    #[serde(flatten)]
    pub metrics: ProductMetrics,
}

impl From<HighlightRow> for ProductHighlight {
    fn from(row: HighlightRow) -> Self {
        Self {
            metrics: ProductMetrics::compute(
                row.stock_quantity,
                row.minimum_stock,
                row.purchase_price,
                row.selling_price,
            ),
            id: row.id,
            sku: row.sku,
            name: row.name,
            stock_quantity: row.stock_quantity,
            purchase_price: row.purchase_price,
            selling_price: row.selling_price,
        }
    }
}

/// Category or supplier ranked by product count
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct GroupStock {
    pub id: Uuid,
    pub name: String,
    pub product_count: i64,
    pub total_stock: i64,
}

/// Stock valuation of a category or supplier
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct GroupValue {
    pub id: Uuid,
    pub name: String,
    pub product_count: i64,
    pub total_stock: i64,
    pub total_value: Decimal,
}

/// Inventory statistics
#[derive(Debug, Serialize)]
pub struct InventoryStats {
    pub overview: InventoryOverview,
    pub price_stats: PriceStats,
    pub stock_stats: StockStats,
    pub most_expensive: Option<ProductHighlight>,
    pub cheapest: Option<ProductHighlight>,
    pub highest_stock: Option<ProductHighlight>,
    pub lowest_stock: Option<ProductHighlight>,
    pub top_categories: Vec<GroupStock>,
    pub top_suppliers: Vec<GroupStock>,
}

/// Low stock product with the quantity needed to get back above minimum
#[derive(Debug, Serialize)]
pub struct LowStockItem {
    #[serde(flatten)]
    pub product: ProductView,
    pub shortage: i32,
    pub restock_quantity: i32,
}

impl From<ProductRow> for LowStockItem {
    fn from(row: ProductRow) -> Self {
        let shortage = shortage(row.stock_quantity, row.minimum_stock);
        let restock_quantity = restock_quantity(row.stock_quantity, row.minimum_stock);
        Self {
            product: row.into(),
            shortage,
            restock_quantity,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LowStockReport {
    pub count: usize,
    pub products: Vec<LowStockItem>,
}

/// Valuation grouped by category and by supplier
#[derive(Debug, Serialize)]
pub struct StockValueReport {
    pub total_value: Decimal,
    pub by_category: Vec<GroupValue>,
    pub by_supplier: Vec<GroupValue>,
}

/// Flat stock report row, also the CSV record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StockReportRow {
    pub sku: String,
    pub name: String,
    pub category: String,
    pub supplier: String,
    pub stock_quantity: i32,
    pub minimum_stock: i32,
    pub purchase_price: Decimal,
    pub selling_price: Decimal,
    pub stock_value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockReportSummary {
    pub total_items: i64,
    pub total_value: Decimal,
}

#[derive(Debug, Serialize)]
pub struct StockReport {
    pub category_id: Option<Uuid>,
    pub summary: StockReportSummary,
    pub products: Vec<StockReportRow>,
}

/// Query parameters for the stock report
#[derive(Debug, Default, Deserialize)]
pub struct StockReportQuery {
    pub category_id: Option<Uuid>,
    pub format: Option<ReportFormat>,
}

/// Output format of exportable reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Json,
    Csv,
}

/// Ledger totals with net movement
#[derive(Debug, Serialize)]
pub struct TransactionOverview {
    #[serde(flatten)]
    pub totals: MovementTotals,
    pub net_movement: i64,
}

impl From<MovementTotals> for TransactionOverview {
    fn from(totals: MovementTotals) -> Self {
        let net_movement = totals.total_in - totals.total_out;
        Self {
            totals,
            net_movement,
        }
    }
}

/// Transactions recorded per user
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct UserActivity {
    pub user_id: Uuid,
    pub username: String,
    pub transaction_count: i64,
}

#[derive(Debug, Serialize)]
pub struct TransactionStats {
    pub overview: TransactionOverview,
    pub recent_transactions: Vec<StockTransaction>,
    pub top_users: Vec<UserActivity>,
}

/// Flat ledger report row, also the CSV record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TransactionReportRow {
    pub created_at: DateTime<Utc>,
    pub sku: String,
    pub product_name: String,
    pub transaction_type: String,
    pub quantity: i32,
    pub notes: String,
    pub username: String,
}

/// Query parameters for the transaction report
#[derive(Debug, Default, Deserialize)]
pub struct TransactionReportQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub format: Option<ReportFormat>,
}

#[derive(Debug, Serialize)]
pub struct TransactionReport {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub summary: MovementTotals,
    pub transactions: PaginatedResponse<TransactionReportRow>,
}

/// One day of ledger activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct DailyMovement {
    pub date: NaiveDate,
    pub stock_in: i64,
    pub stock_out: i64,
    pub count: i64,
}

/// Row counts of the main tables
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct TableCounts {
    pub products: i64,
    pub categories: i64,
    pub suppliers: i64,
    pub transactions: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct DashboardPriceStats {
    pub avg_purchase_price: Option<Decimal>,
    pub avg_selling_price: Option<Decimal>,
    pub min_selling_price: Option<Decimal>,
    pub max_selling_price: Option<Decimal>,
}

/// Everything the dashboard page shows
#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub counts: TableCounts,
    pub total_stock_value: Decimal,
    pub low_stock_count: i64,
    pub top_by_stock: Vec<ProductHighlight>,
    pub top_by_value: Vec<ProductHighlight>,
    pub top_by_margin: Vec<ProductHighlight>,
    pub low_stock_products: Vec<LowStockItem>,
    pub category_stats: Vec<GroupValue>,
    pub supplier_stats: Vec<GroupValue>,
    pub transaction_totals: TransactionOverview,
    pub recent_transactions: Vec<StockTransaction>,
    pub daily_movements: Vec<DailyMovement>,
    pub price_stats: DashboardPriceStats,
}

const HIGHLIGHT_SELECT: &str = r#"
    SELECT id, sku, name, stock_quantity, minimum_stock, purchase_price, selling_price
    FROM products
"#;

const TRANSACTION_REPORT_SELECT: &str = r#"
    SELECT t.created_at, p.sku, p.name AS product_name, t.transaction_type,
           t.quantity, t.notes, u.username
    FROM stock_transactions t
    JOIN products p ON p.id = t.product_id
    JOIN users u ON u.id = t.created_by
    WHERE ($1::date IS NULL OR t.created_at::date >= $1)
      AND ($2::date IS NULL OR t.created_at::date <= $2)
    ORDER BY t.created_at DESC, t.id DESC
"#;

/// Grouping used by the per-category and per-supplier aggregates
#[derive(Debug, Clone, Copy)]
enum Grouping {
    Category,
    Supplier,
}

impl Grouping {
    fn table_and_key(self) -> (&'static str, &'static str) {
        match self {
            Grouping::Category => ("categories", "category_id"),
            Grouping::Supplier => ("suppliers", "supplier_id"),
        }
    }
}

/// Sum stock and value over report rows
pub fn summarize_stock(rows: &[StockReportRow]) -> StockReportSummary {
    rows.iter().fold(
        StockReportSummary {
            total_items: 0,
            total_value: Decimal::ZERO,
        },
        |mut acc, row| {
            acc.total_items += row.stock_quantity as i64;
            acc.total_value += row.stock_value;
            acc
        },
    )
}

/// First day of a `days`-long window ending today
pub fn movement_window_start(today: NaiveDate, days: u32) -> NaiveDate {
    today - Duration::days(days.saturating_sub(1) as i64)
}

/// Daily series from `start` through `today`, oldest first, with missing days as zeros
pub fn fill_daily_series(
    start: NaiveDate,
    today: NaiveDate,
    rows: Vec<DailyMovement>,
) -> Vec<DailyMovement> {
    let by_date: HashMap<NaiveDate, DailyMovement> =
        rows.into_iter().map(|row| (row.date, row)).collect();

    start
        .iter_days()
        .take_while(|date| *date <= today)
        .map(|date| {
            by_date.get(&date).cloned().unwrap_or(DailyMovement {
                date,
                stock_in: 0,
                stock_out: 0,
                count: 0,
            })
        })
        .collect()
}

/// Validate the `days` parameter of the daily movement report
pub fn movement_days(days: Option<u32>) -> AppResult<u32> {
    let days = days.unwrap_or(DEFAULT_MOVEMENT_DAYS);
    if (1..=MAX_MOVEMENT_DAYS).contains(&days) {
        Ok(days)
    } else {
        Err(AppError::invalid(
            "days",
            "days must be between 1 and 90",
        ))
    }
}

impl ReportingService {
    pub fn new(db: PgPool, max_page_size: u32) -> Self {
        Self { db, max_page_size }
    }

    /// Overall inventory statistics
    pub async fn inventory_stats(&self) -> AppResult<InventoryStats> {
        let overview = self.overview().await?;

        let price_stats = sqlx::query_as::<_, PriceStats>(
            r#"
            SELECT ROUND(AVG(purchase_price), 2) AS avg_purchase_price,
                   ROUND(AVG(selling_price), 2) AS avg_selling_price
            FROM products
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        let stock_stats = sqlx::query_as::<_, StockStats>(
            "SELECT MAX(stock_quantity) AS max_stock, MIN(stock_quantity) AS min_stock FROM products",
        )
        .fetch_one(&self.db)
        .await?;

        Ok(InventoryStats {
            overview,
            price_stats,
            stock_stats,
            most_expensive: self.first_highlight("selling_price DESC").await?,
            cheapest: self.first_highlight("selling_price ASC").await?,
            highest_stock: self.first_highlight("stock_quantity DESC").await?,
            lowest_stock: self.first_highlight("stock_quantity ASC").await?,
            top_categories: self.top_groups(Grouping::Category, 5).await?,
            top_suppliers: self.top_groups(Grouping::Supplier, 5).await?,
        })
    }

    async fn overview(&self) -> AppResult<InventoryOverview> {
        let overview = sqlx::query_as::<_, InventoryOverview>(
            r#"
            SELECT COUNT(*) AS total_products,
                   COALESCE(SUM(stock_quantity * purchase_price), 0) AS total_stock_value,
                   COUNT(*) FILTER (WHERE stock_quantity <= minimum_stock) AS low_stock_count,
                   COALESCE(SUM(stock_quantity), 0)::BIGINT AS total_items_in_stock
            FROM products
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        Ok(overview)
    }

    /// `order_by` is always one of the literals in this module
    async fn highlights(&self, order_by: &str, limit: i64) -> AppResult<Vec<ProductHighlight>> {
        let rows = sqlx::query_as::<_, HighlightRow>(&format!(
            "{HIGHLIGHT_SELECT} ORDER BY {order_by}, name LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(ProductHighlight::from).collect())
    }

    async fn first_highlight(&self, order_by: &str) -> AppResult<Option<ProductHighlight>> {
        Ok(self.highlights(order_by, 1).await?.into_iter().next())
    }

    async fn top_groups(&self, grouping: Grouping, limit: i64) -> AppResult<Vec<GroupStock>> {
        let (table, key) = grouping.table_and_key();
        let groups = sqlx::query_as::<_, GroupStock>(&format!(
            r#"
            SELECT g.id, g.name, COUNT(p.id) AS product_count,
                   COALESCE(SUM(p.stock_quantity), 0)::BIGINT AS total_stock
            FROM {table} g
            LEFT JOIN products p ON p.{key} = g.id
            GROUP BY g.id, g.name
            ORDER BY product_count DESC, g.name
            LIMIT $1
            "#
        ))
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(groups)
    }

    async fn group_values(&self, grouping: Grouping) -> AppResult<Vec<GroupValue>> {
        let (table, key) = grouping.table_and_key();
        let groups = sqlx::query_as::<_, GroupValue>(&format!(
            r#"
            SELECT g.id, g.name, COUNT(p.id) AS product_count,
                   COALESCE(SUM(p.stock_quantity), 0)::BIGINT AS total_stock,
                   COALESCE(SUM(p.stock_quantity * p.purchase_price), 0) AS total_value
            FROM {table} g
            LEFT JOIN products p ON p.{key} = g.id
            GROUP BY g.id, g.name
            ORDER BY total_value DESC, g.name
            "#
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(groups)
    }

    /// Products at or below their minimum stock, lowest stock first
    pub async fn low_stock(&self) -> AppResult<LowStockReport> {
        let products = self.low_stock_items(None).await?;
        Ok(LowStockReport {
            count: products.len(),
            products,
        })
    }

    async fn low_stock_items(&self, limit: Option<i64>) -> AppResult<Vec<LowStockItem>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            {PRODUCT_SELECT}
            WHERE p.stock_quantity <= p.minimum_stock
            ORDER BY p.stock_quantity, p.name
            LIMIT $1
            "#
        ))
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(LowStockItem::from).collect())
    }

    /// Stock value per category and per supplier
    pub async fn stock_value(&self) -> AppResult<StockValueReport> {
        let by_category = self.group_values(Grouping::Category).await?;
        let by_supplier = self.group_values(Grouping::Supplier).await?;
        let total_value = by_category.iter().map(|g| g.total_value).sum();

        Ok(StockValueReport {
            total_value,
            by_category,
            by_supplier,
        })
    }

    /// Product stock listing with valuation, optionally for one category
    pub async fn stock_report(&self, category_id: Option<Uuid>) -> AppResult<StockReport> {
        let products = sqlx::query_as::<_, StockReportRow>(
            r#"
            SELECT p.sku, p.name, c.name AS category, s.name AS supplier,
                   p.stock_quantity, p.minimum_stock, p.purchase_price, p.selling_price,
                   p.stock_quantity * p.purchase_price AS stock_value
            FROM products p
            JOIN categories c ON c.id = p.category_id
            JOIN suppliers s ON s.id = p.supplier_id
            WHERE ($1::uuid IS NULL OR p.category_id = $1)
            ORDER BY c.name, p.name
            "#,
        )
        .bind(category_id)
        .fetch_all(&self.db)
        .await?;

        Ok(StockReport {
            category_id,
            summary: summarize_stock(&products),
            products,
        })
    }

    /// Ledger totals, recent activity and most active users
    pub async fn transaction_stats(&self) -> AppResult<TransactionStats> {
        let totals = self.movement_totals(&DateRange::default()).await?;

        let recent_transactions = self.recent_transactions(20).await?;

        let top_users = sqlx::query_as::<_, UserActivity>(
            r#"
            SELECT u.id AS user_id, u.username, COUNT(t.id) AS transaction_count
            FROM stock_transactions t
            JOIN users u ON u.id = t.created_by
            GROUP BY u.id, u.username
            ORDER BY transaction_count DESC, u.username
            LIMIT 10
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(TransactionStats {
            overview: totals.into(),
            recent_transactions,
            top_users,
        })
    }

    async fn movement_totals(&self, range: &DateRange) -> AppResult<MovementTotals> {
        let totals = sqlx::query_as::<_, MovementTotals>(&format!(
            r#"
            SELECT {TOTALS_COLUMNS}
            FROM stock_transactions
            WHERE ($1::date IS NULL OR created_at::date >= $1)
              AND ($2::date IS NULL OR created_at::date <= $2)
            "#
        ))
        .bind(range.start)
        .bind(range.end)
        .fetch_one(&self.db)
        .await?;

        Ok(totals)
    }

    async fn recent_transactions(&self, limit: i64) -> AppResult<Vec<StockTransaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            "{TRANSACTION_SELECT} ORDER BY t.created_at DESC, t.id DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        into_transactions(rows)
    }

    /// Ledger report over a date range, one page at a time
    pub async fn transaction_report(
        &self,
        query: &TransactionReportQuery,
    ) -> AppResult<TransactionReport> {
        let range = Self::report_range(query)?;
        let pagination = Pagination::from_query(query.page, query.per_page, self.max_page_size);

        let summary = self.movement_totals(&range).await?;

        let rows = sqlx::query_as::<_, TransactionReportRow>(&format!(
            "{TRANSACTION_REPORT_SELECT} LIMIT $3 OFFSET $4"
        ))
        .bind(range.start)
        .bind(range.end)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        let total = summary.total_transactions.max(0) as u64;
        Ok(TransactionReport {
            start_date: range.start,
            end_date: range.end,
            summary,
            transactions: PaginatedResponse::new(rows, pagination, total),
        })
    }

    /// Every ledger row in the range, for CSV export
    pub async fn transaction_report_rows(
        &self,
        query: &TransactionReportQuery,
    ) -> AppResult<Vec<TransactionReportRow>> {
        let range = Self::report_range(query)?;

        let rows = sqlx::query_as::<_, TransactionReportRow>(TRANSACTION_REPORT_SELECT)
            .bind(range.start)
            .bind(range.end)
            .fetch_all(&self.db)
            .await?;

        Ok(rows)
    }

    fn report_range(query: &TransactionReportQuery) -> AppResult<DateRange> {
        DateRange::new(query.start_date, query.end_date)
            .map_err(|m| AppError::invalid("start_date", m))
    }

    /// Per-day IN/OUT totals for the last `days` days, oldest first
    pub async fn daily_movements(&self, days: u32) -> AppResult<Vec<DailyMovement>> {
        let today = Utc::now().date_naive();
        let start = movement_window_start(today, days);

        let rows = sqlx::query_as::<_, DailyMovement>(
            r#"
            SELECT created_at::date AS date,
                   COALESCE(SUM(quantity) FILTER (WHERE transaction_type = 'IN'), 0)::BIGINT AS stock_in,
                   COALESCE(SUM(quantity) FILTER (WHERE transaction_type = 'OUT'), 0)::BIGINT AS stock_out,
                   COUNT(*) AS count
            FROM stock_transactions
            WHERE created_at::date >= $1
            GROUP BY created_at::date
            "#,
        )
        .bind(start)
        .fetch_all(&self.db)
        .await?;

        Ok(fill_daily_series(start, today, rows))
    }

    /// Row counts of the four main tables
    pub async fn counts(&self) -> AppResult<TableCounts> {
        let counts = sqlx::query_as::<_, TableCounts>(
            r#"
            SELECT (SELECT COUNT(*) FROM products) AS products,
                   (SELECT COUNT(*) FROM categories) AS categories,
                   (SELECT COUNT(*) FROM suppliers) AS suppliers,
                   (SELECT COUNT(*) FROM stock_transactions) AS transactions
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        Ok(counts)
    }

    /// Combined dashboard figures
    pub async fn dashboard(&self) -> AppResult<Dashboard> {
        let overview = self.overview().await?;

        let price_stats = sqlx::query_as::<_, DashboardPriceStats>(
            r#"
            SELECT ROUND(AVG(purchase_price), 2) AS avg_purchase_price,
                   ROUND(AVG(selling_price), 2) AS avg_selling_price,
                   MIN(selling_price) AS min_selling_price,
                   MAX(selling_price) AS max_selling_price
            FROM products
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        let totals = self.movement_totals(&DateRange::default()).await?;

        Ok(Dashboard {
            counts: self.counts().await?,
            total_stock_value: overview.total_stock_value,
            low_stock_count: overview.low_stock_count,
            top_by_stock: self.highlights("stock_quantity DESC", 5).await?,
            top_by_value: self
                .highlights("stock_quantity * purchase_price DESC", 5)
                .await?,
            top_by_margin: self
                .highlights("(selling_price - purchase_price) / purchase_price DESC", 5)
                .await?,
            low_stock_products: self.low_stock_items(Some(5)).await?,
            category_stats: self.group_values(Grouping::Category).await?,
            supplier_stats: self.group_values(Grouping::Supplier).await?,
            transaction_totals: totals.into(),
            recent_transactions: self.recent_transactions(10).await?,
            daily_movements: self.daily_movements(DEFAULT_MOVEMENT_DAYS).await?,
            price_stats,
        })
    }

    /// Export report data as CSV
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let csv_data = String::from_utf8(
            wtr.into_inner()
                .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?,
        )
        .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))?;
        Ok(csv_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn report_row(sku: &str, stock: i32, value: &str) -> StockReportRow {
        StockReportRow {
            sku: sku.to_string(),
            name: "Kemeja Flanel".to_string(),
            category: "Pakaian".to_string(),
            supplier: "CV Maju Jaya".to_string(),
            stock_quantity: stock,
            minimum_stock: 10,
            purchase_price: Decimal::from_str("85000.00").unwrap(),
            selling_price: Decimal::from_str("120000.00").unwrap(),
            stock_value: Decimal::from_str(value).unwrap(),
        }
    }

    #[test]
    fn test_daily_series_is_zero_filled_and_ordered() {
        let rows = vec![
            DailyMovement { date: day(7), stock_in: 5, stock_out: 2, count: 3 },
            DailyMovement { date: day(5), stock_in: 0, stock_out: 4, count: 1 },
        ];
        let series = fill_daily_series(day(4), day(7), rows);

        let dates: Vec<NaiveDate> = series.iter().map(|d| d.date).collect();
        assert_eq!(dates, vec![day(4), day(5), day(6), day(7)]);
        assert_eq!(series[0].count, 0);
        assert_eq!(series[1].stock_out, 4);
        assert_eq!(series[2], DailyMovement { date: day(6), stock_in: 0, stock_out: 0, count: 0 });
        assert_eq!(series[3].stock_in, 5);
    }

    #[test]
    fn test_window_start_includes_today() {
        assert_eq!(movement_window_start(day(7), 7), day(1));
        assert_eq!(movement_window_start(day(7), 1), day(7));
        assert_eq!(fill_daily_series(day(1), day(7), vec![]).len(), 7);
    }

    #[test]
    fn test_movement_days_bounds() {
        assert_eq!(movement_days(None).unwrap(), 7);
        assert_eq!(movement_days(Some(90)).unwrap(), 90);
        assert!(movement_days(Some(0)).is_err());
        assert!(movement_days(Some(91)).is_err());
    }

    #[test]
    fn test_stock_summary() {
        let rows = vec![
            report_row("PKN001", 4, "340000.00"),
            report_row("PKN002", 6, "510000.00"),
        ];
        let summary = summarize_stock(&rows);
        assert_eq!(summary.total_items, 10);
        assert_eq!(summary.total_value, Decimal::from_str("850000.00").unwrap());
        assert_eq!(summarize_stock(&[]).total_value, Decimal::ZERO);
    }

    #[test]
    fn test_csv_export_has_header_and_rows() {
        let csv = ReportingService::export_to_csv(&[report_row("PKN001", 4, "340000.00")]).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "sku,name,category,supplier,stock_quantity,minimum_stock,purchase_price,selling_price,stock_value"
        );
        assert!(lines.next().unwrap().starts_with("PKN001,Kemeja Flanel,Pakaian,CV Maju Jaya,4,10,"));
    }

    #[test]
    fn test_net_movement() {
        let overview = TransactionOverview::from(MovementTotals {
            total_transactions: 3,
            total_in: 50,
            total_out: 20,
        });
        assert_eq!(overview.net_movement, 30);
    }

    #[test]
    fn test_report_format_parses_lowercase() {
        let q: StockReportQuery = serde_json::from_str(r#"{"format":"csv"}"#).unwrap();
        assert_eq!(q.format, Some(ReportFormat::Csv));
    }
}
