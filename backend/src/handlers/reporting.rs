//! Reporting handlers for analytics and data export

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use crate::error::AppResult;
use crate::services::reporting::{
    movement_days, DailyMovement, Dashboard, InventoryStats, LowStockReport, ReportFormat,
    StockReportQuery, StockValueReport, TableCounts, TransactionReportQuery, TransactionStats,
};
use crate::services::ReportingService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DailyMovementQuery {
    pub days: Option<u32>,
}

fn service(state: &AppState) -> ReportingService {
    ReportingService::new(state.db.clone(), state.config.inventory.max_page_size)
}

fn csv_response(name: &str, body: String) -> Response {
    let disposition = format!(
        "attachment; filename=\"{}_{}.csv\"",
        name,
        Utc::now().format("%Y%m%d")
    );
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}

/// Overall inventory statistics
pub async fn get_inventory_stats(State(state): State<AppState>) -> AppResult<Json<InventoryStats>> {
    let stats = service(&state).inventory_stats().await?;
    Ok(Json(stats))
}

/// Products at or below minimum stock
pub async fn get_low_stock(State(state): State<AppState>) -> AppResult<Json<LowStockReport>> {
    let report = service(&state).low_stock().await?;
    Ok(Json(report))
}

/// Stock value by category and supplier
pub async fn get_stock_value(State(state): State<AppState>) -> AppResult<Json<StockValueReport>> {
    let report = service(&state).stock_value().await?;
    Ok(Json(report))
}

/// Stock report as JSON or CSV
pub async fn get_stock_report(
    State(state): State<AppState>,
    Query(query): Query<StockReportQuery>,
) -> AppResult<Response> {
    let report = service(&state).stock_report(query.category_id).await?;

    if query.format.unwrap_or_default() == ReportFormat::Csv {
        let csv = ReportingService::export_to_csv(&report.products)?;
        return Ok(csv_response("stock_report", csv));
    }

    Ok(Json(report).into_response())
}

/// Ledger statistics
pub async fn get_transaction_stats(
    State(state): State<AppState>,
) -> AppResult<Json<TransactionStats>> {
    let stats = service(&state).transaction_stats().await?;
    Ok(Json(stats))
}

/// Ledger report over a date range as JSON or CSV
pub async fn get_transaction_report(
    State(state): State<AppState>,
    Query(query): Query<TransactionReportQuery>,
) -> AppResult<Response> {
    let service = service(&state);

    if query.format.unwrap_or_default() == ReportFormat::Csv {
        let rows = service.transaction_report_rows(&query).await?;
        let csv = ReportingService::export_to_csv(&rows)?;
        return Ok(csv_response("transaction_report", csv));
    }

    let report = service.transaction_report(&query).await?;
    Ok(Json(report).into_response())
}

/// Per-day movements for the last `days` days
pub async fn get_daily_movements(
    State(state): State<AppState>,
    Query(query): Query<DailyMovementQuery>,
) -> AppResult<Json<Vec<DailyMovement>>> {
    let days = movement_days(query.days)?;
    let movements = service(&state).daily_movements(days).await?;
    Ok(Json(movements))
}

/// Dashboard figures
pub async fn get_dashboard(State(state): State<AppState>) -> AppResult<Json<Dashboard>> {
    let dashboard = service(&state).dashboard().await?;
    Ok(Json(dashboard))
}

/// Table row counts
pub async fn get_counts(State(state): State<AppState>) -> AppResult<Json<TableCounts>> {
    let counts = service(&state).counts().await?;
    Ok(Json(counts))
}
