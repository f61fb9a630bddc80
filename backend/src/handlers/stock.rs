//! Stock ledger HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use shared::{PaginatedResponse, Pagination, TransactionType};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::stock::{
    DeletedTransaction, ProductHistory, ReconciliationReport, RecordTransactionInput,
    StockTransaction, TransactionFilter,
};
use crate::services::StockService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct TransactionListQuery {
    pub product_id: Option<Uuid>,
    pub transaction_type: Option<TransactionType>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Record a stock movement. A replayed idempotency key answers 200 instead of 201.
pub async fn record_transaction(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<RecordTransactionInput>,
) -> AppResult<(StatusCode, Json<StockTransaction>)> {
    let (transaction, replayed) = StockService::new(state.db)
        .record_transaction(&user, input)
        .await?;

    let status = if replayed {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(transaction)))
}

/// List ledger entries, newest first
pub async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<TransactionListQuery>,
) -> AppResult<Json<PaginatedResponse<StockTransaction>>> {
    let pagination = Pagination::from_query(
        query.page,
        query.per_page,
        state.config.inventory.max_page_size,
    );
    let filter = TransactionFilter {
        product_id: query.product_id,
        transaction_type: query.transaction_type,
        start_date: query.start_date,
        end_date: query.end_date,
    };

    let transactions = StockService::new(state.db)
        .list_transactions(&filter, pagination)
        .await?;
    Ok(Json(transactions))
}

/// Get a single ledger entry
pub async fn get_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<Uuid>,
) -> AppResult<Json<StockTransaction>> {
    let transaction = StockService::new(state.db)
        .get_transaction(transaction_id)
        .await?;
    Ok(Json(transaction))
}

/// Full ledger of one product
pub async fn product_history(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ProductHistory>> {
    let history = StockService::new(state.db).product_history(product_id).await?;
    Ok(Json(history))
}

/// Delete and reverse a ledger entry (superuser only)
pub async fn delete_transaction(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(transaction_id): Path<Uuid>,
) -> AppResult<Json<DeletedTransaction>> {
    let deleted = StockService::new(state.db)
        .delete_transaction(&user, transaction_id)
        .await?;
    Ok(Json(deleted))
}

/// Products whose balance disagrees with their ledger
pub async fn reconcile(State(state): State<AppState>) -> AppResult<Json<ReconciliationReport>> {
    let report = StockService::new(state.db).reconcile().await?;
    Ok(Json(report))
}
