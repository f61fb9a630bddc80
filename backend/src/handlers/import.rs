//! CSV import handlers
//!
//! The request body is the CSV file itself (`Content-Type: text/csv`).

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::import::ImportSummary;
use crate::services::ImportService;
use crate::AppState;

fn service(state: &AppState) -> ImportService {
    ImportService::new(state.db.clone(), state.config.inventory.default_minimum_stock)
}

/// Import categories (`name`)
pub async fn import_categories(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: String,
) -> AppResult<Json<ImportSummary>> {
    tracing::info!(user_id = %user.user_id, bytes = body.len(), "Category import started");
    let summary = service(&state).import_categories(&body).await?;
    Ok(Json(summary))
}

/// Import suppliers (`name,phone,address`)
pub async fn import_suppliers(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: String,
) -> AppResult<Json<ImportSummary>> {
    tracing::info!(user_id = %user.user_id, bytes = body.len(), "Supplier import started");
    let summary = service(&state).import_suppliers(&body).await?;
    Ok(Json(summary))
}

/// Import products, upserting by SKU
pub async fn import_products(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: String,
) -> AppResult<Json<ImportSummary>> {
    let summary = service(&state).import_products(&user, &body).await?;
    Ok(Json(summary))
}
