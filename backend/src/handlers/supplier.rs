//! Supplier HTTP handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::supplier::{SupplierDetail, SupplierInput, SupplierSummary};
use crate::services::SupplierService;
use crate::AppState;

/// List suppliers with product counts
pub async fn list_suppliers(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let suppliers = SupplierService::new(state.db).list().await?;
    Ok(Json(json!({
        "count": suppliers.len(),
        "suppliers": suppliers,
    })))
}

/// Get a supplier with its products
pub async fn get_supplier(
    State(state): State<AppState>,
    Path(supplier_id): Path<Uuid>,
) -> AppResult<Json<SupplierDetail>> {
    let supplier = SupplierService::new(state.db).get(supplier_id).await?;
    Ok(Json(supplier))
}

/// Create a supplier
pub async fn create_supplier(
    State(state): State<AppState>,
    Json(input): Json<SupplierInput>,
) -> AppResult<(StatusCode, Json<SupplierSummary>)> {
    let supplier = SupplierService::new(state.db).create(input).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

/// Update a supplier
pub async fn update_supplier(
    State(state): State<AppState>,
    Path(supplier_id): Path<Uuid>,
    Json(input): Json<SupplierInput>,
) -> AppResult<Json<SupplierSummary>> {
    let supplier = SupplierService::new(state.db).update(supplier_id, input).await?;
    Ok(Json(supplier))
}

/// Delete a supplier without products
pub async fn delete_supplier(
    State(state): State<AppState>,
    Path(supplier_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let name = SupplierService::new(state.db).delete(supplier_id).await?;
    Ok(Json(json!({
        "message": format!("Supplier '{}' deleted", name),
    })))
}
