//! Category HTTP handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::category::{CategoryDetail, CategoryInput, CategorySummary};
use crate::services::CategoryService;
use crate::AppState;

/// List categories with product counts
pub async fn list_categories(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let categories = CategoryService::new(state.db).list().await?;
    Ok(Json(json!({
        "count": categories.len(),
        "categories": categories,
    })))
}

/// Get a category with its products
pub async fn get_category(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
) -> AppResult<Json<CategoryDetail>> {
    let category = CategoryService::new(state.db).get(category_id).await?;
    Ok(Json(category))
}

/// Create a category
pub async fn create_category(
    State(state): State<AppState>,
    Json(input): Json<CategoryInput>,
) -> AppResult<(StatusCode, Json<CategorySummary>)> {
    let category = CategoryService::new(state.db).create(input).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// Rename a category
pub async fn update_category(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
    Json(input): Json<CategoryInput>,
) -> AppResult<Json<CategorySummary>> {
    let category = CategoryService::new(state.db).update(category_id, input).await?;
    Ok(Json(category))
}

/// Delete an empty category
pub async fn delete_category(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let name = CategoryService::new(state.db).delete(category_id).await?;
    Ok(Json(json!({
        "message": format!("Category '{}' deleted", name),
    })))
}
