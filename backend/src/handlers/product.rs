//! Product HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use shared::PaginatedResponse;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::product::{
    CreateProductInput, ProductDetail, ProductListQuery, ProductSearchResult, ProductView,
    ProductsByCategory, ProductsBySupplier, StockCorrection, StockCorrectionInput,
    UpdateProductInput,
};
use crate::services::ProductService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

fn service(state: &AppState) -> ProductService {
    ProductService::new(state.db.clone(), &state.config)
}

/// List products with filters and pagination
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> AppResult<Json<PaginatedResponse<ProductView>>> {
    let products = service(&state).list(&query).await?;
    Ok(Json(products))
}

/// Get product detail
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ProductDetail>> {
    let product = service(&state).get(product_id).await?;
    Ok(Json(product))
}

/// Create a product
pub async fn create_product(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateProductInput>,
) -> AppResult<(StatusCode, Json<ProductView>)> {
    let product = service(&state).create(&user, input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Update product attributes
pub async fn update_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(input): Json<UpdateProductInput>,
) -> AppResult<Json<ProductView>> {
    let product = service(&state).update(product_id, input).await?;
    Ok(Json(product))
}

/// Delete a product without ledger history
pub async fn delete_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let name = service(&state).delete(product_id).await?;
    Ok(Json(deleted_message(&name)))
}

fn deleted_message(name: &str) -> Value {
    json!({
        "message": format!("Product '{}' deleted", name),
    })
}

/// Products of one category
pub async fn products_by_category(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
) -> AppResult<Json<ProductsByCategory>> {
    let result = service(&state).by_category(category_id).await?;
    Ok(Json(result))
}

/// Products of one supplier
pub async fn products_by_supplier(
    State(state): State<AppState>,
    Path(supplier_id): Path<Uuid>,
) -> AppResult<Json<ProductsBySupplier>> {
    let result = service(&state).by_supplier(supplier_id).await?;
    Ok(Json(result))
}

/// Search products by name or SKU
pub async fn search_products(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<ProductSearchResult>> {
    let result = service(&state).search(&query.q).await?;
    Ok(Json(result))
}

/// Correct the stock balance to a counted quantity
pub async fn correct_stock(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(product_id): Path<Uuid>,
    Json(input): Json<StockCorrectionInput>,
) -> AppResult<Json<StockCorrection>> {
    let correction = service(&state).correct_stock(&user, product_id, input).await?;
    Ok(Json(correction))
}
