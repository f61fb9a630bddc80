//! Route definitions for the InventoryPro API

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/auth/me", get(handlers::me))
        .route("/users", post(handlers::create_user))
        .nest("/categories", category_routes())
        .nest("/suppliers", supplier_routes())
        .nest("/products", product_routes())
        .nest("/transactions", transaction_routes())
        .nest("/reports", report_routes())
        .nest("/import", import_routes())
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public)
        .nest("/auth", auth_routes())
        .merge(protected)
}

/// Authentication routes (public)
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
}

/// Category routes (protected)
fn category_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route(
            "/:category_id",
            get(handlers::get_category)
                .put(handlers::update_category)
                .delete(handlers::delete_category),
        )
        .route("/:category_id/products", get(handlers::products_by_category))
}

/// Supplier routes (protected)
fn supplier_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_suppliers).post(handlers::create_supplier),
        )
        .route(
            "/:supplier_id",
            get(handlers::get_supplier)
                .put(handlers::update_supplier)
                .delete(handlers::delete_supplier),
        )
        .route("/:supplier_id/products", get(handlers::products_by_supplier))
}

/// Product routes (protected)
fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_products).post(handlers::create_product))
        .route("/search", get(handlers::search_products))
        .route(
            "/:product_id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route("/:product_id/history", get(handlers::product_history))
        .route("/:product_id/stock-correction", post(handlers::correct_stock))
}

/// Stock ledger routes (protected)
fn transaction_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_transactions).post(handlers::record_transaction),
        )
        .route("/reconciliation", get(handlers::reconcile))
        .route(
            "/:transaction_id",
            get(handlers::get_transaction).delete(handlers::delete_transaction),
        )
}

/// Report routes (protected)
fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(handlers::get_dashboard))
        .route("/inventory-stats", get(handlers::get_inventory_stats))
        .route("/low-stock", get(handlers::get_low_stock))
        .route("/stock-value", get(handlers::get_stock_value))
        .route("/stock", get(handlers::get_stock_report))
        .route("/transaction-stats", get(handlers::get_transaction_stats))
        .route("/transactions", get(handlers::get_transaction_report))
        .route("/daily-movements", get(handlers::get_daily_movements))
        .route("/counts", get(handlers::get_counts))
}

/// CSV import routes (protected)
fn import_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", post(handlers::import_categories))
        .route("/suppliers", post(handlers::import_suppliers))
        .route("/products", post(handlers::import_products))
}
