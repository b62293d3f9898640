//! Route definitions for the Stock Ledger API

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - products and batches
        .nest("/products", product_routes(state.clone()))
        // Protected routes - low-stock reporting
        .nest("/stock", stock_routes(state.clone()))
        // Protected routes - sales orders
        .nest("/sales-orders", sales_order_routes(state.clone()))
        // Protected routes - purchase orders
        .nest("/purchase-orders", purchase_order_routes(state))
}

/// Product routes (protected)
fn product_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_products).post(handlers::create_product))
        .route("/:product_id", get(handlers::get_product))
        .route(
            "/:product_id/batches",
            get(handlers::get_batches).post(handlers::receive_stock),
        )
        .route("/:product_id/movements", get(handlers::get_movements))
        .route("/:product_id/stock", get(handlers::get_stock_level))
        .route(
            "/:product_id/reconciliation",
            get(handlers::get_reconciliation),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Low-stock routes (protected)
fn stock_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/low", get(handlers::list_low_stock))
        .route("/low/:product_id/ack", post(handlers::acknowledge_low_stock))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Sales order routes (protected)
fn sales_order_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_sales_orders).post(handlers::create_sales_order),
        )
        .route("/:order_id", get(handlers::get_sales_order))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Purchase order routes (protected)
fn purchase_order_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_purchase_orders).post(handlers::create_purchase_order),
        )
        .route("/:order_id", get(handlers::get_purchase_order))
        .route(
            "/:order_id/status",
            put(handlers::update_purchase_order_status),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
