//! HTTP handlers for product and batch endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use shared::{
    BatchOverview, CreateProductInput, PaginatedResponse, Pagination, ProductBatch, ProductStock,
    ReceiveStockInput, Reconciliation, StockMovement,
};

use crate::error::AppResult;
use crate::middleware::CurrentTenant;
use crate::services::{ProductService, StockLevel};
use crate::AppState;

/// Register a product
pub async fn create_product(
    State(state): State<AppState>,
    tenant: CurrentTenant,
    Json(input): Json<CreateProductInput>,
) -> AppResult<(StatusCode, Json<ProductStock>)> {
    let service = ProductService::new(state.db, state.audit);
    let product = service.register(tenant.business_id(), input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// List products with their derived quantities
pub async fn list_products(
    State(state): State<AppState>,
    tenant: CurrentTenant,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<PaginatedResponse<ProductStock>>> {
    let service = ProductService::new(state.db, state.audit);
    let products = service.list(tenant.business_id(), pagination).await?;
    Ok(Json(products))
}

/// Get a product by ID
pub async fn get_product(
    State(state): State<AppState>,
    tenant: CurrentTenant,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ProductStock>> {
    let service = ProductService::new(state.db, state.audit);
    let product = service.get(tenant.business_id(), product_id).await?;
    Ok(Json(product))
}

/// Active batches of a product in FEFO order
pub async fn get_batches(
    State(state): State<AppState>,
    tenant: CurrentTenant,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<BatchOverview>> {
    let window = state.config.inventory.expiring_soon_days;
    let service = ProductService::new(state.db, state.audit);
    let overview = service
        .batch_overview(
            tenant.business_id(),
            product_id,
            Utc::now().date_naive(),
            window,
        )
        .await?;
    Ok(Json(overview))
}

/// Enter stock by hand as a new batch
pub async fn receive_stock(
    State(state): State<AppState>,
    tenant: CurrentTenant,
    Path(product_id): Path<Uuid>,
    Json(input): Json<ReceiveStockInput>,
) -> AppResult<(StatusCode, Json<ProductBatch>)> {
    let service = ProductService::new(state.db, state.audit);
    let batch = service
        .receive_stock(tenant.business_id(), product_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(batch)))
}

/// Ledger history of a product
pub async fn get_movements(
    State(state): State<AppState>,
    tenant: CurrentTenant,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<Vec<StockMovement>>> {
    let service = ProductService::new(state.db, state.audit);
    let movements = service.movements(tenant.business_id(), product_id).await?;
    Ok(Json(movements))
}

/// Derived quantity of a product
pub async fn get_stock_level(
    State(state): State<AppState>,
    tenant: CurrentTenant,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<StockLevel>> {
    let service = ProductService::new(state.db, state.audit);
    let level = service.stock_level(tenant.business_id(), product_id).await?;
    Ok(Json(level))
}

/// Ledger sum against batch sum
pub async fn get_reconciliation(
    State(state): State<AppState>,
    tenant: CurrentTenant,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<Reconciliation>> {
    let service = ProductService::new(state.db, state.audit);
    let result = service
        .reconciliation(tenant.business_id(), product_id)
        .await?;
    Ok(Json(result))
}
