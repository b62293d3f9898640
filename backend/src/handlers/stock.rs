//! HTTP handlers for low-stock reporting

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use shared::ProductStock;

use crate::error::AppResult;
use crate::middleware::CurrentTenant;
use crate::services::ProductService;
use crate::AppState;

/// Products below their minimum that have not been acknowledged
pub async fn list_low_stock(
    State(state): State<AppState>,
    tenant: CurrentTenant,
) -> AppResult<Json<Vec<ProductStock>>> {
    let service = ProductService::new(state.db, state.audit);
    let products = service.low_stock(tenant.business_id()).await?;
    Ok(Json(products))
}

/// Acknowledge a low-stock alert
pub async fn acknowledge_low_stock(
    State(state): State<AppState>,
    tenant: CurrentTenant,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ProductStock>> {
    let service = ProductService::new(state.db, state.audit);
    let product = service
        .acknowledge_low_stock(tenant.business_id(), product_id)
        .await?;
    Ok(Json(product))
}
