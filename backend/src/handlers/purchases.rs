//! HTTP handlers for purchase order endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use shared::{
    CreatePurchaseOrderInput, PaginatedResponse, Pagination, PurchaseOrder,
    PurchaseOrderWithItems, UpdatePurchaseStatusInput,
};

use crate::error::AppResult;
use crate::middleware::CurrentTenant;
use crate::services::PurchaseOrderService;
use crate::AppState;

/// Create a purchase order
pub async fn create_purchase_order(
    State(state): State<AppState>,
    tenant: CurrentTenant,
    Json(input): Json<CreatePurchaseOrderInput>,
) -> AppResult<(StatusCode, Json<PurchaseOrderWithItems>)> {
    let service = PurchaseOrderService::new(state.db, state.audit);
    let order = service.create(tenant.business_id(), input).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// List purchase orders
pub async fn list_purchase_orders(
    State(state): State<AppState>,
    tenant: CurrentTenant,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<PaginatedResponse<PurchaseOrder>>> {
    let service = PurchaseOrderService::new(state.db, state.audit);
    let orders = service.list(tenant.business_id(), pagination).await?;
    Ok(Json(orders))
}

/// Get a purchase order by ID
pub async fn get_purchase_order(
    State(state): State<AppState>,
    tenant: CurrentTenant,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<PurchaseOrderWithItems>> {
    let service = PurchaseOrderService::new(state.db, state.audit);
    let order = service.get(tenant.business_id(), order_id).await?;
    Ok(Json(order))
}

/// Change a purchase order's status; completing it receives its stock
pub async fn update_purchase_order_status(
    State(state): State<AppState>,
    tenant: CurrentTenant,
    Path(order_id): Path<Uuid>,
    Json(input): Json<UpdatePurchaseStatusInput>,
) -> AppResult<Json<PurchaseOrderWithItems>> {
    let service = PurchaseOrderService::new(state.db, state.audit);
    let order = service
        .update_status(tenant.business_id(), order_id, input.status)
        .await?;
    Ok(Json(order))
}
