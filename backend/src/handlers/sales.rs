//! HTTP handlers for sales order endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use shared::{CreateSalesOrderInput, PaginatedResponse, Pagination, SalesOrder, SalesOrderWithItems};

use crate::error::AppResult;
use crate::middleware::CurrentTenant;
use crate::services::SalesOrderService;
use crate::AppState;

/// Create a sales order
pub async fn create_sales_order(
    State(state): State<AppState>,
    tenant: CurrentTenant,
    Json(input): Json<CreateSalesOrderInput>,
) -> AppResult<(StatusCode, Json<SalesOrderWithItems>)> {
    let service = SalesOrderService::new(state.db, state.audit);
    let order = service.create(tenant.business_id(), input).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// List sales orders
pub async fn list_sales_orders(
    State(state): State<AppState>,
    tenant: CurrentTenant,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<PaginatedResponse<SalesOrder>>> {
    let service = SalesOrderService::new(state.db, state.audit);
    let orders = service.list(tenant.business_id(), pagination).await?;
    Ok(Json(orders))
}

/// Get a sales order by ID
pub async fn get_sales_order(
    State(state): State<AppState>,
    tenant: CurrentTenant,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<SalesOrderWithItems>> {
    let service = SalesOrderService::new(state.db, state.audit);
    let order = service.get(tenant.business_id(), order_id).await?;
    Ok(Json(order))
}
