//! Purchase order models and status rules

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::StockError;

/// Purchase order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOrderStatus {
    Pending,
    Completed,
    Cancelled,
}

impl PurchaseOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseOrderStatus::Pending => "pending",
            PurchaseOrderStatus::Completed => "completed",
            PurchaseOrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for PurchaseOrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PurchaseOrderStatus {
    type Err = StockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PurchaseOrderStatus::Pending),
            "completed" => Ok(PurchaseOrderStatus::Completed),
            "cancelled" => Ok(PurchaseOrderStatus::Cancelled),
            other => Err(StockError::UnknownStatus(other.to_string())),
        }
    }
}

/// What a status change does to stock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionEffect {
    /// Target equals current status; nothing is written
    NoOp,
    /// Header status changes, stock does not
    StatusOnly,
    /// Items become batches and ledger rows, then the header is completed
    ReceiveStock,
}

/// Decide what moving from `from` to `to` means.
///
/// Completed and cancelled are terminal. Re-completing a completed order is a
/// no-op so batches are created exactly once per order.
pub fn plan_transition(
    from: PurchaseOrderStatus,
    to: PurchaseOrderStatus,
) -> Result<TransitionEffect, StockError> {
    use PurchaseOrderStatus::*;

    match (from, to) {
        (a, b) if a == b => Ok(TransitionEffect::NoOp),
        (Pending, Completed) => Ok(TransitionEffect::ReceiveStock),
        (Pending, Cancelled) => Ok(TransitionEffect::StatusOnly),
        (from, to) => Err(StockError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }),
    }
}

/// Purchase order header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub id: Uuid,
    pub business_id: Uuid,
    pub supplier_id: Option<Uuid>,
    pub status: PurchaseOrderStatus,
    pub order_date: DateTime<Utc>,
}

/// A purchase order line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrderItem {
    pub id: Uuid,
    pub purchase_order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_cost: Decimal,
    pub lot_number: Option<String>,
    pub expiry_date: Option<NaiveDate>,
}

/// A requested purchase line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseLine {
    pub product_id: Uuid,
    pub quantity: i32,
    #[serde(default)]
    pub unit_cost: Decimal,
    pub lot_number: Option<String>,
    pub expiry_date: Option<NaiveDate>,
}

/// Input for creating a purchase order
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePurchaseOrderInput {
    pub supplier_id: Option<Uuid>,
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<PurchaseLine>,
}

/// Input for a status change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePurchaseStatusInput {
    pub status: PurchaseOrderStatus,
}

/// A purchase order with its lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrderWithItems {
    pub order: PurchaseOrder,
    pub items: Vec<PurchaseOrderItem>,
}
