//! Stock movement ledger models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StockError;

/// Why a stock quantity changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementReason {
    SalesOrder,
    PurchaseOrder,
    ManualAdjustment,
}

impl MovementReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementReason::SalesOrder => "SALES_ORDER",
            MovementReason::PurchaseOrder => "PURCHASE_ORDER",
            MovementReason::ManualAdjustment => "MANUAL_ADJUSTMENT",
        }
    }
}

impl std::fmt::Display for MovementReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MovementReason {
    type Err = StockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SALES_ORDER" => Ok(MovementReason::SalesOrder),
            "PURCHASE_ORDER" => Ok(MovementReason::PurchaseOrder),
            "MANUAL_ADJUSTMENT" => Ok(MovementReason::ManualAdjustment),
            other => Err(StockError::UnknownReason(other.to_string())),
        }
    }
}

/// An append-only ledger row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StockMovement {
    pub id: Uuid,
    pub business_id: Uuid,
    pub product_id: Uuid,
    /// Positive for receipts, negative for consumption
    pub quantity_change: i32,
    pub reason: MovementReason,
    /// Usually the originating order id
    pub reference_id: String,
    pub created_at: DateTime<Utc>,
}

/// A ledger row waiting to be appended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStockMovement {
    pub product_id: Uuid,
    pub quantity_change: i32,
    pub reason: MovementReason,
    pub reference_id: String,
}

impl NewStockMovement {
    /// Stock leaving through a sales order
    pub fn sale(product_id: Uuid, quantity: i32, order_id: Uuid) -> Self {
        Self {
            product_id,
            quantity_change: -quantity.abs(),
            reason: MovementReason::SalesOrder,
            reference_id: order_id.to_string(),
        }
    }

    /// Stock arriving through a completed purchase order
    pub fn purchase(product_id: Uuid, quantity: i32, order_id: Uuid) -> Self {
        Self {
            product_id,
            quantity_change: quantity.abs(),
            reason: MovementReason::PurchaseOrder,
            reference_id: order_id.to_string(),
        }
    }

    /// Stock entered by hand, referenced by the batch it created
    pub fn manual(product_id: Uuid, quantity_change: i32, batch_id: Uuid) -> Self {
        Self {
            product_id,
            quantity_change,
            reason: MovementReason::ManualAdjustment,
            reference_id: batch_id.to_string(),
        }
    }
}

/// Signed sum of a movement history
pub fn ledger_balance(movements: &[StockMovement]) -> i64 {
    movements.iter().map(|m| i64::from(m.quantity_change)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_codes_round_trip_through_text() {
        for reason in [
            MovementReason::SalesOrder,
            MovementReason::PurchaseOrder,
            MovementReason::ManualAdjustment,
        ] {
            assert_eq!(reason.as_str().parse::<MovementReason>(), Ok(reason));
        }
        assert!("RETURN".parse::<MovementReason>().is_err());
    }

    #[test]
    fn sale_is_negative_and_purchase_positive() {
        let order = Uuid::new_v4();
        let p = Uuid::new_v4();
        assert_eq!(NewStockMovement::sale(p, 5, order).quantity_change, -5);
        assert_eq!(NewStockMovement::purchase(p, 20, order).quantity_change, 20);
        assert_eq!(NewStockMovement::sale(p, 5, order).reference_id, order.to_string());
    }
}
