//! Sales order models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::StockError;

/// Sales order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalesOrderStatus {
    Pending,
    Completed,
    Cancelled,
}

impl SalesOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SalesOrderStatus::Pending => "pending",
            SalesOrderStatus::Completed => "completed",
            SalesOrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for SalesOrderStatus {
    type Err = StockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SalesOrderStatus::Pending),
            "completed" => Ok(SalesOrderStatus::Completed),
            "cancelled" => Ok(SalesOrderStatus::Cancelled),
            other => Err(StockError::UnknownStatus(other.to_string())),
        }
    }
}

/// Sales order header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesOrder {
    pub id: Uuid,
    pub business_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub status: SalesOrderStatus,
    pub order_date: DateTime<Utc>,
    pub total_amount: Option<Decimal>,
}

/// A line of a committed sales order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// A requested line, before any stock is touched
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Option<Decimal>,
}

impl OrderLine {
    pub fn unit_price(&self) -> Decimal {
        self.unit_price.unwrap_or(Decimal::ZERO)
    }

    /// `None` when the product does not fit a `Decimal`
    pub fn line_total(&self) -> Option<Decimal> {
        self.unit_price().checked_mul(Decimal::from(self.quantity))
    }
}

/// Input for creating a sales order
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateSalesOrderInput {
    pub customer_id: Option<Uuid>,
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<OrderLine>,
}

/// A committed sales order with its lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesOrderWithItems {
    pub order: SalesOrder,
    pub items: Vec<OrderItem>,
}

/// Sum of quantity times unit price over all lines, `None` on overflow
pub fn order_total(lines: &[OrderLine]) -> Option<Decimal> {
    lines
        .iter()
        .try_fold(Decimal::ZERO, |total, line| total.checked_add(line.line_total()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_price_counts_as_zero() {
        let lines = vec![
            OrderLine {
                product_id: Uuid::new_v4(),
                quantity: 3,
                unit_price: Some(Decimal::new(250, 2)),
            },
            OrderLine {
                product_id: Uuid::new_v4(),
                quantity: 7,
                unit_price: None,
            },
        ];
        assert_eq!(order_total(&lines), Some(Decimal::new(750, 2)));
    }

    #[test]
    fn overflowing_total_is_none() {
        let lines = vec![OrderLine {
            product_id: Uuid::new_v4(),
            quantity: 2,
            unit_price: Some(Decimal::MAX),
        }];
        assert_eq!(order_total(&lines), None);
    }

    #[test]
    fn empty_order_fails_validation() {
        let input = CreateSalesOrderInput {
            customer_id: None,
            items: vec![],
        };
        assert!(input.validate().is_err());
    }
}
