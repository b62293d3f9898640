//! Product models
//!
//! A product never stores its own quantity. Stock is always derived from the
//! product's batches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A product owned by a business
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Product {
    pub id: Uuid,
    pub business_id: Uuid,
    pub sku: String,
    pub name: String,
    /// Minimum stock threshold for low-stock reporting
    pub min_stock: i32,
    /// Set once a low-stock alert was acknowledged, cleared by replenishment
    pub low_stock_notified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A product together with its derived quantity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductStock {
    #[serde(flatten)]
    pub product: Product,
    pub quantity: i64,
}

impl ProductStock {
    pub fn is_below_minimum(&self) -> bool {
        is_below_minimum(self.quantity, self.product.min_stock)
    }

    /// Whether this product should show up in the low-stock report
    pub fn needs_alert(&self) -> bool {
        self.is_below_minimum() && !self.product.low_stock_notified
    }
}

pub fn is_below_minimum(quantity: i64, min_stock: i32) -> bool {
    quantity < i64::from(min_stock)
}

/// Input for registering a product
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateProductInput {
    #[validate(length(min = 1, max = 64, message = "SKU must be 1-64 characters"))]
    pub sku: String,
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
    #[validate(range(min = 0, message = "Minimum stock cannot be negative"))]
    #[serde(default)]
    pub min_stock: i32,
    /// Opening quantity, recorded as an initial batch
    #[validate(range(min = 0, message = "Initial quantity cannot be negative"))]
    pub initial_quantity: Option<i32>,
}

/// Lot number given to the opening batch of a product
pub fn initial_lot_number(sku: &str) -> String {
    format!("INITIAL-{}", sku)
}

/// Ledger agreement for one product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reconciliation {
    pub product_id: Uuid,
    /// Signed sum of all stock movements
    pub ledger_total: i64,
    /// Sum of current batch quantities
    pub batch_total: i64,
    pub consistent: bool,
}

impl Reconciliation {
    pub fn new(product_id: Uuid, ledger_total: i64, batch_total: i64) -> Self {
        Self {
            product_id,
            ledger_total,
            batch_total,
            consistent: ledger_total == batch_total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn below_minimum_is_strict() {
        assert!(is_below_minimum(4, 5));
        assert!(!is_below_minimum(5, 5));
        assert!(!is_below_minimum(0, 0));
    }

    #[test]
    fn reconciliation_flags_divergence() {
        let id = Uuid::new_v4();
        assert!(Reconciliation::new(id, 12, 12).consistent);
        assert!(!Reconciliation::new(id, 12, 11).consistent);
    }

    #[test]
    fn stock_serializes_flat() {
        let now = Utc::now();
        let stock = ProductStock {
            product: Product {
                id: Uuid::nil(),
                business_id: Uuid::nil(),
                sku: "SKU-1".to_string(),
                name: "Widget".to_string(),
                min_stock: 3,
                low_stock_notified: false,
                created_at: now,
                updated_at: now,
            },
            quantity: 2,
        };
        let json = serde_json::to_value(&stock).unwrap();
        assert_eq!(json["sku"], "SKU-1");
        assert_eq!(json["quantity"], 2);
        assert!(stock.needs_alert());
    }

    #[test]
    fn create_input_rejects_negative_minimum() {
        let input = CreateProductInput {
            sku: "SKU-1".to_string(),
            name: "Widget".to_string(),
            min_stock: -1,
            initial_quantity: None,
        };
        assert!(input.validate().is_err());
    }
}
