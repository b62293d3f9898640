//! Product batch (lot) models

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::fefo::BatchLevel;

/// A lot of stock for one product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductBatch {
    pub id: Uuid,
    pub product_id: Uuid,
    pub business_id: Uuid,
    pub lot_number: Option<String>,
    /// Never negative; zero once depleted
    pub quantity: i32,
    pub expiry_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl ProductBatch {
    pub fn is_active(&self) -> bool {
        self.quantity > 0
    }

    /// Expired batches are still consumable; the caller decides what to do with them
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry_date.is_some_and(|d| d < today)
    }

    /// Not yet expired but expiring within `days` of `today`
    pub fn expires_within(&self, today: NaiveDate, days: i64) -> bool {
        match self.expiry_date {
            Some(d) => d >= today && d <= today + Duration::days(days),
            None => false,
        }
    }

    pub fn level(&self) -> BatchLevel {
        BatchLevel {
            batch_id: self.id,
            quantity: self.quantity,
            expiry_date: self.expiry_date,
            created_at: self.created_at,
        }
    }
}

/// Input for manual stock entry
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReceiveStockInput {
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i32,
    #[validate(length(max = 64, message = "Lot number must be at most 64 characters"))]
    pub lot_number: Option<String>,
    pub expiry_date: Option<NaiveDate>,
}

/// Active batches of a product with expiry figures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOverview {
    pub product_id: Uuid,
    pub batches: Vec<ProductBatch>,
    pub total_quantity: i64,
    /// Quantity in batches expiring within the configured window
    pub expiring_soon: i64,
    pub has_expired_batches: bool,
}

impl BatchOverview {
    pub fn new(
        product_id: Uuid,
        batches: Vec<ProductBatch>,
        today: NaiveDate,
        window_days: i64,
    ) -> Self {
        let active: Vec<ProductBatch> = batches.into_iter().filter(|b| b.is_active()).collect();
        let total_quantity = active.iter().map(|b| i64::from(b.quantity)).sum();
        let expiring_soon = active
            .iter()
            .filter(|b| b.expires_within(today, window_days))
            .map(|b| i64::from(b.quantity))
            .sum();
        let has_expired_batches = active.iter().any(|b| b.is_expired(today));

        Self {
            product_id,
            batches: active,
            total_quantity,
            expiring_soon,
            has_expired_batches,
        }
    }
}
