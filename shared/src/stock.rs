//! Stock availability checks and the shortfall report

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Requested quantity exceeds what the product's batches hold.
///
/// Carries enough detail for a caller to say "need 5, have 2".
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("insufficient stock for product {product_name} ({product_id}): requested {requested}, available {available}")]
pub struct Shortfall {
    pub product_id: Uuid,
    pub product_name: String,
    pub requested: i64,
    pub available: i64,
}

impl Shortfall {
    pub fn missing(&self) -> i64 {
        self.requested - self.available
    }
}

/// Stock figure for one requested line, as read by the validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineAvailability {
    pub product_id: Uuid,
    pub product_name: String,
    pub requested: i64,
    pub available: i64,
}

impl LineAvailability {
    pub fn is_sufficient(&self) -> bool {
        self.available >= self.requested
    }

    pub fn check(&self) -> Result<(), Shortfall> {
        if self.is_sufficient() {
            Ok(())
        } else {
            Err(Shortfall {
                product_id: self.product_id,
                product_name: self.product_name.clone(),
                requested: self.requested,
                available: self.available,
            })
        }
    }
}

/// First shortfall among the lines, in submission order
pub fn first_shortfall(lines: &[LineAvailability]) -> Result<(), Shortfall> {
    lines.iter().try_for_each(LineAvailability::check)
}
