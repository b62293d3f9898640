//! First-Expired-First-Out consumption planning
//!
//! The allocator locks a product's active batches and hands them to
//! [`plan_consumption`], which decides how much to take from each one. Keeping
//! the walk free of I/O lets the ordering and arithmetic be tested on their own.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StockError;

/// The fields of a batch that FEFO looks at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchLevel {
    pub batch_id: Uuid,
    pub quantity: i32,
    pub expiry_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// One decrement the allocator must apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchDraw {
    pub batch_id: Uuid,
    /// Units taken from the batch
    pub taken: i32,
    /// Quantity left in the batch after the draw
    pub remaining: i32,
}

/// FEFO ordering: earliest expiry first, no expiry last, then oldest lot,
/// then id so the order is total.
///
/// Matches `ORDER BY expiry_date ASC NULLS LAST, created_at ASC, id ASC`.
pub fn fefo_cmp(a: &BatchLevel, b: &BatchLevel) -> Ordering {
    let by_expiry = match (a.expiry_date, b.expiry_date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };

    by_expiry
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.batch_id.cmp(&b.batch_id))
}

pub fn sort_fefo(batches: &mut [BatchLevel]) {
    batches.sort_by(fefo_cmp);
}

/// Total quantity held by active batches
pub fn available_quantity(batches: &[BatchLevel]) -> i64 {
    batches
        .iter()
        .filter(|b| b.quantity > 0)
        .map(|b| i64::from(b.quantity))
        .sum()
}

/// Walk the batches in FEFO order and take `quantity` units.
///
/// A batch holding at least the remaining amount is decremented and the walk
/// stops; a smaller batch is emptied and the walk continues. Batches with no
/// stock are skipped. If the batches run out first, nothing is returned except
/// the shortfall, so a caller that has not applied any draw has nothing to undo.
pub fn plan_consumption(batches: &[BatchLevel], quantity: i32) -> Result<Vec<BatchDraw>, StockError> {
    if quantity <= 0 {
        return Err(StockError::InvalidQuantity(i64::from(quantity)));
    }

    let available = available_quantity(batches);
    if available < i64::from(quantity) {
        return Err(StockError::Insufficient {
            requested: i64::from(quantity),
            available,
        });
    }

    let mut ordered: Vec<&BatchLevel> = batches.iter().filter(|b| b.quantity > 0).collect();
    ordered.sort_by(|a, b| fefo_cmp(a, b));

    let mut remaining = quantity;
    let mut draws = Vec::new();

    for batch in ordered {
        if remaining == 0 {
            break;
        }

        if batch.quantity >= remaining {
            draws.push(BatchDraw {
                batch_id: batch.batch_id,
                taken: remaining,
                remaining: batch.quantity - remaining,
            });
            remaining = 0;
        } else {
            draws.push(BatchDraw {
                batch_id: batch.batch_id,
                taken: batch.quantity,
                remaining: 0,
            });
            remaining -= batch.quantity;
        }
    }

    Ok(draws)
}
