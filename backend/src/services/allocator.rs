//! FEFO allocator
//!
//! Consumes stock from a product's batches inside an open transaction. The
//! candidate batches are locked with `FOR UPDATE`, so two orders drawing on the
//! same product serialize while orders on other products proceed.

use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use shared::{plan_consumption, BatchDraw, BatchLevel, Shortfall, StockError};

use crate::error::{AppError, AppResult};
use crate::services::batch_store;

/// Take `quantity` units of a product, earliest expiry first.
///
/// On shortfall nothing has been written; the caller drops the transaction.
pub async fn consume(
    tx: &mut Transaction<'_, Postgres>,
    business_id: Uuid,
    product_id: Uuid,
    quantity: i32,
) -> AppResult<Vec<BatchDraw>> {
    let batches = batch_store::lock_active_batches(&mut **tx, business_id, product_id).await?;
    let levels: Vec<BatchLevel> = batches.iter().map(|b| b.level()).collect();

    let draws = match plan_consumption(&levels, quantity) {
        Ok(draws) => draws,
        Err(StockError::Insufficient {
            requested,
            available,
        }) => {
            let product_name = product_name(tx, business_id, product_id).await?;
            return Err(Shortfall {
                product_id,
                product_name,
                requested,
                available,
            }
            .into());
        }
        Err(e) => return Err(e.into()),
    };

    for draw in &draws {
        batch_store::decrement(&mut **tx, draw.batch_id, draw.taken).await?;
    }

    tracing::debug!(
        %product_id,
        quantity,
        batches = draws.len(),
        "stock consumed"
    );

    Ok(draws)
}

async fn product_name(
    tx: &mut Transaction<'_, Postgres>,
    business_id: Uuid,
    product_id: Uuid,
) -> AppResult<String> {
    sqlx::query_scalar::<_, String>("SELECT name FROM products WHERE id = $1 AND business_id = $2")
        .bind(product_id)
        .bind(business_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))
}
