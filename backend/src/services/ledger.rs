//! Stock movement ledger
//!
//! Rows are only ever inserted, and only inside the transaction that changed the
//! batches they describe.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgExecutor, Postgres, Transaction};
use uuid::Uuid;

use shared::{NewStockMovement, StockError, StockMovement};

use crate::error::AppResult;

#[derive(Debug, FromRow)]
struct MovementRow {
    id: Uuid,
    business_id: Uuid,
    product_id: Uuid,
    quantity_change: i32,
    reason: String,
    reference_id: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<MovementRow> for StockMovement {
    type Error = StockError;

    fn try_from(row: MovementRow) -> Result<Self, Self::Error> {
        Ok(StockMovement {
            id: row.id,
            business_id: row.business_id,
            product_id: row.product_id,
            quantity_change: row.quantity_change,
            reason: row.reason.parse()?,
            reference_id: row.reference_id,
            created_at: row.created_at,
        })
    }
}

/// Append a movement. A failed insert fails the enclosing transaction.
pub async fn append(
    tx: &mut Transaction<'_, Postgres>,
    business_id: Uuid,
    movement: &NewStockMovement,
) -> AppResult<StockMovement> {
    let row = sqlx::query_as::<_, MovementRow>(
        r#"
        INSERT INTO stock_movements (business_id, product_id, quantity_change, reason, reference_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, business_id, product_id, quantity_change, reason, reference_id, created_at
        "#,
    )
    .bind(business_id)
    .bind(movement.product_id)
    .bind(movement.quantity_change)
    .bind(movement.reason.as_str())
    .bind(&movement.reference_id)
    .fetch_one(&mut **tx)
    .await?;

    tracing::debug!(
        product_id = %movement.product_id,
        quantity_change = movement.quantity_change,
        reason = %movement.reason,
        "stock movement appended"
    );

    Ok(row.try_into()?)
}

/// Movement history of a product, oldest first
pub async fn history<'e>(
    executor: impl PgExecutor<'e>,
    business_id: Uuid,
    product_id: Uuid,
) -> AppResult<Vec<StockMovement>> {
    let rows = sqlx::query_as::<_, MovementRow>(
        r#"
        SELECT id, business_id, product_id, quantity_change, reason, reference_id, created_at
        FROM stock_movements
        WHERE business_id = $1 AND product_id = $2
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(business_id)
    .bind(product_id)
    .fetch_all(executor)
    .await?;

    rows.into_iter()
        .map(|row| StockMovement::try_from(row).map_err(Into::into))
        .collect()
}
