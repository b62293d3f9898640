//! Batch store: product lots and the quantity derived from them
//!
//! A product's quantity is never stored. It is always `SUM(quantity)` over the
//! product's active batches, read in a single statement.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgConnection, PgExecutor};
use uuid::Uuid;

use shared::ProductBatch;

use crate::error::AppResult;

#[derive(Debug, FromRow)]
struct BatchRow {
    id: Uuid,
    product_id: Uuid,
    business_id: Uuid,
    lot_number: Option<String>,
    quantity: i32,
    expiry_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
}

impl From<BatchRow> for ProductBatch {
    fn from(row: BatchRow) -> Self {
        ProductBatch {
            id: row.id,
            product_id: row.product_id,
            business_id: row.business_id,
            lot_number: row.lot_number,
            quantity: row.quantity,
            expiry_date: row.expiry_date,
            created_at: row.created_at,
        }
    }
}

/// Fields of a batch about to be received
#[derive(Debug, Clone)]
pub struct NewBatch<'a> {
    pub product_id: Uuid,
    pub quantity: i32,
    pub lot_number: Option<&'a str>,
    pub expiry_date: Option<NaiveDate>,
}

/// Insert a batch inside the caller's transaction
pub async fn insert_batch(
    conn: &mut PgConnection,
    business_id: Uuid,
    batch: NewBatch<'_>,
) -> AppResult<ProductBatch> {
    let row = sqlx::query_as::<_, BatchRow>(
        r#"
        INSERT INTO product_batches (product_id, business_id, lot_number, quantity, expiry_date)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, product_id, business_id, lot_number, quantity, expiry_date, created_at
        "#,
    )
    .bind(batch.product_id)
    .bind(business_id)
    .bind(batch.lot_number)
    .bind(batch.quantity)
    .bind(batch.expiry_date)
    .fetch_one(&mut *conn)
    .await?;

    Ok(row.into())
}

/// Active batches of a product in FEFO order
pub async fn active_batches<'e>(
    executor: impl PgExecutor<'e>,
    business_id: Uuid,
    product_id: Uuid,
) -> AppResult<Vec<ProductBatch>> {
    let rows = sqlx::query_as::<_, BatchRow>(
        r#"
        SELECT id, product_id, business_id, lot_number, quantity, expiry_date, created_at
        FROM product_batches
        WHERE business_id = $1 AND product_id = $2 AND quantity > 0
        ORDER BY expiry_date ASC NULLS LAST, created_at ASC, id ASC
        "#,
    )
    .bind(business_id)
    .bind(product_id)
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

/// Active batches of a product in FEFO order, row-locked until the transaction ends.
///
/// Only the rows returned are locked; depleted batches stay unlocked.
pub async fn lock_active_batches(
    conn: &mut PgConnection,
    business_id: Uuid,
    product_id: Uuid,
) -> AppResult<Vec<ProductBatch>> {
    let rows = sqlx::query_as::<_, BatchRow>(
        r#"
        SELECT id, product_id, business_id, lot_number, quantity, expiry_date, created_at
        FROM product_batches
        WHERE business_id = $1 AND product_id = $2 AND quantity > 0
        ORDER BY expiry_date ASC NULLS LAST, created_at ASC, id ASC
        FOR UPDATE
        "#,
    )
    .bind(business_id)
    .bind(product_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

/// Take `taken` units from a locked batch
pub async fn decrement(conn: &mut PgConnection, batch_id: Uuid, taken: i32) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE product_batches
        SET quantity = quantity - $1
        WHERE id = $2
        "#,
    )
    .bind(taken)
    .bind(batch_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Derived quantity of a product
pub async fn derived_quantity<'e>(
    executor: impl PgExecutor<'e>,
    business_id: Uuid,
    product_id: Uuid,
) -> AppResult<i64> {
    let quantity: i64 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(quantity), 0)::BIGINT
        FROM product_batches
        WHERE business_id = $1 AND product_id = $2 AND quantity > 0
        "#,
    )
    .bind(business_id)
    .bind(product_id)
    .fetch_one(executor)
    .await?;

    Ok(quantity)
}
