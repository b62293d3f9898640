//! Stock validator
//!
//! Read-only pre-check run before any write transaction opens. Its figures may be
//! stale by the time the allocator runs; the allocator has the final word.

use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::{first_shortfall, LineAvailability, OrderLine};

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct StockValidator {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct AvailabilityRow {
    name: String,
    available: i64,
}

impl StockValidator {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Available stock for each line, in submission order
    pub async fn availability(
        &self,
        business_id: Uuid,
        lines: &[OrderLine],
    ) -> AppResult<Vec<LineAvailability>> {
        let mut result = Vec::with_capacity(lines.len());

        for line in lines {
            let row = sqlx::query_as::<_, AvailabilityRow>(
                r#"
                SELECT p.name,
                       COALESCE(SUM(b.quantity) FILTER (WHERE b.quantity > 0), 0)::BIGINT AS available
                FROM products p
                LEFT JOIN product_batches b
                       ON b.product_id = p.id AND b.business_id = p.business_id
                WHERE p.id = $1 AND p.business_id = $2
                GROUP BY p.id, p.name
                "#,
            )
            .bind(line.product_id)
            .bind(business_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

            result.push(LineAvailability {
                product_id: line.product_id,
                product_name: row.name,
                requested: i64::from(line.quantity),
                available: row.available,
            });
        }

        Ok(result)
    }

    /// Fail with the first line whose product cannot cover it
    pub async fn validate(&self, business_id: Uuid, lines: &[OrderLine]) -> AppResult<()> {
        let availability = self.availability(business_id, lines).await?;
        first_shortfall(&availability)?;
        Ok(())
    }
}
