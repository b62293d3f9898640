//! Purchase order service
//!
//! Completing a purchase order turns its lines into batches. The header row is
//! locked for the whole status change, so concurrent completions of one order
//! serialize and only the first one receives stock.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use shared::{
    plan_transition, validate_purchase_lines, CreatePurchaseOrderInput, NewStockMovement,
    PaginatedResponse, Pagination, PurchaseOrder, PurchaseOrderItem, PurchaseOrderStatus,
    PurchaseOrderWithItems, StockError, TransitionEffect,
};

use crate::audit::{AuditEvent, AuditHook};
use crate::error::{AppError, AppResult};
use crate::services::batch_store::{self, NewBatch};
use crate::services::ledger;
use crate::services::products::{require_product, reset_low_stock_flag};

#[derive(Clone)]
pub struct PurchaseOrderService {
    db: PgPool,
    audit: Arc<dyn AuditHook>,
}

#[derive(Debug, FromRow)]
struct PurchaseOrderRow {
    id: Uuid,
    business_id: Uuid,
    supplier_id: Option<Uuid>,
    status: String,
    order_date: DateTime<Utc>,
}

impl TryFrom<PurchaseOrderRow> for PurchaseOrder {
    type Error = StockError;

    fn try_from(row: PurchaseOrderRow) -> Result<Self, Self::Error> {
        Ok(PurchaseOrder {
            id: row.id,
            business_id: row.business_id,
            supplier_id: row.supplier_id,
            status: row.status.parse()?,
            order_date: row.order_date,
        })
    }
}

#[derive(Debug, FromRow)]
struct PurchaseItemRow {
    id: Uuid,
    purchase_order_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    unit_cost: Decimal,
    lot_number: Option<String>,
    expiry_date: Option<NaiveDate>,
}

impl From<PurchaseItemRow> for PurchaseOrderItem {
    fn from(row: PurchaseItemRow) -> Self {
        PurchaseOrderItem {
            id: row.id,
            purchase_order_id: row.purchase_order_id,
            product_id: row.product_id,
            quantity: row.quantity,
            unit_cost: row.unit_cost,
            lot_number: row.lot_number,
            expiry_date: row.expiry_date,
        }
    }
}

impl PurchaseOrderService {
    pub fn new(db: PgPool, audit: Arc<dyn AuditHook>) -> Self {
        Self { db, audit }
    }

    /// Create a pending purchase order. Stock is untouched until completion.
    pub async fn create(
        &self,
        business_id: Uuid,
        input: CreatePurchaseOrderInput,
    ) -> AppResult<PurchaseOrderWithItems> {
        input.validate()?;
        validate_purchase_lines(&input.items).map_err(|m| AppError::validation("items", m))?;

        let mut tx = self.db.begin().await?;

        for line in &input.items {
            require_product(&mut *tx, business_id, line.product_id).await?;
        }

        let order: PurchaseOrder = sqlx::query_as::<_, PurchaseOrderRow>(
            r#"
            INSERT INTO purchase_orders (business_id, supplier_id, status)
            VALUES ($1, $2, $3)
            RETURNING id, business_id, supplier_id, status, order_date
            "#,
        )
        .bind(business_id)
        .bind(input.supplier_id)
        .bind(PurchaseOrderStatus::Pending.as_str())
        .fetch_one(&mut *tx)
        .await?
        .try_into()?;

        let mut items = Vec::with_capacity(input.items.len());
        for (position, line) in input.items.iter().enumerate() {
            let item = sqlx::query_as::<_, PurchaseItemRow>(
                r#"
                INSERT INTO purchase_order_items
                    (purchase_order_id, product_id, quantity, unit_cost, lot_number, expiry_date, position)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING id, purchase_order_id, product_id, quantity, unit_cost, lot_number, expiry_date
                "#,
            )
            .bind(order.id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.unit_cost)
            .bind(&line.lot_number)
            .bind(line.expiry_date)
            .bind(position as i32)
            .fetch_one(&mut *tx)
            .await?;

            items.push(item.into());
        }

        tx.commit().await?;

        self.audit.record(&AuditEvent::PurchaseOrderCreated {
            business_id,
            order_id: order.id,
            lines: items.len(),
        });

        Ok(PurchaseOrderWithItems { order, items })
    }

    /// Move a purchase order to a new status.
    ///
    /// Completing a pending order creates one batch and one positive ledger row
    /// per line. Completing an already completed order changes nothing.
    pub async fn update_status(
        &self,
        business_id: Uuid,
        order_id: Uuid,
        new_status: PurchaseOrderStatus,
    ) -> AppResult<PurchaseOrderWithItems> {
        let mut tx = self.db.begin().await?;

        let current: PurchaseOrderStatus = sqlx::query_scalar::<_, String>(
            r#"
            SELECT status
            FROM purchase_orders
            WHERE id = $1 AND business_id = $2
            FOR UPDATE
            "#,
        )
        .bind(order_id)
        .bind(business_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase order".to_string()))?
        .parse()?;

        let effect = plan_transition(current, new_status)?;

        if effect == TransitionEffect::NoOp {
            tx.commit().await?;
            tracing::debug!(%order_id, status = %current, "purchase order status unchanged");
            return self.get(business_id, order_id).await;
        }

        let mut batches_created = 0;

        if effect == TransitionEffect::ReceiveStock {
            let items = self.items(&mut *tx, order_id).await?;

            for item in &items {
                let batch = batch_store::insert_batch(
                    &mut *tx,
                    business_id,
                    NewBatch {
                        product_id: item.product_id,
                        quantity: item.quantity,
                        lot_number: item.lot_number.as_deref(),
                        expiry_date: item.expiry_date,
                    },
                )
                .await?;

                reset_low_stock_flag(&mut *tx, business_id, item.product_id).await?;

                ledger::append(
                    &mut tx,
                    business_id,
                    &NewStockMovement::purchase(item.product_id, batch.quantity, order_id),
                )
                .await?;

                batches_created += 1;
            }
        }

        sqlx::query(
            r#"
            UPDATE purchase_orders
            SET status = $1
            WHERE id = $2 AND business_id = $3
            "#,
        )
        .bind(new_status.as_str())
        .bind(order_id)
        .bind(business_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.audit.record(&AuditEvent::PurchaseOrderStatusChanged {
            business_id,
            order_id,
            from: current,
            to: new_status,
            batches_created,
        });

        self.get(business_id, order_id).await
    }

    /// Get a purchase order with its lines
    pub async fn get(
        &self,
        business_id: Uuid,
        order_id: Uuid,
    ) -> AppResult<PurchaseOrderWithItems> {
        let order: PurchaseOrder = sqlx::query_as::<_, PurchaseOrderRow>(
            r#"
            SELECT id, business_id, supplier_id, status, order_date
            FROM purchase_orders
            WHERE id = $1 AND business_id = $2
            "#,
        )
        .bind(order_id)
        .bind(business_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase order".to_string()))?
        .try_into()?;

        let mut conn = self.db.acquire().await?;
        let items = self.items(&mut *conn, order_id).await?;

        Ok(PurchaseOrderWithItems { order, items })
    }

    /// List purchase orders, newest first
    pub async fn list(
        &self,
        business_id: Uuid,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<PurchaseOrder>> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM purchase_orders WHERE business_id = $1")
                .bind(business_id)
                .fetch_one(&self.db)
                .await?;

        let rows = sqlx::query_as::<_, PurchaseOrderRow>(
            r#"
            SELECT id, business_id, supplier_id, status, order_date
            FROM purchase_orders
            WHERE business_id = $1
            ORDER BY order_date DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(business_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        let orders = rows
            .into_iter()
            .map(PurchaseOrder::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PaginatedResponse::new(
            orders,
            pagination,
            u64::try_from(total).unwrap_or(0),
        ))
    }

    async fn items(
        &self,
        conn: &mut sqlx::PgConnection,
        order_id: Uuid,
    ) -> AppResult<Vec<PurchaseOrderItem>> {
        let rows = sqlx::query_as::<_, PurchaseItemRow>(
            r#"
            SELECT id, purchase_order_id, product_id, quantity, unit_cost, lot_number, expiry_date
            FROM purchase_order_items
            WHERE purchase_order_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
