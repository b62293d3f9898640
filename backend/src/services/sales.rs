//! Sales order service
//!
//! Creating an order is all-or-nothing: the header, every line, every batch
//! decrement and every ledger row commit together or not at all.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use shared::{
    order_total, validate_order_lines, CreateSalesOrderInput, NewStockMovement, OrderItem,
    PaginatedResponse, Pagination, SalesOrder, SalesOrderStatus, SalesOrderWithItems, StockError,
};

use crate::audit::{AuditEvent, AuditHook};
use crate::error::{AppError, AppResult};
use crate::services::{allocator, ledger, StockValidator};

#[derive(Clone)]
pub struct SalesOrderService {
    db: PgPool,
    audit: Arc<dyn AuditHook>,
}

#[derive(Debug, FromRow)]
struct SalesOrderRow {
    id: Uuid,
    business_id: Uuid,
    customer_id: Option<Uuid>,
    status: String,
    order_date: DateTime<Utc>,
    total_amount: Option<Decimal>,
}

impl TryFrom<SalesOrderRow> for SalesOrder {
    type Error = StockError;

    fn try_from(row: SalesOrderRow) -> Result<Self, Self::Error> {
        Ok(SalesOrder {
            id: row.id,
            business_id: row.business_id,
            customer_id: row.customer_id,
            status: row.status.parse()?,
            order_date: row.order_date,
            total_amount: row.total_amount,
        })
    }
}

#[derive(Debug, FromRow)]
struct OrderItemRow {
    id: Uuid,
    order_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    unit_price: Decimal,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        OrderItem {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            quantity: row.quantity,
            unit_price: row.unit_price,
        }
    }
}

impl SalesOrderService {
    pub fn new(db: PgPool, audit: Arc<dyn AuditHook>) -> Self {
        Self { db, audit }
    }

    /// Create a sales order, consuming stock FEFO for every line
    pub async fn create(
        &self,
        business_id: Uuid,
        input: CreateSalesOrderInput,
    ) -> AppResult<SalesOrderWithItems> {
        input.validate()?;
        validate_order_lines(&input.items).map_err(|m| AppError::validation("items", m))?;
        let total = order_total(&input.items)
            .ok_or_else(|| AppError::validation("items", "Order total is out of range"))?;

        StockValidator::new(self.db.clone())
            .validate(business_id, &input.items)
            .await?;

        let mut tx = self.db.begin().await?;

        let order: SalesOrder = sqlx::query_as::<_, SalesOrderRow>(
            r#"
            INSERT INTO sales_orders (business_id, customer_id, status, total_amount)
            VALUES ($1, $2, $3, $4)
            RETURNING id, business_id, customer_id, status, order_date, total_amount
            "#,
        )
        .bind(business_id)
        .bind(input.customer_id)
        .bind(SalesOrderStatus::Pending.as_str())
        .bind(total)
        .fetch_one(&mut *tx)
        .await?
        .try_into()?;

        let mut items = Vec::with_capacity(input.items.len());

        for (position, line) in input.items.iter().enumerate() {
            // Dropping `tx` on any error below rolls back every earlier line
            allocator::consume(&mut tx, business_id, line.product_id, line.quantity).await?;

            let item = sqlx::query_as::<_, OrderItemRow>(
                r#"
                INSERT INTO order_items (order_id, product_id, quantity, unit_price, position)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, order_id, product_id, quantity, unit_price
                "#,
            )
            .bind(order.id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.unit_price())
            .bind(position as i32)
            .fetch_one(&mut *tx)
            .await?;

            ledger::append(
                &mut tx,
                business_id,
                &NewStockMovement::sale(line.product_id, line.quantity, order.id),
            )
            .await?;

            items.push(item.into());
        }

        tx.commit().await?;

        self.audit.record(&AuditEvent::SalesOrderCreated {
            business_id,
            order_id: order.id,
            lines: items.len(),
            units: input.items.iter().map(|l| i64::from(l.quantity)).sum(),
        });

        Ok(SalesOrderWithItems { order, items })
    }

    /// Get a sales order with its lines
    pub async fn get(&self, business_id: Uuid, order_id: Uuid) -> AppResult<SalesOrderWithItems> {
        let order: SalesOrder = sqlx::query_as::<_, SalesOrderRow>(
            r#"
            SELECT id, business_id, customer_id, status, order_date, total_amount
            FROM sales_orders
            WHERE id = $1 AND business_id = $2
            "#,
        )
        .bind(order_id)
        .bind(business_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Sales order".to_string()))?
        .try_into()?;

        let items = sqlx::query_as::<_, OrderItemRow>(
            r#"
            SELECT id, order_id, product_id, quantity, unit_price
            FROM order_items
            WHERE order_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.db)
        .await?;

        Ok(SalesOrderWithItems {
            order,
            items: items.into_iter().map(Into::into).collect(),
        })
    }

    /// List sales orders, newest first
    pub async fn list(
        &self,
        business_id: Uuid,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<SalesOrder>> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sales_orders WHERE business_id = $1")
                .bind(business_id)
                .fetch_one(&self.db)
                .await?;

        let rows = sqlx::query_as::<_, SalesOrderRow>(
            r#"
            SELECT id, business_id, customer_id, status, order_date, total_amount
            FROM sales_orders
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
            .map(SalesOrder::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PaginatedResponse::new(
            orders,
            pagination,
            u64::try_from(total).unwrap_or(0),
        ))
    }
}
