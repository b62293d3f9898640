//! Product service: registration, manual stock entry and stock queries

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgConnection, PgExecutor, PgPool};
use uuid::Uuid;
use validator::Validate;

use shared::{
    initial_lot_number, validate_lot_number, validate_sku, BatchOverview, CreateProductInput,
    NewStockMovement, PaginatedResponse, Pagination, Product, ProductBatch, ProductStock,
    ReceiveStockInput, Reconciliation, StockMovement,
};

use crate::audit::{AuditEvent, AuditHook};
use crate::error::{is_unique_violation, AppError, AppResult};
use crate::services::batch_store::{self, NewBatch};
use crate::services::ledger;

#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
    audit: Arc<dyn AuditHook>,
}

/// Derived quantity of one product
#[derive(Debug, Clone, Serialize)]
pub struct StockLevel {
    pub product_id: Uuid,
    pub quantity: i64,
    pub min_stock: i32,
    pub below_minimum: bool,
}

#[derive(Debug, FromRow)]
struct ProductRow {
    id: Uuid,
    business_id: Uuid,
    sku: String,
    name: String,
    min_stock: i32,
    low_stock_notified: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            business_id: row.business_id,
            sku: row.sku,
            name: row.name,
            min_stock: row.min_stock,
            low_stock_notified: row.low_stock_notified,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ProductStockRow {
    #[sqlx(flatten)]
    product: ProductRow,
    quantity: i64,
}

impl From<ProductStockRow> for ProductStock {
    fn from(row: ProductStockRow) -> Self {
        ProductStock {
            product: row.product.into(),
            quantity: row.quantity,
        }
    }
}

const PRODUCT_STOCK_SELECT: &str = r#"
    SELECT p.id, p.business_id, p.sku, p.name, p.min_stock, p.low_stock_notified,
           p.created_at, p.updated_at,
           COALESCE((
               SELECT SUM(b.quantity)
               FROM product_batches b
               WHERE b.product_id = p.id AND b.business_id = p.business_id AND b.quantity > 0
           ), 0)::BIGINT AS quantity
    FROM products p
"#;

/// Load a product owned by the business, or `NotFound`
pub(crate) async fn require_product<'e>(
    executor: impl PgExecutor<'e>,
    business_id: Uuid,
    product_id: Uuid,
) -> AppResult<Product> {
    sqlx::query_as::<_, ProductRow>(
        r#"
        SELECT id, business_id, sku, name, min_stock, low_stock_notified, created_at, updated_at
        FROM products
        WHERE id = $1 AND business_id = $2
        "#,
    )
    .bind(product_id)
    .bind(business_id)
    .fetch_optional(executor)
    .await?
    .map(Into::into)
    .ok_or_else(|| AppError::NotFound("Product".to_string()))
}

/// Clear the low-stock flag after stock arrives
pub(crate) async fn reset_low_stock_flag(
    conn: &mut PgConnection,
    business_id: Uuid,
    product_id: Uuid,
) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE products
        SET low_stock_notified = FALSE
        WHERE id = $1 AND business_id = $2 AND low_stock_notified
        "#,
    )
    .bind(product_id)
    .bind(business_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

impl ProductService {
    pub fn new(db: PgPool, audit: Arc<dyn AuditHook>) -> Self {
        Self { db, audit }
    }

    /// Register a product, with its opening stock as an initial batch
    pub async fn register(
        &self,
        business_id: Uuid,
        input: CreateProductInput,
    ) -> AppResult<ProductStock> {
        input.validate()?;
        validate_sku(&input.sku).map_err(|m| AppError::validation("sku", m))?;

        let initial_quantity = input.initial_quantity.unwrap_or(0);

        let mut tx = self.db.begin().await?;

        let product: Product = sqlx::query_as::<_, ProductRow>(
            r#"
            INSERT INTO products (business_id, sku, name, min_stock)
            VALUES ($1, $2, $3, $4)
            RETURNING id, business_id, sku, name, min_stock, low_stock_notified, created_at, updated_at
            "#,
        )
        .bind(business_id)
        .bind(&input.sku)
        .bind(&input.name)
        .bind(input.min_stock)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateEntry("sku".to_string())
            } else {
                e.into()
            }
        })?
        .into();

        if initial_quantity > 0 {
            let lot = initial_lot_number(&product.sku);
            let batch = batch_store::insert_batch(
                &mut *tx,
                business_id,
                NewBatch {
                    product_id: product.id,
                    quantity: initial_quantity,
                    lot_number: Some(lot.as_str()),
                    expiry_date: None,
                },
            )
            .await?;

            ledger::append(
                &mut tx,
                business_id,
                &NewStockMovement::manual(product.id, initial_quantity, batch.id),
            )
            .await?;
        }

        tx.commit().await?;

        self.audit.record(&AuditEvent::ProductRegistered {
            business_id,
            product_id: product.id,
            sku: product.sku.clone(),
            initial_quantity,
        });

        Ok(ProductStock {
            product,
            quantity: i64::from(initial_quantity),
        })
    }

    /// Product with its derived quantity
    pub async fn get(&self, business_id: Uuid, product_id: Uuid) -> AppResult<ProductStock> {
        let query = format!("{} WHERE p.id = $1 AND p.business_id = $2", PRODUCT_STOCK_SELECT);
        let row = sqlx::query_as::<_, ProductStockRow>(&query)
            .bind(product_id)
            .bind(business_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        Ok(row.into())
    }

    /// List products with derived quantities, ordered by SKU
    pub async fn list(
        &self,
        business_id: Uuid,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<ProductStock>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE business_id = $1")
            .bind(business_id)
            .fetch_one(&self.db)
            .await?;

        let query = format!(
            "{} WHERE p.business_id = $1 ORDER BY p.sku ASC LIMIT $2 OFFSET $3",
            PRODUCT_STOCK_SELECT
        );
        let rows = sqlx::query_as::<_, ProductStockRow>(&query)
            .bind(business_id)
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(&self.db)
            .await?;

        Ok(PaginatedResponse::new(
            rows.into_iter().map(Into::into).collect(),
            pagination,
            u64::try_from(total).unwrap_or(0),
        ))
    }

    /// Derived quantity of a product
    pub async fn stock_level(&self, business_id: Uuid, product_id: Uuid) -> AppResult<StockLevel> {
        let stock = self.get(business_id, product_id).await?;
        Ok(StockLevel {
            product_id,
            quantity: stock.quantity,
            min_stock: stock.product.min_stock,
            below_minimum: stock.is_below_minimum(),
        })
    }

    /// Active batches in FEFO order with expiry figures
    pub async fn batch_overview(
        &self,
        business_id: Uuid,
        product_id: Uuid,
        today: NaiveDate,
        expiring_soon_days: i64,
    ) -> AppResult<BatchOverview> {
        require_product(&self.db, business_id, product_id).await?;
        let batches = batch_store::active_batches(&self.db, business_id, product_id).await?;
        Ok(BatchOverview::new(product_id, batches, today, expiring_soon_days))
    }

    /// Enter stock by hand as a new batch
    pub async fn receive_stock(
        &self,
        business_id: Uuid,
        product_id: Uuid,
        input: ReceiveStockInput,
    ) -> AppResult<ProductBatch> {
        input.validate()?;
        validate_lot_number(input.lot_number.as_deref())
            .map_err(|m| AppError::validation("lot_number", m))?;

        let mut tx = self.db.begin().await?;

        require_product(&mut *tx, business_id, product_id).await?;

        let batch = batch_store::insert_batch(
            &mut *tx,
            business_id,
            NewBatch {
                product_id,
                quantity: input.quantity,
                lot_number: input.lot_number.as_deref(),
                expiry_date: input.expiry_date,
            },
        )
        .await?;

        ledger::append(
            &mut tx,
            business_id,
            &NewStockMovement::manual(product_id, input.quantity, batch.id),
        )
        .await?;

        reset_low_stock_flag(&mut *tx, business_id, product_id).await?;

        tx.commit().await?;

        self.audit.record(&AuditEvent::StockReceived {
            business_id,
            product_id,
            batch_id: batch.id,
            quantity: batch.quantity,
        });

        Ok(batch)
    }

    /// Ledger history of a product, oldest first
    pub async fn movements(
        &self,
        business_id: Uuid,
        product_id: Uuid,
    ) -> AppResult<Vec<StockMovement>> {
        require_product(&self.db, business_id, product_id).await?;
        ledger::history(&self.db, business_id, product_id).await
    }

    /// Compare the ledger sum with the batch sum
    pub async fn reconciliation(
        &self,
        business_id: Uuid,
        product_id: Uuid,
    ) -> AppResult<Reconciliation> {
        require_product(&self.db, business_id, product_id).await?;

        let (ledger_total, batch_total): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COALESCE((
                    SELECT SUM(quantity_change) FROM stock_movements
                    WHERE business_id = $1 AND product_id = $2
                ), 0)::BIGINT,
                COALESCE((
                    SELECT SUM(quantity) FROM product_batches
                    WHERE business_id = $1 AND product_id = $2
                ), 0)::BIGINT
            "#,
        )
        .bind(business_id)
        .bind(product_id)
        .fetch_one(&self.db)
        .await?;

        let result = Reconciliation::new(product_id, ledger_total, batch_total);
        if !result.consistent {
            tracing::warn!(
                %product_id,
                ledger_total,
                batch_total,
                "ledger and batches disagree"
            );
        }

        Ok(result)
    }

    /// Products below their minimum that have not been acknowledged yet
    pub async fn low_stock(&self, business_id: Uuid) -> AppResult<Vec<ProductStock>> {
        let query = format!(
            "SELECT * FROM ({} WHERE p.business_id = $1) s \
             WHERE s.quantity < s.min_stock AND NOT s.low_stock_notified \
             ORDER BY s.sku ASC",
            PRODUCT_STOCK_SELECT
        );
        let rows = sqlx::query_as::<_, ProductStockRow>(&query)
            .bind(business_id)
            .fetch_all(&self.db)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Mark a low-stock alert as seen until the product is replenished
    pub async fn acknowledge_low_stock(
        &self,
        business_id: Uuid,
        product_id: Uuid,
    ) -> AppResult<ProductStock> {
        let updated = sqlx::query(
            r#"
            UPDATE products
            SET low_stock_notified = TRUE
            WHERE id = $1 AND business_id = $2
            "#,
        )
        .bind(product_id)
        .bind(business_id)
        .execute(&self.db)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }

        self.audit.record(&AuditEvent::LowStockAcknowledged {
            business_id,
            product_id,
        });

        self.get(business_id, product_id).await
    }
}
