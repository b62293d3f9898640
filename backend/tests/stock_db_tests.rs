//! Database-backed stock tests
//!
//! Each test gets a fresh PostgreSQL database with the migrations applied.
//! Run with `DATABASE_URL=postgres://... cargo test -- --ignored`.

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use shared::{
    CreateProductInput, CreatePurchaseOrderInput, CreateSalesOrderInput, MovementReason,
    OrderLine, PurchaseLine, PurchaseOrderStatus, ReceiveStockInput,
};
use sqlx::PgPool;
use stock_ledger_backend::{
    services::{ProductService, PurchaseOrderService, SalesOrderService, StockValidator},
    AppError, AuditEvent, AuditHook,
};
use tokio_test::{assert_err, assert_ok};
use uuid::Uuid;

#[derive(Default)]
struct RecordingAudit {
    events: Mutex<Vec<AuditEvent>>,
}

impl AuditHook for RecordingAudit {
    fn record(&self, event: &AuditEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

impl RecordingAudit {
    fn count(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

struct Fixture {
    business_id: Uuid,
    audit: Arc<RecordingAudit>,
    products: ProductService,
    sales: SalesOrderService,
    purchases: PurchaseOrderService,
}

fn fixture(pool: &PgPool) -> Fixture {
    let audit = Arc::new(RecordingAudit::default());
    Fixture {
        business_id: Uuid::new_v4(),
        products: ProductService::new(pool.clone(), audit.clone()),
        sales: SalesOrderService::new(pool.clone(), audit.clone()),
        purchases: PurchaseOrderService::new(pool.clone(), audit.clone()),
        audit,
    }
}

async fn product(f: &Fixture, sku: &str, min_stock: i32) -> Uuid {
    f.products
        .register(
            f.business_id,
            CreateProductInput {
                sku: sku.to_string(),
                name: format!("Product {}", sku),
                min_stock,
                initial_quantity: None,
            },
        )
        .await
        .unwrap()
        .product
        .id
}

async fn receive(f: &Fixture, product_id: Uuid, quantity: i32, expiry: Option<NaiveDate>) -> Uuid {
    f.products
        .receive_stock(
            f.business_id,
            product_id,
            ReceiveStockInput {
                quantity,
                lot_number: None,
                expiry_date: expiry,
            },
        )
        .await
        .unwrap()
        .id
}

async fn batch_quantity(pool: &PgPool, batch_id: Uuid) -> i32 {
    sqlx::query_scalar("SELECT quantity FROM product_batches WHERE id = $1")
        .bind(batch_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

fn order(lines: &[(Uuid, i32)]) -> CreateSalesOrderInput {
    CreateSalesOrderInput {
        customer_id: None,
        items: lines
            .iter()
            .map(|(product_id, quantity)| OrderLine {
                product_id: *product_id,
                quantity: *quantity,
                unit_price: Some(Decimal::new(100, 2)),
            })
            .collect(),
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_sale_drains_earliest_expiry_first(pool: PgPool) -> anyhow::Result<()> {
    let f = fixture(&pool);
    let p = product(&f, "MILK-1L", 0).await;
    let b1 = receive(&f, p, 3, NaiveDate::from_ymd_opt(2024, 1, 10)).await;
    let b2 = receive(&f, p, 10, None).await;

    let created = assert_ok!(f.sales.create(f.business_id, order(&[(p, 5)])).await);

    assert_eq!(batch_quantity(&pool, b1).await, 0);
    assert_eq!(batch_quantity(&pool, b2).await, 8);

    let history = f.products.movements(f.business_id, p).await?;
    let sale = history.last().unwrap();
    assert_eq!(sale.quantity_change, -5);
    assert_eq!(sale.reason, MovementReason::SalesOrder);
    assert_eq!(sale.reference_id, created.order.id.to_string());

    let reconciliation = f.products.reconciliation(f.business_id, p).await?;
    assert!(reconciliation.consistent);
    assert_eq!(reconciliation.batch_total, 8);
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_failed_line_rolls_back_whole_order(pool: PgPool) -> anyhow::Result<()> {
    let f = fixture(&pool);
    let p = product(&f, "BEANS-250", 0).await;
    let batch = receive(&f, p, 10, None).await;
    let events_before = f.audit.count();

    // Each line alone fits, together they do not
    let result = f.sales.create(f.business_id, order(&[(p, 6), (p, 6)])).await;

    match result {
        Err(AppError::InsufficientStock(s)) => {
            assert_eq!(s.requested, 6);
            assert_eq!(s.available, 4);
            assert_eq!(s.product_name, "Product BEANS-250");
        }
        other => panic!("expected shortfall, got {:?}", other.map(|o| o.order.id)),
    }

    assert_eq!(batch_quantity(&pool, batch).await, 10);
    let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales_orders")
        .fetch_one(&pool)
        .await?;
    assert_eq!(orders, 0);
    let sales_rows: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM stock_movements WHERE reason = 'SALES_ORDER'")
            .fetch_one(&pool)
            .await?;
    assert_eq!(sales_rows, 0);
    assert_eq!(f.audit.count(), events_before);
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_concurrent_orders_never_oversell(pool: PgPool) -> anyhow::Result<()> {
    let f = fixture(&pool);
    let p = product(&f, "FLOUR-1KG", 0).await;
    let batch = receive(&f, p, 10, None).await;

    let (a, b) = tokio::join!(
        f.sales.create(f.business_id, order(&[(p, 6)])),
        f.sales.create(f.business_id, order(&[(p, 6)])),
    );

    let results = [a, b];
    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(succeeded, 1);

    let failure = results.into_iter().find_map(|r| r.err()).unwrap();
    match failure {
        AppError::InsufficientStock(s) => assert_eq!(s.available, 4),
        other => panic!("expected shortfall, got {}", other),
    }

    assert_eq!(batch_quantity(&pool, batch).await, 4);
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_purchase_completion_creates_batches_once(pool: PgPool) -> anyhow::Result<()> {
    let f = fixture(&pool);
    let p = product(&f, "SUGAR-500", 0).await;

    let po = f
        .purchases
        .create(
            f.business_id,
            CreatePurchaseOrderInput {
                supplier_id: None,
                items: vec![PurchaseLine {
                    product_id: p,
                    quantity: 20,
                    unit_cost: Decimal::new(250, 2),
                    lot_number: Some("L1".to_string()),
                    expiry_date: None,
                }],
            },
        )
        .await?;
    assert_eq!(f.products.stock_level(f.business_id, p).await?.quantity, 0);

    let completed = f
        .purchases
        .update_status(f.business_id, po.order.id, PurchaseOrderStatus::Completed)
        .await?;
    assert_eq!(completed.order.status, PurchaseOrderStatus::Completed);
    let events_after_first = f.audit.count();

    f.purchases
        .update_status(f.business_id, po.order.id, PurchaseOrderStatus::Completed)
        .await?;
    assert_eq!(f.audit.count(), events_after_first);

    let overview = f
        .products
        .batch_overview(f.business_id, p, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 30)
        .await?;
    assert_eq!(overview.batches.len(), 1);
    assert_eq!(overview.batches[0].quantity, 20);
    assert_eq!(overview.batches[0].lot_number.as_deref(), Some("L1"));

    let history = f.products.movements(f.business_id, p).await?;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].quantity_change, 20);
    assert_eq!(history[0].reason, MovementReason::PurchaseOrder);

    let reopened = f
        .purchases
        .update_status(f.business_id, po.order.id, PurchaseOrderStatus::Pending)
        .await;
    assert!(matches!(reopened, Err(AppError::InvalidStateTransition(_))));
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_concurrent_completion_receives_stock_once(pool: PgPool) -> anyhow::Result<()> {
    let f = fixture(&pool);
    let p = product(&f, "RICE-5KG", 0).await;

    let po = f
        .purchases
        .create(
            f.business_id,
            CreatePurchaseOrderInput {
                supplier_id: None,
                items: vec![PurchaseLine {
                    product_id: p,
                    quantity: 20,
                    unit_cost: Decimal::new(900, 2),
                    lot_number: Some("L7".to_string()),
                    expiry_date: None,
                }],
            },
        )
        .await?;
    let events_before = f.audit.count();

    let (a, b) = tokio::join!(
        f.purchases
            .update_status(f.business_id, po.order.id, PurchaseOrderStatus::Completed),
        f.purchases
            .update_status(f.business_id, po.order.id, PurchaseOrderStatus::Completed),
    );
    assert_ok!(a);
    assert_ok!(b);

    let batches: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM product_batches WHERE product_id = $1")
            .bind(p)
            .fetch_one(&pool)
            .await?;
    assert_eq!(batches, 1);

    let receipts: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM stock_movements WHERE product_id = $1 AND reason = 'PURCHASE_ORDER'",
    )
    .bind(p)
    .fetch_one(&pool)
    .await?;
    assert_eq!(receipts, 1);

    assert_eq!(f.products.stock_level(f.business_id, p).await?.quantity, 20);
    assert_eq!(f.audit.count(), events_before + 1);
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_out_of_range_price_is_a_validation_error(pool: PgPool) -> anyhow::Result<()> {
    let f = fixture(&pool);
    let p = product(&f, "SALT-1KG", 0).await;
    let batch = receive(&f, p, 5, None).await;

    let input = CreateSalesOrderInput {
        customer_id: None,
        items: vec![OrderLine {
            product_id: p,
            quantity: 1,
            unit_price: Some(Decimal::new(10_000_000_000_000, 0)),
        }],
    };
    let result = f.sales.create(f.business_id, input).await;
    assert!(matches!(result, Err(AppError::Validation { .. })));

    assert_eq!(batch_quantity(&pool, batch).await, 5);
    let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales_orders WHERE business_id = $1")
        .bind(f.business_id)
        .fetch_one(&pool)
        .await?;
    assert_eq!(orders, 0);
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_revalidation_without_writes_is_stable(pool: PgPool) -> anyhow::Result<()> {
    let f = fixture(&pool);
    let p = product(&f, "TEA-20", 0).await;
    receive(&f, p, 2, None).await;

    let validator = StockValidator::new(pool.clone());
    let lines = order(&[(p, 5)]).items;

    let first = validator.availability(f.business_id, &lines).await?;
    let second = validator.availability(f.business_id, &lines).await?;
    assert_eq!(first, second);
    assert_eq!(first[0].available, 2);

    assert!(matches!(
        validator.validate(f.business_id, &lines).await,
        Err(AppError::InsufficientStock(_))
    ));
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_other_tenants_products_are_invisible(pool: PgPool) -> anyhow::Result<()> {
    let f = fixture(&pool);
    let p = product(&f, "SALT-1", 0).await;
    receive(&f, p, 5, None).await;

    let stranger = Uuid::new_v4();
    let err = assert_err!(f.sales.create(stranger, order(&[(p, 1)])).await);
    assert!(matches!(err, AppError::NotFound(_)));
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_registration_records_opening_stock(pool: PgPool) -> anyhow::Result<()> {
    let f = fixture(&pool);

    let registered = f
        .products
        .register(
            f.business_id,
            CreateProductInput {
                sku: "RICE-5KG".to_string(),
                name: "Rice 5kg".to_string(),
                min_stock: 2,
                initial_quantity: Some(12),
            },
        )
        .await?;
    let id = registered.product.id;

    let overview = f
        .products
        .batch_overview(f.business_id, id, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 30)
        .await?;
    assert_eq!(overview.batches[0].lot_number.as_deref(), Some("INITIAL-RICE-5KG"));

    let history = f.products.movements(f.business_id, id).await?;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].reason, MovementReason::ManualAdjustment);
    assert_eq!(history[0].reference_id, overview.batches[0].id.to_string());

    let duplicate = f
        .products
        .register(
            f.business_id,
            CreateProductInput {
                sku: "RICE-5KG".to_string(),
                name: "Rice again".to_string(),
                min_stock: 0,
                initial_quantity: None,
            },
        )
        .await;
    assert!(matches!(duplicate, Err(AppError::DuplicateEntry(_))));
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_low_stock_flag_cycle(pool: PgPool) -> anyhow::Result<()> {
    let f = fixture(&pool);
    let p = product(&f, "OIL-1L", 5).await;
    receive(&f, p, 2, None).await;

    let low = f.products.low_stock(f.business_id).await?;
    assert_eq!(low.len(), 1);
    assert_eq!(low[0].quantity, 2);

    f.products.acknowledge_low_stock(f.business_id, p).await?;
    assert!(f.products.low_stock(f.business_id).await?.is_empty());

    // New stock clears the acknowledgement; still below minimum so it reappears
    receive(&f, p, 1, None).await;
    let low = f.products.low_stock(f.business_id).await?;
    assert_eq!(low.len(), 1);
    assert_eq!(low[0].quantity, 3);
    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_ledger_rows_cannot_be_rewritten(pool: PgPool) -> anyhow::Result<()> {
    let f = fixture(&pool);
    let p = product(&f, "VINEGAR", 0).await;
    receive(&f, p, 4, None).await;

    let update = sqlx::query("UPDATE stock_movements SET quantity_change = 400")
        .execute(&pool)
        .await;
    assert!(update.is_err());

    let delete = sqlx::query("DELETE FROM stock_movements").execute(&pool).await;
    assert!(delete.is_err());
    Ok(())
}
