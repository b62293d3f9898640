//! Audit events for committed stock mutations
//!
//! Each mutating operation reports exactly one event, after its transaction has
//! committed. Rolled-back work never reaches the hook.

use uuid::Uuid;

use shared::PurchaseOrderStatus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditEvent {
    ProductRegistered {
        business_id: Uuid,
        product_id: Uuid,
        sku: String,
        initial_quantity: i32,
    },
    StockReceived {
        business_id: Uuid,
        product_id: Uuid,
        batch_id: Uuid,
        quantity: i32,
    },
    SalesOrderCreated {
        business_id: Uuid,
        order_id: Uuid,
        lines: usize,
        units: i64,
    },
    PurchaseOrderCreated {
        business_id: Uuid,
        order_id: Uuid,
        lines: usize,
    },
    PurchaseOrderStatusChanged {
        business_id: Uuid,
        order_id: Uuid,
        from: PurchaseOrderStatus,
        to: PurchaseOrderStatus,
        batches_created: usize,
    },
    LowStockAcknowledged {
        business_id: Uuid,
        product_id: Uuid,
    },
}

/// Receives one event per committed mutation
pub trait AuditHook: Send + Sync {
    fn record(&self, event: &AuditEvent);
}

/// Writes audit events to the `stock_audit` tracing target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAudit;

impl AuditHook for TracingAudit {
    fn record(&self, event: &AuditEvent) {
        match event {
            AuditEvent::ProductRegistered {
                business_id,
                product_id,
                sku,
                initial_quantity,
            } => tracing::info!(
                target: "stock_audit",
                %business_id,
                %product_id,
                sku = %sku,
                initial_quantity,
                "product registered"
            ),
            AuditEvent::StockReceived {
                business_id,
                product_id,
                batch_id,
                quantity,
            } => tracing::info!(
                target: "stock_audit",
                %business_id,
                %product_id,
                %batch_id,
                quantity,
                "stock received"
            ),
            AuditEvent::SalesOrderCreated {
                business_id,
                order_id,
                lines,
                units,
            } => tracing::info!(
                target: "stock_audit",
                %business_id,
                %order_id,
                lines,
                units,
                "sales order created"
            ),
            AuditEvent::PurchaseOrderCreated {
                business_id,
                order_id,
                lines,
            } => tracing::info!(
                target: "stock_audit",
                %business_id,
                %order_id,
                lines,
                "purchase order created"
            ),
            AuditEvent::PurchaseOrderStatusChanged {
                business_id,
                order_id,
                from,
                to,
                batches_created,
            } => tracing::info!(
                target: "stock_audit",
                %business_id,
                %order_id,
                from = %from,
                to = %to,
                batches_created,
                "purchase order status changed"
            ),
            AuditEvent::LowStockAcknowledged {
                business_id,
                product_id,
            } => tracing::info!(
                target: "stock_audit",
                %business_id,
                %product_id,
                "low stock acknowledged"
            ),
        }
    }
}
