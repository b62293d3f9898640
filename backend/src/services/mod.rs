//! Business logic services for the Stock Ledger platform

pub mod allocator;
pub mod batch_store;
pub mod ledger;
pub mod products;
pub mod purchasing;
pub mod sales;
pub mod validator;

pub use products::{ProductService, StockLevel};
pub use purchasing::PurchaseOrderService;
pub use sales::SalesOrderService;
pub use validator::StockValidator;
