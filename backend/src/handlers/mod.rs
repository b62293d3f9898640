//! HTTP request handlers

pub mod health;
pub mod products;
pub mod purchases;
pub mod sales;
pub mod stock;

pub use health::*;
pub use products::*;
pub use purchases::*;
pub use sales::*;
pub use stock::*;
