//! Shared types and pure stock logic for the Stock Ledger platform
//!
//! This crate holds everything that does not need a database connection: the
//! domain models, the FEFO consumption planner, shortfall detection, purchase
//! order status rules and input validation. The backend wraps these in
//! transactions.

pub mod error;
pub mod fefo;
pub mod models;
pub mod stock;
pub mod types;
pub mod validation;

pub use error::*;
pub use fefo::*;
pub use models::*;
pub use stock::*;
pub use types::*;
pub use validation::*;
