//! Domain models for the Stock Ledger platform

mod batch;
mod movement;
mod product;
mod purchase;
mod sales;

pub use batch::*;
pub use movement::*;
pub use product::*;
pub use purchase::*;
pub use sales::*;
