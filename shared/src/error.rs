//! Errors raised by the pure stock logic

use thiserror::Error;

/// Errors produced without touching storage
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StockError {
    #[error("quantity must be a positive integer, got {0}")]
    InvalidQuantity(i64),

    #[error("insufficient stock: requested {requested}, available {available}")]
    Insufficient { requested: i64, available: i64 },

    #[error("cannot move purchase order from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("unknown status: {0}")]
    UnknownStatus(String),

    #[error("unknown movement reason: {0}")]
    UnknownReason(String),
}
