//! Validation utilities for the Stock Ledger platform
//!
//! Checks that the derive-based `validator` rules cannot express on their own.

use rust_decimal::Decimal;

use crate::models::{order_total, OrderLine, PurchaseLine};

/// Longest lot number accepted
pub const MAX_LOT_NUMBER_LEN: usize = 64;

/// Money columns are NUMERIC(14, 2): amounts stay below 10^12 with two decimals
pub const MAX_AMOUNT_SCALE: u32 = 2;

/// Exclusive upper bound for prices, costs and order totals
pub fn amount_limit() -> Decimal {
    Decimal::new(1_000_000_000_000, 0)
}

// ============================================================================
// Identifier Validations
// ============================================================================

/// Validate SKU format (letters, digits, '-', '_' and '.')
pub fn validate_sku(sku: &str) -> Result<(), &'static str> {
    let trimmed = sku.trim();
    if trimmed.is_empty() {
        return Err("SKU cannot be empty");
    }
    if trimmed.len() != sku.len() {
        return Err("SKU cannot start or end with whitespace");
    }
    if !sku
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err("SKU may only contain letters, digits, '-', '_' and '.'");
    }
    Ok(())
}

/// Validate an optional lot number
pub fn validate_lot_number(lot: Option<&str>) -> Result<(), &'static str> {
    match lot {
        Some(l) if l.trim().is_empty() => Err("Lot number cannot be blank"),
        Some(l) if l.chars().count() > MAX_LOT_NUMBER_LEN => {
            Err("Lot number must be at most 64 characters")
        }
        _ => Ok(()),
    }
}

// ============================================================================
// Order Validations
// ============================================================================

/// Validate a unit price or cost against the stored money range
pub fn validate_unit_amount(amount: Decimal) -> Result<(), &'static str> {
    if amount < Decimal::ZERO {
        return Err("Amount cannot be negative");
    }
    if amount >= amount_limit() {
        return Err("Amount must be less than 1000000000000");
    }
    if amount.normalize().scale() > MAX_AMOUNT_SCALE {
        return Err("Amount may have at most two decimal places");
    }
    Ok(())
}

/// Validate the lines of a sales order
pub fn validate_order_lines(lines: &[OrderLine]) -> Result<(), &'static str> {
    if lines.is_empty() {
        return Err("At least one item is required");
    }
    for line in lines {
        if line.quantity <= 0 {
            return Err("Quantity must be a positive integer");
        }
        validate_unit_amount(line.unit_price())?;
    }
    match order_total(lines) {
        Some(total) if total < amount_limit() => Ok(()),
        _ => Err("Order total must be less than 1000000000000"),
    }
}

/// Validate the lines of a purchase order
pub fn validate_purchase_lines(lines: &[PurchaseLine]) -> Result<(), &'static str> {
    if lines.is_empty() {
        return Err("At least one item is required");
    }
    for line in lines {
        if line.quantity <= 0 {
            return Err("Quantity must be a positive integer");
        }
        validate_unit_amount(line.unit_cost)?;
        validate_lot_number(line.lot_number.as_deref())?;
    }
    Ok(())
}
