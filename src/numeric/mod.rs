// ============================================================================
// Numeric Module
// Exact decimal arithmetic for prices and quantities
// ============================================================================
//
// This module provides:
// - Price/Quantity aliases over rust_decimal::Decimal
// - NumericError: Error types for arithmetic and parsing
// - Checked helpers used by the matching core
//
// Design principles:
// - No floating-point operations
// - Overflow is reported, never wrapped

mod errors;

pub use errors::{NumericError, NumericResult};

use rust_decimal::Decimal;
use std::str::FromStr;

/// Limit price of an order or execution price of a trade.
pub type Price = Decimal;

/// Base-asset quantity.
pub type Quantity = Decimal;

/// Parse a decimal from its canonical string form (`"0.00001255"`, `"111227.70"`).
pub fn parse_decimal(input: &str) -> NumericResult<Decimal> {
    Decimal::from_str(input.trim()).map_err(|_| NumericError::InvalidInput(input.to_string()))
}

/// `price × quantity`, failing instead of overflowing.
pub fn checked_notional(price: Price, quantity: Quantity) -> NumericResult<Decimal> {
    price.checked_mul(quantity).ok_or(NumericError::Overflow)
}
