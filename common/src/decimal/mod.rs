//! Decimal type utilities for precise financial calculations

use rust_decimal::Decimal;
pub use rust_decimal_macros::dec;

use crate::error::{Error, Result};

/// Price type with high precision
pub type Price = Decimal;

/// Quantity type with high precision
pub type Quantity = Decimal;

/// Amount type with high precision (typically Price * Quantity)
pub type Amount = Decimal;

/// Convert a float coming from a foreign API into a decimal
pub fn from_f64(value: f64) -> Result<Decimal> {
    Decimal::try_from(value).map_err(|e| Error::DecimalError(format!("{} is not representable: {}", value, e)))
}

/// `lhs / rhs`, failing instead of panicking on a zero divisor or overflow
pub fn checked_div(lhs: Decimal, rhs: Decimal) -> Result<Decimal> {
    lhs.checked_div(rhs)
        .ok_or_else(|| Error::DecimalError(format!("Cannot divide {} by {}", lhs, rhs)))
}

/// `lhs * rhs`, failing instead of panicking on overflow
pub fn checked_mul(lhs: Decimal, rhs: Decimal) -> Result<Decimal> {
    lhs.checked_mul(rhs)
        .ok_or_else(|| Error::DecimalError(format!("Cannot multiply {} by {}", lhs, rhs)))
}
