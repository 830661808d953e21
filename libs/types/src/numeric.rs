//! Fixed-point decimal types for amounts and prices
//!
//! Uses rust_decimal for deterministic arithmetic (no floating-point errors).
//! Every multiplication and division is checked; overflow surfaces as an
//! error, never as a panic or a wrapped value.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::NumericError;

/// Base units per whole unit of value (the wire denomination: 1e18).
pub fn unit_scale() -> Decimal {
    Decimal::from(1_000_000_000_000_000_000u64)
}

/// Positive base-unit quantity of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    /// Validate and wrap a raw decimal. Rejects zero and negative values.
    pub fn try_new(value: Decimal) -> Result<Self, NumericError> {
        if value <= Decimal::ZERO {
            return Err(NumericError::NotPositive {
                value: value.to_string(),
            });
        }
        Ok(Self(value))
    }

    /// Get the inner decimal
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Positive base-unit price per unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Validate and wrap a raw decimal. Rejects zero and negative values.
    pub fn try_new(value: Decimal) -> Result<Self, NumericError> {
        if value <= Decimal::ZERO {
            return Err(NumericError::NotPositive {
                value: value.to_string(),
            });
        }
        Ok(Self(value))
    }

    /// Get the inner decimal
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Compute the escrow value of an order: `amount * price / scale`.
///
/// `scale` is the base-unit denomination (a positive power of ten, normally
/// [`unit_scale`]). Dividing the amount first keeps the intermediate product
/// inside the 96-bit decimal mantissa for wire-denominated inputs; the
/// division by a power of ten is exact.
pub fn escrow_value(amount: Amount, price: Price, scale: Decimal) -> Result<Decimal, NumericError> {
    let whole_units = amount
        .as_decimal()
        .checked_div(scale)
        .ok_or(NumericError::Overflow)?;
    whole_units
        .checked_mul(price.as_decimal())
        .ok_or(NumericError::Overflow)
}
