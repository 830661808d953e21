//! Error types for numeric boundary validation
//!
//! The engine-level error taxonomy lives in the `exchange` crate; this module
//! only covers failures constructing the numeric newtypes.

use thiserror::Error;

/// Numeric construction and arithmetic errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NumericError {
    #[error("Value must be positive: {value}")]
    NotPositive { value: String },

    #[error("Arithmetic overflow in fixed-point calculation")]
    Overflow,
}
