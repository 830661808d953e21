//! Engine error taxonomy
//!
//! Every failure is a local validation error detected before any mutation;
//! a failed request aborts with zero state change and the reason is surfaced
//! verbatim to the caller. Nothing is retried and nothing is partially
//! applied.

use thiserror::Error;

/// Ledger-specific errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: String, available: String },

    #[error("Escrow invariant violated for {account_id}: held {held}, requested {requested}")]
    InvariantViolation {
        account_id: String,
        held: String,
        requested: String,
    },

    #[error("Arithmetic overflow in balance calculation")]
    ArithmeticOverflow,
}

/// Order store errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrderStoreError {
    #[error("Unknown order: {order_id}")]
    UnknownOrder { order_id: String },

    #[error("Duplicate order: {order_id}")]
    DuplicateOrder { order_id: String },

    #[error("Order already in terminal state: {state}")]
    AlreadyTerminal { state: String },

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}

/// Top-level engine error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExchangeError {
    #[error("Attached value mismatch: expected {expected}, attached {attached}")]
    ValueMismatch { expected: String, attached: String },

    #[error("Order amount must be positive: {value}")]
    InvalidAmount { value: String },

    #[error("Order price must be positive: {value}")]
    InvalidPrice { value: String },

    #[error("Caller {caller} does not own order {order_id}")]
    NotOwner { caller: String, order_id: String },

    #[error("Arithmetic overflow computing order value")]
    ArithmeticOverflow,

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Order error: {0}")]
    Orders(#[from] OrderStoreError),
}
