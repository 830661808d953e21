//! Account balance types
//!
//! A balance has two buckets: `free` (spendable) and `escrowed` (locked
//! against open orders). All mutation goes through the ledger, which
//! validates before applying; the type itself only carries the buckets and
//! their invariant checks.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-account fund buckets.
///
/// Invariant: both buckets are non-negative, and `escrowed` always equals
/// the sum of the escrow values of the account's open orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub free: Decimal,
    pub escrowed: Decimal,
}

impl Balance {
    /// Create an empty balance.
    pub fn new() -> Self {
        Self {
            free: Decimal::ZERO,
            escrowed: Decimal::ZERO,
        }
    }

    /// Total funds held for the account, free and escrowed combined.
    pub fn total(&self) -> Decimal {
        self.free + self.escrowed
    }

    /// Check the non-negativity invariant.
    pub fn check_invariant(&self) -> bool {
        self.free >= Decimal::ZERO && self.escrowed >= Decimal::ZERO
    }

    /// Check if the account holds no funds at all.
    pub fn is_empty(&self) -> bool {
        self.free.is_zero() && self.escrowed.is_zero()
    }
}

impl Default for Balance {
    fn default() -> Self {
        Self::new()
    }
}
