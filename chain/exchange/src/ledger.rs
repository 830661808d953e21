//! Ledger - per-account balance and escrow accounting
//!
//! The single source of truth for funds. Every operation validates its
//! preconditions before touching any bucket, so a returned error always
//! means zero mutation. All arithmetic is checked; overflow is an error,
//! never a wrap.

use rust_decimal::Decimal;
use std::collections::HashMap;
use types::account::Balance;
use types::ids::AccountId;

use crate::errors::LedgerError;

/// Per-account free/escrowed balances.
#[derive(Debug, Default)]
pub struct Ledger {
    balances: HashMap<AccountId, Balance>,
}

impl Ledger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self {
            balances: HashMap::new(),
        }
    }

    // ───────────────────────── Mutations ─────────────────────────

    /// Credit `amount` to the account's free balance.
    ///
    /// `amount` must be non-negative; growth is unconditionally safe and the
    /// only failure mode is arithmetic overflow.
    pub fn credit(&mut self, account: AccountId, amount: Decimal) -> Result<(), LedgerError> {
        debug_assert!(amount >= Decimal::ZERO);
        let balance = self.balances.entry(account).or_default();
        balance.free = balance
            .free
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        Ok(())
    }

    /// Move `amount` from the account's free balance into escrow.
    pub fn escrow(&mut self, account: AccountId, amount: Decimal) -> Result<(), LedgerError> {
        let balance = self.balances.entry(account).or_default();
        if balance.free < amount {
            return Err(LedgerError::InsufficientFunds {
                required: amount.to_string(),
                available: balance.free.to_string(),
            });
        }
        let new_escrowed = balance
            .escrowed
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        balance.free -= amount;
        balance.escrowed = new_escrowed;
        Ok(())
    }

    /// Move `amount` from escrow back to the account's free balance.
    ///
    /// Escrow is only ever released against a known open order, so a
    /// shortfall here means a caller bug, not a user error.
    pub fn release(&mut self, account: AccountId, amount: Decimal) -> Result<(), LedgerError> {
        let balance = self.balances.entry(account).or_default();
        if balance.escrowed < amount {
            return Err(LedgerError::InvariantViolation {
                account_id: account.to_string(),
                held: balance.escrowed.to_string(),
                requested: amount.to_string(),
            });
        }
        let new_free = balance
            .free
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        balance.escrowed -= amount;
        balance.free = new_free;
        Ok(())
    }

    /// Settle `amount` of `from`'s escrow into `to`'s free balance.
    ///
    /// Both sides are validated before either is touched; no intermediate
    /// state is ever observable.
    pub fn settle(
        &mut self,
        from: AccountId,
        to: AccountId,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        if from == to {
            // Settling to yourself is exactly an escrow release.
            return self.release(from, amount);
        }

        let held = self.deposits(&from);
        if held < amount {
            return Err(LedgerError::InvariantViolation {
                account_id: from.to_string(),
                held: held.to_string(),
                requested: amount.to_string(),
            });
        }
        let new_to_free = self
            .free_balance(&to)
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow)?;

        // All checks passed; neither write below can fail.
        let from_balance = self.balances.entry(from).or_default();
        from_balance.escrowed -= amount;
        let to_balance = self.balances.entry(to).or_default();
        to_balance.free = new_to_free;
        Ok(())
    }

    // ───────────────────────── Queries ─────────────────────────

    /// Current escrowed amount for an account (the `deposits` view).
    pub fn deposits(&self, account: &AccountId) -> Decimal {
        self.balances
            .get(account)
            .map(|b| b.escrowed)
            .unwrap_or(Decimal::ZERO)
    }

    /// Current free balance for an account.
    pub fn free_balance(&self, account: &AccountId) -> Decimal {
        self.balances
            .get(account)
            .map(|b| b.free)
            .unwrap_or(Decimal::ZERO)
    }

    /// Full balance record for an account, if it has ever held funds.
    pub fn balance(&self, account: &AccountId) -> Option<&Balance> {
        self.balances.get(account)
    }

    /// Iterate every account that has ever held funds.
    pub fn accounts(&self) -> impl Iterator<Item = (&AccountId, &Balance)> {
        self.balances.iter()
    }

    /// Check the non-negativity invariant across every account.
    pub fn check_invariants(&self) -> bool {
        self.balances.values().all(Balance::check_invariant)
    }
}
