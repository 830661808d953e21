//! Order lifecycle types
//!
//! An order is immutable except for its state, which moves monotonically:
//! `Open` is left exactly once, into `Filled` or `Cancelled`, and no state is
//! ever re-entered. Terminal orders are retained for audit.

use crate::ids::{AccountId, OrderId};
use crate::numeric::{Amount, Price};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid)
    Buy,
    /// Sell order (ask)
    Sell,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Order state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderState {
    /// Resting with value escrowed, awaiting fill or cancellation
    Open,
    /// Settled to a counter-party (terminal)
    Filled,
    /// Escrow returned to the owner (terminal)
    Cancelled,
}

impl OrderState {
    /// Check if the state is terminal (no further transitions possible)
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderState::Open)
    }

    /// Check whether `next` is a legal successor of this state.
    pub fn can_transition_to(&self, next: OrderState) -> bool {
        matches!(
            (self, next),
            (OrderState::Open, OrderState::Filled) | (OrderState::Open, OrderState::Cancelled)
        )
    }
}

/// A placed order.
///
/// `escrow_value` is fixed at creation (`amount * price`, fixed-point
/// scaled) and is the exact quantity the ledger holds in escrow while the
/// order is open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub owner: AccountId,
    pub side: Side,
    pub amount: Amount,
    pub price: Price,
    pub escrow_value: Decimal,
    pub state: OrderState,
    pub created_at: i64, // Unix nanos, supplied by the caller
    pub updated_at: i64, // Unix nanos
    pub version: u64,
}

impl Order {
    /// Create a new open order.
    pub fn open(
        owner: AccountId,
        side: Side,
        amount: Amount,
        price: Price,
        escrow_value: Decimal,
        timestamp: i64,
    ) -> Self {
        Self {
            order_id: OrderId::new(),
            owner,
            side,
            amount,
            price,
            escrow_value,
            state: OrderState::Open,
            created_at: timestamp,
            updated_at: timestamp,
            version: 0,
        }
    }

    /// Create an order directly in `Filled` state (the direct-fill path,
    /// which never rests and never holds escrow).
    pub fn filled(
        owner: AccountId,
        side: Side,
        amount: Amount,
        price: Price,
        escrow_value: Decimal,
        timestamp: i64,
    ) -> Self {
        Self {
            order_id: OrderId::new(),
            owner,
            side,
            amount,
            price,
            escrow_value,
            state: OrderState::Filled,
            created_at: timestamp,
            updated_at: timestamp,
            version: 0,
        }
    }

    /// Check if the order is in a terminal state
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Apply a state transition already validated by the caller.
    ///
    /// The store is the only mutation path and performs the legality checks;
    /// this method only records the transition.
    pub fn apply_state(&mut self, next: OrderState, timestamp: i64) {
        debug_assert!(self.state.can_transition_to(next));
        self.state = next;
        self.updated_at = timestamp;
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_order(state_at: i64) -> Order {
        Order::open(
            AccountId::new(),
            Side::Buy,
            Amount::try_new(Decimal::from(10)).unwrap(),
            Price::try_new(Decimal::from(5)).unwrap(),
            Decimal::from(50),
            state_at,
        )
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
    }

    #[test]
    fn test_open_order_defaults() {
        let order = test_order(1_708_123_456_789_000_000);
        assert_eq!(order.state, OrderState::Open);
        assert_eq!(order.version, 0);
        assert!(!order.is_terminal());
    }

    #[test]
    fn test_filled_constructor_is_terminal() {
        let order = Order::filled(
            AccountId::new(),
            Side::Buy,
            Amount::try_new(Decimal::from(1)).unwrap(),
            Price::try_new(Decimal::from(2)).unwrap(),
            Decimal::from(2),
            1_708_123_456_789_000_000,
        );
        assert_eq!(order.state, OrderState::Filled);
        assert!(order.is_terminal());
    }

    #[test]
    fn test_transition_rules() {
        assert!(OrderState::Open.can_transition_to(OrderState::Filled));
        assert!(OrderState::Open.can_transition_to(OrderState::Cancelled));
        assert!(!OrderState::Open.can_transition_to(OrderState::Open));
        assert!(!OrderState::Filled.can_transition_to(OrderState::Cancelled));
        assert!(!OrderState::Cancelled.can_transition_to(OrderState::Filled));
        assert!(!OrderState::Filled.can_transition_to(OrderState::Open));
    }

    #[test]
    fn test_apply_state_bumps_version() {
        let mut order = test_order(1_708_123_456_789_000_000);
        order.apply_state(OrderState::Cancelled, 1_708_123_456_790_000_000);
        assert_eq!(order.state, OrderState::Cancelled);
        assert_eq!(order.version, 1);
        assert_eq!(order.updated_at, 1_708_123_456_790_000_000);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!OrderState::Open.is_terminal());
        assert!(OrderState::Filled.is_terminal());
        assert!(OrderState::Cancelled.is_terminal());
    }

    #[test]
    fn test_order_serialization() {
        let order = test_order(1_708_123_456_789_000_000);
        let json = serde_json::to_string(&order).unwrap();
        let deserialized: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(order.order_id, deserialized.order_id);
        assert_eq!(order.state, deserialized.state);
        assert_eq!(order.escrow_value, deserialized.escrow_value);
    }
}
