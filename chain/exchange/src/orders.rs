//! Order store - order records and state transitions
//!
//! Orders are keyed by id and never deleted; terminal records stay behind
//! for audit. The store is the only mutation path for order state and
//! enforces the monotonic transition rules.

use rust_decimal::Decimal;
use std::collections::HashMap;
use types::ids::{AccountId, OrderId};
use types::order::{Order, OrderState};

use crate::errors::OrderStoreError;

/// All orders ever created, keyed by id.
#[derive(Debug, Default)]
pub struct OrderStore {
    orders: HashMap<OrderId, Order>,
}

impl OrderStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            orders: HashMap::new(),
        }
    }

    // ───────────────────────── Mutations ─────────────────────────

    /// Insert a new order record.
    pub fn create(&mut self, order: Order) -> Result<(), OrderStoreError> {
        if self.orders.contains_key(&order.order_id) {
            return Err(OrderStoreError::DuplicateOrder {
                order_id: order.order_id.to_string(),
            });
        }
        self.orders.insert(order.order_id, order);
        Ok(())
    }

    /// Transition an order to `next`.
    ///
    /// Legal successors are Open -> Filled and Open -> Cancelled only; a
    /// terminal order reports `AlreadyTerminal`, any other illegal pair
    /// reports `InvalidTransition`.
    pub fn transition(
        &mut self,
        order_id: &OrderId,
        next: OrderState,
        timestamp: i64,
    ) -> Result<(), OrderStoreError> {
        let order = self
            .orders
            .get_mut(order_id)
            .ok_or_else(|| OrderStoreError::UnknownOrder {
                order_id: order_id.to_string(),
            })?;

        if order.state.is_terminal() {
            return Err(OrderStoreError::AlreadyTerminal {
                state: format!("{:?}", order.state),
            });
        }
        if !order.state.can_transition_to(next) {
            return Err(OrderStoreError::InvalidTransition {
                from: format!("{:?}", order.state),
                to: format!("{:?}", next),
            });
        }

        order.apply_state(next, timestamp);
        Ok(())
    }

    // ───────────────────────── Queries ─────────────────────────

    /// Look up an order by id.
    pub fn get(&self, order_id: &OrderId) -> Result<&Order, OrderStoreError> {
        self.orders
            .get(order_id)
            .ok_or_else(|| OrderStoreError::UnknownOrder {
                order_id: order_id.to_string(),
            })
    }

    /// Check whether an order id exists.
    pub fn contains(&self, order_id: &OrderId) -> bool {
        self.orders.contains_key(order_id)
    }

    /// All open orders belonging to an account.
    pub fn open_orders(&self, account: &AccountId) -> Vec<&Order> {
        self.orders
            .values()
            .filter(|o| o.owner == *account && o.state == OrderState::Open)
            .collect()
    }

    /// Sum of escrow values over the account's open orders.
    ///
    /// Equals the ledger's escrowed bucket for the account after every
    /// committed operation; the audit suite leans on this.
    pub fn escrowed_total(&self, account: &AccountId) -> Decimal {
        self.open_orders(account)
            .iter()
            .map(|o| o.escrow_value)
            .fold(Decimal::ZERO, |acc, v| acc + v)
    }

    /// Total number of order records, terminal ones included.
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Check if no order was ever created.
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}
