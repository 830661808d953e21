//! Settlement - direct-fill buys, cancellation, and escrow settlement
//!
//! Closes the order lifecycle: `buy` records an immediately-filled payment,
//! `cancel` returns escrow to the owner, and `fill` settles a resting
//! order's escrow to a counter-party chosen by the ordering layer. Each
//! operation is atomic; any validation failure leaves balances, orders, and
//! the event log untouched.

use rust_decimal::Decimal;
use tracing::debug;
use types::ids::{AccountId, OrderId};
use types::numeric::{escrow_value, Amount, Price};
use types::order::{Order, OrderState, Side};

use crate::errors::{ExchangeError, OrderStoreError};
use crate::events::{EventLog, ExchangeEvent, LogBuy, OrderCancelled};
use crate::ledger::Ledger;
use crate::orders::OrderStore;

/// Settlement engine.
#[derive(Debug, Clone)]
pub struct SettlementEngine {
    value_scale: Decimal,
}

impl SettlementEngine {
    /// Create a settlement engine with the given base-unit scale.
    pub fn new(value_scale: Decimal) -> Self {
        Self { value_scale }
    }

    /// Direct-fill buy: the attached value is credited to the sender's held
    /// balance and the order is recorded directly in `Filled`, with no
    /// intermediate Open state and no escrow.
    ///
    /// Returns the new order id and the committed `LogBuy` sequence.
    pub fn buy(
        &self,
        ledger: &mut Ledger,
        orders: &mut OrderStore,
        events: &mut EventLog,
        sender: AccountId,
        amount: Decimal,
        price: Decimal,
        attached_value: Decimal,
        timestamp: i64,
    ) -> Result<(OrderId, u64), ExchangeError> {
        let amount = Amount::try_new(amount).map_err(|_| ExchangeError::InvalidAmount {
            value: amount.to_string(),
        })?;
        let price = Price::try_new(price).map_err(|_| ExchangeError::InvalidPrice {
            value: price.to_string(),
        })?;
        let expected = escrow_value(amount, price, self.value_scale)
            .map_err(|_| ExchangeError::ArithmeticOverflow)?;
        if attached_value != expected {
            return Err(ExchangeError::ValueMismatch {
                expected: expected.to_string(),
                attached: attached_value.to_string(),
            });
        }

        let order = Order::filled(sender, Side::Buy, amount, price, expected, timestamp);
        let order_id = order.order_id;
        if orders.contains(&order_id) {
            return Err(ExchangeError::Orders(OrderStoreError::DuplicateOrder {
                order_id: order_id.to_string(),
            }));
        }

        ledger.credit(sender, attached_value)?;
        orders.create(order)?;
        let sequence = events.append(
            ExchangeEvent::LogBuy(LogBuy {
                buyer: sender,
                amount,
                price,
            }),
            timestamp,
        );

        debug!(%sender, %order_id, %attached_value, "buy filled");
        Ok((order_id, sequence))
    }

    /// Cancel an open order, releasing its escrow back to the owner.
    ///
    /// Returns the committed `OrderCancelled` sequence.
    pub fn cancel(
        &self,
        ledger: &mut Ledger,
        orders: &mut OrderStore,
        events: &mut EventLog,
        sender: AccountId,
        order_id: OrderId,
        timestamp: i64,
    ) -> Result<u64, ExchangeError> {
        let order = orders.get(&order_id)?;
        if order.owner != sender {
            return Err(ExchangeError::NotOwner {
                caller: sender.to_string(),
                order_id: order_id.to_string(),
            });
        }
        if order.state.is_terminal() {
            return Err(ExchangeError::Orders(OrderStoreError::AlreadyTerminal {
                state: format!("{:?}", order.state),
            }));
        }
        let refund = order.escrow_value;

        ledger.release(sender, refund)?;
        orders.transition(&order_id, OrderState::Cancelled, timestamp)?;
        let sequence = events.append(
            ExchangeEvent::OrderCancelled(OrderCancelled { order_id }),
            timestamp,
        );

        debug!(%sender, %order_id, %refund, "order cancelled");
        Ok(sequence)
    }

    /// Fill an open order against a counter-party chosen by the ordering
    /// layer, settling the escrow into the counter-party's held balance.
    ///
    /// Which order meets which counter-party is not decided here; there is
    /// no matching policy in the core.
    pub fn fill(
        &self,
        ledger: &mut Ledger,
        orders: &mut OrderStore,
        events: &mut EventLog,
        order_id: OrderId,
        counter_party: AccountId,
        timestamp: i64,
    ) -> Result<u64, ExchangeError> {
        let order = orders.get(&order_id)?;
        if order.state.is_terminal() {
            return Err(ExchangeError::Orders(OrderStoreError::AlreadyTerminal {
                state: format!("{:?}", order.state),
            }));
        }
        let (owner, amount, price, value) =
            (order.owner, order.amount, order.price, order.escrow_value);

        ledger.settle(owner, counter_party, value)?;
        orders.transition(&order_id, OrderState::Filled, timestamp)?;
        let sequence = events.append(
            ExchangeEvent::LogBuy(LogBuy {
                buyer: owner,
                amount,
                price,
            }),
            timestamp,
        );

        debug!(%owner, %counter_party, %order_id, "order filled");
        Ok(sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::OrderPlacement;
    use types::numeric::unit_scale;

    const T0: i64 = 1_708_123_456_789_000_000;

    fn wei(s: &str) -> Decimal {
        Decimal::from_scientific(s).unwrap()
    }

    fn setup() -> (SettlementEngine, OrderPlacement, Ledger, OrderStore, EventLog) {
        (
            SettlementEngine::new(unit_scale()),
            OrderPlacement::new(unit_scale()),
            Ledger::new(),
            OrderStore::new(),
            EventLog::new(),
        )
    }

    fn place(
        placement: &OrderPlacement,
        ledger: &mut Ledger,
        orders: &mut OrderStore,
        events: &mut EventLog,
        owner: AccountId,
        value: &str,
    ) -> OrderId {
        let (order_id, _) = placement
            .place_order(
                ledger,
                orders,
                events,
                owner,
                wei(value),
                wei("1e18"),
                wei(value),
                T0,
            )
            .unwrap();
        order_id
    }

    // ─── Buy tests ───

    #[test]
    fn test_buy_credits_held_balance() {
        let (settlement, _, mut ledger, mut orders, mut events) = setup();
        let bob = AccountId::new();

        let (order_id, _) = settlement
            .buy(
                &mut ledger,
                &mut orders,
                &mut events,
                bob,
                wei("1e18"),
                wei("2e18"),
                wei("2e18"),
                T0,
            )
            .unwrap();

        assert_eq!(ledger.free_balance(&bob), wei("2e18"));
        assert_eq!(ledger.deposits(&bob), Decimal::ZERO);
        assert_eq!(orders.get(&order_id).unwrap().state, OrderState::Filled);
    }

    #[test]
    fn test_buy_emits_one_log_buy() {
        let (settlement, _, mut ledger, mut orders, mut events) = setup();
        let bob = AccountId::new();

        settlement
            .buy(
                &mut ledger,
                &mut orders,
                &mut events,
                bob,
                wei("1e18"),
                wei("2e18"),
                wei("2e18"),
                T0,
            )
            .unwrap();

        assert_eq!(events.len(), 1);
        match &events.last().unwrap().event {
            ExchangeEvent::LogBuy(log) => {
                assert_eq!(log.buyer, bob);
                assert_eq!(log.amount.as_decimal(), wei("1e18"));
                assert_eq!(log.price.as_decimal(), wei("2e18"));
            }
            other => panic!("expected LogBuy, got {:?}", other),
        }
    }

    #[test]
    fn test_buy_value_mismatch_mutates_nothing() {
        let (settlement, _, mut ledger, mut orders, mut events) = setup();
        let bob = AccountId::new();

        let err = settlement
            .buy(
                &mut ledger,
                &mut orders,
                &mut events,
                bob,
                wei("1e18"),
                wei("2e18"),
                wei("1e18"),
                T0,
            )
            .unwrap_err();

        assert!(matches!(err, ExchangeError::ValueMismatch { .. }));
        assert_eq!(ledger.free_balance(&bob), Decimal::ZERO);
        assert!(orders.is_empty());
        assert!(events.is_empty());
    }

    #[test]
    fn test_buy_zero_amount_rejected() {
        let (settlement, _, mut ledger, mut orders, mut events) = setup();
        let err = settlement
            .buy(
                &mut ledger,
                &mut orders,
                &mut events,
                AccountId::new(),
                Decimal::ZERO,
                wei("1e18"),
                Decimal::ZERO,
                T0,
            )
            .unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidAmount { .. }));
    }

    // ─── Cancel tests ───

    #[test]
    fn test_cancel_restores_free_balance() {
        let (settlement, placement, mut ledger, mut orders, mut events) = setup();
        let alice = AccountId::new();
        let order_id = place(&placement, &mut ledger, &mut orders, &mut events, alice, "1e18");

        settlement
            .cancel(&mut ledger, &mut orders, &mut events, alice, order_id, T0 + 1)
            .unwrap();

        assert_eq!(ledger.free_balance(&alice), wei("1e18"));
        assert_eq!(ledger.deposits(&alice), Decimal::ZERO);
        assert_eq!(orders.get(&order_id).unwrap().state, OrderState::Cancelled);
    }

    #[test]
    fn test_cancel_twice_is_already_terminal() {
        let (settlement, placement, mut ledger, mut orders, mut events) = setup();
        let alice = AccountId::new();
        let order_id = place(&placement, &mut ledger, &mut orders, &mut events, alice, "1e18");

        settlement
            .cancel(&mut ledger, &mut orders, &mut events, alice, order_id, T0 + 1)
            .unwrap();
        let err = settlement
            .cancel(&mut ledger, &mut orders, &mut events, alice, order_id, T0 + 2)
            .unwrap_err();

        assert!(matches!(
            err,
            ExchangeError::Orders(OrderStoreError::AlreadyTerminal { .. })
        ));
        // Escrow was not released twice.
        assert_eq!(ledger.free_balance(&alice), wei("1e18"));
    }

    #[test]
    fn test_cancel_not_owner() {
        let (settlement, placement, mut ledger, mut orders, mut events) = setup();
        let alice = AccountId::new();
        let eve = AccountId::new();
        let order_id = place(&placement, &mut ledger, &mut orders, &mut events, alice, "1e18");

        let err = settlement
            .cancel(&mut ledger, &mut orders, &mut events, eve, order_id, T0 + 1)
            .unwrap_err();

        assert!(matches!(err, ExchangeError::NotOwner { .. }));
        assert_eq!(ledger.deposits(&alice), wei("1e18"));
        assert_eq!(orders.get(&order_id).unwrap().state, OrderState::Open);
    }

    #[test]
    fn test_cancel_unknown_order() {
        let (settlement, _, mut ledger, mut orders, mut events) = setup();
        let err = settlement
            .cancel(
                &mut ledger,
                &mut orders,
                &mut events,
                AccountId::new(),
                OrderId::new(),
                T0,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ExchangeError::Orders(OrderStoreError::UnknownOrder { .. })
        ));
    }

    // ─── Fill tests ───

    #[test]
    fn test_fill_settles_escrow_to_counterparty() {
        let (settlement, placement, mut ledger, mut orders, mut events) = setup();
        let alice = AccountId::new();
        let bob = AccountId::new();
        let order_id = place(&placement, &mut ledger, &mut orders, &mut events, alice, "1e18");

        settlement
            .fill(&mut ledger, &mut orders, &mut events, order_id, bob, T0 + 1)
            .unwrap();

        assert_eq!(ledger.deposits(&alice), Decimal::ZERO);
        assert_eq!(ledger.free_balance(&alice), Decimal::ZERO);
        assert_eq!(ledger.free_balance(&bob), wei("1e18"));
        assert_eq!(orders.get(&order_id).unwrap().state, OrderState::Filled);
    }

    #[test]
    fn test_fill_emits_log_buy_for_owner() {
        let (settlement, placement, mut ledger, mut orders, mut events) = setup();
        let alice = AccountId::new();
        let bob = AccountId::new();
        let order_id = place(&placement, &mut ledger, &mut orders, &mut events, alice, "1e18");

        settlement
            .fill(&mut ledger, &mut orders, &mut events, order_id, bob, T0 + 1)
            .unwrap();

        match &events.last().unwrap().event {
            ExchangeEvent::LogBuy(log) => assert_eq!(log.buyer, alice),
            other => panic!("expected LogBuy, got {:?}", other),
        }
    }

    #[test]
    fn test_fill_terminal_order_fails() {
        let (settlement, placement, mut ledger, mut orders, mut events) = setup();
        let alice = AccountId::new();
        let bob = AccountId::new();
        let order_id = place(&placement, &mut ledger, &mut orders, &mut events, alice, "1e18");

        settlement
            .cancel(&mut ledger, &mut orders, &mut events, alice, order_id, T0 + 1)
            .unwrap();
        let err = settlement
            .fill(&mut ledger, &mut orders, &mut events, order_id, bob, T0 + 2)
            .unwrap_err();

        assert!(matches!(
            err,
            ExchangeError::Orders(OrderStoreError::AlreadyTerminal { .. })
        ));
        assert_eq!(ledger.free_balance(&bob), Decimal::ZERO);
    }
}
