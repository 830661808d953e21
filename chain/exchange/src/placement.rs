//! Order placement - validation, escrow lock, and open-order creation
//!
//! One atomic unit: every precondition is checked before the first ledger
//! write, so a failed placement retains no value and creates no order.

use rust_decimal::Decimal;
use tracing::debug;
use types::ids::{AccountId, OrderId};
use types::numeric::{escrow_value, Amount, Price};
use types::order::{Order, Side};

use crate::errors::ExchangeError;
use crate::events::{EventLog, ExchangeEvent, OrderPlaced};
use crate::ledger::Ledger;
use crate::orders::OrderStore;

/// Order placement service.
///
/// Carries the fixed-point value scale used for the `amount * price`
/// computation; all other state lives in the ledger and the order store.
#[derive(Debug, Clone)]
pub struct OrderPlacement {
    value_scale: Decimal,
}

impl OrderPlacement {
    /// Create a placement service with the given base-unit scale.
    pub fn new(value_scale: Decimal) -> Self {
        Self { value_scale }
    }

    /// Place a new order, locking `amount * price` in escrow.
    ///
    /// The attached value is the payment received with the request; it must
    /// equal the expected escrow value exactly. On success the sender's
    /// escrowed bucket grows by exactly that value, an Open order exists,
    /// and one `OrderPlaced` event is committed.
    ///
    /// Returns the new order id and the committed event sequence.
    pub fn place_order(
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
        // Validate everything before touching any state.
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

        let order = Order::open(sender, Side::Buy, amount, price, expected, timestamp);
        let order_id = order.order_id;
        if orders.contains(&order_id) {
            return Err(ExchangeError::Orders(
                crate::errors::OrderStoreError::DuplicateOrder {
                    order_id: order_id.to_string(),
                },
            ));
        }
        // Escrow growth is the one mutation that could still overflow;
        // check it now so credit + escrow below cannot half-apply.
        ledger
            .deposits(&sender)
            .checked_add(expected)
            .ok_or(ExchangeError::ArithmeticOverflow)?;

        // Commit: credit the received value, lock it, record the order.
        ledger.credit(sender, attached_value)?;
        ledger.escrow(sender, expected)?;
        orders.create(order)?;
        let sequence = events.append(
            ExchangeEvent::OrderPlaced(OrderPlaced {
                owner: sender,
                amount,
                price,
                order_id,
            }),
            timestamp,
        );

        debug!(%sender, %order_id, %expected, "order placed");
        Ok((order_id, sequence))
    }
}
