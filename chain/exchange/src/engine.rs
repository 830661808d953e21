//! Exchange engine - the single-writer request boundary
//!
//! Owns the ledger, the order store, and the event log, and applies one
//! request at a time in the order the external sequencer delivers them.
//! Committed request ids are remembered: replaying one returns the original
//! receipt without re-applying effects, while a failed request leaves no
//! trace and revalidates from scratch on replay.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, warn};
use types::ids::{AccountId, OrderId, RequestId};
use types::numeric::unit_scale;
use types::order::Order;

use crate::errors::ExchangeError;
use crate::events::EventLog;
use crate::ledger::Ledger;
use crate::orders::OrderStore;
use crate::placement::OrderPlacement;
use crate::settlement::SettlementEngine;

/// One atomic request, as delivered by the ordering layer.
///
/// The sender identity is already authenticated and the attached value is
/// the payment actually received with the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExchangeRequest {
    PlaceOrder {
        request_id: RequestId,
        sender: AccountId,
        amount: Decimal,
        price: Decimal,
        attached_value: Decimal,
    },
    Buy {
        request_id: RequestId,
        sender: AccountId,
        amount: Decimal,
        price: Decimal,
        attached_value: Decimal,
    },
    Cancel {
        request_id: RequestId,
        sender: AccountId,
        order_id: OrderId,
    },
    Fill {
        request_id: RequestId,
        order_id: OrderId,
        counter_party: AccountId,
    },
}

impl ExchangeRequest {
    /// The id the engine deduplicates on.
    pub fn request_id(&self) -> RequestId {
        match self {
            ExchangeRequest::PlaceOrder { request_id, .. }
            | ExchangeRequest::Buy { request_id, .. }
            | ExchangeRequest::Cancel { request_id, .. }
            | ExchangeRequest::Fill { request_id, .. } => *request_id,
        }
    }
}

/// What a committed request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Committed {
    Placed { order_id: OrderId },
    Bought { order_id: OrderId },
    Cancelled { order_id: OrderId },
    Filled { order_id: OrderId },
}

/// Outcome of a committed request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub request_id: RequestId,
    pub outcome: Committed,
    /// Sequence of the event this request committed
    pub sequence: u64,
    /// True when this receipt was served from the dedup record instead of
    /// re-applying the request
    pub replayed: bool,
}

/// The exchange core: ledger, order store, event log, and the services
/// operating on them, behind a serial `apply` entry point.
#[derive(Debug)]
pub struct Exchange {
    ledger: Ledger,
    orders: OrderStore,
    events: EventLog,
    placement: OrderPlacement,
    settlement: SettlementEngine,
    committed: HashMap<RequestId, Receipt>,
}

impl Exchange {
    /// Create an exchange with the default 1e18 base-unit value scale.
    pub fn new() -> Self {
        Self::with_value_scale(unit_scale())
    }

    /// Create an exchange with a custom base-unit value scale.
    ///
    /// # Panics
    /// Panics if `scale` is not positive.
    pub fn with_value_scale(scale: Decimal) -> Self {
        assert!(scale > Decimal::ZERO, "value scale must be positive");
        Self {
            ledger: Ledger::new(),
            orders: OrderStore::new(),
            events: EventLog::new(),
            placement: OrderPlacement::new(scale),
            settlement: SettlementEngine::new(scale),
            committed: HashMap::new(),
        }
    }

    // ───────────────────────── Request boundary ─────────────────────────

    /// Apply one request atomically.
    ///
    /// The outcome is binary: either every mutation committed and the
    /// receipt is returned, or the error is surfaced and no state changed.
    /// A request id that already committed is served its original receipt,
    /// marked `replayed`, with no further effect.
    pub fn apply(
        &mut self,
        request: ExchangeRequest,
        timestamp: i64,
    ) -> Result<Receipt, ExchangeError> {
        let request_id = request.request_id();
        if let Some(previous) = self.committed.get(&request_id) {
            info!(%request_id, "request replayed, serving committed receipt");
            let mut receipt = previous.clone();
            receipt.replayed = true;
            return Ok(receipt);
        }

        let result = match request {
            ExchangeRequest::PlaceOrder {
                sender,
                amount,
                price,
                attached_value,
                ..
            } => self
                .placement
                .place_order(
                    &mut self.ledger,
                    &mut self.orders,
                    &mut self.events,
                    sender,
                    amount,
                    price,
                    attached_value,
                    timestamp,
                )
                .map(|(order_id, sequence)| (Committed::Placed { order_id }, sequence)),
            ExchangeRequest::Buy {
                sender,
                amount,
                price,
                attached_value,
                ..
            } => self
                .settlement
                .buy(
                    &mut self.ledger,
                    &mut self.orders,
                    &mut self.events,
                    sender,
                    amount,
                    price,
                    attached_value,
                    timestamp,
                )
                .map(|(order_id, sequence)| (Committed::Bought { order_id }, sequence)),
            ExchangeRequest::Cancel {
                sender, order_id, ..
            } => self
                .settlement
                .cancel(
                    &mut self.ledger,
                    &mut self.orders,
                    &mut self.events,
                    sender,
                    order_id,
                    timestamp,
                )
                .map(|sequence| (Committed::Cancelled { order_id }, sequence)),
            ExchangeRequest::Fill {
                order_id,
                counter_party,
                ..
            } => self
                .settlement
                .fill(
                    &mut self.ledger,
                    &mut self.orders,
                    &mut self.events,
                    order_id,
                    counter_party,
                    timestamp,
                )
                .map(|sequence| (Committed::Filled { order_id }, sequence)),
        };

        match result {
            Ok((outcome, sequence)) => {
                let receipt = Receipt {
                    request_id,
                    outcome,
                    sequence,
                    replayed: false,
                };
                self.committed.insert(request_id, receipt.clone());
                Ok(receipt)
            }
            Err(err) => {
                // Failed requests record nothing; a later retry with the
                // same id revalidates from scratch.
                warn!(%request_id, %err, "request rejected");
                Err(err)
            }
        }
    }

    // ───────────────────────── Direct operations ─────────────────────────

    /// Place an order outside the deduplicated request boundary.
    pub fn place_order(
        &mut self,
        sender: AccountId,
        amount: Decimal,
        price: Decimal,
        attached_value: Decimal,
        timestamp: i64,
    ) -> Result<OrderId, ExchangeError> {
        self.placement
            .place_order(
                &mut self.ledger,
                &mut self.orders,
                &mut self.events,
                sender,
                amount,
                price,
                attached_value,
                timestamp,
            )
            .map(|(order_id, _)| order_id)
    }

    /// Direct-fill buy outside the deduplicated request boundary.
    pub fn buy(
        &mut self,
        sender: AccountId,
        amount: Decimal,
        price: Decimal,
        attached_value: Decimal,
        timestamp: i64,
    ) -> Result<OrderId, ExchangeError> {
        self.settlement
            .buy(
                &mut self.ledger,
                &mut self.orders,
                &mut self.events,
                sender,
                amount,
                price,
                attached_value,
                timestamp,
            )
            .map(|(order_id, _)| order_id)
    }

    /// Cancel an open order.
    pub fn cancel(
        &mut self,
        sender: AccountId,
        order_id: OrderId,
        timestamp: i64,
    ) -> Result<(), ExchangeError> {
        self.settlement
            .cancel(
                &mut self.ledger,
                &mut self.orders,
                &mut self.events,
                sender,
                order_id,
                timestamp,
            )
            .map(|_| ())
    }

    /// Fill an open order against a counter-party.
    pub fn fill(
        &mut self,
        order_id: OrderId,
        counter_party: AccountId,
        timestamp: i64,
    ) -> Result<(), ExchangeError> {
        self.settlement
            .fill(
                &mut self.ledger,
                &mut self.orders,
                &mut self.events,
                order_id,
                counter_party,
                timestamp,
            )
            .map(|_| ())
    }

    // ───────────────────────── Read-only views ─────────────────────────

    /// Current escrowed amount for an account.
    pub fn deposits(&self, account: &AccountId) -> Decimal {
        self.ledger.deposits(account)
    }

    /// Current free balance for an account.
    pub fn free_balance(&self, account: &AccountId) -> Decimal {
        self.ledger.free_balance(account)
    }

    /// Look up an order record.
    pub fn order(&self, order_id: &OrderId) -> Result<&Order, ExchangeError> {
        Ok(self.orders.get(order_id)?)
    }

    /// The committed event log.
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// The order store, for audit queries.
    pub fn orders(&self) -> &OrderStore {
        &self.orders
    }

    /// The ledger, for audit queries.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Audit check: balances non-negative, and for every account the
    /// escrowed bucket equals the sum of its open orders' escrow values.
    pub fn check_invariants(&self) -> bool {
        self.ledger.check_invariants()
            && self
                .ledger
                .accounts()
                .all(|(account, balance)| balance.escrowed == self.orders.escrowed_total(account))
    }
}

impl Default for Exchange {
    fn default() -> Self {
        Self::new()
    }
}
