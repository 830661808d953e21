//! Committed events and the append-only event log
//!
//! Events are immutable records appended if and only if the corresponding
//! state transition committed, in commit order. Consumers do not register
//! callbacks; they read the log by offset and keep their own cursor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use types::ids::{AccountId, OrderId};
use types::numeric::{Amount, Price};

/// An order was placed and its value escrowed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPlaced {
    pub owner: AccountId,
    pub amount: Amount,
    pub price: Price,
    pub order_id: OrderId,
}

/// A buy committed: either the direct-fill payment path or the settlement
/// of a resting order to its counter-party
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogBuy {
    pub buyer: AccountId,
    pub amount: Amount,
    pub price: Price,
}

/// An open order was cancelled and its escrow released
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelled {
    pub order_id: OrderId,
}

/// Enum wrapper for all committed events, enabling uniform handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExchangeEvent {
    OrderPlaced(OrderPlaced),
    LogBuy(LogBuy),
    OrderCancelled(OrderCancelled),
}

/// One committed entry of the event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Global monotonic sequence number, dense from zero
    pub sequence: u64,
    /// Unix nanosecond timestamp of the request that committed this event
    pub timestamp: i64,
    pub event: ExchangeEvent,
}

impl EventRecord {
    /// Commit timestamp as a UTC datetime.
    pub fn recorded_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(self.timestamp)
    }
}

/// Append-only event log with offset-based reads.
///
/// Sequences are dense: the record with sequence `n` sits at index `n`, so a
/// consumer's cursor is simply the next sequence it has not seen.
#[derive(Debug, Default)]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Append an event, assigning it the next sequence number.
    ///
    /// Returns the assigned sequence.
    pub fn append(&mut self, event: ExchangeEvent, timestamp: i64) -> u64 {
        let sequence = self.records.len() as u64;
        self.records.push(EventRecord {
            sequence,
            timestamp,
            event,
        });
        sequence
    }

    /// Read every record with `sequence >= cursor`, in commit order.
    pub fn read_from(&self, cursor: u64) -> &[EventRecord] {
        let start = (cursor as usize).min(self.records.len());
        &self.records[start..]
    }

    /// Get the most recently committed record.
    pub fn last(&self) -> Option<&EventRecord> {
        self.records.last()
    }

    /// Number of committed events.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if no event has committed yet.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn placed_event() -> ExchangeEvent {
        ExchangeEvent::OrderPlaced(OrderPlaced {
            owner: AccountId::new(),
            amount: Amount::try_new(Decimal::from(10)).unwrap(),
            price: Price::try_new(Decimal::from(5)).unwrap(),
            order_id: OrderId::new(),
        })
    }

    #[test]
    fn test_append_assigns_dense_sequences() {
        let mut log = EventLog::new();
        assert_eq!(log.append(placed_event(), 1), 0);
        assert_eq!(log.append(placed_event(), 2), 1);
        assert_eq!(log.append(placed_event(), 3), 2);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_read_from_start() {
        let mut log = EventLog::new();
        log.append(placed_event(), 1);
        log.append(placed_event(), 2);
        let all = log.read_from(0);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].sequence, 0);
        assert_eq!(all[1].sequence, 1);
    }

    #[test]
    fn test_read_from_cursor() {
        let mut log = EventLog::new();
        for i in 0..5 {
            log.append(placed_event(), i);
        }
        let tail = log.read_from(3);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].sequence, 3);
    }

    #[test]
    fn test_read_past_end_is_empty() {
        let mut log = EventLog::new();
        log.append(placed_event(), 1);
        assert!(log.read_from(10).is_empty());
    }

    #[test]
    fn test_recorded_at_conversion() {
        let mut log = EventLog::new();
        log.append(placed_event(), 1_708_123_456_789_000_000);
        let record = log.last().unwrap();
        assert_eq!(
            record.recorded_at().timestamp_nanos_opt().unwrap(),
            1_708_123_456_789_000_000
        );
    }

    #[test]
    fn test_event_serialization() {
        let event = ExchangeEvent::LogBuy(LogBuy {
            buyer: AccountId::new(),
            amount: Amount::try_new(Decimal::from(1)).unwrap(),
            price: Price::try_new(Decimal::from(2)).unwrap(),
        });
        let json = serde_json::to_string(&event).unwrap();
        let deserialized: ExchangeEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, deserialized);
    }

    #[test]
    fn test_cancelled_event_serialization() {
        let record = EventRecord {
            sequence: 7,
            timestamp: 42,
            event: ExchangeEvent::OrderCancelled(OrderCancelled {
                order_id: OrderId::new(),
            }),
        };
        let json = serde_json::to_string(&record).unwrap();
        let deserialized: EventRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, deserialized);
    }
}
