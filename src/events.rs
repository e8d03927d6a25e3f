// 5.0: every engine state change produces a typed event. the surrounding
// application picks the transport; the engine only knows the EventEmitter
// trait. delivery is synchronous and best-effort: the engine never retries
// and never blocks tick processing on a listener.

use crate::tick::Tick;
use crate::types::{OrderId, Price, Quote, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: Timestamp,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(id: EventId, timestamp: Timestamp, payload: EventPayload) -> Self {
        Self {
            id,
            timestamp,
            payload,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    // Order lifecycle
    OrderOpened(OrderOpenedEvent),
    OrderClosed(OrderClosedEvent),
    OrderCanceled(OrderCanceledEvent),
    OrderDirectivesUpdated(OrderDirectivesUpdatedEvent),

    // Market data
    TickApplied(TickAppliedEvent),

    // Risk
    MarginCall(MarginCallEvent),
    StopOut(StopOutEvent),

    // Funding
    Deposit(DepositEvent),
    Withdrawal(WithdrawalEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderOpenedEvent {
    pub order_id: OrderId,
    pub open_price: Price,
    pub open_date: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderClosedEvent {
    pub order_id: OrderId,
    pub close_price: Price,
    pub close_date: Timestamp,
    pub net_profit: Quote,
    pub reason: CloseReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloseReason {
    Manual,
    StopLoss,
    TakeProfit,
    StopOut,
    NegativeBalance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCanceledEvent {
    pub order_id: OrderId,
    // computed for the event only: ask for sell, bid for buy
    pub cancel_price: Price,
    pub cancel_date: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDirectivesUpdatedEvent {
    pub order_id: OrderId,
    pub stop_loss: Option<Price>,
    pub take_profit: Option<Price>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickAppliedEvent {
    pub tick: Tick,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarginCallEvent {
    pub margin_level: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopOutEvent {
    pub order_id: OrderId,
    pub margin_level: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositEvent {
    pub amount: Quote,
    pub new_balance: Quote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalEvent {
    pub amount: Quote,
    pub new_balance: Quote,
}

pub trait EventEmitter {
    fn emit(&mut self, event: Event);
}

/// In-memory sink. The engine owns one; applications can drain it or swap in
/// their own emitter.
#[derive(Debug, Default)]
pub struct EventCollector {
    events: Vec<Event>,
    next_id: u64,
}

impl EventCollector {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            next_id: 1,
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn next_id(&mut self) -> EventId {
        let id = EventId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn truncate_oldest(&mut self, max: usize) {
        if self.events.len() > max {
            let drop = self.events.len() - max;
            self.events.drain(0..drop);
        }
    }
}

impl EventEmitter for EventCollector {
    fn emit(&mut self, event: Event) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn collector_ids_increase() {
        let mut collector = EventCollector::new();
        let first = collector.next_id();
        let second = collector.next_id();
        assert!(second > first);
    }

    #[test]
    fn collector_emit_and_drain() {
        let mut collector = EventCollector::new();
        let id = collector.next_id();
        collector.emit(Event::new(
            id,
            Timestamp::from_millis(1000),
            EventPayload::Deposit(DepositEvent {
                amount: Quote::new(dec!(500)),
                new_balance: Quote::new(dec!(100500)),
            }),
        ));

        assert_eq!(collector.events().len(), 1);
        let drained = collector.drain();
        assert_eq!(drained.len(), 1);
        assert!(collector.events().is_empty());
    }

    #[test]
    fn truncate_drops_oldest() {
        let mut collector = EventCollector::new();
        for i in 0..5 {
            let id = collector.next_id();
            collector.emit(Event::new(
                id,
                Timestamp::from_millis(i),
                EventPayload::MarginCall(MarginCallEvent {
                    margin_level: dec!(90),
                }),
            ));
        }

        collector.truncate_oldest(2);
        assert_eq!(collector.events().len(), 2);
        assert_eq!(collector.events()[0].id, EventId(4));
    }

    #[test]
    fn events_serialize() {
        let event = Event::new(
            EventId(1),
            Timestamp::from_millis(0),
            EventPayload::StopOut(StopOutEvent {
                order_id: OrderId(3),
                margin_level: dec!(42.5),
            }),
        );
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("StopOut"));
    }
}
