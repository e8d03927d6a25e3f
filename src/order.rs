// 3.0: orders and the per-account ledger. the status machine and the profit
// formulas live here; everything that fires them lives in engine/.
//
// status machine: Pending -> Open -> Closed, Pending -> Canceled. nothing
// else. closed and canceled orders are never deleted, so every historical
// fill stays queryable.

use crate::types::{Lots, OrderId, Price, Quote, Side, Symbol, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Open,
    Closed,
    Canceled,
}

impl OrderStatus {
    fn can_transition(&self, to: OrderStatus) -> bool {
        matches!(
            (self, to),
            (OrderStatus::Pending, OrderStatus::Open)
                | (OrderStatus::Pending, OrderStatus::Canceled)
                | (OrderStatus::Open, OrderStatus::Closed)
        )
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum OrderError {
    #[error("Order {0} not found")]
    UnknownOrder(OrderId),

    #[error("Operation illegal for order {id} in status {from:?}")]
    InvalidStateTransition {
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    },
}

// requested trigger prices. explicit optionals: an unset field is None, never
// a sentinel number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDirectives {
    pub stop: Option<Price>,
    pub limit: Option<Price>,
    pub stop_loss: Option<Price>,
    pub take_profit: Option<Price>,
}

impl OrderDirectives {
    pub fn market() -> Self {
        Self::default()
    }

    pub fn with_stop(mut self, stop: Price) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn with_limit(mut self, limit: Price) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_stop_loss(mut self, stop_loss: Price) -> Self {
        self.stop_loss = Some(stop_loss);
        self
    }

    pub fn with_take_profit(mut self, take_profit: Price) -> Self {
        self.take_profit = Some(take_profit);
        self
    }

    // a market order has neither entry trigger and fills at placement
    pub fn is_market(&self) -> bool {
        self.stop.is_none() && self.limit.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub symbol: Symbol,
    pub side: Side,
    pub lots: Lots,
    pub directives: OrderDirectives,
    pub status: OrderStatus,
    pub creation_price: Price,
    pub creation_date: Timestamp,
    pub open_price: Option<Price>,
    pub open_date: Option<Timestamp>,
    pub close_price: Option<Price>,
    pub close_date: Option<Timestamp>,
}

impl Order {
    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }

    pub fn is_open(&self) -> bool {
        self.status == OrderStatus::Open
    }

    fn transition(&mut self, to: OrderStatus) -> Result<(), OrderError> {
        if !self.status.can_transition(to) {
            return Err(OrderError::InvalidStateTransition {
                id: self.id,
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    /// Fill a pending order at the triggering side's price.
    pub fn fill(&mut self, price: Price, date: Timestamp) -> Result<(), OrderError> {
        self.transition(OrderStatus::Open)?;
        self.open_price = Some(price);
        self.open_date = Some(date);
        Ok(())
    }

    /// Close an open order, freezing its close price and date.
    pub fn close(&mut self, price: Price, date: Timestamp) -> Result<(), OrderError> {
        self.transition(OrderStatus::Closed)?;
        self.close_price = Some(price);
        self.close_date = Some(date);
        Ok(())
    }

    /// Cancel a pending order.
    pub fn cancel(&mut self) -> Result<(), OrderError> {
        self.transition(OrderStatus::Canceled)
    }

    // directive updates are legal while the order can still trade
    fn ensure_active(&self) -> Result<(), OrderError> {
        match self.status {
            OrderStatus::Pending | OrderStatus::Open => Ok(()),
            status => Err(OrderError::InvalidStateTransition {
                id: self.id,
                from: status,
                to: status,
            }),
        }
    }

    /// Set or clear the stop-loss. Takes effect on the next tick evaluation.
    pub fn set_stop_loss(&mut self, stop_loss: Option<Price>) -> Result<(), OrderError> {
        self.ensure_active()?;
        self.directives.stop_loss = stop_loss;
        Ok(())
    }

    /// Set or clear the take-profit. Takes effect on the next tick evaluation.
    pub fn set_take_profit(&mut self, take_profit: Option<Price>) -> Result<(), OrderError> {
        self.ensure_active()?;
        self.directives.take_profit = take_profit;
        Ok(())
    }
}

// 3.1: profit formulas. the realized and unrealized paths share these so the
// numbers agree at close time.

/// Gross profit: buy = (close - open), sell = (open - close), scaled to units.
pub fn gross_profit(side: Side, open: Price, close: Price, lots: Lots) -> Quote {
    Quote::new(side.sign() * (close.value() - open.value()) * lots.units())
}

/// Net profit = gross + swaps - |commission|. Swaps are fixed at zero in this
/// model but stay an explicit term so the formula reads like the statement.
pub fn net_profit(gross: Quote, swaps: Quote, commission: Quote) -> Quote {
    gross.add(swaps).sub(commission.abs())
}

// 3.2: the ledger. owns every order for one account and the id counter; ids
// are monotonically increasing and never reused. BTreeMap keeps iteration in
// id order, which is creation order, which is the evaluation order the
// matching engine requires.
#[derive(Debug, Clone, Default)]
pub struct OrderLedger {
    orders: BTreeMap<OrderId, Order>,
    next_id: u64,
}

impl OrderLedger {
    pub fn new() -> Self {
        Self {
            orders: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Create an order and return its id. Market orders are created Pending
    /// too; the engine fills them immediately after creation.
    pub fn create(
        &mut self,
        symbol: Symbol,
        side: Side,
        lots: Lots,
        directives: OrderDirectives,
        creation_price: Price,
        creation_date: Timestamp,
    ) -> OrderId {
        let id = OrderId(self.next_id);
        self.next_id += 1;

        self.orders.insert(
            id,
            Order {
                id,
                symbol,
                side,
                lots,
                directives,
                status: OrderStatus::Pending,
                creation_price,
                creation_date,
                open_price: None,
                open_date: None,
                close_price: None,
                close_date: None,
            },
        );
        id
    }

    pub fn get(&self, id: OrderId) -> Result<&Order, OrderError> {
        self.orders.get(&id).ok_or(OrderError::UnknownOrder(id))
    }

    pub fn get_mut(&mut self, id: OrderId) -> Result<&mut Order, OrderError> {
        self.orders.get_mut(&id).ok_or(OrderError::UnknownOrder(id))
    }

    /// All orders in creation order, whatever their status.
    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.values()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Ids of pending orders on one symbol, in ledger order.
    pub fn pending_for(&self, symbol: &str) -> Vec<OrderId> {
        self.orders
            .values()
            .filter(|o| o.is_pending() && o.symbol.as_str() == symbol)
            .map(|o| o.id)
            .collect()
    }

    /// Ids of open orders on one symbol, in ledger order.
    pub fn open_for(&self, symbol: &str) -> Vec<OrderId> {
        self.orders
            .values()
            .filter(|o| o.is_open() && o.symbol.as_str() == symbol)
            .map(|o| o.id)
            .collect()
    }

    /// All open orders across symbols, in ledger order.
    pub fn open_orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.values().filter(|o| o.is_open())
    }
}
