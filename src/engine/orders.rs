//! Order operations: placement, cancellation, closing, directive updates and
//! the profit/commission query surface.

use super::core::Engine;
use super::results::EngineError;
use crate::events::{
    CloseReason, EventPayload, OrderCanceledEvent, OrderClosedEvent, OrderDirectivesUpdatedEvent,
    OrderOpenedEvent,
};
use crate::order::{gross_profit, net_profit, Order, OrderDirectives, OrderStatus};
use crate::types::{Lots, OrderId, Price, Quote, Side, Symbol};

impl Engine {
    /// Place an order. With neither stop nor limit directive this is a market
    /// order and fills immediately at the current ask (buy) or bid (sell);
    /// otherwise it rests as pending until a tick triggers it.
    pub fn place_order(
        &mut self,
        symbol: &str,
        side: Side,
        lots: Lots,
        directives: OrderDirectives,
    ) -> Result<OrderId, EngineError> {
        self.assert_symbol(symbol)?;

        let creation_price = match side {
            Side::Buy => self.ask(symbol)?,
            Side::Sell => self.bid(symbol)?,
        };

        let is_market = directives.is_market();
        let id = self.ledger.create(
            Symbol::new(symbol),
            side,
            lots,
            directives,
            creation_price,
            self.account.local_date(),
        );

        if is_market {
            self.fill_order(id)?;
        }

        Ok(id)
    }

    /// Fill a pending order at the triggering side's price and emit the open
    /// event. Shared by market-order placement and entry evaluation.
    pub(super) fn fill_order(&mut self, id: OrderId) -> Result<(), EngineError> {
        let (symbol, side) = {
            let order = self.ledger.get(id)?;
            (order.symbol.clone(), order.side)
        };

        let open_price = match side {
            Side::Buy => self.ask(symbol.as_str())?,
            Side::Sell => self.bid(symbol.as_str())?,
        };
        let open_date = self.account.local_date();

        self.ledger.get_mut(id)?.fill(open_price, open_date)?;

        self.emit(EventPayload::OrderOpened(OrderOpenedEvent {
            order_id: id,
            open_price,
            open_date,
        }));
        Ok(())
    }

    /// Cancel a pending order. The cancel price (ask for sells, bid for buys)
    /// is computed purely for the emitted event.
    pub fn cancel_order(&mut self, id: OrderId) -> Result<(), EngineError> {
        let (symbol, side, status) = {
            let order = self.ledger.get(id)?;
            (order.symbol.clone(), order.side, order.status)
        };

        if status != OrderStatus::Pending {
            return Err(EngineError::InvalidStateTransition {
                id,
                from: status,
                to: OrderStatus::Canceled,
            });
        }

        let cancel_price = match side {
            Side::Sell => self.ask(symbol.as_str())?,
            Side::Buy => self.bid(symbol.as_str())?,
        };
        let cancel_date = self.account.local_date();

        self.ledger.get_mut(id)?.cancel()?;

        self.emit(EventPayload::OrderCanceled(OrderCanceledEvent {
            order_id: id,
            cancel_price,
            cancel_date,
        }));
        Ok(())
    }

    /// Manually close an open order at the current bid (buy) or ask (sell).
    pub fn close_order(&mut self, id: OrderId) -> Result<(), EngineError> {
        self.close_order_with_reason(id, CloseReason::Manual)
    }

    /// Close an open order, realizing its net profit into the balance.
    pub(super) fn close_order_with_reason(
        &mut self,
        id: OrderId,
        reason: CloseReason,
    ) -> Result<(), EngineError> {
        let (symbol, side, lots, open_price) = {
            let order = self.ledger.get(id)?;
            (order.symbol.clone(), order.side, order.lots, order.open_price)
        };

        let close_price = match side {
            Side::Buy => self.bid(symbol.as_str())?,
            Side::Sell => self.ask(symbol.as_str())?,
        };
        let close_date = self.account.local_date();

        // the transition check runs before any balance mutation, so an
        // illegal close leaves the account untouched
        self.ledger.get_mut(id)?.close(close_price, close_date)?;

        let open_price = open_price.ok_or_else(|| EngineError::MissingPrice(symbol.clone()))?;
        let gross = gross_profit(side, open_price, close_price, lots);
        let net = net_profit(gross, Quote::zero(), self.account.commission());
        self.account.realize(net);

        self.emit(EventPayload::OrderClosed(OrderClosedEvent {
            order_id: id,
            close_price,
            close_date,
            net_profit: net,
            reason,
        }));
        Ok(())
    }

    // --- directive updates ---

    pub fn set_stop_loss(&mut self, id: OrderId, stop_loss: Price) -> Result<(), EngineError> {
        self.update_directives(id, |order| order.set_stop_loss(Some(stop_loss)))
    }

    pub fn clear_stop_loss(&mut self, id: OrderId) -> Result<(), EngineError> {
        self.update_directives(id, |order| order.set_stop_loss(None))
    }

    pub fn set_take_profit(&mut self, id: OrderId, take_profit: Price) -> Result<(), EngineError> {
        self.update_directives(id, |order| order.set_take_profit(Some(take_profit)))
    }

    pub fn clear_take_profit(&mut self, id: OrderId) -> Result<(), EngineError> {
        self.update_directives(id, |order| order.set_take_profit(None))
    }

    fn update_directives(
        &mut self,
        id: OrderId,
        update: impl FnOnce(&mut Order) -> Result<(), crate::order::OrderError>,
    ) -> Result<(), EngineError> {
        let order = self.ledger.get_mut(id)?;
        update(order)?;
        let directives = order.directives;

        self.emit(EventPayload::OrderDirectivesUpdated(OrderDirectivesUpdatedEvent {
            order_id: id,
            stop_loss: directives.stop_loss,
            take_profit: directives.take_profit,
        }));
        Ok(())
    }

    // --- queries ---

    pub fn order(&self, id: OrderId) -> Result<&Order, EngineError> {
        Ok(self.ledger.get(id)?)
    }

    /// All orders in creation order, whatever their status.
    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.ledger.orders()
    }

    pub fn stop_loss(&self, id: OrderId) -> Result<Option<Price>, EngineError> {
        Ok(self.ledger.get(id)?.directives.stop_loss)
    }

    pub fn take_profit(&self, id: OrderId) -> Result<Option<Price>, EngineError> {
        Ok(self.ledger.get(id)?.directives.take_profit)
    }

    /// Gross profit: unrealized at the current closing side for open orders,
    /// frozen at the close price for closed orders.
    pub fn order_gross_profit(&self, id: OrderId) -> Result<Quote, EngineError> {
        let order = self.ledger.get(id)?;

        let close_price = match order.status {
            OrderStatus::Open => match order.side {
                Side::Buy => self.bid(order.symbol.as_str())?,
                Side::Sell => self.ask(order.symbol.as_str())?,
            },
            OrderStatus::Closed => order
                .close_price
                .ok_or_else(|| EngineError::MissingPrice(order.symbol.clone()))?,
            status => {
                return Err(EngineError::InvalidStateTransition {
                    id,
                    from: status,
                    to: status,
                })
            }
        };

        let open_price = order
            .open_price
            .ok_or_else(|| EngineError::MissingPrice(order.symbol.clone()))?;
        Ok(gross_profit(order.side, open_price, close_price, order.lots))
    }

    pub fn order_net_profit(&self, id: OrderId) -> Result<Quote, EngineError> {
        let gross = self.order_gross_profit(id)?;
        let swaps = self.order_swaps(id)?;
        let commission = self.order_commission(id)?;
        Ok(net_profit(gross, swaps, commission))
    }

    /// Overnight financing adjustment. Fixed at zero in this model.
    pub fn order_swaps(&self, id: OrderId) -> Result<Quote, EngineError> {
        self.ledger.get(id)?;
        Ok(Quote::zero())
    }

    pub fn order_commission(&self, id: OrderId) -> Result<Quote, EngineError> {
        self.ledger.get(id)?;
        Ok(self.account.commission())
    }
}
