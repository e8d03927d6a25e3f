// 6.2 engine/matching.rs: the tick-processing algorithm. one tick runs, in
// this fixed order: entry evaluation over pending orders, exit evaluation
// over open orders, the watched-symbol tick event, then the account-wide
// margin-call check. the phases are strictly sequential; exit evaluation
// reads the balance that earlier closes in the same tick already moved.

use super::core::Engine;
use super::results::EngineError;
use crate::events::{
    CloseReason, EventPayload, MarginCallEvent, StopOutEvent, TickAppliedEvent,
};
use crate::margin::breaches;
use crate::tick::Tick;
use crate::types::Side;

impl Engine {
    pub(super) fn on_tick(&mut self, tick: &Tick) -> Result<(), EngineError> {
        self.evaluate_entries(tick)?;
        self.evaluate_exits(tick)?;

        if self.account.is_watching(tick.symbol.as_str()) {
            self.emit(EventPayload::TickApplied(TickAppliedEvent {
                tick: tick.clone(),
            }));
        }

        // margin call is informational: it forces nothing
        let level = self.margin_level()?;
        if breaches(level, self.account.margin_call_level) {
            if let Some(margin_level) = level {
                self.emit(EventPayload::MarginCall(MarginCallEvent { margin_level }));
            }
        }

        Ok(())
    }

    /// Fill pending orders whose stop or limit the tick satisfies, in ledger
    /// order. Fills price at the triggering side: ask for buys, bid for sells.
    fn evaluate_entries(&mut self, tick: &Tick) -> Result<(), EngineError> {
        for id in self.ledger.pending_for(tick.symbol.as_str()) {
            let (side, directives) = {
                let order = self.ledger.get(id)?;
                (order.side, order.directives)
            };

            let limit_hit = directives.limit.is_some_and(|limit| match side {
                Side::Buy => tick.ask <= limit,
                Side::Sell => tick.bid >= limit,
            });
            let stop_hit = directives.stop.is_some_and(|stop| match side {
                Side::Buy => tick.ask >= stop,
                Side::Sell => tick.bid <= stop,
            });

            if limit_hit || stop_hit {
                self.fill_order(id)?;
            }
        }
        Ok(())
    }

    /// Close open orders whose exit conditions the tick satisfies, in ledger
    /// order, each order evaluated independently.
    fn evaluate_exits(&mut self, tick: &Tick) -> Result<(), EngineError> {
        for id in self.ledger.open_for(tick.symbol.as_str()) {
            let (side, directives) = {
                let order = self.ledger.get(id)?;
                (order.side, order.directives)
            };

            // stop-loss wins over take-profit when both would trigger
            let stop_loss_hit = directives.stop_loss.is_some_and(|sl| match side {
                Side::Buy => tick.bid <= sl,
                Side::Sell => tick.ask >= sl,
            });

            if stop_loss_hit {
                self.close_order_with_reason(id, CloseReason::StopLoss)?;
            } else {
                let take_profit_hit = directives.take_profit.is_some_and(|tp| match side {
                    Side::Buy => tick.bid >= tp,
                    Side::Sell => tick.ask <= tp,
                });
                if take_profit_hit {
                    self.close_order_with_reason(id, CloseReason::TakeProfit)?;
                }
            }

            // margin level is recomputed per order: each close above moved the
            // balance the next order's check depends on
            let level = self.margin_level()?;
            if breaches(level, self.account.stop_out_level) && self.ledger.get(id)?.is_open() {
                self.close_order_with_reason(id, CloseReason::StopOut)?;
                if let Some(margin_level) = level {
                    self.emit(EventPayload::StopOut(StopOutEvent {
                        order_id: id,
                        margin_level,
                    }));
                }
            }

            if self.account.negative_balance_protection
                && self.equity()?.is_negative()
                && self.ledger.get(id)?.is_open()
            {
                self.close_order_with_reason(id, CloseReason::NegativeBalance)?;
            }
        }
        Ok(())
    }
}
