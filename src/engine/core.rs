// 6.1 engine/core.rs: the engine owns one account, its tick store, its order
// ledger, the margin model and the event log. all state lives here.

use super::config::EngineConfig;
use super::results::EngineError;
use crate::account::Account;
use crate::config::AccountConfig;
use crate::events::{
    DepositEvent, Event, EventCollector, EventEmitter, EventPayload, WithdrawalEvent,
};
use crate::margin::{margin_level, MarginModel, ZeroMargin};
use crate::order::{gross_profit, net_profit, OrderLedger};
use crate::types::Side;
use crate::tick::{Tick, TickStore};
use crate::types::{Price, Quote, Symbol, Timestamp};
use rust_decimal::Decimal;

#[derive(Debug)]
pub struct Engine {
    pub(super) config: EngineConfig,
    pub(super) account: Account,
    pub(super) ticks: TickStore,
    pub(super) ledger: OrderLedger,
    pub(super) margin_model: Box<dyn MarginModel>,
    pub(super) events: EventCollector,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_margin_model(config, Box::new(ZeroMargin))
    }

    /// Construct with a non-default used-margin computation.
    pub fn with_margin_model(config: EngineConfig, margin_model: Box<dyn MarginModel>) -> Self {
        let account = Account::new(config.account.clone());
        Self {
            config,
            account,
            ticks: TickStore::new(),
            ledger: OrderLedger::new(),
            margin_model,
            events: EventCollector::new(),
        }
    }

    pub fn from_account_config(account: AccountConfig) -> Self {
        Self::new(EngineConfig::new(account))
    }

    // --- symbols and ticks ---

    pub fn register_symbol(&mut self, symbol: impl Into<Symbol>) {
        self.ticks.register_symbol(symbol.into());
    }

    /// Registered symbols in registration order.
    pub fn symbols(&self) -> &[Symbol] {
        self.ticks.symbols()
    }

    /// Start emitting a TickApplied event for every processed tick on a symbol.
    pub fn watch_symbol(&mut self, symbol: &str) -> Result<(), EngineError> {
        if !self.ticks.is_registered(symbol) {
            return Err(EngineError::UnknownSymbol(Symbol::new(symbol)));
        }
        self.account.watch(Symbol::new(symbol));
        Ok(())
    }

    /// Bulk-load historical ticks for a symbol. The batch may arrive unsorted;
    /// the store re-sorts on ingestion and advance sorts again.
    pub fn load_ticks(&mut self, symbol: &str, batch: Vec<Tick>) -> Result<(), EngineError> {
        if let Some(stray) = batch.iter().find(|t| t.symbol.as_str() != symbol) {
            return Err(EngineError::InvalidArgument(format!(
                "tick for {} in batch loaded for {}",
                stray.symbol, symbol
            )));
        }
        self.ticks.load_ticks(symbol, batch)?;
        Ok(())
    }

    pub fn stored_ticks(&self, symbol: &str) -> Result<&[Tick], EngineError> {
        Ok(self.ticks.ticks(symbol)?)
    }

    pub fn last_tick(&self, symbol: &str) -> Result<Option<&Tick>, EngineError> {
        Ok(self.ticks.last_tick(symbol)?)
    }

    pub fn bid(&self, symbol: &str) -> Result<Price, EngineError> {
        Ok(self.ticks.bid(symbol)?)
    }

    pub fn ask(&self, symbol: &str) -> Result<Price, EngineError> {
        Ok(self.ticks.ask(symbol)?)
    }

    // --- account state ---

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn balance(&self) -> Quote {
        self.account.balance()
    }

    pub fn local_date(&self) -> Timestamp {
        self.account.local_date()
    }

    /// Equity = balance + unrealized net profit of all open orders, priced at
    /// the current closing side (bid for buys, ask for sells).
    pub fn equity(&self) -> Result<Quote, EngineError> {
        let mut equity = self.account.balance();
        for order in self.ledger.open_orders() {
            // the closing side of the current quote: bid closes buys, ask closes sells
            let current = match order.side {
                Side::Buy => self.ticks.bid(order.symbol.as_str())?,
                Side::Sell => self.ticks.ask(order.symbol.as_str())?,
            };
            let open_price = order
                .open_price
                .ok_or_else(|| EngineError::MissingPrice(order.symbol.clone()))?;
            let gross = gross_profit(order.side, open_price, current, order.lots);
            equity = equity.add(net_profit(gross, Quote::zero(), self.account.commission()));
        }
        Ok(equity)
    }

    pub fn used_margin(&self) -> Quote {
        let open: Vec<_> = self.ledger.open_orders().collect();
        self.margin_model.used_margin(&open, self.account.leverage)
    }

    /// None means infinite (used margin is zero).
    pub fn margin_level(&self) -> Result<Option<Decimal>, EngineError> {
        Ok(margin_level(self.equity()?, self.used_margin()))
    }

    // --- funding ---

    pub fn deposit(&mut self, amount: Quote) -> Result<(), EngineError> {
        if amount.value() <= Decimal::ZERO {
            return Err(EngineError::InvalidArgument(
                "deposit amount must be positive".to_string(),
            ));
        }
        self.account.deposit(amount);
        let new_balance = self.account.balance();
        self.emit(EventPayload::Deposit(DepositEvent {
            amount,
            new_balance,
        }));
        Ok(())
    }

    pub fn withdraw(&mut self, amount: Quote) -> Result<(), EngineError> {
        if amount.value() <= Decimal::ZERO {
            return Err(EngineError::InvalidArgument(
                "withdrawal amount must be positive".to_string(),
            ));
        }
        if self.account.negative_balance_protection && amount > self.account.balance() {
            return Err(EngineError::InvalidArgument(format!(
                "withdrawal {} exceeds balance {}",
                amount,
                self.account.balance()
            )));
        }
        self.account.withdraw(amount);
        let new_balance = self.account.balance();
        self.emit(EventPayload::Withdrawal(WithdrawalEvent {
            amount,
            new_balance,
        }));
        Ok(())
    }

    // --- events ---

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    pub fn recent_events(&self, count: usize) -> &[Event] {
        let events = self.events.events();
        let start = events.len().saturating_sub(count);
        &events[start..]
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain()
    }

    pub(super) fn emit(&mut self, payload: EventPayload) {
        let event = Event::new(self.events.next_id(), self.account.local_date(), payload);

        if self.config.verbose {
            println!("[event {}] {:?}", event.id.0, event.payload);
        }

        self.events.emit(event);
        self.events.truncate_oldest(self.config.max_events);
    }

    pub(super) fn assert_symbol(&self, symbol: &str) -> Result<(), EngineError> {
        if !self.ticks.is_registered(symbol) {
            return Err(EngineError::UnknownSymbol(Symbol::new(symbol)));
        }
        Ok(())
    }
}
