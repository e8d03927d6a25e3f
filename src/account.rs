//! Account state: balance, simulated clock, risk thresholds.
//!
//! The account is the single owner of the balance and the simulated local
//! date. Balance moves only when an order closes (realized net profit) or on
//! an explicit deposit/withdrawal; the local date only ever moves forward.

use crate::config::AccountConfig;
use crate::types::{Quote, Symbol, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub currency: String,
    balance: Quote,
    local_date: Timestamp,
    // margin fraction, e.g. 1/500 for 500x accounts
    pub leverage: Decimal,
    pub negative_balance_protection: bool,
    // fixed per-order fee, stored as an absolute value
    commission: Quote,
    // thresholds are percentages of margin level
    pub margin_call_level: Decimal,
    pub stop_out_level: Decimal,
    watched: HashSet<Symbol>,
    pub total_deposited: Quote,
    pub total_withdrawn: Quote,
}

impl Account {
    pub fn new(config: AccountConfig) -> Self {
        Self {
            currency: config.currency,
            balance: config.balance,
            local_date: config.start_date,
            leverage: config.leverage,
            negative_balance_protection: config.negative_balance_protection,
            commission: config.commission.abs(),
            margin_call_level: config.margin_call_level,
            stop_out_level: config.stop_out_level,
            watched: HashSet::new(),
            total_deposited: Quote::zero(),
            total_withdrawn: Quote::zero(),
        }
    }

    pub fn balance(&self) -> Quote {
        self.balance
    }

    pub fn local_date(&self) -> Timestamp {
        self.local_date
    }

    /// Advance the simulated clock. Going backwards is silently ignored; the
    /// local date is monotonically non-decreasing.
    pub fn set_local_date(&mut self, date: Timestamp) {
        if date > self.local_date {
            self.local_date = date;
        }
    }

    pub fn commission(&self) -> Quote {
        self.commission
    }

    /// Realize a closed order's net profit into the balance.
    pub fn realize(&mut self, net_profit: Quote) {
        self.balance = self.balance.add(net_profit);
    }

    pub fn deposit(&mut self, amount: Quote) {
        self.balance = self.balance.add(amount);
        self.total_deposited = self.total_deposited.add(amount);
    }

    pub fn withdraw(&mut self, amount: Quote) {
        self.balance = self.balance.sub(amount);
        self.total_withdrawn = self.total_withdrawn.add(amount);
    }

    pub fn watch(&mut self, symbol: Symbol) {
        self.watched.insert(symbol);
    }

    pub fn is_watching(&self, symbol: &str) -> bool {
        self.watched.contains(symbol)
    }
}
