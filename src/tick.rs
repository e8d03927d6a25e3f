// 2.0: tick storage. per-symbol append-only, time-ordered sequences plus the
// last-applied tick cache the matching engine prices against.
//
// loading a batch merges and re-sorts; the sort is stable so ticks sharing a
// timestamp keep their arrival order. the last-tick cache is only written by
// the clock advancer as ticks are applied, never by loading, so price lookups
// reflect simulated time and not merely loaded history.

use crate::types::{Price, Symbol, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// a single best bid/ask observation. immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tick {
    pub symbol: Symbol,
    pub bid: Price,
    pub ask: Price,
    pub timestamp: Timestamp,
}

impl Tick {
    pub fn new(symbol: impl Into<Symbol>, bid: Price, ask: Price, timestamp: Timestamp) -> Self {
        Self {
            symbol: symbol.into(),
            bid,
            ask,
            timestamp,
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum TickError {
    #[error("Symbol {0} is not registered")]
    UnknownSymbol(Symbol),

    #[error("No tick has been applied for symbol {0}")]
    MissingPrice(Symbol),
}

/// Per-symbol tick sequences for one simulated account.
#[derive(Debug, Clone, Default)]
pub struct TickStore {
    // registration order matters: clock advance collects ticks symbol-by-symbol
    // in this order before the stable sort, which fixes tie-breaking.
    symbols: Vec<Symbol>,
    ticks: HashMap<Symbol, Vec<Tick>>,
    last: HashMap<Symbol, Tick>,
}

impl TickStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a symbol. Registering twice is a no-op.
    pub fn register_symbol(&mut self, symbol: Symbol) {
        if !self.ticks.contains_key(&symbol) {
            self.symbols.push(symbol.clone());
            self.ticks.insert(symbol, Vec::new());
        }
    }

    pub fn is_registered(&self, symbol: &str) -> bool {
        self.ticks.contains_key(symbol)
    }

    /// Registered symbols in registration order.
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Merge a batch of ticks into a symbol's sequence and re-sort by timestamp.
    /// The sort is stable: equal timestamps keep their relative order.
    pub fn load_ticks(&mut self, symbol: &str, batch: Vec<Tick>) -> Result<(), TickError> {
        let stored = self
            .ticks
            .get_mut(symbol)
            .ok_or_else(|| TickError::UnknownSymbol(Symbol::new(symbol)))?;

        stored.extend(batch);
        stored.sort_by_key(|tick| tick.timestamp);
        Ok(())
    }

    /// All stored ticks for a symbol, ascending by timestamp.
    pub fn ticks(&self, symbol: &str) -> Result<&[Tick], TickError> {
        self.ticks
            .get(symbol)
            .map(Vec::as_slice)
            .ok_or_else(|| TickError::UnknownSymbol(Symbol::new(symbol)))
    }

    /// The most recently applied tick, or None if the symbol has not yet been
    /// advanced through.
    pub fn last_tick(&self, symbol: &str) -> Result<Option<&Tick>, TickError> {
        if !self.is_registered(symbol) {
            return Err(TickError::UnknownSymbol(Symbol::new(symbol)));
        }
        Ok(self.last.get(symbol))
    }

    /// Record a tick as applied. Called by the clock advancer per processed tick.
    pub(crate) fn apply_tick(&mut self, tick: Tick) {
        self.last.insert(tick.symbol.clone(), tick);
    }

    pub fn bid(&self, symbol: &str) -> Result<Price, TickError> {
        self.last_tick(symbol)?
            .map(|tick| tick.bid)
            .ok_or_else(|| TickError::MissingPrice(Symbol::new(symbol)))
    }

    pub fn ask(&self, symbol: &str) -> Result<Price, TickError> {
        self.last_tick(symbol)?
            .map(|tick| tick.ask)
            .ok_or_else(|| TickError::MissingPrice(Symbol::new(symbol)))
    }
}
