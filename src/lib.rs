// broker-core: simulated brokerage matching and account-risk engine.
// given a chronologically ordered stream of price ticks it advances a virtual
// clock, fills or rejects pending orders, closes positions on stop-loss /
// take-profit / margin triggers, and keeps balance, equity and margin level
// consistent at every step. all computation is deterministic with no
// external I/O, so backtests replay bit-identically.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x types.rs:   primitives: Symbol, OrderId, Side, Price, Quote, Lots, Timestamp
//   2.x tick.rs:    per-symbol tick sequences + last-applied cache
//   3.x order.rs:   order status machine, profit formulas, the per-account ledger
//   4.x margin.rs:  pluggable used-margin models, margin level
//   5.x events.rs:  typed state-transition events + emitter trait
//   6.x engine/:    core engine: placement, matching, clock advance
//   7.x config.rs:  account construction defaults

pub mod account;
pub mod config;
pub mod engine;
pub mod events;
pub mod margin;
pub mod order;
pub mod tick;
pub mod types;

pub use account::*;
pub use config::*;
pub use engine::*;
pub use events::*;
pub use margin::*;
pub use order::*;
pub use tick::*;
pub use types::*;
