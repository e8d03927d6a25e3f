// 6.0: the matching and account-risk engine. coordinates order placement,
// entry/exit evaluation, margin enforcement and the simulated clock.
// deterministic and synchronous with no external I/O.

mod clock;
mod config;
mod core;
mod matching;
mod orders;
mod results;

pub use config::EngineConfig;
pub use core::Engine;
pub use results::EngineError;
