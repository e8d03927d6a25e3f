//! Engine configuration options.

use crate::config::AccountConfig;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Account construction parameters.
    pub account: AccountConfig,
    /// Maximum number of events to retain in memory.
    pub max_events: usize,
    /// Enable verbose logging.
    pub verbose: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            account: AccountConfig::default(),
            max_events: 100_000,
            verbose: false,
        }
    }
}

impl EngineConfig {
    pub fn new(account: AccountConfig) -> Self {
        Self {
            account,
            ..Self::default()
        }
    }
}
