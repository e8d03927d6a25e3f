// 7.0 config.rs: account construction parameters with their documented
// defaults. the engine consumes these once at construction.

use crate::types::{Quote, Timestamp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    // Deposit currency
    pub currency: String,
    // Starting balance
    pub balance: Quote,
    // Margin fraction (1/500 = 500x account)
    pub leverage: Decimal,
    // Force-close open orders when equity goes negative
    pub negative_balance_protection: bool,
    // Fixed per-order fee, applied as an absolute value
    pub commission: Quote,
    // Margin level percentage that triggers the informational margin call
    pub margin_call_level: Decimal,
    // Margin level percentage that force-closes open orders
    pub stop_out_level: Decimal,
    // Initial simulated local date
    pub start_date: Timestamp,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
            balance: Quote::new(dec!(100000)),
            leverage: Decimal::ONE / dec!(500),
            negative_balance_protection: false,
            commission: Quote::zero(),
            margin_call_level: dec!(100),
            stop_out_level: dec!(50),
            start_date: Timestamp::epoch(),
        }
    }
}
