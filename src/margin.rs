// 4.0: used-margin computation and margin level.
//
// the margin level is a percentage: equity / used margin * 100, infinite
// (None) when used margin is zero. a None level can never breach the
// margin-call or stop-out thresholds.

use crate::order::Order;
use crate::types::Quote;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Pluggable used-margin computation over the account's open orders.
///
/// The reference behavior treats used margin as permanently zero, which makes
/// margin-call and stop-out unreachable; `ZeroMargin` preserves that so
/// replays of historical backtests stay identical. `NotionalMargin` is the
/// opt-in real formula for callers who want the risk machinery live.
pub trait MarginModel: std::fmt::Debug {
    fn used_margin(&self, open_orders: &[&Order], leverage: Decimal) -> Quote;
}

/// Used margin is always zero. Margin level stays infinite.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroMargin;

impl MarginModel for ZeroMargin {
    fn used_margin(&self, _open_orders: &[&Order], _leverage: Decimal) -> Quote {
        Quote::zero()
    }
}

/// Used margin = sum of lots x 100000 x open price x leverage fraction.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotionalMargin;

impl MarginModel for NotionalMargin {
    fn used_margin(&self, open_orders: &[&Order], leverage: Decimal) -> Quote {
        let total = open_orders
            .iter()
            .filter_map(|order| order.open_price.map(|p| order.lots.units() * p.value()))
            .sum::<Decimal>();
        Quote::new(total * leverage)
    }
}

/// None means infinite: no margin-call or stop-out condition can trigger.
pub fn margin_level(equity: Quote, used_margin: Quote) -> Option<Decimal> {
    if used_margin.value().is_zero() {
        None
    } else {
        Some(equity.value() / used_margin.value() * dec!(100))
    }
}

/// Whether a (possibly infinite) margin level breaches a threshold percentage.
pub fn breaches(level: Option<Decimal>, threshold: Decimal) -> bool {
    level.is_some_and(|l| l <= threshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{OrderDirectives, OrderLedger};
    use crate::types::{Lots, Price, Side, Symbol, Timestamp};
    use rust_decimal_macros::dec;

    fn open_order_ledger() -> OrderLedger {
        let mut ledger = OrderLedger::new();
        let id = ledger.create(
            Symbol::new("EURUSD"),
            Side::Buy,
            Lots::new_unchecked(dec!(1)),
            OrderDirectives::market(),
            Price::new_unchecked(dec!(1.1)),
            Timestamp::from_millis(0),
        );
        ledger
            .get_mut(id)
            .unwrap()
            .fill(Price::new_unchecked(dec!(1.1)), Timestamp::from_millis(0))
            .unwrap();
        ledger
    }

    #[test]
    fn zero_margin_is_always_zero() {
        let ledger = open_order_ledger();
        let open: Vec<_> = ledger.open_orders().collect();
        let used = ZeroMargin.used_margin(&open, Decimal::ONE / dec!(500));
        assert_eq!(used.value(), dec!(0));
    }

    #[test]
    fn notional_margin_scales_with_leverage() {
        let ledger = open_order_ledger();
        let open: Vec<_> = ledger.open_orders().collect();
        // 1 lot x 100000 x 1.1 x (1/500) = 220
        let used = NotionalMargin.used_margin(&open, Decimal::ONE / dec!(500));
        assert_eq!(used.value(), dec!(220));
    }

    #[test]
    fn margin_level_infinite_when_unused() {
        assert_eq!(margin_level(Quote::new(dec!(1000)), Quote::zero()), None);
        assert!(!breaches(None, dec!(100)));
    }

    #[test]
    fn margin_level_percentage() {
        let level = margin_level(Quote::new(dec!(110)), Quote::new(dec!(220)));
        assert_eq!(level, Some(dec!(50)));
        assert!(breaches(level, dec!(50)));
        assert!(!breaches(level, dec!(49)));
    }
}
