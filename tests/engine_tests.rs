//! End-to-end scenarios: clock advance, fills, exits, risk enforcement.

use broker_core::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn tick(symbol: &str, bid: Decimal, ask: Decimal, seconds: i64) -> Tick {
    Tick::new(
        symbol,
        Price::new_unchecked(bid),
        Price::new_unchecked(ask),
        Timestamp::from_millis(seconds * 1000),
    )
}

fn engine_with_ticks(ticks: Vec<Tick>) -> Engine {
    let mut engine = Engine::new(EngineConfig::default());
    engine.register_symbol("EURUSD");
    engine.load_ticks("EURUSD", ticks).unwrap();
    engine
}

fn one_lot() -> Lots {
    Lots::new_unchecked(dec!(1))
}

#[test]
fn advance_always_lands_on_the_window_end() {
    let mut engine = engine_with_ticks(vec![]);

    let applied = engine.advance(3600).unwrap();
    assert!(applied.is_empty());
    assert_eq!(engine.local_date().as_millis(), 3_600_000);

    // with ticks, the final date is still the requested end, not the last tick
    engine
        .load_ticks("EURUSD", vec![tick("EURUSD", dec!(1.10), dec!(1.1002), 3700)])
        .unwrap();
    let applied = engine.advance(3600).unwrap();
    assert_eq!(applied.len(), 1);
    assert_eq!(engine.local_date().as_millis(), 7_200_000);
}

#[test]
fn buy_limit_opens_only_when_ask_reaches_limit() {
    let mut engine = engine_with_ticks(vec![
        tick("EURUSD", dec!(1.1010), dec!(1.1012), 10),
        tick("EURUSD", dec!(1.1005), dec!(1.1007), 20),
        tick("EURUSD", dec!(1.0998), dec!(1.1000), 30),
    ]);
    engine.advance(15).unwrap();

    let id = engine
        .place_order(
            "EURUSD",
            Side::Buy,
            one_lot(),
            OrderDirectives::market().with_limit(Price::new_unchecked(dec!(1.1000))),
        )
        .unwrap();

    // ask 1.1007 > limit: stays pending
    engine.advance(10).unwrap();
    assert_eq!(engine.order(id).unwrap().status, OrderStatus::Pending);

    // first tick with ask <= limit fills, at the ask
    engine.advance(10).unwrap();
    let order = engine.order(id).unwrap();
    assert_eq!(order.status, OrderStatus::Open);
    assert_eq!(order.open_price.unwrap().value(), dec!(1.1000));
    assert_eq!(order.open_date.unwrap().as_millis(), 30_000);
}

#[test]
fn sell_stop_waits_for_bid_to_fall() {
    let mut engine = engine_with_ticks(vec![
        tick("EURUSD", dec!(1.0960), dec!(1.0962), 10),
        tick("EURUSD", dec!(1.0950), dec!(1.0952), 20),
        tick("EURUSD", dec!(1.0895), dec!(1.0897), 30),
    ]);
    engine.advance(15).unwrap();

    let id = engine
        .place_order(
            "EURUSD",
            Side::Sell,
            one_lot(),
            OrderDirectives::market().with_stop(Price::new_unchecked(dec!(1.0900))),
        )
        .unwrap();

    engine.advance(10).unwrap();
    assert_eq!(engine.order(id).unwrap().status, OrderStatus::Pending);

    engine.advance(10).unwrap();
    let order = engine.order(id).unwrap();
    assert_eq!(order.status, OrderStatus::Open);
    // sells open at the bid
    assert_eq!(order.open_price.unwrap().value(), dec!(1.0895));
}

#[test]
fn market_order_realizes_profit_minus_commission() {
    let config = EngineConfig::new(AccountConfig {
        commission: Quote::new(dec!(7)),
        ..AccountConfig::default()
    });
    let mut engine = Engine::new(config);
    engine.register_symbol("EURUSD");
    engine
        .load_ticks(
            "EURUSD",
            vec![
                tick("EURUSD", dec!(1.0998), dec!(1.1000), 10),
                tick("EURUSD", dec!(1.1050), dec!(1.1052), 20),
            ],
        )
        .unwrap();
    engine.advance(15).unwrap();

    let id = engine
        .place_order("EURUSD", Side::Buy, one_lot(), OrderDirectives::market())
        .unwrap();

    // opening never touches the balance
    assert_eq!(engine.balance().value(), dec!(100000));
    assert_eq!(engine.order(id).unwrap().open_price.unwrap().value(), dec!(1.1000));

    engine.advance(10).unwrap();
    engine.close_order(id).unwrap();

    // (1.1050 - 1.1000) x 1 x 100000 - 7 = 493
    assert_eq!(engine.order_gross_profit(id).unwrap().value(), dec!(500.0000));
    assert_eq!(engine.order_net_profit(id).unwrap().value(), dec!(493.0000));
    assert_eq!(engine.balance().value(), dec!(100493.0000));
}

#[test]
fn losses_are_realized_too() {
    let mut engine = engine_with_ticks(vec![
        tick("EURUSD", dec!(1.0998), dec!(1.1000), 10),
        tick("EURUSD", dec!(1.0940), dec!(1.0942), 20),
    ]);
    engine.advance(15).unwrap();

    let id = engine
        .place_order("EURUSD", Side::Buy, one_lot(), OrderDirectives::market())
        .unwrap();
    engine.advance(10).unwrap();
    engine.close_order(id).unwrap();

    assert_eq!(engine.order_net_profit(id).unwrap().value(), dec!(-600.0000));
    assert_eq!(engine.balance().value(), dec!(99400.0000));
}

#[test]
fn cancel_only_works_once_and_only_on_pending() {
    let mut engine = engine_with_ticks(vec![tick("EURUSD", dec!(1.0998), dec!(1.1000), 10)]);
    engine.advance(15).unwrap();

    let pending = engine
        .place_order(
            "EURUSD",
            Side::Buy,
            one_lot(),
            OrderDirectives::market().with_limit(Price::new_unchecked(dec!(1.0900))),
        )
        .unwrap();
    engine.cancel_order(pending).unwrap();
    assert_eq!(engine.order(pending).unwrap().status, OrderStatus::Canceled);
    assert!(matches!(
        engine.cancel_order(pending),
        Err(EngineError::InvalidStateTransition { .. })
    ));

    let open = engine
        .place_order("EURUSD", Side::Buy, one_lot(), OrderDirectives::market())
        .unwrap();
    assert!(matches!(
        engine.cancel_order(open),
        Err(EngineError::InvalidStateTransition { .. })
    ));
}

#[test]
fn stop_loss_wins_over_take_profit_on_the_same_tick() {
    let mut engine = engine_with_ticks(vec![
        tick("EURUSD", dec!(1.0998), dec!(1.1000), 10),
        // bid below the stop-loss; take-profit would also read as hit if
        // evaluated against a crossed book
        tick("EURUSD", dec!(1.0945), dec!(1.0960), 20),
    ]);
    engine.advance(15).unwrap();

    let id = engine
        .place_order(
            "EURUSD",
            Side::Buy,
            one_lot(),
            OrderDirectives::market()
                .with_stop_loss(Price::new_unchecked(dec!(1.0950)))
                .with_take_profit(Price::new_unchecked(dec!(1.1100))),
        )
        .unwrap();

    engine.advance(10).unwrap();
    let order = engine.order(id).unwrap();
    assert_eq!(order.status, OrderStatus::Closed);
    assert_eq!(order.close_price.unwrap().value(), dec!(1.0945));

    let close_reasons: Vec<CloseReason> = engine
        .events()
        .iter()
        .filter_map(|e| match &e.payload {
            EventPayload::OrderClosed(ev) => Some(ev.reason),
            _ => None,
        })
        .collect();
    assert_eq!(close_reasons, vec![CloseReason::StopLoss]);
}

#[test]
fn take_profit_closes_when_stop_loss_is_clear() {
    let mut engine = engine_with_ticks(vec![
        tick("EURUSD", dec!(1.0998), dec!(1.1000), 10),
        tick("EURUSD", dec!(1.1105), dec!(1.1107), 20),
    ]);
    engine.advance(15).unwrap();

    let id = engine
        .place_order(
            "EURUSD",
            Side::Buy,
            one_lot(),
            OrderDirectives::market()
                .with_stop_loss(Price::new_unchecked(dec!(1.0950)))
                .with_take_profit(Price::new_unchecked(dec!(1.1100))),
        )
        .unwrap();

    engine.advance(10).unwrap();
    let order = engine.order(id).unwrap();
    assert_eq!(order.status, OrderStatus::Closed);
    assert_eq!(order.close_price.unwrap().value(), dec!(1.1105));
    assert_eq!(engine.balance().value(), dec!(101050.0000));
}

#[test]
fn closed_order_snapshot_is_immutable() {
    let mut engine = engine_with_ticks(vec![
        tick("EURUSD", dec!(1.0998), dec!(1.1000), 10),
        tick("EURUSD", dec!(1.1050), dec!(1.1052), 20),
        tick("EURUSD", dec!(1.2000), dec!(1.2002), 30),
    ]);
    engine.advance(15).unwrap();

    let id = engine
        .place_order("EURUSD", Side::Buy, one_lot(), OrderDirectives::market())
        .unwrap();
    engine.advance(10).unwrap();
    engine.close_order(id).unwrap();

    let first = engine.order(id).unwrap().clone();

    // later ticks must not disturb the frozen close
    engine.advance(10).unwrap();
    let second = engine.order(id).unwrap();
    assert_eq!(second.close_price, first.close_price);
    assert_eq!(second.close_date, first.close_date);
    assert_eq!(engine.order_gross_profit(id).unwrap().value(), dec!(500.0000));
}

#[test]
fn price_lookup_requires_an_applied_tick() {
    let mut engine = engine_with_ticks(vec![tick("EURUSD", dec!(1.0998), dec!(1.1000), 10)]);

    // loaded but never advanced through: no observable price yet
    let result = engine.place_order("EURUSD", Side::Buy, one_lot(), OrderDirectives::market());
    assert!(matches!(result, Err(EngineError::MissingPrice(_))));
    assert!(matches!(engine.bid("EURUSD"), Err(EngineError::MissingPrice(_))));
}

#[test]
fn unknown_symbol_is_rejected_everywhere() {
    let mut engine = Engine::new(EngineConfig::default());

    assert!(matches!(
        engine.place_order("GBPUSD", Side::Buy, one_lot(), OrderDirectives::market()),
        Err(EngineError::UnknownSymbol(_))
    ));
    assert!(matches!(
        engine.load_ticks("GBPUSD", vec![tick("GBPUSD", dec!(1.25), dec!(1.2502), 10)]),
        Err(EngineError::UnknownSymbol(_))
    ));
    assert!(matches!(engine.watch_symbol("GBPUSD"), Err(EngineError::UnknownSymbol(_))));
    assert!(matches!(engine.last_tick("GBPUSD"), Err(EngineError::UnknownSymbol(_))));
}

#[test]
fn mismatched_tick_batch_is_rejected() {
    let mut engine = Engine::new(EngineConfig::default());
    engine.register_symbol("EURUSD");

    let result = engine.load_ticks("EURUSD", vec![tick("GBPUSD", dec!(1.25), dec!(1.2502), 10)]);
    assert!(matches!(result, Err(EngineError::InvalidArgument(_))));
}

#[test]
fn directive_updates_rejected_after_close() {
    let mut engine = engine_with_ticks(vec![
        tick("EURUSD", dec!(1.0998), dec!(1.1000), 10),
        tick("EURUSD", dec!(1.1050), dec!(1.1052), 20),
    ]);
    engine.advance(15).unwrap();

    let id = engine
        .place_order("EURUSD", Side::Buy, one_lot(), OrderDirectives::market())
        .unwrap();

    engine.set_stop_loss(id, Price::new_unchecked(dec!(1.0900))).unwrap();
    assert_eq!(engine.stop_loss(id).unwrap().unwrap().value(), dec!(1.0900));
    engine.clear_stop_loss(id).unwrap();
    assert!(engine.stop_loss(id).unwrap().is_none());

    engine.advance(10).unwrap();
    engine.close_order(id).unwrap();

    assert!(matches!(
        engine.set_take_profit(id, Price::new_unchecked(dec!(1.2))),
        Err(EngineError::InvalidStateTransition { .. })
    ));
}

#[test]
fn zero_margin_never_triggers_risk_events() {
    // default model: used margin is permanently zero, so even a deep loss
    // leaves the margin level infinite
    let mut engine = engine_with_ticks(vec![
        tick("EURUSD", dec!(1.0998), dec!(1.1000), 10),
        tick("EURUSD", dec!(0.6000), dec!(0.6002), 20),
    ]);
    engine.advance(15).unwrap();

    engine
        .place_order("EURUSD", Side::Buy, one_lot(), OrderDirectives::market())
        .unwrap();
    engine.advance(10).unwrap();

    assert_eq!(engine.used_margin().value(), dec!(0));
    assert_eq!(engine.margin_level().unwrap(), None);
    assert!(!engine
        .events()
        .iter()
        .any(|e| matches!(e.payload, EventPayload::MarginCall(_) | EventPayload::StopOut(_))));
}

#[test]
fn notional_margin_stop_out_force_closes() {
    let config = EngineConfig::new(AccountConfig {
        balance: Quote::new(dec!(300)),
        ..AccountConfig::default()
    });
    let mut engine = Engine::with_margin_model(config, Box::new(NotionalMargin));
    engine.register_symbol("EURUSD");
    engine
        .load_ticks(
            "EURUSD",
            vec![
                tick("EURUSD", dec!(1.0998), dec!(1.1000), 10),
                tick("EURUSD", dec!(1.0980), dec!(1.0982), 20),
            ],
        )
        .unwrap();
    engine.advance(15).unwrap();

    let id = engine
        .place_order("EURUSD", Side::Buy, one_lot(), OrderDirectives::market())
        .unwrap();
    // used margin = 100000 x 1.1 / 500 = 220
    assert_eq!(engine.used_margin().value(), dec!(220.0));

    engine.advance(10).unwrap();

    // equity fell to 300 - 200 = 100; level 100/220 = 45.45% <= 50
    let order = engine.order(id).unwrap();
    assert_eq!(order.status, OrderStatus::Closed);
    assert_eq!(engine.balance().value(), dec!(100.0000));

    assert!(engine
        .events()
        .iter()
        .any(|e| matches!(e.payload, EventPayload::StopOut(_))));
    let reasons: Vec<CloseReason> = engine
        .events()
        .iter()
        .filter_map(|e| match &e.payload {
            EventPayload::OrderClosed(ev) => Some(ev.reason),
            _ => None,
        })
        .collect();
    assert_eq!(reasons, vec![CloseReason::StopOut]);
}

#[test]
fn negative_balance_protection_closes_underwater_orders() {
    let config = EngineConfig::new(AccountConfig {
        balance: Quote::new(dec!(100)),
        negative_balance_protection: true,
        ..AccountConfig::default()
    });
    let mut engine = Engine::new(config);
    engine.register_symbol("EURUSD");
    engine
        .load_ticks(
            "EURUSD",
            vec![
                tick("EURUSD", dec!(1.0998), dec!(1.1000), 10),
                tick("EURUSD", dec!(1.0900), dec!(1.0902), 20),
            ],
        )
        .unwrap();
    engine.advance(15).unwrap();

    let id = engine
        .place_order("EURUSD", Side::Buy, one_lot(), OrderDirectives::market())
        .unwrap();
    engine.advance(10).unwrap();

    // equity = 100 + (1.0900 - 1.1000) x 100000 = -900: protection kicks in
    let order = engine.order(id).unwrap();
    assert_eq!(order.status, OrderStatus::Closed);
    let reasons: Vec<CloseReason> = engine
        .events()
        .iter()
        .filter_map(|e| match &e.payload {
            EventPayload::OrderClosed(ev) => Some(ev.reason),
            _ => None,
        })
        .collect();
    assert_eq!(reasons, vec![CloseReason::NegativeBalance]);
}

#[test]
fn multi_symbol_advance_interleaves_by_timestamp() {
    let mut engine = Engine::new(EngineConfig::default());
    engine.register_symbol("EURUSD");
    engine.register_symbol("GBPUSD");

    engine
        .load_ticks(
            "EURUSD",
            vec![
                tick("EURUSD", dec!(1.10), dec!(1.1002), 10),
                tick("EURUSD", dec!(1.11), dec!(1.1102), 30),
            ],
        )
        .unwrap();
    engine
        .load_ticks("GBPUSD", vec![tick("GBPUSD", dec!(1.25), dec!(1.2502), 20)])
        .unwrap();

    let applied = engine.advance(60).unwrap();
    let order: Vec<(&str, i64)> = applied
        .iter()
        .map(|t| (t.symbol.as_str(), t.timestamp.as_millis() / 1000))
        .collect();
    assert_eq!(order, vec![("EURUSD", 10), ("GBPUSD", 20), ("EURUSD", 30)]);
}

#[test]
fn equal_timestamps_process_in_registration_order() {
    let mut engine = Engine::new(EngineConfig::default());
    engine.register_symbol("EURUSD");
    engine.register_symbol("GBPUSD");

    engine
        .load_ticks("GBPUSD", vec![tick("GBPUSD", dec!(1.25), dec!(1.2502), 10)])
        .unwrap();
    engine
        .load_ticks("EURUSD", vec![tick("EURUSD", dec!(1.10), dec!(1.1002), 10)])
        .unwrap();

    // EURUSD registered first, so its tick wins the tie
    let applied = engine.advance(60).unwrap();
    let symbols: Vec<&str> = applied.iter().map(|t| t.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["EURUSD", "GBPUSD"]);
}

#[test]
fn replay_is_deterministic() {
    let run = || {
        let mut engine = engine_with_ticks(vec![
            tick("EURUSD", dec!(1.0998), dec!(1.1000), 10),
            tick("EURUSD", dec!(1.1050), dec!(1.1052), 20),
            tick("EURUSD", dec!(1.0940), dec!(1.0942), 30),
        ]);
        engine.advance(15).unwrap();
        engine
            .place_order(
                "EURUSD",
                Side::Buy,
                one_lot(),
                OrderDirectives::market().with_stop_loss(Price::new_unchecked(dec!(1.0950))),
            )
            .unwrap();
        engine.advance(30).unwrap();
        (
            engine.balance(),
            engine.local_date(),
            engine.events().len(),
            serde_json::to_string(engine.order(OrderId(1)).unwrap()).unwrap(),
        )
    };

    assert_eq!(run(), run());
}

#[test]
fn deposit_withdraw_move_balance_and_emit_events() {
    let mut engine = Engine::new(EngineConfig::default());

    engine.deposit(Quote::new(dec!(500))).unwrap();
    engine.withdraw(Quote::new(dec!(200))).unwrap();
    assert_eq!(engine.balance().value(), dec!(100300));

    assert!(matches!(
        engine.deposit(Quote::new(dec!(-1))),
        Err(EngineError::InvalidArgument(_))
    ));

    let kinds: Vec<&str> = engine
        .events()
        .iter()
        .map(|e| match e.payload {
            EventPayload::Deposit(_) => "deposit",
            EventPayload::Withdrawal(_) => "withdrawal",
            _ => "other",
        })
        .collect();
    assert_eq!(kinds, vec!["deposit", "withdrawal"]);
}

#[test]
fn protected_accounts_cannot_overdraw() {
    let config = EngineConfig::new(AccountConfig {
        negative_balance_protection: true,
        ..AccountConfig::default()
    });
    let mut engine = Engine::new(config);

    assert!(matches!(
        engine.withdraw(Quote::new(dec!(200000))),
        Err(EngineError::InvalidArgument(_))
    ));
    assert_eq!(engine.balance().value(), dec!(100000));
}

#[test]
fn event_ids_are_strictly_increasing() {
    let mut engine = engine_with_ticks(vec![
        tick("EURUSD", dec!(1.0998), dec!(1.1000), 10),
        tick("EURUSD", dec!(1.1050), dec!(1.1052), 20),
    ]);
    engine.watch_symbol("EURUSD").unwrap();
    engine.advance(30).unwrap();
    engine.deposit(Quote::new(dec!(1))).unwrap();

    let ids: Vec<u64> = engine.events().iter().map(|e| e.id.0).collect();
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
    assert!(!ids.is_empty());
}
