//! Brokerage Simulation Walkthrough.
//!
//! Demonstrates the engine lifecycle: market fills, pending triggers,
//! stop-loss / take-profit precedence, stop-out enforcement and the event log.

use broker_core::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn main() {
    println!("Brokerage Matching Engine Simulation");
    println!("Single Account, Best Bid/Ask, Deterministic Replay\n");

    scenario_1_market_order_lifecycle();
    scenario_2_pending_triggers();
    scenario_3_stop_loss_take_profit();
    scenario_4_stop_out();
    scenario_5_watched_ticks_and_events();

    println!("\nAll simulations completed successfully.");
}

fn tick(symbol: &str, bid: Decimal, ask: Decimal, seconds: i64) -> Tick {
    Tick::new(
        symbol,
        Price::new_unchecked(bid),
        Price::new_unchecked(ask),
        Timestamp::from_millis(seconds * 1000),
    )
}

/// Market order filled at ask, closed manually at a better bid.
fn scenario_1_market_order_lifecycle() {
    println!("Scenario 1: Market Order Lifecycle\n");

    let mut engine = Engine::new(EngineConfig::default());
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
    println!("  Balance: ${}", engine.balance());

    let id = engine
        .place_order("EURUSD", Side::Buy, Lots::new_unchecked(dec!(1)), OrderDirectives::market())
        .unwrap();
    let order = engine.order(id).unwrap();
    println!("  Buy 1 lot filled @ {}", order.open_price.unwrap());

    engine.advance(10).unwrap();
    println!("  Unrealized net profit: ${}", engine.order_net_profit(id).unwrap());

    engine.close_order(id).unwrap();
    println!("  Closed @ {}, balance: ${}\n", engine.order(id).unwrap().close_price.unwrap(), engine.balance());
}

/// Pending sell stop stays pending until bid crosses the stop.
fn scenario_2_pending_triggers() {
    println!("Scenario 2: Pending Order Triggers\n");

    let mut engine = Engine::new(EngineConfig::default());
    engine.register_symbol("EURUSD");
    engine
        .load_ticks(
            "EURUSD",
            vec![
                tick("EURUSD", dec!(1.0960), dec!(1.0962), 10),
                tick("EURUSD", dec!(1.0950), dec!(1.0952), 20),
                tick("EURUSD", dec!(1.0895), dec!(1.0897), 30),
            ],
        )
        .unwrap();

    engine.advance(15).unwrap();

    let id = engine
        .place_order(
            "EURUSD",
            Side::Sell,
            Lots::new_unchecked(dec!(1)),
            OrderDirectives::market().with_stop(Price::new_unchecked(dec!(1.0900))),
        )
        .unwrap();
    println!("  Sell stop placed at 1.0900, status {:?}", engine.order(id).unwrap().status);

    engine.advance(10).unwrap();
    println!("  After bid 1.0950: status {:?}", engine.order(id).unwrap().status);

    engine.advance(10).unwrap();
    let order = engine.order(id).unwrap();
    println!("  After bid 1.0895: status {:?}, opened @ {}\n", order.status, order.open_price.unwrap());
}

/// Stop-loss beats take-profit when both would trigger on the same tick.
fn scenario_3_stop_loss_take_profit() {
    println!("Scenario 3: Stop-Loss / Take-Profit Precedence\n");

    let mut engine = Engine::new(EngineConfig::default());
    engine.register_symbol("EURUSD");
    engine
        .load_ticks(
            "EURUSD",
            vec![
                tick("EURUSD", dec!(1.0998), dec!(1.1000), 10),
                tick("EURUSD", dec!(1.0945), dec!(1.0960), 20),
            ],
        )
        .unwrap();

    engine.advance(15).unwrap();

    let id = engine
        .place_order(
            "EURUSD",
            Side::Buy,
            Lots::new_unchecked(dec!(1)),
            OrderDirectives::market()
                .with_stop_loss(Price::new_unchecked(dec!(1.0950)))
                .with_take_profit(Price::new_unchecked(dec!(1.1100))),
        )
        .unwrap();
    println!("  Buy open @ 1.1000, SL 1.0950, TP 1.1100");

    engine.advance(10).unwrap();
    let order = engine.order(id).unwrap();
    println!("  Tick bid 1.0945: status {:?}, closed @ {}", order.status, order.close_price.unwrap());
    println!("  Balance: ${}\n", engine.balance());
}

/// Stop-out force-closes under a live margin model.
fn scenario_4_stop_out() {
    println!("Scenario 4: Stop-Out Enforcement\n");

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
        .place_order("EURUSD", Side::Buy, Lots::new_unchecked(dec!(1)), OrderDirectives::market())
        .unwrap();
    println!("  Buy 1 lot on a $300 account, used margin ${}", engine.used_margin());

    engine.advance(10).unwrap();
    let order = engine.order(id).unwrap();
    println!("  After 20-pip drop: status {:?}, balance ${}", order.status, engine.balance());

    let stop_outs = engine
        .events()
        .iter()
        .filter(|e| matches!(e.payload, EventPayload::StopOut(_)))
        .count();
    println!("  Stop-out events: {}\n", stop_outs);
}

/// Watched symbols emit a tick event per processed tick.
fn scenario_5_watched_ticks_and_events() {
    println!("Scenario 5: Watched Symbols and the Event Log\n");

    let mut engine = Engine::new(EngineConfig::default());
    engine.register_symbol("EURUSD");
    engine.register_symbol("GBPUSD");
    engine.watch_symbol("EURUSD").unwrap();

    engine
        .load_ticks(
            "EURUSD",
            vec![
                tick("EURUSD", dec!(1.0998), dec!(1.1000), 10),
                tick("EURUSD", dec!(1.1002), dec!(1.1004), 20),
            ],
        )
        .unwrap();
    engine
        .load_ticks("GBPUSD", vec![tick("GBPUSD", dec!(1.2500), dec!(1.2502), 15)])
        .unwrap();

    let applied = engine.advance(30).unwrap();
    println!("  Applied {} ticks across 2 symbols", applied.len());

    let tick_events = engine
        .events()
        .iter()
        .filter(|e| matches!(e.payload, EventPayload::TickApplied(_)))
        .count();
    println!("  TickApplied events (EURUSD only): {}", tick_events);
    println!("  Local date: {}", engine.local_date());
    println!("  Events in log: {}", engine.events().len());
}
