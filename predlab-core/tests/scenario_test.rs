//! End-to-end scenarios: detect → simulate on hand-built markets.

use chrono::{DateTime, Duration, TimeZone, Utc};
use predlab_core::execution::{cost_after_entry_fee, execution_price, proceeds_after_exit_fee};
use predlab_core::{
    EntrySignal, FeeModel, MarketSeries, Outcome, OutcomePolicy, PricePoint, Side,
    SignalDetector, StrategyRule, TradeSimulator,
};

fn t(i: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 10, 1, 0, 0, 0).unwrap() + Duration::days(i)
}

fn market(prices: &[f64], outcome: Option<Outcome>) -> MarketSeries {
    let points = prices
        .iter()
        .enumerate()
        .map(|(i, &p)| PricePoint::new(t(i as i64), p))
        .collect();
    MarketSeries::new("election-2024", "Will candidate X win?", points)
        .unwrap()
        .with_outcome(outcome)
}

fn detect_one(series: &MarketSeries, rule: &StrategyRule) -> EntrySignal {
    let signals = SignalDetector::default().detect(series, rule);
    assert_eq!(signals.len(), 1, "expected exactly one entry");
    signals[0]
}

#[test]
fn scenario_a_longshot_wins() {
    let series = market(&[0.10, 0.12, 0.95], Some(Outcome::Yes));
    let rule = StrategyRule::buy_yes_below("yes_below_030", 0.30);

    let signal = detect_one(&series, &rule);
    assert_eq!(signal.entry_index, 0);
    assert_eq!(signal.entry_timestamp, t(0));
    assert_eq!(signal.entry_price(), 0.10);

    let trade = TradeSimulator::default()
        .simulate(&series, &signal, &rule)
        .unwrap();
    assert_eq!(trade.quoted_entry_price, 0.10);
    assert!((trade.net_return - 9.0).abs() < 1e-12);
    assert!(trade.win);
}

#[test]
fn scenario_b_longshot_loses() {
    let series = market(&[0.10, 0.12, 0.95], Some(Outcome::No));
    let rule = StrategyRule::buy_yes_below("yes_below_030", 0.30);
    let signal = detect_one(&series, &rule);

    let trade = TradeSimulator::default()
        .simulate(&series, &signal, &rule)
        .unwrap();
    assert_eq!(trade.net_return, -1.0);
    assert!(!trade.win);
}

#[test]
fn scenario_c_fees_and_slippage() {
    let exec = execution_price(0.10, Side::Yes, 0.01);
    let cost = cost_after_entry_fee(exec, 0.02);
    let proceeds = proceeds_after_exit_fee(1.0, 0.02);
    assert!((exec - 0.101).abs() < 1e-9);
    assert!((cost - 0.103).abs() < 1e-3);
    assert!((proceeds - 0.98).abs() < 1e-12);

    let series = market(&[0.10, 0.50], Some(Outcome::Yes));
    let rule = StrategyRule::buy_yes_below("yes_below_030", 0.30);
    let signal = detect_one(&series, &rule);
    let sim = TradeSimulator::new(FeeModel::new(0.02, 0.02, 0.01), OutcomePolicy::Explicit);
    let trade = sim.simulate(&series, &signal, &rule).unwrap();
    assert!((trade.execution_price - 0.101).abs() < 1e-9);
    assert!((trade.net_return - 8.51).abs() < 0.01, "got {}", trade.net_return);
    assert!(trade.win);
}

#[test]
fn scenario_d_ambiguous_final_price_excluded_in_both_modes() {
    let series = market(&[0.20, 0.35, 0.50], None);
    let rule = StrategyRule::buy_yes_below("yes_below_030", 0.30);
    let signal = detect_one(&series, &rule);

    for policy in [OutcomePolicy::Explicit, OutcomePolicy::price_as_proxy()] {
        let sim = TradeSimulator::new(FeeModel::zero(), policy);
        let exclusion = sim.simulate(&series, &signal, &rule).unwrap_err();
        assert!(exclusion.reason.is_indeterminate(), "{policy:?}");
        assert_eq!(exclusion.market_id, "election-2024");
    }
}

#[test]
fn proxy_mode_settles_decisive_final_price() {
    let series = market(&[0.20, 0.60, 0.97], None);
    let rule = StrategyRule::buy_yes_below("yes_below_030", 0.30);
    let signal = detect_one(&series, &rule);

    let explicit = TradeSimulator::default().simulate(&series, &signal, &rule);
    assert!(explicit.is_err());

    let proxy = TradeSimulator::new(FeeModel::zero(), OutcomePolicy::price_as_proxy());
    let trade = proxy.simulate(&series, &signal, &rule).unwrap();
    assert!(trade.win);
    assert!((trade.net_return - 4.0).abs() < 1e-9);
}

#[test]
fn no_signal_no_trade() {
    let series = market(&[0.60, 0.70, 0.80], Some(Outcome::Yes));
    let rule = StrategyRule::buy_yes_below("yes_below_030", 0.30);
    assert!(SignalDetector::default().detect(&series, &rule).is_empty());
}

#[test]
fn no_side_wins_when_market_resolves_no() {
    let series = market(&[0.90, 0.40, 0.02], Some(Outcome::No));
    let rule = StrategyRule::new(
        "fade_favorite",
        predlab_core::EntryCondition::PriceAbove {
            threshold: 0.85,
            inclusive: false,
        },
        predlab_core::SideSelector::Fixed { side: Side::No },
    );
    let signal = detect_one(&series, &rule);
    let trade = TradeSimulator::default()
        .simulate(&series, &signal, &rule)
        .unwrap();
    assert_eq!(trade.side, Side::No);
    assert!((trade.quoted_entry_price - 0.10).abs() < 1e-12);
    assert!(trade.win);
    assert!((trade.net_return - 9.0).abs() < 1e-9);
}
