//! Sizing and planning through the public API

use bracket_desk::order::{Action, OrderKind, TimeInForce};
use bracket_desk::planner::{plan_order, OrderStrategy, PlanError, PlanRequest};
use bracket_desk::risk::{size_position, NotSizable, RiskInput};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio_test::assert_ok;

fn request(strategy: OrderStrategy, quantity: u64, entry: Decimal, stop: Decimal) -> PlanRequest {
    PlanRequest {
        strategy,
        symbol: "AAPL".to_string(),
        quantity,
        entry_price: entry,
        stop_price: stop,
        action: Action::Buy,
    }
}

#[test]
fn test_sized_quantity_feeds_the_ladder() {
    let sizing = assert_ok!(size_position(&RiskInput {
        equity: dec!(100000),
        risk_percent: dec!(1.0),
        entry_price: dec!(200),
        stop_price: dec!(190),
        action: Action::Buy,
        existing_position: 0,
    }));
    assert_eq!(sizing.quantity, 100);

    let plan = assert_ok!(plan_order(&request(
        OrderStrategy::ThreeStopsOnly,
        sizing.quantity,
        dec!(200),
        dec!(190),
    )));
    let legs = assert_ok!(plan.preview(dec!(200)));

    let sizes: Vec<u64> = legs.iter().map(|l| l.quantity).collect();
    assert_eq!(sizes, vec![33, 33, 34]);
    let prices: Vec<Decimal> = legs.iter().filter_map(|l| l.price()).collect();
    assert_eq!(prices, vec![dec!(196.67), dec!(193.33), dec!(190)]);
    assert!(legs.iter().all(|l| l.side == Action::Sell && l.tif == TimeInForce::Gtc));
}

#[test]
fn test_inverted_stop_is_not_sizable() {
    let result = size_position(&RiskInput {
        equity: dec!(100000),
        risk_percent: dec!(1.0),
        entry_price: dec!(190),
        stop_price: dec!(200),
        action: Action::Buy,
        existing_position: 0,
    });
    assert_eq!(result, Err(NotSizable::StopOnWrongSide));
}

#[test]
fn test_oco_preview_from_fill() {
    let plan = assert_ok!(plan_order(&request(
        OrderStrategy::MarketPlusThreeStopsWithOco,
        99,
        dec!(200),
        dec!(190),
    )));
    let legs = assert_ok!(plan.preview(dec!(200.50)));

    assert_eq!(legs.len(), 5);
    assert_eq!(legs[0].kind, OrderKind::Market);
    assert_eq!(legs[1].kind, OrderKind::Limit(dec!(221.50)));
    assert_eq!(legs[2].kind, OrderKind::Stop(dec!(197.00)));
    assert_eq!(legs[1].oco_group, legs[2].oco_group);
    assert!(legs[1].oco_group.as_deref().is_some_and(|g| g.starts_with("OCO_")));
    assert_eq!(legs[3].kind, OrderKind::Stop(dec!(193.50)));
    assert_eq!(legs[4].kind, OrderKind::Stop(dec!(190)));
    assert_eq!(legs[1..].iter().map(|l| l.quantity).sum::<u64>(), 132);
}

#[test]
fn test_strategy_tags_parse() {
    for strategy in OrderStrategy::ALL {
        assert_eq!(strategy.label().parse::<OrderStrategy>(), Ok(strategy));
        assert_eq!(strategy.id().parse::<OrderStrategy>(), Ok(strategy));
    }
    assert_eq!(
        "Bracket".parse::<OrderStrategy>(),
        Err(PlanError::UnknownStrategy("Bracket".to_string()))
    );
}
