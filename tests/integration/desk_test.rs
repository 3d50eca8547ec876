//! Desk refresh and submission against the paper gateway

use bracket_desk::broker::{Bar, PaperBroker, QuoteTick};
use bracket_desk::config::{Config, ExecutionConfig, QuoteConfig};
use bracket_desk::desk::{DeskError, StopSource, TickerRequest, TradingDesk};
use bracket_desk::execution::{ExecutionError, LegStatus};
use bracket_desk::order::{Action, OrderKind};
use bracket_desk::planner::{OrderStrategy, PlanRequest};
use rust_decimal_macros::dec;
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

fn config() -> Config {
    Config {
        quote: QuoteConfig {
            settle_ms: 1,
            poll_interval_ms: 1,
            max_polls: 3,
        },
        execution: ExecutionConfig {
            fill_poll_interval_ms: 1,
            max_fill_polls: 3,
            leg_pacing_ms: 1,
            oco_pacing_ms: 1,
            ..ExecutionConfig::default()
        },
        ..Config::default()
    }
}

fn paper() -> PaperBroker {
    PaperBroker::new()
        .with_account(dec!(100000), dec!(40000), dec!(160000))
        .with_quote(
            "TSLA",
            QuoteTick {
                market_price: None,
                last: Some(dec!(0)),
                close: Some(dec!(250)),
            },
        )
        .with_bars(
            "TSLA",
            vec![
                Bar {
                    low: dec!(244),
                    high: dec!(252.10),
                },
                Bar {
                    low: dec!(246),
                    high: dec!(254.50),
                },
            ],
        )
        .with_position("TSLA", -40)
}

#[tokio::test]
async fn test_refresh_then_short_with_three_stops() {
    let broker = Arc::new(paper());
    let desk = TradingDesk::new(broker.clone(), config());
    assert!(desk.connect().await);

    let view = assert_ok!(
        desk.refresh_ticker(
            &TickerRequest::new("TSLA", Action::Sell).with_stop_source(StopSource::HighOfDay)
        )
        .await
    );
    assert_eq!(view.price, Some(dec!(250)));
    assert_eq!(view.stop_price, Some(dec!(254.50)));
    assert_eq!(view.exposure.map(|e| e.value), Some(dec!(10000)));

    // 1000 / 4.50
    let sizing = assert_ok!(view.sizing.unwrap());
    assert_eq!(sizing.quantity, 222);
    assert_eq!(sizing.projected_quantity, -262);

    let result = desk
        .submit(&PlanRequest {
            strategy: OrderStrategy::MarketPlusThreeStops,
            symbol: view.symbol.clone(),
            quantity: sizing.quantity,
            entry_price: dec!(250),
            stop_price: dec!(254.50),
            action: Action::Sell,
        })
        .await;

    assert!(result.success, "{}", result.summary);
    assert_eq!(
        result.summary,
        "SELL 222 shares of TSLA at $250.00. 3 stop-loss orders submitted."
    );
    assert_eq!(broker.position("TSLA").await, -262);

    let working = broker.working_orders().await;
    assert_eq!(working.len(), 3);
    assert!(working.iter().all(|(_, leg)| leg.side == Action::Buy));
    let stops: Vec<_> = working.iter().map(|(_, leg)| leg.kind).collect();
    assert!(stops.contains(&OrderKind::Stop(dec!(251.50))));
    assert!(stops.contains(&OrderKind::Stop(dec!(253.00))));
    assert!(stops.contains(&OrderKind::Stop(dec!(254.50))));
}

#[tokio::test]
async fn test_disconnected_desk() {
    let desk = TradingDesk::new(Arc::new(paper()), config());

    assert!(matches!(
        assert_err!(desk.refresh_account().await),
        DeskError::NotConnected
    ));

    let result = desk
        .submit(&PlanRequest {
            strategy: OrderStrategy::MarketOnly,
            symbol: "TSLA".to_string(),
            quantity: 10,
            entry_price: dec!(250),
            stop_price: dec!(260),
            action: Action::Sell,
        })
        .await;
    assert_eq!(result.error, Some(ExecutionError::Connectivity));
    assert_eq!(result.summary, "Not connected to the gateway");
}

#[tokio::test]
async fn test_market_order_without_price_places_no_stops() {
    let broker = Arc::new(PaperBroker::new().connected());
    let desk = TradingDesk::new(broker.clone(), config());

    let result = desk
        .submit(&PlanRequest {
            strategy: OrderStrategy::MarketPlusOneStop,
            symbol: "MSFT".to_string(),
            quantity: 10,
            entry_price: dec!(400),
            stop_price: dec!(390),
            action: Action::Buy,
        })
        .await;

    assert!(!result.success);
    assert_eq!(result.summary, "Market order was not filled (Inactive)");
    assert_eq!(result.legs.len(), 1);
    assert!(matches!(result.legs[0].status, LegStatus::Rejected { .. }));
    assert_eq!(broker.placed_orders().await.len(), 1);
    assert!(broker.working_orders().await.is_empty());
}

#[tokio::test]
async fn test_stop_order_rests_at_gateway() {
    let broker = Arc::new(PaperBroker::new().connected());
    let desk = TradingDesk::new(broker.clone(), config());

    let result = desk
        .submit(&PlanRequest {
            strategy: OrderStrategy::StopOnly,
            symbol: "SPY".to_string(),
            quantity: 5,
            entry_price: dec!(500),
            stop_price: dec!(505.25),
            action: Action::Buy,
        })
        .await;

    assert!(result.success);
    assert_eq!(
        result.summary,
        "Stop order to BUY 5 shares of SPY at stop $505.25 submitted."
    );
    let working = broker.working_orders().await;
    assert_eq!(working.len(), 1);
    assert_eq!(working[0].1.kind, OrderKind::Stop(dec!(505.25)));
}
