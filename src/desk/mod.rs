//! Trading desk facade
//!
//! What the panel front end talks to: connection management, the refresh
//! cycle (account, quote, position, LOD/HOD stop, auto-sizing) and order
//! submission through the execution coordinator.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

use crate::broker::{
    day_range, position_for, AccountSnapshot, Broker, BrokerError, DayRange, PositionExposure,
    PositionSnapshot, QuoteFetcher,
};
use crate::config::Config;
use crate::execution::{ExecutionCoordinator, ExecutionResult};
use crate::order::Action;
use crate::planner::{plan_order, PlanRequest};
use crate::risk::{NotSizable, PositionSizer, SizingResult};
use crate::telemetry::{record_latency, LatencyMetric};

/// Desk-level failures
#[derive(Debug, Error)]
pub enum DeskError {
    #[error("Not connected to the gateway")]
    NotConnected,
    #[error(transparent)]
    Broker(#[from] BrokerError),
}

/// Where the stop price comes from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopSource {
    /// Whatever the trader typed
    #[default]
    Manual,
    /// Session low, for longs
    LowOfDay,
    /// Session high, for shorts
    HighOfDay,
}

/// Inputs of one ticker refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerRequest {
    pub symbol: String,
    pub action: Action,
    /// Falls back to the configured risk percent
    pub risk_percent: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    #[serde(default)]
    pub stop_source: StopSource,
}

impl TickerRequest {
    pub fn new(symbol: impl Into<String>, action: Action) -> Self {
        Self {
            symbol: symbol.into(),
            action,
            risk_percent: None,
            stop_price: None,
            stop_source: StopSource::Manual,
        }
    }

    pub fn with_stop(mut self, stop_price: Decimal) -> Self {
        self.stop_price = Some(stop_price);
        self
    }

    pub fn with_stop_source(mut self, stop_source: StopSource) -> Self {
        self.stop_source = stop_source;
        self
    }

    pub fn with_risk_percent(mut self, risk_percent: Decimal) -> Self {
        self.risk_percent = Some(risk_percent);
        self
    }
}

/// Everything the panel shows after a ticker refresh
#[derive(Debug, Clone)]
pub struct TickerView {
    pub symbol: String,
    pub account: AccountSnapshot,
    /// Live price, `None` when the feed produced nothing in time
    pub price: Option<Decimal>,
    pub position: PositionSnapshot,
    pub exposure: Option<PositionExposure>,
    /// Stop after LOD/HOD substitution
    pub stop_price: Option<Decimal>,
    pub day_range: Option<DayRange>,
    /// Sizing at the live price; absent without a price and a stop
    pub sizing: Option<Result<SizingResult, NotSizable>>,
}

/// Caller-facing entry point of the core
pub struct TradingDesk {
    broker: Arc<dyn Broker>,
    config: Config,
    sizer: PositionSizer,
    coordinator: ExecutionCoordinator,
}

impl TradingDesk {
    pub fn new(broker: Arc<dyn Broker>, config: Config) -> Self {
        let sizer = PositionSizer::from_config(&config.risk);
        let coordinator = ExecutionCoordinator::new(broker.clone(), config.execution.clone());
        Self {
            broker,
            config,
            sizer,
            coordinator,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn coordinator(&self) -> &ExecutionCoordinator {
        &self.coordinator
    }

    pub fn is_connected(&self) -> bool {
        self.broker.is_connected()
    }

    /// (Re)connect to the configured gateway
    ///
    /// An existing session is dropped first. Returns whether the new session
    /// is up; failure is reported, never fatal.
    pub async fn connect(&self) -> bool {
        let broker = &self.config.broker;
        if self.broker.is_connected() {
            tracing::info!("Dropping existing gateway session");
            self.broker.disconnect().await;
        }

        let connected = self
            .broker
            .connect(&broker.host, broker.port, broker.client_id, broker.connect_timeout())
            .await;

        if connected {
            tracing::info!(host = %broker.host, port = broker.port, client_id = broker.client_id, "Connected to gateway");
        } else {
            tracing::error!(host = %broker.host, port = broker.port, client_id = broker.client_id, "Gateway connection failed");
        }
        connected
    }

    pub async fn disconnect(&self) {
        self.broker.disconnect().await;
    }

    /// Account balances in the configured currency
    pub async fn refresh_account(&self) -> Result<AccountSnapshot, DeskError> {
        self.ensure_connected()?;
        let values = self.broker.account_values().await?;
        let snapshot = AccountSnapshot::from_values(&values, &self.config.broker.currency);
        tracing::debug!(
            net_liquidation = ?snapshot.net_liquidation,
            buying_power = ?snapshot.buying_power,
            "Account refreshed"
        );
        Ok(snapshot)
    }

    /// Full refresh for one symbol
    pub async fn refresh_ticker(&self, request: &TickerRequest) -> Result<TickerView, DeskError> {
        let account = self.refresh_account().await?;
        let symbol = request.symbol.trim().to_uppercase();

        let started = Instant::now();
        let price = QuoteFetcher::new(self.broker.as_ref(), &self.config.quote)
            .fetch(&symbol)
            .await?;
        record_latency(LatencyMetric::QuoteFetch, started.elapsed());

        let positions = self.broker.positions().await?;
        let position = position_for(&positions, &symbol);

        let (stop_price, day_range) = self.resolve_stop(&symbol, request).await;

        let equity = account.equity();
        let exposure = price.map(|p| PositionExposure::new(position.quantity, p, equity));

        let sizer = match request.risk_percent {
            Some(risk) => self.sizer.clone().with_risk_percent(risk),
            None => self.sizer.clone(),
        };
        let sizing = match (price, stop_price) {
            (Some(entry), Some(stop)) => {
                Some(sizer.size(equity, entry, stop, request.action, position.quantity))
            }
            _ => None,
        };

        if let Some(Err(reason)) = &sizing {
            tracing::info!(%symbol, %reason, "Trade not sizable");
        }

        Ok(TickerView {
            symbol,
            account,
            price,
            position,
            exposure,
            stop_price,
            day_range,
            sizing,
        })
    }

    /// Stop after LOD/HOD substitution; lookup failures keep the manual stop
    async fn resolve_stop(
        &self,
        symbol: &str,
        request: &TickerRequest,
    ) -> (Option<Decimal>, Option<DayRange>) {
        if request.stop_source == StopSource::Manual {
            return (request.stop_price, None);
        }

        match day_range(self.broker.as_ref(), symbol).await {
            Ok(Some(range)) => {
                let stop = match request.stop_source {
                    StopSource::LowOfDay => range.low,
                    _ => range.high,
                };
                tracing::debug!(symbol, %stop, source = ?request.stop_source, "Stop set from day range");
                (Some(stop), Some(range))
            }
            Ok(None) => {
                tracing::warn!(symbol, "No bars for day range, keeping stop");
                (request.stop_price, None)
            }
            Err(e) => {
                tracing::warn!(symbol, error = %e, "Day range lookup failed, keeping stop");
                (request.stop_price, None)
            }
        }
    }

    /// Plan and execute the trader's confirmed order
    pub async fn submit(&self, request: &PlanRequest) -> ExecutionResult {
        match plan_order(request) {
            Ok(plan) => self.coordinator.execute_plan(&plan).await,
            Err(err) => {
                tracing::warn!(symbol = %request.symbol, error = %err, "Order plan rejected");
                ExecutionResult::refused(&request.symbol, request.strategy, err)
            }
        }
    }

    fn ensure_connected(&self) -> Result<(), DeskError> {
        if self.broker.is_connected() {
            Ok(())
        } else {
            Err(DeskError::NotConnected)
        }
    }
}
