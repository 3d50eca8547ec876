//! Bounded quote retrieval
//!
//! Subscribe, give the feed a moment to settle, then poll at fixed
//! sub-intervals for a usable price. The subscription is cancelled on every
//! exit path.

use rust_decimal::Decimal;
use std::time::Duration;

use super::{Broker, BrokerError, DayRange, QuoteHandle};
use crate::config::QuoteConfig;

/// Grace period on top of the poll schedule before a stalled gateway is abandoned
const SLACK: Duration = Duration::from_millis(500);

/// Fetches a single tradable price for a symbol
pub struct QuoteFetcher<'a> {
    broker: &'a dyn Broker,
    settle: Duration,
    poll_interval: Duration,
    max_polls: u32,
}

impl<'a> QuoteFetcher<'a> {
    pub fn new(broker: &'a dyn Broker, config: &QuoteConfig) -> Self {
        Self {
            broker,
            settle: Duration::from_millis(config.settle_ms),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            max_polls: config.max_polls,
        }
    }

    /// Poll schedule length; `fetch` gives up on a silent gateway shortly after
    pub fn ceiling(&self) -> Duration {
        self.settle + self.poll_interval * self.max_polls
    }

    /// Current price for `symbol`, `None` when no positive price arrived in time
    pub async fn fetch(&self, symbol: &str) -> Result<Option<Decimal>, BrokerError> {
        let handle = self.broker.request_quote(symbol).await?;
        let result = tokio::time::timeout(self.ceiling() + SLACK, self.poll(handle))
            .await
            .unwrap_or(Err(BrokerError::Timeout));

        match tokio::time::timeout(SLACK, self.broker.cancel_quote(handle)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(symbol, error = %e, "Failed to cancel quote subscription"),
            Err(_) => tracing::warn!(symbol, "Quote cancellation timed out"),
        }

        match &result {
            Ok(Some(price)) => tracing::debug!(symbol, %price, "Quote received"),
            Ok(None) => tracing::warn!(symbol, "No price available"),
            Err(e) => tracing::warn!(symbol, error = %e, "Quote request failed"),
        }
        result
    }

    async fn poll(&self, handle: QuoteHandle) -> Result<Option<Decimal>, BrokerError> {
        tokio::time::sleep(self.settle).await;

        for attempt in 0..self.max_polls {
            if let Some(price) = self.broker.poll_quote(handle).await?.tradable_price() {
                return Ok(Some(price));
            }
            tracing::trace!(attempt, "Waiting for quote");
            tokio::time::sleep(self.poll_interval).await;
        }

        // One last look before giving up
        Ok(self.broker.poll_quote(handle).await?.tradable_price())
    }
}

/// Low and high of day for `symbol`; a single round trip, no retry
pub async fn day_range(broker: &dyn Broker, symbol: &str) -> Result<Option<DayRange>, BrokerError> {
    let bars = broker.request_daily_bars(symbol).await?;
    Ok(DayRange::from_bars(&bars))
}
