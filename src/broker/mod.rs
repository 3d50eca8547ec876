//! Brokerage gateway capability
//!
//! The core only sees the gateway through the [`Broker`] trait. The real
//! transport lives outside this crate; [`PaperBroker`] simulates one for the
//! binary and the tests.

mod account;
mod paper;
mod quote;
mod types;

pub use account::{
    position_for, AccountSnapshot, DayRange, PositionExposure, BUYING_POWER, CASH_BALANCE,
    NET_LIQUIDATION,
};
pub use paper::PaperBroker;
pub use quote::{day_range, QuoteFetcher};
pub use types::{
    AccountValue, Bar, BrokerError, OrderHandle, OrderStatus, OrderStatusReport, PositionSnapshot,
    QuoteHandle, QuoteTick,
};

use async_trait::async_trait;
use std::time::Duration;

use crate::order::OrderLeg;

/// Operations the core needs from a brokerage gateway
///
/// Implementations serialize their own request/response pairs per connection.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Open a session; `false` when the gateway could not be reached
    async fn connect(&self, host: &str, port: u16, client_id: i32, timeout: Duration) -> bool;
    async fn disconnect(&self);
    fn is_connected(&self) -> bool;

    async fn account_values(&self) -> Result<Vec<AccountValue>, BrokerError>;
    async fn positions(&self) -> Result<Vec<PositionSnapshot>, BrokerError>;

    /// Start a market data subscription
    async fn request_quote(&self, symbol: &str) -> Result<QuoteHandle, BrokerError>;
    async fn cancel_quote(&self, handle: QuoteHandle) -> Result<(), BrokerError>;
    /// Latest fields of a subscription
    async fn poll_quote(&self, handle: QuoteHandle) -> Result<QuoteTick, BrokerError>;

    /// Today's bars, one synchronous round trip
    async fn request_daily_bars(&self, symbol: &str) -> Result<Vec<Bar>, BrokerError>;

    async fn place_order(&self, symbol: &str, leg: &OrderLeg) -> Result<OrderHandle, BrokerError>;
    async fn poll_order_status(&self, handle: OrderHandle) -> Result<OrderStatusReport, BrokerError>;
    async fn cancel_order(&self, handle: OrderHandle) -> Result<(), BrokerError>;
}
