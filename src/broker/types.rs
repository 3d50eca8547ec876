//! Broker value types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Handle for a placed order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderHandle(pub u64);

impl fmt::Display for OrderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle for a market data subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuoteHandle(pub u64);

/// Raw account value as reported by the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountValue {
    pub tag: String,
    pub currency: String,
    pub value: String,
}

impl AccountValue {
    pub fn new(tag: impl Into<String>, currency: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            currency: currency.into(),
            value: value.into(),
        }
    }
}

/// Signed share position in one symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub symbol: String,
    /// Positive = long, negative = short
    pub quantity: i64,
}

impl PositionSnapshot {
    pub fn flat(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            quantity: 0,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.quantity == 0
    }
}

/// Latest fields of a market data subscription
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteTick {
    pub market_price: Option<Decimal>,
    pub last: Option<Decimal>,
    pub close: Option<Decimal>,
}

impl QuoteTick {
    /// First positive price in priority order: market price, last, close
    pub fn tradable_price(&self) -> Option<Decimal> {
        [self.market_price, self.last, self.close]
            .into_iter()
            .flatten()
            .find(|p| *p > Decimal::ZERO)
    }
}

/// One daily bar's range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    pub low: Decimal,
    pub high: Decimal,
}

/// Gateway order states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    PendingSubmit,
    PreSubmitted,
    Submitted,
    Filled,
    Cancelled,
    ApiCancelled,
    Inactive,
}

impl OrderStatus {
    /// No further status changes will be reported
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled
                | OrderStatus::Cancelled
                | OrderStatus::ApiCancelled
                | OrderStatus::Inactive
        )
    }

    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::PendingSubmit => "PendingSubmit",
            OrderStatus::PreSubmitted => "PreSubmitted",
            OrderStatus::Submitted => "Submitted",
            OrderStatus::Filled => "Filled",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::ApiCancelled => "ApiCancelled",
            OrderStatus::Inactive => "Inactive",
        };
        f.write_str(s)
    }
}

impl FromStr for OrderStatus {
    type Err = BrokerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PendingSubmit" => Ok(OrderStatus::PendingSubmit),
            "PreSubmitted" => Ok(OrderStatus::PreSubmitted),
            "Submitted" => Ok(OrderStatus::Submitted),
            "Filled" => Ok(OrderStatus::Filled),
            "Cancelled" => Ok(OrderStatus::Cancelled),
            "ApiCancelled" => Ok(OrderStatus::ApiCancelled),
            "Inactive" => Ok(OrderStatus::Inactive),
            other => Err(BrokerError::Protocol(format!("unknown order status: {other}"))),
        }
    }
}

/// Order status poll result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusReport {
    pub status: OrderStatus,
    /// Zero until something has filled
    pub avg_fill_price: Decimal,
}

/// Broker request failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrokerError {
    #[error("not connected to the gateway")]
    NotConnected,
    #[error("order rejected: {0}")]
    Rejected(String),
    #[error("unknown order {0}")]
    UnknownOrder(OrderHandle),
    #[error("unknown subscription {0:?}")]
    UnknownSubscription(QuoteHandle),
    #[error("request timed out")]
    Timeout,
    #[error("protocol error: {0}")]
    Protocol(String),
}
