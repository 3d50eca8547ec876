//! Order primitives shared by the planner, the broker interface and the
//! execution coordinator

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Trade direction of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Sell,
}

impl Action {
    /// The side that closes a position opened with this action
    pub fn opposite(&self) -> Self {
        match self {
            Action::Buy => Action::Sell,
            Action::Sell => Action::Buy,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Buy => write!(f, "BUY"),
            Action::Sell => write!(f, "SELL"),
        }
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" | "LONG" => Ok(Action::Buy),
            "SELL" | "SHORT" => Ok(Action::Sell),
            other => Err(format!("unknown action: {other}")),
        }
    }
}

/// Order kind; the price lives on the variant that needs one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "price", rename_all = "lowercase")]
pub enum OrderKind {
    /// Fill at the prevailing price
    Market,
    /// Rest at a limit price
    Limit(Decimal),
    /// Trigger a market order once the stop price trades
    Stop(Decimal),
}

impl OrderKind {
    /// Price attached to the order, `None` for market orders
    pub fn price(&self) -> Option<Decimal> {
        match self {
            OrderKind::Market => None,
            OrderKind::Limit(p) | OrderKind::Stop(p) => Some(*p),
        }
    }
}

/// Time in force
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeInForce {
    #[default]
    Day,
    /// Good till cancelled
    Gtc,
}

/// A single broker order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLeg {
    pub side: Action,
    pub quantity: u64,
    pub kind: OrderKind,
    pub tif: TimeInForce,
    /// Legs sharing a group cancel each other on fill
    pub oco_group: Option<String>,
}

impl OrderLeg {
    fn new(side: Action, quantity: u64, kind: OrderKind) -> Self {
        Self {
            side,
            quantity,
            kind,
            tif: TimeInForce::Day,
            oco_group: None,
        }
    }

    pub fn market(side: Action, quantity: u64) -> Self {
        Self::new(side, quantity, OrderKind::Market)
    }

    pub fn limit(side: Action, quantity: u64, price: Decimal) -> Self {
        Self::new(side, quantity, OrderKind::Limit(price))
    }

    pub fn stop(side: Action, quantity: u64, price: Decimal) -> Self {
        Self::new(side, quantity, OrderKind::Stop(price))
    }

    /// Mark the leg good-till-cancelled
    pub fn gtc(mut self) -> Self {
        self.tif = TimeInForce::Gtc;
        self
    }

    /// Attach the leg to a one-cancels-other group
    pub fn with_oco(mut self, group: impl Into<String>) -> Self {
        self.oco_group = Some(group.into());
        self
    }

    pub fn price(&self) -> Option<Decimal> {
        self.kind.price()
    }
}

impl fmt::Display for OrderLeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            OrderKind::Market => write!(f, "{} {} MKT", self.side, self.quantity)?,
            OrderKind::Limit(p) => write!(f, "{} {} LMT @ {:.2}", self.side, self.quantity, p)?,
            OrderKind::Stop(p) => write!(f, "{} {} STP @ {:.2}", self.side, self.quantity, p)?,
        }
        if self.tif == TimeInForce::Gtc {
            write!(f, " GTC")?;
        }
        if let Some(group) = &self.oco_group {
            write!(f, " [{group}]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_action_opposite() {
        assert_eq!(Action::Buy.opposite(), Action::Sell);
        assert_eq!(Action::Sell.opposite(), Action::Buy);
    }

    #[test]
    fn test_action_parse() {
        assert_eq!("buy".parse::<Action>().unwrap(), Action::Buy);
        assert_eq!("SELL".parse::<Action>().unwrap(), Action::Sell);
        assert_eq!("short".parse::<Action>().unwrap(), Action::Sell);
        assert!("hold".parse::<Action>().is_err());
    }

    #[test]
    fn test_market_leg_has_no_price() {
        let leg = OrderLeg::market(Action::Buy, 100);
        assert_eq!(leg.price(), None);
        assert_eq!(leg.tif, TimeInForce::Day);
        assert!(leg.oco_group.is_none());
    }

    #[test]
    fn test_stop_leg_builder() {
        let leg = OrderLeg::stop(Action::Sell, 33, dec!(197.00))
            .gtc()
            .with_oco("OCO_1");
        assert_eq!(leg.price(), Some(dec!(197.00)));
        assert_eq!(leg.tif, TimeInForce::Gtc);
        assert_eq!(leg.oco_group.as_deref(), Some("OCO_1"));
    }

    #[test]
    fn test_leg_display() {
        let leg = OrderLeg::limit(Action::Sell, 33, dec!(221.5)).gtc();
        assert_eq!(leg.to_string(), "SELL 33 LMT @ 221.50 GTC");
    }
}
