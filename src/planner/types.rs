//! Order plan types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::order::{Action, OrderLeg};

/// Order strategy offered by the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStrategy {
    #[serde(rename = "market")]
    MarketOnly,
    #[serde(rename = "market-1-stop")]
    MarketPlusOneStop,
    #[serde(rename = "market-3-stops")]
    MarketPlusThreeStops,
    #[serde(rename = "3-stops")]
    ThreeStopsOnly,
    #[serde(rename = "limit")]
    LimitOnly,
    #[serde(rename = "stop")]
    StopOnly,
    #[serde(rename = "market-3-stops-oco")]
    MarketPlusThreeStopsWithOco,
}

impl OrderStrategy {
    pub const ALL: [OrderStrategy; 7] = [
        OrderStrategy::MarketPlusThreeStops,
        OrderStrategy::MarketPlusOneStop,
        OrderStrategy::ThreeStopsOnly,
        OrderStrategy::MarketOnly,
        OrderStrategy::LimitOnly,
        OrderStrategy::StopOnly,
        OrderStrategy::MarketPlusThreeStopsWithOco,
    ];

    /// Label shown in the panel's order type selector
    pub fn label(&self) -> &'static str {
        match self {
            OrderStrategy::MarketOnly => "Market Order",
            OrderStrategy::MarketPlusOneStop => "Market + 1 Stop",
            OrderStrategy::MarketPlusThreeStops => "Market + 3 Stops",
            OrderStrategy::ThreeStopsOnly => "3 Stops Only",
            OrderStrategy::LimitOnly => "Limit Order",
            OrderStrategy::StopOnly => "Stop Order",
            OrderStrategy::MarketPlusThreeStopsWithOco => "Market + 3 Stops + OCO",
        }
    }

    /// Short identifier used on the command line
    pub fn id(&self) -> &'static str {
        match self {
            OrderStrategy::MarketOnly => "market",
            OrderStrategy::MarketPlusOneStop => "market-1-stop",
            OrderStrategy::MarketPlusThreeStops => "market-3-stops",
            OrderStrategy::ThreeStopsOnly => "3-stops",
            OrderStrategy::LimitOnly => "limit",
            OrderStrategy::StopOnly => "stop",
            OrderStrategy::MarketPlusThreeStopsWithOco => "market-3-stops-oco",
        }
    }

    /// Whether the strategy opens with a market order that must fill first
    pub fn has_market_entry(&self) -> bool {
        matches!(
            self,
            OrderStrategy::MarketOnly
                | OrderStrategy::MarketPlusOneStop
                | OrderStrategy::MarketPlusThreeStops
                | OrderStrategy::MarketPlusThreeStopsWithOco
        )
    }
}

impl fmt::Display for OrderStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OrderStrategy {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        Self::ALL
            .into_iter()
            .find(|strategy| {
                strategy.label().eq_ignore_ascii_case(tag) || strategy.id().eq_ignore_ascii_case(tag)
            })
            .ok_or_else(|| PlanError::UnknownStrategy(tag.to_string()))
    }
}

/// Planning errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// Stop is on the wrong side of the reference price
    #[error("invalid risk geometry: stop {stop} is not beyond reference {reference} for {action}")]
    InvalidRiskGeometry {
        action: Action,
        reference: Decimal,
        stop: Decimal,
    },
    #[error("unknown order strategy: {0}")]
    UnknownStrategy(String),
    #[error("order quantity must be positive")]
    ZeroQuantity,
    #[error("prices must be positive")]
    InvalidPrice,
}

/// Inputs to the planner, taken from the trader's final confirmation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRequest {
    pub strategy: OrderStrategy,
    pub symbol: String,
    pub quantity: u64,
    pub entry_price: Decimal,
    pub stop_price: Decimal,
    pub action: Action,
}

/// Protective structure priced from the primary's average fill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtectionKind {
    /// One stop for the full quantity at the stop price
    SingleStop,
    /// Three-way stop ladder between fill and stop
    StopLadder,
    /// 2R target/stop OCO pair on a third, two ladder stops on the rest
    LadderWithOco,
}

/// Protective legs to derive once the primary fills
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillProtection {
    pub kind: ProtectionKind,
    /// Side of the primary order being protected
    pub action: Action,
    pub quantity: u64,
    pub stop_price: Decimal,
}

/// One step of a plan, with its dependency on earlier steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum PlanStep {
    /// Placed, then awaited until the broker reports a terminal state
    Primary { leg: OrderLeg },
    /// Placed without waiting on anything
    Independent { leg: OrderLeg },
    /// Requires the preceding primary leg to have filled
    OnFill { protection: FillProtection },
}

/// Ordered set of broker orders implementing one strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLegPlan {
    pub symbol: String,
    pub strategy: OrderStrategy,
    pub action: Action,
    pub quantity: u64,
    pub entry_price: Decimal,
    pub stop_price: Decimal,
    pub steps: Vec<PlanStep>,
}

impl OrderLegPlan {
    /// The leg that must fill before anything else is placed
    pub fn primary(&self) -> Option<&OrderLeg> {
        self.steps.iter().find_map(|step| match step {
            PlanStep::Primary { leg } => Some(leg),
            _ => None,
        })
    }

    /// Post-fill protection, if the plan has any
    pub fn protection(&self) -> Option<&FillProtection> {
        self.steps.iter().find_map(|step| match step {
            PlanStep::OnFill { protection } => Some(protection),
            _ => None,
        })
    }
}

/// A stop price paired with its share count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LadderRung {
    pub price: Decimal,
    pub quantity: u64,
}
