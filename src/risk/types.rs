//! Risk sizing types

use crate::order::Action;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Inputs to a single sizing calculation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskInput {
    /// Account equity (net liquidation)
    pub equity: Decimal,
    /// Percent of equity put at risk, 0 < r <= 100
    pub risk_percent: Decimal,
    /// Expected entry price
    pub entry_price: Decimal,
    /// Protective stop price
    pub stop_price: Decimal,
    /// Direction of the new trade
    pub action: Action,
    /// Signed shares already held (negative = short)
    pub existing_position: i64,
}

/// Quantity and projected exposure for a trade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizingResult {
    /// Shares to trade, always at least one
    pub quantity: u64,
    /// Price distance between entry and stop
    pub per_share_risk: Decimal,
    /// Equity put at risk
    pub risk_budget: Decimal,
    /// quantity * entry
    pub trade_notional: Decimal,
    /// Trade notional as percent of equity
    pub trade_percent: Decimal,
    /// Signed position after the trade
    pub projected_quantity: i64,
    /// |projected_quantity| * entry
    pub projected_notional: Decimal,
    /// Projected notional as percent of equity
    pub projected_percent: Decimal,
}

/// Reasons a trade cannot be sized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NotSizable {
    #[error("risk percent must be in (0, 100]")]
    InvalidRiskPercent,
    #[error("account equity must be positive")]
    NonPositiveEquity,
    #[error("entry and stop prices must be positive")]
    NonPositivePrice,
    #[error("stop is on the wrong side of entry")]
    StopOnWrongSide,
    #[error("risk budget does not cover a single share")]
    BelowOneShare,
    #[error("position size is out of range")]
    Overflow,
}
