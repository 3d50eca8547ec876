//! Account and position snapshots built from raw gateway values

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{AccountValue, Bar, PositionSnapshot};

pub const NET_LIQUIDATION: &str = "NetLiquidation";
pub const CASH_BALANCE: &str = "CashBalance";
pub const BUYING_POWER: &str = "BuyingPower";

/// Account balances for one refresh cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub currency: String,
    pub net_liquidation: Option<Decimal>,
    pub cash_balance: Option<Decimal>,
    pub buying_power: Option<Decimal>,
}

impl AccountSnapshot {
    /// Pick the balances reported in `currency`; unparsable values are absent
    pub fn from_values(values: &[AccountValue], currency: &str) -> Self {
        let mut snapshot = Self {
            currency: currency.to_string(),
            net_liquidation: None,
            cash_balance: None,
            buying_power: None,
        };

        for value in values.iter().filter(|v| v.currency == currency) {
            let parsed = match Decimal::from_str(value.value.trim()) {
                Ok(v) => v,
                Err(e) => {
                    tracing::debug!(tag = %value.tag, value = %value.value, error = %e, "Skipping unparsable account value");
                    continue;
                }
            };
            match value.tag.as_str() {
                NET_LIQUIDATION => snapshot.net_liquidation = Some(parsed),
                CASH_BALANCE => snapshot.cash_balance = Some(parsed),
                BUYING_POWER => snapshot.buying_power = Some(parsed),
                _ => {}
            }
        }

        snapshot
    }

    /// Equity used for sizing; zero when the gateway did not report it
    pub fn equity(&self) -> Decimal {
        self.net_liquidation.unwrap_or(Decimal::ZERO)
    }
}

/// Find the position for `symbol`, flat when none is reported
pub fn position_for(positions: &[PositionSnapshot], symbol: &str) -> PositionSnapshot {
    positions
        .iter()
        .find(|p| p.symbol.eq_ignore_ascii_case(symbol))
        .cloned()
        .unwrap_or_else(|| PositionSnapshot::flat(symbol))
}

/// Market value and share of equity of an existing position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionExposure {
    pub value: Decimal,
    pub percent_of_equity: Decimal,
}

impl PositionExposure {
    pub fn new(quantity: i64, price: Decimal, equity: Decimal) -> Self {
        let value = Decimal::from(quantity.unsigned_abs()) * price;
        let percent_of_equity = if equity > Decimal::ZERO {
            value / equity * dec!(100)
        } else {
            Decimal::ZERO
        };
        Self {
            value,
            percent_of_equity,
        }
    }
}

/// Low and high of the current session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRange {
    pub low: Decimal,
    pub high: Decimal,
}

impl DayRange {
    /// Range over all bars, `None` when there are no bars
    pub fn from_bars(bars: &[Bar]) -> Option<Self> {
        let low = bars.iter().map(|b| b.low).min()?;
        let high = bars.iter().map(|b| b.high).max()?;
        Some(Self { low, high })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values() -> Vec<AccountValue> {
        vec![
            AccountValue::new(NET_LIQUIDATION, "USD", "100000.50"),
            AccountValue::new(NET_LIQUIDATION, "EUR", "91000"),
            AccountValue::new(CASH_BALANCE, "USD", "25000"),
            AccountValue::new(BUYING_POWER, "USD", "400000"),
            AccountValue::new("AccountType", "", "INDIVIDUAL"),
        ]
    }

    #[test]
    fn test_snapshot_from_values() {
        let snapshot = AccountSnapshot::from_values(&values(), "USD");
        assert_eq!(snapshot.net_liquidation, Some(dec!(100000.50)));
        assert_eq!(snapshot.cash_balance, Some(dec!(25000)));
        assert_eq!(snapshot.buying_power, Some(dec!(400000)));
        assert_eq!(snapshot.equity(), dec!(100000.50));
    }

    #[test]
    fn test_snapshot_other_currency() {
        let snapshot = AccountSnapshot::from_values(&values(), "EUR");
        assert_eq!(snapshot.net_liquidation, Some(dec!(91000)));
        assert!(snapshot.cash_balance.is_none());
    }

    #[test]
    fn test_snapshot_missing_and_garbage() {
        let values = vec![AccountValue::new(NET_LIQUIDATION, "USD", "n/a")];
        let snapshot = AccountSnapshot::from_values(&values, "USD");
        assert!(snapshot.net_liquidation.is_none());
        assert_eq!(snapshot.equity(), Decimal::ZERO);
    }

    #[test]
    fn test_position_for() {
        let positions = vec![
            PositionSnapshot {
                symbol: "AAPL".to_string(),
                quantity: 150,
            },
            PositionSnapshot {
                symbol: "TSLA".to_string(),
                quantity: -20,
            },
        ];
        assert_eq!(position_for(&positions, "TSLA").quantity, -20);
        assert_eq!(position_for(&positions, "aapl").quantity, 150);
        assert!(position_for(&positions, "NVDA").is_flat());
    }

    #[test]
    fn test_position_exposure() {
        let exposure = PositionExposure::new(-20, dec!(250), dec!(100000));
        assert_eq!(exposure.value, dec!(5000));
        assert_eq!(exposure.percent_of_equity, dec!(5));

        let exposure = PositionExposure::new(10, dec!(250), dec!(0));
        assert_eq!(exposure.percent_of_equity, dec!(0));
    }

    #[test]
    fn test_day_range() {
        let bars = vec![
            Bar {
                low: dec!(101.5),
                high: dec!(103),
            },
            Bar {
                low: dec!(99.75),
                high: dec!(102),
            },
            Bar {
                low: dec!(100),
                high: dec!(104.25),
            },
        ];
        let range = DayRange::from_bars(&bars).unwrap();
        assert_eq!(range.low, dec!(99.75));
        assert_eq!(range.high, dec!(104.25));
        assert!(DayRange::from_bars(&[]).is_none());
    }
}
