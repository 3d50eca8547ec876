//! Risk-budget position sizing
//!
//! Shares are sized so that a stop-out loses at most `risk_percent` of
//! equity: `quantity = floor(equity * risk% / 100 / |entry - stop|)`.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{NotSizable, RiskInput, SizingResult};
use crate::config::RiskConfig;
use crate::order::Action;

/// Compute the share quantity and projected exposure for a trade
pub fn size_position(input: &RiskInput) -> Result<SizingResult, NotSizable> {
    if input.risk_percent <= Decimal::ZERO || input.risk_percent > dec!(100) {
        return Err(NotSizable::InvalidRiskPercent);
    }
    if input.equity <= Decimal::ZERO {
        return Err(NotSizable::NonPositiveEquity);
    }
    if input.entry_price <= Decimal::ZERO || input.stop_price <= Decimal::ZERO {
        return Err(NotSizable::NonPositivePrice);
    }

    let per_share_risk = match input.action {
        Action::Buy => input.entry_price - input.stop_price,
        Action::Sell => input.stop_price - input.entry_price,
    };
    if per_share_risk <= Decimal::ZERO {
        return Err(NotSizable::StopOnWrongSide);
    }

    let risk_budget = input
        .equity
        .checked_mul(input.risk_percent)
        .and_then(|v| v.checked_div(dec!(100)))
        .ok_or(NotSizable::Overflow)?;
    let quantity = risk_budget
        .checked_div(per_share_risk)
        .and_then(|shares| shares.floor().to_u64())
        .ok_or(NotSizable::Overflow)?;
    if quantity == 0 {
        return Err(NotSizable::BelowOneShare);
    }

    let trade_notional = Decimal::from(quantity)
        .checked_mul(input.entry_price)
        .ok_or(NotSizable::Overflow)?;
    let trade_percent = percent_of(trade_notional, input.equity)?;

    let signed = i64::try_from(quantity).unwrap_or(i64::MAX);
    let projected_quantity = match input.action {
        Action::Buy => input.existing_position.saturating_add(signed),
        Action::Sell => input.existing_position.saturating_sub(signed),
    };
    let projected_notional = Decimal::from(projected_quantity.unsigned_abs())
        .checked_mul(input.entry_price)
        .ok_or(NotSizable::Overflow)?;
    let projected_percent = percent_of(projected_notional, input.equity)?;

    Ok(SizingResult {
        quantity,
        per_share_risk,
        risk_budget,
        trade_notional,
        trade_percent,
        projected_quantity,
        projected_notional,
        projected_percent,
    })
}

fn percent_of(value: Decimal, equity: Decimal) -> Result<Decimal, NotSizable> {
    value
        .checked_div(equity)
        .and_then(|v| v.checked_mul(dec!(100)))
        .ok_or(NotSizable::Overflow)
}

/// Sizer bound to the desk's configured risk percent
#[derive(Debug, Clone)]
pub struct PositionSizer {
    /// Default percent of equity risked per trade
    pub risk_percent: Decimal,
}

impl PositionSizer {
    pub fn new(risk_percent: Decimal) -> Self {
        Self { risk_percent }
    }

    pub fn from_config(config: &RiskConfig) -> Self {
        Self::new(config.risk_percent)
    }

    /// Use a different risk percent, e.g. from a quick-select button
    pub fn with_risk_percent(mut self, risk_percent: Decimal) -> Self {
        self.risk_percent = risk_percent;
        self
    }

    /// Size a trade with the configured risk percent
    pub fn size(
        &self,
        equity: Decimal,
        entry_price: Decimal,
        stop_price: Decimal,
        action: Action,
        existing_position: i64,
    ) -> Result<SizingResult, NotSizable> {
        size_position(&RiskInput {
            equity,
            risk_percent: self.risk_percent,
            entry_price,
            stop_price,
            action,
            existing_position,
        })
    }
}

impl Default for PositionSizer {
    fn default() -> Self {
        Self::new(dec!(1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(equity: Decimal, risk: Decimal, entry: Decimal, stop: Decimal, action: Action) -> RiskInput {
        RiskInput {
            equity,
            risk_percent: risk,
            entry_price: entry,
            stop_price: stop,
            action,
            existing_position: 0,
        }
    }

    #[test]
    fn test_long_sizing_example() {
        let result =
            size_position(&input(dec!(100000), dec!(1.0), dec!(200), dec!(190), Action::Buy))
                .unwrap();

        assert_eq!(result.per_share_risk, dec!(10));
        assert_eq!(result.risk_budget, dec!(1000));
        assert_eq!(result.quantity, 100);
        assert_eq!(result.trade_notional, dec!(20000));
        assert_eq!(result.trade_percent, dec!(20));
        assert_eq!(result.projected_quantity, 100);
    }

    #[test]
    fn test_stop_above_entry_on_buy_is_not_sizable() {
        let result =
            size_position(&input(dec!(100000), dec!(1.0), dec!(190), dec!(200), Action::Buy));
        assert_eq!(result, Err(NotSizable::StopOnWrongSide));
    }

    #[test]
    fn test_short_sizing() {
        // Short at 50 with stop at 52.5: 2.5 risk per share, $500 budget
        let result =
            size_position(&input(dec!(50000), dec!(1.0), dec!(50), dec!(52.5), Action::Sell))
                .unwrap();
        assert_eq!(result.per_share_risk, dec!(2.5));
        assert_eq!(result.quantity, 200);
        assert_eq!(result.projected_quantity, -200);
        assert_eq!(result.projected_notional, dec!(10000));
    }

    #[test]
    fn test_quantity_is_floored() {
        // $1000 budget / $3 per share = 333.33
        let result =
            size_position(&input(dec!(100000), dec!(1.0), dec!(103), dec!(100), Action::Buy))
                .unwrap();
        assert_eq!(result.quantity, 333);
        assert!(Decimal::from(result.quantity) * result.per_share_risk <= result.risk_budget);
    }

    #[test]
    fn test_budget_never_exceeded() {
        let entries = [dec!(10.37), dec!(99.99), dec!(250.01), dec!(1234.5)];
        let risks = [dec!(0.25), dec!(0.5), dec!(1.5), dec!(3)];
        for entry in entries {
            for risk in risks {
                let stop = entry * dec!(0.93);
                let sized =
                    size_position(&input(dec!(87654.32), risk, entry, stop, Action::Buy)).unwrap();
                let expected = (dec!(87654.32) * risk / dec!(100) / (entry - stop)).floor();
                assert_eq!(Decimal::from(sized.quantity), expected);
                assert!(Decimal::from(sized.quantity) * sized.per_share_risk <= sized.risk_budget);
            }
        }
    }

    #[test]
    fn test_invalid_risk_percent() {
        for risk in [dec!(0), dec!(-1), dec!(100.01)] {
            let result =
                size_position(&input(dec!(100000), risk, dec!(200), dec!(190), Action::Buy));
            assert_eq!(result, Err(NotSizable::InvalidRiskPercent));
        }
    }

    #[test]
    fn test_full_risk_percent_allowed() {
        let result =
            size_position(&input(dec!(1000), dec!(100), dec!(20), dec!(10), Action::Buy)).unwrap();
        assert_eq!(result.quantity, 100);
    }

    #[test]
    fn test_non_positive_equity() {
        for equity in [dec!(0), dec!(-5000)] {
            let result =
                size_position(&input(equity, dec!(1.0), dec!(200), dec!(190), Action::Buy));
            assert_eq!(result, Err(NotSizable::NonPositiveEquity));
        }
    }

    #[test]
    fn test_non_positive_prices() {
        let result = size_position(&input(dec!(1000), dec!(1.0), dec!(0), dec!(-1), Action::Sell));
        assert_eq!(result, Err(NotSizable::NonPositivePrice));
    }

    #[test]
    fn test_budget_below_one_share() {
        // $10 budget, $50 per share risk
        let result =
            size_position(&input(dec!(1000), dec!(1.0), dec!(200), dec!(150), Action::Buy));
        assert_eq!(result, Err(NotSizable::BelowOneShare));
    }

    #[test]
    fn test_projection_flips_short_to_long() {
        let mut inp = input(dec!(100000), dec!(1.0), dec!(200), dec!(190), Action::Buy);
        inp.existing_position = -40;
        let result = size_position(&inp).unwrap();
        assert_eq!(result.projected_quantity, 60);
        assert_eq!(result.projected_notional, dec!(12000));
        assert_eq!(result.projected_percent, dec!(12));
    }

    #[test]
    fn test_projection_adds_to_short() {
        let mut inp = input(dec!(100000), dec!(1.0), dec!(100), dec!(110), Action::Sell);
        inp.existing_position = -50;
        let result = size_position(&inp).unwrap();
        assert_eq!(result.quantity, 100);
        assert_eq!(result.projected_quantity, -150);
        assert_eq!(result.projected_percent, dec!(15));
    }

    #[test]
    fn test_position_sizer_uses_configured_risk() {
        let sizer = PositionSizer::new(dec!(0.5));
        let result = sizer
            .size(dec!(100000), dec!(200), dec!(190), Action::Buy, 0)
            .unwrap();
        assert_eq!(result.quantity, 50);

        let sizer = sizer.with_risk_percent(dec!(1.5));
        let result = sizer
            .size(dec!(100000), dec!(200), dec!(190), Action::Buy, 0)
            .unwrap();
        assert_eq!(result.quantity, 150);
    }

    #[test]
    fn test_notional_overflow_is_not_sizable() {
        let inp = input(
            dec!(100000000000),
            dec!(100),
            dec!(10000000000),
            dec!(9999999999.99999999),
            Action::Buy,
        );
        assert_eq!(size_position(&inp), Err(NotSizable::Overflow));
    }

    #[test]
    fn test_share_count_beyond_u64_is_overflow() {
        let inp = input(
            dec!(1000000000000),
            dec!(100),
            dec!(1),
            dec!(0.99999999),
            Action::Buy,
        );
        assert_eq!(size_position(&inp), Err(NotSizable::Overflow));
    }

    #[test]
    fn test_position_sizer_default() {
        assert_eq!(PositionSizer::default().risk_percent, dec!(1.0));
    }
}
