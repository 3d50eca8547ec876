//! Three-way stop ladder
//!
//! Splits a position into three protective stops spaced between a reference
//! price R and the stop: the first rung sits 2/3 of the way from the stop to
//! R, the second 1/3, the third on the stop itself. Sizes are `Q/3, Q/3` and
//! the remainder, so the rungs always add up to Q.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{LadderRung, PlanError};
use crate::order::{Action, OrderLeg};

/// Round a price to cents
pub(crate) fn to_cents(price: Decimal) -> Decimal {
    price.round_dp(2)
}

/// Risk distance between a reference price and the stop, positive when the
/// stop sits on the losing side of the reference
pub fn price_diff(action: Action, reference: Decimal, stop_price: Decimal) -> Decimal {
    match action {
        Action::Buy => reference - stop_price,
        Action::Sell => stop_price - reference,
    }
}

/// Reject geometries where the stop is at or beyond the reference price
pub(crate) fn checked_price_diff(
    action: Action,
    reference: Decimal,
    stop_price: Decimal,
) -> Result<Decimal, PlanError> {
    let diff = price_diff(action, reference, stop_price);
    if diff <= Decimal::ZERO {
        return Err(PlanError::InvalidRiskGeometry {
            action,
            reference,
            stop: stop_price,
        });
    }
    Ok(diff)
}

/// Split a quantity into the three ladder sizes
pub fn ladder_sizes(quantity: u64) -> [u64; 3] {
    let third = quantity / 3;
    [third, third, quantity - 2 * third]
}

/// Protective stops ordered nearest-to-reference first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopLadder {
    /// Side of the position being protected
    pub action: Action,
    pub reference: Decimal,
    pub stop_price: Decimal,
    /// R: distance between reference and stop
    pub price_diff: Decimal,
    pub rungs: [LadderRung; 3],
}

impl StopLadder {
    pub fn build(
        action: Action,
        quantity: u64,
        reference: Decimal,
        stop_price: Decimal,
    ) -> Result<Self, PlanError> {
        let diff = checked_price_diff(action, reference, stop_price)?;
        let prices = Self::prices(action, diff, stop_price);
        let sizes = ladder_sizes(quantity);

        let rungs = [0, 1, 2].map(|i| LadderRung {
            price: prices[i],
            quantity: sizes[i],
        });

        Ok(Self {
            action,
            reference,
            stop_price,
            price_diff: diff,
            rungs,
        })
    }

    fn prices(action: Action, diff: Decimal, stop_price: Decimal) -> [Decimal; 3] {
        let two_thirds = diff * Decimal::from(2) / Decimal::from(3);
        let one_third = diff / Decimal::from(3);
        match action {
            Action::Buy => [
                to_cents(stop_price + two_thirds),
                to_cents(stop_price + one_third),
                to_cents(stop_price),
            ],
            Action::Sell => [
                to_cents(stop_price - two_thirds),
                to_cents(stop_price - one_third),
                to_cents(stop_price),
            ],
        }
    }

    /// Rung prices, nearest-to-reference first
    pub fn stop_prices(&self) -> [Decimal; 3] {
        self.rungs.map(|r| r.price)
    }

    pub fn total_quantity(&self) -> u64 {
        self.rungs.iter().map(|r| r.quantity).sum()
    }

    /// GTC stop legs on the closing side; empty rungs are dropped
    pub fn legs(&self) -> Vec<OrderLeg> {
        self.rungs
            .iter()
            .filter(|rung| rung.quantity > 0)
            .map(|rung| OrderLeg::stop(self.action.opposite(), rung.quantity, rung.price).gtc())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{OrderKind, TimeInForce};
    use rust_decimal_macros::dec;

    #[test]
    fn test_sizes_for_hundred() {
        assert_eq!(ladder_sizes(100), [33, 33, 34]);
    }

    #[test]
    fn test_sizes_always_sum_to_quantity() {
        for q in 0..=301u64 {
            let sizes = ladder_sizes(q);
            assert_eq!(sizes.iter().sum::<u64>(), q, "q = {q}");
            assert!(sizes[2] >= sizes[0]);
            assert!(sizes[2] - sizes[0] <= 2);
        }
    }

    #[test]
    fn test_long_ladder_prices() {
        let ladder = StopLadder::build(Action::Buy, 100, dec!(200), dec!(190)).unwrap();
        assert_eq!(ladder.price_diff, dec!(10));
        assert_eq!(ladder.stop_prices(), [dec!(196.67), dec!(193.33), dec!(190)]);
        assert_eq!(ladder.total_quantity(), 100);
    }

    #[test]
    fn test_short_ladder_prices() {
        let ladder = StopLadder::build(Action::Sell, 90, dec!(50), dec!(53)).unwrap();
        assert_eq!(ladder.stop_prices(), [dec!(51), dec!(52), dec!(53)]);
        assert_eq!(ladder.rungs.map(|r| r.quantity), [30, 30, 30]);
    }

    #[test]
    fn test_prices_monotonic_between_stop_and_reference() {
        let cases = [
            (Action::Buy, dec!(200.50), dec!(190)),
            (Action::Buy, dec!(12.34), dec!(11.99)),
            (Action::Sell, dec!(75.10), dec!(80.05)),
            (Action::Sell, dec!(3.21), dec!(3.50)),
        ];
        for (action, reference, stop) in cases {
            let p = StopLadder::build(action, 10, reference, stop)
                .unwrap()
                .stop_prices();
            match action {
                Action::Buy => {
                    assert!(reference >= p[0] && p[0] >= p[1] && p[1] >= p[2]);
                    assert_eq!(p[2], stop);
                }
                Action::Sell => {
                    assert!(reference <= p[0] && p[0] <= p[1] && p[1] <= p[2]);
                    assert_eq!(p[2], stop);
                }
            }
        }
    }

    #[test]
    fn test_rejects_stop_beyond_reference() {
        let err = StopLadder::build(Action::Buy, 100, dec!(190), dec!(200)).unwrap_err();
        assert!(matches!(err, PlanError::InvalidRiskGeometry { .. }));

        let err = StopLadder::build(Action::Sell, 100, dec!(200), dec!(190)).unwrap_err();
        assert!(matches!(err, PlanError::InvalidRiskGeometry { .. }));

        let err = StopLadder::build(Action::Buy, 100, dec!(190), dec!(190)).unwrap_err();
        assert!(matches!(err, PlanError::InvalidRiskGeometry { .. }));
    }

    #[test]
    fn test_legs_close_position_gtc() {
        let ladder = StopLadder::build(Action::Buy, 100, dec!(200), dec!(190)).unwrap();
        let legs = ladder.legs();
        assert_eq!(legs.len(), 3);
        for leg in &legs {
            assert_eq!(leg.side, Action::Sell);
            assert_eq!(leg.tif, TimeInForce::Gtc);
            assert!(matches!(leg.kind, OrderKind::Stop(_)));
        }
        assert_eq!(legs[0].kind, OrderKind::Stop(dec!(196.67)));
        assert_eq!(legs[2].quantity, 34);
    }

    #[test]
    fn test_small_quantity_drops_empty_rungs() {
        let ladder = StopLadder::build(Action::Buy, 2, dec!(200), dec!(190)).unwrap();
        assert_eq!(ladder.total_quantity(), 2);
        let legs = ladder.legs();
        assert_eq!(legs.len(), 1);
        assert_eq!(legs[0].quantity, 2);
        assert_eq!(legs[0].kind, OrderKind::Stop(dec!(190)));
    }
}
