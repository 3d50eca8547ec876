//! Strategy-to-plan mapping and post-fill protection
//!
//! Every function here is pure: legs are derived from their inputs only and
//! nothing talks to the broker.

use rust_decimal::Decimal;
use uuid::Uuid;

use super::ladder::{checked_price_diff, ladder_sizes, to_cents, StopLadder};
use super::{
    FillProtection, OrderLegPlan, OrderStrategy, PlanError, PlanRequest, PlanStep, ProtectionKind,
};
use crate::order::{Action, OrderLeg};

/// Build the ordered leg plan for a strategy
pub fn plan_order(request: &PlanRequest) -> Result<OrderLegPlan, PlanError> {
    if request.quantity == 0 {
        return Err(PlanError::ZeroQuantity);
    }

    let PlanRequest {
        strategy,
        quantity,
        entry_price,
        stop_price,
        action,
        ..
    } = request.clone();

    let require_positive = |prices: &[Decimal]| {
        if prices.iter().any(|p| *p <= Decimal::ZERO) {
            Err(PlanError::InvalidPrice)
        } else {
            Ok(())
        }
    };

    let on_fill = |kind: ProtectionKind| PlanStep::OnFill {
        protection: FillProtection {
            kind,
            action,
            quantity,
            stop_price,
        },
    };

    let steps: Vec<PlanStep> = match strategy {
        OrderStrategy::MarketOnly => vec![PlanStep::Primary {
            leg: OrderLeg::market(action, quantity),
        }],
        OrderStrategy::LimitOnly => {
            require_positive(&[entry_price])?;
            vec![PlanStep::Independent {
                leg: OrderLeg::limit(action, quantity, to_cents(entry_price)),
            }]
        }
        OrderStrategy::StopOnly => {
            require_positive(&[stop_price])?;
            vec![PlanStep::Independent {
                leg: OrderLeg::stop(action, quantity, to_cents(stop_price)),
            }]
        }
        OrderStrategy::ThreeStopsOnly => {
            require_positive(&[entry_price, stop_price])?;
            StopLadder::build(action, quantity, entry_price, stop_price)?
                .legs()
                .into_iter()
                .map(|leg| PlanStep::Independent { leg })
                .collect()
        }
        OrderStrategy::MarketPlusOneStop => {
            require_positive(&[stop_price])?;
            vec![
                PlanStep::Primary {
                    leg: OrderLeg::market(action, quantity),
                },
                on_fill(ProtectionKind::SingleStop),
            ]
        }
        OrderStrategy::MarketPlusThreeStops => {
            require_positive(&[stop_price])?;
            vec![
                PlanStep::Primary {
                    leg: OrderLeg::market(action, quantity),
                },
                on_fill(ProtectionKind::StopLadder),
            ]
        }
        OrderStrategy::MarketPlusThreeStopsWithOco => {
            require_positive(&[stop_price])?;
            vec![
                PlanStep::Primary {
                    leg: OrderLeg::market(action, quantity),
                },
                on_fill(ProtectionKind::LadderWithOco),
            ]
        }
    };

    tracing::debug!(
        symbol = %request.symbol,
        strategy = strategy.id(),
        quantity,
        steps = steps.len(),
        "Order plan built"
    );

    Ok(OrderLegPlan {
        symbol: request.symbol.clone(),
        strategy,
        action,
        quantity,
        entry_price,
        stop_price,
        steps,
    })
}

/// Fresh one-cancels-other group identifier
pub fn new_oco_group() -> String {
    format!("OCO_{}", Uuid::new_v4().simple())
}

impl FillProtection {
    /// Protective legs for a primary filled at `fill_price`, in placement order
    pub fn legs(&self, fill_price: Decimal) -> Result<Vec<OrderLeg>, PlanError> {
        match self.kind {
            ProtectionKind::SingleStop => {
                checked_price_diff(self.action, fill_price, self.stop_price)?;
                Ok(vec![OrderLeg::stop(
                    self.action.opposite(),
                    self.quantity,
                    to_cents(self.stop_price),
                )
                .gtc()])
            }
            ProtectionKind::StopLadder => {
                Ok(StopLadder::build(self.action, self.quantity, fill_price, self.stop_price)?
                    .legs())
            }
            ProtectionKind::LadderWithOco => self.oco_legs(fill_price),
        }
    }

    /// OCO pair (2R target limit + nearest ladder stop) on a third of the
    /// position, the two farther ladder stops on the remainder
    fn oco_legs(&self, fill_price: Decimal) -> Result<Vec<OrderLeg>, PlanError> {
        let ladder = StopLadder::build(self.action, self.quantity, fill_price, self.stop_price)?;
        let prices = ladder.stop_prices();
        let exit = self.action.opposite();

        let [oco_qty, second, third] = oco_sizes(self.quantity);
        let rest = [second, third];

        let mut legs = Vec::with_capacity(4);
        if oco_qty > 0 {
            let group = new_oco_group();
            let target = oco_target(self.action, fill_price, ladder.price_diff);
            legs.push(OrderLeg::limit(exit, oco_qty, target).gtc().with_oco(&group));
            legs.push(OrderLeg::stop(exit, oco_qty, prices[0]).gtc().with_oco(group));
        }
        for (qty, price) in rest.into_iter().zip(&prices[1..]) {
            if qty > 0 {
                legs.push(OrderLeg::stop(exit, qty, *price).gtc());
            }
        }
        Ok(legs)
    }
}

/// Profit target two risk units beyond the fill
pub fn oco_target(action: Action, fill_price: Decimal, price_diff: Decimal) -> Decimal {
    let two_r = price_diff * Decimal::from(2);
    match action {
        Action::Buy => to_cents(fill_price + two_r),
        Action::Sell => to_cents(fill_price - two_r),
    }
}

/// Sizes used by the OCO strategy: `[oco, second stop, third stop]`
pub fn oco_sizes(quantity: u64) -> [u64; 3] {
    let oco_qty = quantity / 3;
    let remainder = quantity - oco_qty;
    [oco_qty, remainder / 2, remainder - remainder / 2]
}

impl OrderLegPlan {
    /// Every leg the plan would place if the primary filled at `fill_price`
    pub fn preview(&self, fill_price: Decimal) -> Result<Vec<OrderLeg>, PlanError> {
        let mut legs = Vec::new();
        for step in &self.steps {
            match step {
                PlanStep::Primary { leg } | PlanStep::Independent { leg } => legs.push(leg.clone()),
                PlanStep::OnFill { protection } => legs.extend(protection.legs(fill_price)?),
            }
        }
        Ok(legs)
    }

    /// Ladder sizes this plan protects with, for display
    pub fn ladder_sizes(&self) -> Option<[u64; 3]> {
        match self.protection().map(|p| p.kind) {
            Some(ProtectionKind::StopLadder) => Some(ladder_sizes(self.quantity)),
            Some(ProtectionKind::LadderWithOco) => Some(oco_sizes(self.quantity)),
            _ if self.strategy == OrderStrategy::ThreeStopsOnly => Some(ladder_sizes(self.quantity)),
            _ => None,
        }
    }
}
