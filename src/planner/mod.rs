//! Order planning module
//!
//! Turns a strategy and a sized quantity into an ordered plan of primary and
//! protective legs: single orders, three-way stop ladders and OCO
//! target/stop pairs.

mod ladder;
mod strategy;
mod types;

pub use ladder::{ladder_sizes, price_diff, StopLadder};
pub use strategy::{new_oco_group, oco_sizes, oco_target, plan_order};
pub use types::{
    FillProtection, LadderRung, OrderLegPlan, OrderStrategy, PlanError, PlanRequest, PlanStep,
    ProtectionKind,
};
