//! Plan command implementation

use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::order::{Action, OrderLeg};
use crate::planner::{plan_order, OrderLegPlan, OrderStrategy, PlanError, PlanRequest};

/// Order fields shared by `plan` and `submit`
#[derive(Args, Debug, Clone)]
pub struct OrderArgs {
    /// Strategy id (e.g. market-3-stops) or panel label
    #[arg(long, default_value = "market-3-stops")]
    pub strategy: OrderStrategy,

    /// Ticker symbol
    #[arg(long)]
    pub symbol: String,

    /// Shares to trade
    #[arg(long)]
    pub qty: u64,

    /// Entry price (limit price for limit orders)
    #[arg(long)]
    pub entry: Decimal,

    /// Stop price
    #[arg(long)]
    pub stop: Decimal,

    /// BUY or SELL
    #[arg(long, default_value = "BUY")]
    pub action: Action,
}

impl OrderArgs {
    pub fn to_request(&self) -> PlanRequest {
        PlanRequest {
            strategy: self.strategy,
            symbol: self.symbol.trim().to_uppercase(),
            quantity: self.qty,
            entry_price: self.entry,
            stop_price: self.stop,
            action: self.action,
        }
    }
}

#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub order: OrderArgs,

    /// Hypothetical fill price for market entries; defaults to the entry price
    #[arg(long)]
    pub fill: Option<Decimal>,

    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct PlanPreview<'a> {
    plan: &'a OrderLegPlan,
    fill_price: Decimal,
    legs: &'a [OrderLeg],
}

impl PlanArgs {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let plan = plan_order(&self.order.to_request())?;
        let fill_price = self.fill.unwrap_or(self.order.entry);
        let legs = preview(&plan, fill_price)?;

        if self.json {
            let preview = PlanPreview {
                plan: &plan,
                fill_price,
                legs: &legs,
            };
            println!("{}", serde_json::to_string_pretty(&preview)?);
            return Ok(());
        }

        println!(
            "{} {} {} shares of {}",
            plan.strategy, plan.action, plan.quantity, plan.symbol
        );
        if plan.strategy.has_market_entry() {
            println!("Protective legs priced from a fill at ${:.2}", fill_price);
        }
        for (i, leg) in legs.iter().enumerate() {
            println!("  {}. {}", i + 1, leg);
        }
        Ok(())
    }
}

fn preview(plan: &OrderLegPlan, fill_price: Decimal) -> Result<Vec<OrderLeg>, PlanError> {
    let legs = plan.preview(fill_price)?;
    tracing::debug!(symbol = %plan.symbol, legs = legs.len(), %fill_price, "Plan previewed");
    Ok(legs)
}
