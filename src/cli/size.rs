//! Size command implementation

use clap::Args;
use rust_decimal::Decimal;

use crate::config::Config;
use crate::order::Action;
use crate::risk::PositionSizer;

#[derive(Args, Debug)]
pub struct SizeArgs {
    /// Account equity (net liquidation)
    #[arg(long)]
    pub equity: Decimal,

    /// Percent of equity to risk; defaults to the configured value
    #[arg(long)]
    pub risk: Option<Decimal>,

    /// Entry price
    #[arg(long)]
    pub entry: Decimal,

    /// Stop price
    #[arg(long)]
    pub stop: Decimal,

    /// BUY or SELL
    #[arg(long, default_value = "BUY")]
    pub action: Action,

    /// Signed shares already held
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub position: i64,
}

impl SizeArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let mut sizer = PositionSizer::from_config(&config.risk);
        if let Some(risk) = self.risk {
            sizer = sizer.with_risk_percent(risk);
        }

        let sizing = sizer.size(self.equity, self.entry, self.stop, self.action, self.position)?;

        println!("Shares:            {}", sizing.quantity);
        println!("Risk per share:    ${:.2}", sizing.per_share_risk);
        println!("Risk budget:       ${:.2}", sizing.risk_budget);
        println!(
            "Trade value:       ${:.2} ({:.2}% of equity)",
            sizing.trade_notional, sizing.trade_percent
        );
        println!(
            "Position after:    {} shares, ${:.2} ({:.2}% of equity)",
            sizing.projected_quantity, sizing.projected_notional, sizing.projected_percent
        );
        Ok(())
    }
}
