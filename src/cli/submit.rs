//! Submit command implementation

use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

use super::OrderArgs;
use crate::broker::PaperBroker;
use crate::config::Config;
use crate::desk::TradingDesk;

#[derive(Args, Debug)]
pub struct SubmitArgs {
    #[command(flatten)]
    pub order: OrderArgs,

    /// Price the paper gateway fills market orders at
    #[arg(long)]
    pub price: Decimal,

    /// Paper account equity
    #[arg(long, default_value = "100000")]
    pub equity: Decimal,

    /// Print the execution result as JSON
    #[arg(long)]
    pub json: bool,
}

impl SubmitArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let request = self.order.to_request();
        let broker = PaperBroker::new()
            .with_price(&request.symbol, self.price)
            .with_account(self.equity, self.equity, self.equity * dec!(4));

        let desk = TradingDesk::new(Arc::new(broker), config.clone());
        if !desk.connect().await {
            anyhow::bail!("Could not connect to the paper gateway");
        }

        let result = desk.submit(&request).await;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            println!("{}", result.summary);
            for outcome in &result.legs {
                println!("  {}. {} -> {:?}", outcome.index + 1, outcome.leg, outcome.status);
            }
        }

        if !result.success {
            anyhow::bail!("Order submission incomplete");
        }
        Ok(())
    }
}
