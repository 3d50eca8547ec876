//! CLI interface for bracket-desk
//!
//! Provides subcommands for:
//! - `size`: Risk-based position size for a trade
//! - `plan`: Show the orders a strategy would place
//! - `submit`: Execute a plan against the paper gateway
//! - `config`: Show the effective configuration

mod plan;
mod size;
mod submit;

pub use plan::{OrderArgs, PlanArgs};
pub use size::SizeArgs;
pub use submit::SubmitArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "bracket-desk")]
#[command(about = "Risk-sized bracket order desk for a brokerage gateway")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Size a position from equity, risk and stop distance
    Size(SizeArgs),
    /// Build an order plan and preview its legs
    Plan(PlanArgs),
    /// Submit an order plan to the paper gateway
    Submit(SubmitArgs),
    /// Show configuration
    Config,
}
