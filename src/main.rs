use bracket_desk::cli::{Cli, Commands};
use bracket_desk::config::Config;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        Config::default()
    });

    // Initialize telemetry
    let _telemetry = bracket_desk::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Size(args) => args.execute(&config).await?,
        Commands::Plan(args) => args.execute().await?,
        Commands::Submit(args) => {
            tracing::info!(symbol = %args.order.symbol, strategy = args.order.strategy.id(), "Submitting to paper gateway");
            args.execute(&config).await?;
        }
        Commands::Config => {
            println!("Current configuration ({}):", cli.config);
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
