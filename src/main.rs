mod config;
mod fetch;
mod models;
mod pipeline;
mod source;
mod storage;
mod utils;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::AppConfig;
use crate::pipeline::Pipeline;
use crate::source::YahooSource;

#[derive(Parser)]
#[command(name = "dji-gather", about = "Company info and daily price history for the Dow 30", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch company info and price history, then write both CSV files (default)
    Run,

    /// Print the effective configuration as JSON
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "dji_gather=info,warn",
        1 => "dji_gather=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::new(filter))
        .init();

    let config = AppConfig::load()?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let clock = utils::RunClock::start();
            info!(
                "Gathering {} tickers, {} year(s) of daily bars",
                config.gather.tickers.len(),
                config.gather.lookback_years
            );
            let source = YahooSource::new(&config.provider)
                .context("Failed to build market data client")?;

            let stats = Pipeline::new(config.gather, config.output, Arc::new(source))
                .run()
                .await?;

            for path in [&stats.company_file, &stats.prices_file].into_iter().flatten() {
                info!("Saved {}", path.display());
            }
            info!(
                "Data gathering completed: {} price rows in {:.1?}",
                utils::fmt_number(stats.price_rows),
                clock.stop()
            );
        }

        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
