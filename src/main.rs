pub mod types;
pub mod error;
pub mod config;
pub mod data;
pub mod metrics;
pub mod charts;
pub mod server;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the interactive dashboard
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Print population, growth and density for one country
    Report {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        #[arg(long)]
        country: String,
        /// Census year for the summary line; defaults to the latest
        #[arg(long)]
        year: Option<i32>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Serve { config } => {
            info!("Serving dashboard with config: {:?}", config);
            let app_config = config::AppConfig::load_from_file(config)?;

            // Load-time failures abort startup
            let dataset = data::load_data(&app_config).context("Failed to load population table")?;

            server::start_server(app_config, dataset).await?;
        }
        Commands::Report { config, country, year } => {
            let app_config = config::AppConfig::load_from_file(config)?;
            let dataset = data::load_data(&app_config).context("Failed to load population table")?;
            print_report(&dataset, country, year.unwrap_or_else(|| dataset.years().latest()))?;
        }
    }

    Ok(())
}

fn print_report(dataset: &types::Dataset, country: &str, year: i32) -> anyhow::Result<()> {
    let state = charts::DashboardState {
        country: country.to_string(),
        year,
    };
    for line in charts::report_lines(dataset, &state)? {
        println!("{}", line);
    }
    Ok(())
}
