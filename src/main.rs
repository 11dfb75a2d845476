use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vacancy_client::config::Environment;
use vacancy_client::vacancy::{parse_date_iso, DEFAULT_WEEKENDS};
use vacancy_client::{ClientConfig, VacancyService};

#[derive(Parser)]
#[command(name = "vacancy-search")]
#[command(about = "Query the hotel vacancy API", long_about = None)]
struct Cli {
    /// API base URL (overrides VACANCY_API_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// Use the production API
    #[arg(long)]
    production: bool,

    /// Default request timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check API health
    Health,

    /// List hotels
    Hotels {
        /// Bypass the hotel list cache
        #[arg(long)]
        refresh: bool,
    },

    /// Scrape the hotel list from the booking site
    Scrape,

    /// Search vacancies between two dates (YYYY-MM-DD)
    Search {
        #[arg(long)]
        checkin: String,

        #[arg(long)]
        checkout: String,

        /// Hotel id, omit for all hotels
        #[arg(long)]
        hotel: Option<String>,
    },

    /// Search the next N weekends
    Weekends {
        #[arg(short, long, default_value_t = DEFAULT_WEEKENDS)]
        count: u32,
    },
}

fn build_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = ClientConfig::from_env().context("loading configuration")?;

    if cli.production {
        let defaults = ClientConfig::for_environment(Environment::Production);
        config.base_url = defaults.base_url;
    }
    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(ms) = cli.timeout_ms {
        config.timeout = Duration::from_millis(ms);
    }

    config.validate().context("validating configuration")?;
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "vacancy_client=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = build_config(&cli)?;
    let service = VacancyService::new(config).context("creating API client")?;

    match cli.command {
        Commands::Health => {
            let health = service.check_health().await?;
            print_json(&health)?;
        }

        Commands::Hotels { refresh } => {
            let hotels = service.get_hotels(refresh).await?;
            for hotel in &hotels {
                println!("{:>12}  {}", hotel.id, hotel.name);
            }
        }

        Commands::Scrape => {
            let hotels = service.scrape_hotels().await?;
            print_json(&hotels)?;
        }

        Commands::Search {
            checkin,
            checkout,
            hotel,
        } => {
            let checkin = parse_date_iso(&checkin)?;
            let checkout = parse_date_iso(&checkout)?;
            let result = service
                .search_vacancies(checkin, checkout, hotel.as_deref())
                .await?;
            print_json(&result)?;
        }

        Commands::Weekends { count } => {
            let result = service.search_weekend_vacancies(count).await?;
            println!(
                "{} of {} weekends have vacancies",
                result.weekends_with_vacancies(),
                result.weekends_searched()
            );
            print_json(&result)?;
        }
    }

    Ok(())
}
