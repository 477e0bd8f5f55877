mod config;
mod error;
mod extractors;
mod models;
mod pipeline;
mod rank_lookup;
mod server;
mod utils;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;
use crate::extractors::{fetch_area_profile, fetch_sale_history};
use crate::pipeline::Pipeline;

#[derive(Parser)]
#[command(name = "property-insight", about = "Property listing and neighbourhood analysis", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Serve GET /property_analysis?url=<listing url>
    Serve,

    /// Analyse one listing URL and print the result as JSON
    Analyze {
        /// Property listing page URL
        url: String,
    },

    /// Neighbourhood statistics for a postcode
    Profile {
        postcode: String,
    },

    /// Recent sold prices for a street address
    Sales {
        postcode: String,
        street_address: String,
    },

    /// SIMD deprivation ranks for a postcode (needs chromedriver)
    Ranks {
        postcode: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "property_insight=info,warn",
        1 => "property_insight=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::new(filter))
        .init();

    let config = AppConfig::load()?;
    let pipeline = Pipeline::from_config(&config).context("Failed to build pipeline")?;

    match cli.command {
        Command::Serve => {
            let addr = format!("{}:{}", config.server.host, config.server.port);
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind {}", addr))?;
            info!("Listening on http://{}/property_analysis", addr);

            axum::serve(listener, server::router(Arc::new(pipeline)))
                .await
                .context("Server error")?;
        }

        Command::Analyze { url } => {
            let result = pipeline.analyse(&url).await?;
            print_json(&result)?;
        }

        Command::Profile { postcode } => {
            let _t = utils::Timer::start(format!("Area profile for {}", postcode));
            let profile = fetch_area_profile(pipeline.fetcher(), pipeline.sources(), &postcode).await?;
            print_json(&profile)?;
        }

        Command::Sales { postcode, street_address } => {
            let _t = utils::Timer::start(format!("Sale history for {}", street_address));
            let prices =
                fetch_sale_history(pipeline.fetcher(), pipeline.sources(), &postcode, &street_address).await?;
            print_json(&prices)?;
        }

        Command::Ranks { postcode } => {
            let _t = utils::Timer::start(format!("Rank lookup for {}", postcode));
            let ranks = pipeline.ranks().lookup(&postcode).await?;
            print_json(&ranks)?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
