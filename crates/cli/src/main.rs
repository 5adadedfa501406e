use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use atoll_catalog::Catalog;
use atoll_core::{slugify, EssentialsConfig, FerryClass, HotelChoice, PlannerConfig, TripSelection};
use atoll_observability::{init_tracing, AppMetrics};
use atoll_service::{PlanRequest, TripService};
use atoll_storage::Store;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "atoll")]
#[command(about = "Atoll island trip planner CLI")]
struct Cli {
    #[arg(long, default_value = "data/catalog")]
    catalog_root: PathBuf,

    /// Planner tuning overrides as a JSON file.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a day-by-day itinerary with costs for a set of location ids.
    Plan {
        /// Location ids, comma separated or repeated.
        #[arg(long, value_delimiter = ',')]
        select: Vec<String>,
        /// Do not force the itinerary to open at the hub island.
        #[arg(long)]
        no_hub_start: bool,
        #[arg(long, default_value_t = 2)]
        adults: u32,
        #[arg(long, default_value_t = 0)]
        infants: u32,
        /// Ferry class: economy, deluxe, or luxury.
        #[arg(long)]
        ferry_class: Option<String>,
        /// Vehicle id for full-day cab pricing.
        #[arg(long)]
        vehicle: Option<String>,
        /// Island priced at the flat ground rate. Repeatable.
        #[arg(long = "flat-island")]
        flat_islands: Vec<String>,
        /// Hotel pick as island=nightly_rate. Repeatable.
        #[arg(long = "hotel")]
        hotels: Vec<String>,
        /// Add-on activity id. Repeatable.
        #[arg(long = "activity")]
        activities: Vec<String>,
        /// Trip start date as YYYY-MM-DD.
        #[arg(long)]
        start_date: Option<NaiveDate>,
    },
    /// Inspect the loaded catalog.
    Catalog {
        #[command(subcommand)]
        command: CatalogCommand,
    },
    /// List activities linked to a location.
    Suggest { location_id: String },
}

#[derive(Debug, Subcommand)]
enum CatalogCommand {
    Locations,
    Activities,
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("atoll_cli");
    let cli = Cli::parse();

    let service = build_service(&cli).await?;

    match cli.command {
        Command::Plan {
            select,
            no_hub_start,
            adults,
            infants,
            ferry_class,
            vehicle,
            flat_islands,
            hotels,
            activities,
            start_date,
        } => {
            let mut hotel_choices = HashMap::new();
            for raw in &hotels {
                let (island, choice) = parse_hotel_arg(raw)?;
                hotel_choices.insert(island, choice);
            }

            let request = PlanRequest {
                selection: TripSelection {
                    location_ids: select,
                    start_from_hub: !no_hub_start,
                    adults,
                    infants,
                },
                essentials: EssentialsConfig {
                    ferry_class: FerryClass::from_optional_str(ferry_class.as_deref()),
                    vehicle_id: vehicle.unwrap_or_default(),
                    flat_islands,
                },
                hotels: hotel_choices,
                activity_ids: activities,
                start_date,
            };

            let response = service.plan_once(request).await;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Catalog { command } => match command {
            CatalogCommand::Locations => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(service.catalog().locations())?
                );
            }
            CatalogCommand::Activities => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(service.catalog().activities())?
                );
            }
            CatalogCommand::Stats => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&service.catalog().stats())?
                );
            }
        },
        Command::Suggest { location_id } => {
            let suggestions = service.catalog().suggest_for(&location_id);
            println!("{}", serde_json::to_string_pretty(&suggestions)?);
        }
    }

    Ok(())
}

async fn build_service(cli: &Cli) -> Result<TripService<Store>> {
    let metrics = AppMetrics::shared();

    let catalog = Catalog::from_dir(&cli.catalog_root)
        .with_context(|| format!("failed loading catalog from {}", cli.catalog_root.display()))?;
    metrics.add_catalog_records_skipped(catalog.stats().skipped_records);

    let config = load_config(cli.config.as_ref())?;

    let store = if let Ok(database_url) = env::var("ATOLL_DATABASE_URL") {
        Store::sqlite(&database_url).await?
    } else {
        Store::memory()
    };

    Ok(TripService::new(
        Arc::new(catalog),
        config,
        Arc::new(store),
        metrics,
        chrono::Duration::days(7),
    ))
}

fn load_config(path: Option<&PathBuf>) -> Result<PlannerConfig> {
    if let Some(path) = path {
        return PlannerConfig::from_json_file(path)
            .with_context(|| format!("failed to load planner config from {}", path.display()));
    }

    match env::var("ATOLL_PLANNER_CONFIG") {
        Ok(path) => PlannerConfig::from_json_file(&path)
            .with_context(|| format!("failed to load planner config from {path}")),
        Err(_) => Ok(PlannerConfig::default()),
    }
}

fn parse_hotel_arg(raw: &str) -> Result<(String, HotelChoice)> {
    let (island, rate) = raw
        .split_once('=')
        .context("expected --hotel island=nightly_rate")?;
    let island = island.trim().to_string();
    let nightly_rate: f64 = rate
        .trim()
        .parse()
        .with_context(|| format!("nightly rate for {island} must be numeric"))?;

    let choice = HotelChoice {
        hotel_id: slugify(&island),
        name: format!("{island} stay"),
        nightly_rate,
    };
    Ok((island, choice))
}
