//! Drone delivery planner.
//!
//! Reads a catalog snapshot (drones, service points, restricted areas and
//! stationings) plus a batch of delivery requests, and prints the plan as
//! JSON on stdout. Logs go to stderr.
//!
//! Usage:
//!   dispatch plan --catalog catalog.json --requests requests.json --pretty
//!   dispatch query --catalog catalog.json --where "capacity>=4" --where "cooling=true"

use anyhow::{bail, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use dispatch_cli::input::{catalog_problems, parse_condition, read_catalog, read_requests};
use dispatch_cli::{Config, CorridorMargin};
use dispatch_core::{
    drone_details, drones_with_cooling, export, plan_catalog, query, query_available_drones,
    AvailabilityIndex, Catalog,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about = "Plan drone deliveries around no-fly zones", long_about = None)]
struct Args {
    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Plan flights for a batch of delivery requests
    Plan {
        /// Catalog snapshot (JSON)
        #[arg(long)]
        catalog: PathBuf,
        /// Delivery requests (JSON array)
        #[arg(long)]
        requests: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Plan)]
        format: OutputFormat,
        /// Expansion count at which a leg is declared unroutable
        #[arg(long)]
        max_expansions: Option<usize>,
        /// Search corridor padding in degrees, or `off`
        #[arg(long)]
        corridor_margin: Option<CorridorMargin>,
    },
    /// List drones able to serve every request
    AvailableDrones {
        #[arg(long)]
        catalog: PathBuf,
        #[arg(long)]
        requests: PathBuf,
    },
    /// Filter drones by conditions such as `capacity>=4`
    Query {
        #[arg(long)]
        catalog: PathBuf,
        #[arg(long = "where", required = true)]
        conditions: Vec<String>,
    },
    /// List drones by cooling support
    Cooling {
        #[arg(long)]
        catalog: PathBuf,
        #[arg(long, action = ArgAction::Set, default_value_t = true)]
        state: bool,
    },
    /// Show a single drone
    Drone {
        #[arg(long)]
        catalog: PathBuf,
        id: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Flight plan as served to clients
    Plan,
    /// One GeoJSON feature per drone
    Geojson,
    /// Drone features plus restricted-area polygons
    Overlay,
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_filter)
        .unwrap_or_else(|_| EnvFilter::new(dispatch_cli::config::DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);
    if config.log_json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{text}");
    Ok(())
}

fn load_catalog(path: &Path) -> Result<Catalog> {
    let catalog = read_catalog(path)?;
    for problem in catalog_problems(&catalog) {
        tracing::warn!("{}", problem);
    }
    tracing::debug!(
        "catalog: {} drones, {} service points, {} restricted areas",
        catalog.drones.len(),
        catalog.service_points.len(),
        catalog.restricted_areas.len()
    );
    Ok(catalog)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::from_env();
    init_tracing(&config);

    match args.command {
        Command::Plan {
            catalog,
            requests,
            format,
            max_expansions,
            corridor_margin,
        } => {
            let config = config.with_overrides(max_expansions, corridor_margin);
            let catalog = load_catalog(&catalog)?;
            let requests = read_requests(&requests)?;
            tracing::info!("planning {} requests", requests.len());

            let plan = plan_catalog(&requests, &catalog, &config.rules());
            match format {
                OutputFormat::Plan => print_json(&plan, args.pretty)?,
                OutputFormat::Geojson => print_json(&export::feature_collection(&plan), args.pretty)?,
                OutputFormat::Overlay => print_json(
                    &export::overlay(&plan, &catalog.restricted_areas),
                    args.pretty,
                )?,
            }
        }
        Command::AvailableDrones { catalog, requests } => {
            let catalog = load_catalog(&catalog)?;
            let requests = read_requests(&requests)?;
            let index = AvailabilityIndex::new(&catalog.service_points, &catalog.service_point_drones);
            print_json(
                &query_available_drones(&catalog.drones, &index, &requests),
                args.pretty,
            )?;
        }
        Command::Query {
            catalog,
            conditions,
        } => {
            let catalog = load_catalog(&catalog)?;
            let conditions = conditions
                .iter()
                .map(|raw| parse_condition(raw))
                .collect::<Result<Vec<_>>>()?;
            print_json(&query(&catalog.drones, &conditions)?, args.pretty)?;
        }
        Command::Cooling { catalog, state } => {
            let catalog = load_catalog(&catalog)?;
            print_json(&drones_with_cooling(&catalog.drones, state), args.pretty)?;
        }
        Command::Drone { catalog, id } => {
            let catalog = load_catalog(&catalog)?;
            match drone_details(&catalog.drones, &id) {
                Some(drone) => print_json(drone, args.pretty)?,
                None => bail!("no drone with id {id}"),
            }
        }
    }

    Ok(())
}
