//! Command-line journey planner.
//!
//! Loads a JSON schedule snapshot, builds the network once and prints the
//! best itineraries between two endpoints. Everything is read from the
//! environment:
//!
//! - `TRANSIT_SCHEDULE`: schedule snapshot path (required)
//! - `TRANSIT_CONFIG`: JSON file with optional `graph` and `search` sections
//! - `TRANSIT_FROM`, `TRANSIT_TO`: a station id, or `lat,lon` for a location
//! - `TRANSIT_DATE`: travel date as `YYYY-MM-DD`
//! - `TRANSIT_TIMES`: comma-separated departure times as `HH:MM`
//! - `TRANSIT_MODES`: optional comma-separated modes, e.g. `tram,bus`
//! - `TRANSIT_LIMIT`: itineraries kept per time (default 5)
//!
//! Log output goes to stderr and is filtered by `RUST_LOG`.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use transit_planner::domain::{LatLong, StationId, TransitTime, TransportMode};
use transit_planner::graph::{BuildError, GraphConfig};
use transit_planner::network::TransportNetwork;
use transit_planner::planner::{Endpoint, JourneyRequest, Planner, SearchConfig, SearchError};
use transit_planner::schedule::{Schedule, ScheduleError};

const DEFAULT_LIMIT: usize = 5;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Search(#[from] SearchError),
}

/// Optional tuning read from `TRANSIT_CONFIG`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    graph: GraphConfig,
    search: SearchConfig,
}

impl FileConfig {
    fn load(path: &Path) -> Result<Self, CliError> {
        let text = std::fs::read_to_string(path).map_err(|source| CliError::ConfigRead {
            path: path.to_owned(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| CliError::ConfigParse {
            path: path.to_owned(),
            source,
        })
    }
}

fn var(name: &'static str) -> Result<String, CliError> {
    std::env::var(name).map_err(|_| CliError::Missing(name))
}

fn invalid(name: &'static str, reason: impl ToString) -> CliError {
    CliError::Invalid {
        name,
        reason: reason.to_string(),
    }
}

fn parse_endpoint(name: &'static str, value: &str) -> Result<Endpoint, CliError> {
    if let Some((lat, lon)) = value.split_once(',') {
        let lat: f64 = lat.trim().parse().map_err(|e| invalid(name, e))?;
        let lon: f64 = lon.trim().parse().map_err(|e| invalid(name, e))?;
        return Ok(Endpoint::Location(LatLong::new(lat, lon)));
    }
    StationId::parse(value.trim())
        .map(Endpoint::Station)
        .map_err(|e| invalid(name, e))
}

fn parse_times(value: &str) -> Result<Vec<TransitTime>, CliError> {
    value
        .split(',')
        .map(|t| TransitTime::parse_hhmm(t.trim()).map_err(|e| invalid("TRANSIT_TIMES", e)))
        .collect()
}

fn parse_modes(value: &str) -> Result<Vec<TransportMode>, CliError> {
    value
        .split(',')
        .map(|name| {
            let name = name.trim();
            TransportMode::ALL
                .into_iter()
                .find(|mode| mode.as_str() == name)
                .ok_or_else(|| invalid("TRANSIT_MODES", format!("unknown mode {name:?}")))
        })
        .collect()
}

fn read_request() -> Result<JourneyRequest, CliError> {
    let origin = parse_endpoint("TRANSIT_FROM", &var("TRANSIT_FROM")?)?;
    let destination = parse_endpoint("TRANSIT_TO", &var("TRANSIT_TO")?)?;
    let date = NaiveDate::parse_from_str(&var("TRANSIT_DATE")?, "%Y-%m-%d")
        .map_err(|e| invalid("TRANSIT_DATE", e))?;
    let times = parse_times(&var("TRANSIT_TIMES")?)?;

    let request = JourneyRequest::new(origin, destination, date, times);
    match std::env::var("TRANSIT_MODES") {
        Ok(modes) => Ok(request.with_modes(parse_modes(&modes)?)),
        Err(_) => Ok(request),
    }
}

async fn run() -> Result<(), CliError> {
    let schedule_path = PathBuf::from(var("TRANSIT_SCHEDULE")?);
    let config = match std::env::var("TRANSIT_CONFIG") {
        Ok(path) => FileConfig::load(Path::new(&path))?,
        Err(_) => FileConfig::default(),
    };
    let limit = match std::env::var("TRANSIT_LIMIT") {
        Ok(limit) => limit.parse().map_err(|e| invalid("TRANSIT_LIMIT", e))?,
        Err(_) => DEFAULT_LIMIT,
    };
    let request = read_request()?;

    let schedule = Schedule::load(&schedule_path)?;
    let network = TransportNetwork::build(&schedule, config.graph)?;
    let planner = Planner::new(Arc::new(network), config.search);

    let itineraries = planner.plan_concurrently(request, limit).await?;
    info!(found = itineraries.len(), "planning complete");

    if itineraries.is_empty() {
        println!("No journeys found.");
    }
    for itinerary in &itineraries {
        println!("{itinerary}");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "journey planning failed");
            ExitCode::FAILURE
        }
    }
}
