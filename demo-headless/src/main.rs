use chrono::{Duration, Utc};
use clap::{Parser, ValueEnum};
use incident_sim_core::api::{ReportIncidentRequest, ResolveIncidentRequest};
use incident_sim_core::grid::{METERS_PER_DEGREE_LAT, METERS_PER_DEGREE_LNG};
use incident_sim_core::{
    EngineConfig, HouseholdStatus, Household, IncidentEngine, IncidentType, InMemoryStore,
    ManualClock, SeededRandom, Severity, SimulationService,
};
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Which propagation model runs each tick
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Propagation {
    /// Decaying risk into the 8 neighbors
    Risk,
    /// Probabilistic growth into the 4 neighbors
    Wave,
    Both,
}

/// Neighborhood incident simulation demo
#[derive(Parser, Debug)]
#[command(name = "incident-sim-demo")]
#[command(about = "Headless neighborhood incident simulation", long_about = None)]
struct Args {
    /// Incident type (fire, gas, intrusion)
    #[arg(short = 't', long, default_value = "fire")]
    incident_type: IncidentType,

    /// Initial severity (1-3)
    #[arg(short, long, default_value_t = 1)]
    severity: u8,

    /// Number of ticks to run
    #[arg(short = 'n', long, default_value_t = 10)]
    ticks: u32,

    /// Simulated seconds between ticks
    #[arg(long, default_value_t = 30)]
    tick_seconds: i64,

    /// Propagation model driven each tick
    #[arg(short, long, value_enum, default_value_t = Propagation::Both)]
    mode: Propagation,

    /// Seed for wave admission draws (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Households per side of the generated square layout
    #[arg(long, default_value_t = 7, value_parser = clap::value_parser!(u32).range(1..=1000))]
    grid_size: u32,

    /// Spacing between generated households in meters
    #[arg(long, default_value_t = 40.0)]
    spacing: f64,

    /// JSON file with a household list, replacing the generated layout
    #[arg(long)]
    households: Option<PathBuf>,

    /// JSON engine config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Origin household id (defaults to the first household, or the center of the generated layout)
    #[arg(short, long)]
    origin: Option<String>,

    /// Stop once this many cells are stored
    #[arg(long, default_value_t = 50_000)]
    max_cells: usize,

    /// Resolve the incident after the last tick
    #[arg(short, long)]
    resolve: bool,

    /// Print the final assessment as JSON
    #[arg(long)]
    json: bool,
}

fn generated_layout(config: &EngineConfig, side: u32, spacing: f64) -> Vec<Household> {
    let (base_lat, base_lng) = (config.grid.base_lat, config.grid.base_lng);
    let half = f64::from(side.saturating_sub(1)) / 2.0;
    let side_len = side as usize;
    let mut households = Vec::with_capacity(side_len.saturating_mul(side_len));
    for row in 0..side {
        for col in 0..side {
            let north = (f64::from(row) - half) * spacing;
            let east = (f64::from(col) - half) * spacing;
            households.push(Household::new(
                format!("H-{row}-{col}"),
                base_lat + north / METERS_PER_DEGREE_LAT,
                base_lng + east / METERS_PER_DEGREE_LNG,
            ));
        }
    }
    households
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    println!("=== Neighborhood Incident Simulation Demo ===\n");

    let config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    let (households, default_origin) = match &args.households {
        Some(path) => {
            let households: Vec<Household> =
                serde_json::from_str(&std::fs::read_to_string(path)?)?;
            let first = households.first().map(|h| h.id.to_string());
            (households, first)
        }
        None => {
            let side = args.grid_size.max(1);
            let center = side / 2;
            (
                generated_layout(&config, side, args.spacing),
                Some(format!("H-{center}-{center}")),
            )
        }
    };
    let origin = args
        .origin
        .clone()
        .or(default_origin)
        .ok_or("no households to report from")?;

    let household_count = households.len();
    let store = Arc::new(InMemoryStore::with_households(households));
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let engine = IncidentEngine::new(store, clock.clone(), config);
    println!(
        "Households: {}, cell size: {:.0}m, intrusion radius: {:.0}m",
        household_count,
        engine.mapper().cell_size(),
        engine.config().intrusion.radius_m
    );
    let rng = match args.seed {
        Some(seed) => SeededRandom::from_seed(seed),
        None => SeededRandom::from_os_rng(),
    };
    let service = SimulationService::new(engine, Box::new(rng));

    let report = service.report_incident(ReportIncidentRequest {
        origin_node_id: Some(origin.clone().into()),
        title: Some(format!("{} detected", args.incident_type.as_str().to_uppercase())),
        description: Some("Simulated sensor event".to_string()),
        incident_type: Some(args.incident_type),
        severity: Some(Severity(args.severity)),
    });
    let Some(outcome) = report.data else {
        return Err(format!("report failed: {}", report.message).into());
    };
    println!(
        "{} at {origin} (incident {}, {} affected)\n",
        report.message, outcome.incident_id, outcome.affected_count
    );

    println!("Tick | Elapsed(s) | Severity | Escalated | New cells | Total cells | Alerts");
    println!("-----|------------|----------|-----------|-----------|-------------|-------");

    for tick in 1..=args.ticks {
        clock.advance(Duration::seconds(args.tick_seconds));

        let escalated = service.escalate().data.map_or(0, |t| t.count);
        let mut new_cells = 0;
        if matches!(args.mode, Propagation::Risk | Propagation::Both) {
            new_cells += service.propagate_risk().data.map_or(0, |t| t.count);
        }
        if matches!(args.mode, Propagation::Wave | Propagation::Both) {
            new_cells += service.propagate_wave().data.map_or(0, |t| t.count);
        }

        let severity = service
            .active_incidents()
            .iter()
            .find(|incident| incident.id == outcome.incident_id)
            .map_or_else(|| "-".to_string(), |incident| incident.severity.to_string());
        let total_cells = service.burning_cells().len();

        println!(
            "{:4} | {:10} | {:>8} | {:9} | {:9} | {:11} | {:6}",
            tick,
            i64::from(tick) * args.tick_seconds,
            severity,
            escalated,
            new_cells,
            total_cells,
            service.active_alerts().len()
        );

        if total_cells > args.max_cells {
            warn!(total_cells, max_cells = args.max_cells, "cell limit reached, stopping");
            break;
        }
    }

    let assessments = service.household_assessments();
    let status = service.neighborhood_status();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&assessments)?);
    } else {
        println!("\n=== Household Assessment ===");
        for (label, wanted) in [
            ("Critical", HouseholdStatus::Critical),
            ("High", HouseholdStatus::High),
            ("Elevated", HouseholdStatus::Elevated),
            ("Safe", HouseholdStatus::Safe),
            ("Intrusion origin", HouseholdStatus::IntrusionOrigin),
            ("Intrusion neighbor", HouseholdStatus::IntrusionNeighbor),
        ] {
            let count = assessments.iter().filter(|a| a.status == wanted).count();
            if count > 0 {
                println!("{label:>18}: {count}");
            }
        }
        println!("Neighborhood: {}", serde_json::to_string(&status)?);
    }

    if args.resolve {
        let resolved = service.resolve_incident(ResolveIncidentRequest {
            incident_id: Some(outcome.incident_id),
        });
        info!(message = %resolved.message, "resolve requested");
        println!(
            "\n{} (neighborhood safe: {})",
            resolved.message,
            service.neighborhood_status().is_safe()
        );
    }

    Ok(())
}
