// Luggage Monitor - Terminal monitor for luggage telemetry
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # Luggage Monitor
//!
//! Loads the five telemetry sources independently, merges whatever has
//! arrived and prints one JSON frame per render on stdout. Logs go to stderr.
//!
//! ## Usage
//!
//! ```bash
//! # Render once from a directory of JSON/CSV sources
//! luggage-monitor --data ./fleet --once --pretty
//!
//! # Follow one item, re-rendering every 30 seconds
//! luggage-monitor --data ./fleet --selection LG-0003 --track LG-0003 --refresh-secs 30
//!
//! # Generated fleet
//! luggage-monitor --demo --scenario rough_handling --once
//! ```

mod error;
mod loader;
mod refresh;
mod render;

use chrono::Utc;
use clap::Parser;
use error::{MonitorError, Result};
use loader::{spawn_loaders, DataSource, MonitorEvent};
use luggage_telemetry::{
    EngineConfig, Gazetteer, Selection, Tag, TelemetryEngine, TelemetryStore,
};
use refresh::RefreshTask;
use render::{render_frame, ViewRequest};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::EnvFilter;

/// Luggage telemetry monitor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding luggage, locations, falls, tamper and temperatures files
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Generate a fleet in memory instead of reading files
    #[arg(long)]
    demo: bool,

    /// Demo scenario (normal_trip, rough_handling, tampering, cold_hold, orphaned)
    #[arg(long, default_value = "normal_trip")]
    scenario: String,

    /// Demo fleet size
    #[arg(long, default_value = "5")]
    items: usize,

    /// Demo seed
    #[arg(long)]
    seed: Option<u64>,

    /// Dashboard selection: "All" or a luggage tag
    #[arg(short, long, default_value = "All")]
    selection: String,

    /// Tag to render a tracking card for
    #[arg(short, long)]
    track: Option<String>,

    /// Engine configuration (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Named places for reverse geocoding (JSON gazetteer)
    #[arg(long)]
    places: Option<PathBuf>,

    /// Override the refresh interval in seconds
    #[arg(long)]
    refresh_secs: Option<u32>,

    /// Render once after every source has settled, then exit
    #[arg(long)]
    once: bool,

    /// Pretty-print frames
    #[arg(long)]
    pretty: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match args.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };
        EnvFilter::from_default_env().add_directive(level.into())
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("Luggage Monitor v{}", env!("CARGO_PKG_VERSION"));

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let engine = TelemetryEngine::new(load_config(&args)?)?;
    let places = args.places.as_deref().map(load_places).transpose()?;
    let source = data_source(&args)?;
    let request = ViewRequest {
        selection: Selection::parse(&args.selection),
        track: args.track.as_deref().map(Tag::new),
    };

    let (tx, mut rx) = mpsc::channel(32);
    let _loaders = spawn_loaders(&source, &tx);
    let mut refresh = if args.once {
        None
    } else {
        let interval = engine.refresh_schedule().interval;
        info!("Refreshing every {}s", interval.as_secs());
        Some(RefreshTask::spawn(interval, tx.clone()))
    };
    drop(tx);

    let mut store = TelemetryStore::new();
    loop {
        let event = tokio::select! {
            event = rx.recv() => event,
            _ = signal::ctrl_c() => {
                info!("Interrupted, stopping");
                break;
            }
        };
        let Some(event) = event else {
            debug!("All producers finished");
            break;
        };

        match event {
            MonitorEvent::Source(update) => {
                let ok = update.is_ok();
                let kind = store.apply(update);
                if ok {
                    info!("Source {} loaded", kind);
                } else {
                    warn!("Source {} unavailable, showing it as empty", kind);
                }
            }
            MonitorEvent::Tick => debug!("Refresh tick"),
        }

        if args.once && !store.all_settled() {
            continue;
        }

        let snapshot = store.snapshot();
        let settled = snapshot.settled_sources().len();
        let frame = render_frame(
            &engine,
            &snapshot,
            &request,
            places.as_ref(),
            settled,
            Utc::now(),
        );
        println!("{}", frame.to_json(args.pretty)?);

        if args.once {
            break;
        }
    }

    if let Some(task) = refresh.as_mut() {
        task.stop();
    }
    Ok(())
}

fn load_config(args: &Args) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path).map_err(|e| MonitorError::io(path, e))?;
            EngineConfig::from_json(&json)?
        }
        None => EngineConfig::default(),
    };
    if let Some(secs) = args.refresh_secs {
        config.refresh.interval_secs = secs;
    }
    Ok(config)
}

fn load_places(path: &Path) -> Result<Gazetteer> {
    let json = std::fs::read_to_string(path).map_err(|e| MonitorError::io(path, e))?;
    let places = Gazetteer::from_json(&json)?;
    info!("Loaded {} named places", places.len());
    Ok(places)
}

fn data_source(args: &Args) -> Result<DataSource> {
    if let Some(dir) = &args.data {
        if args.demo {
            warn!("Both --data and --demo given, using --data");
        }
        return Ok(DataSource::Directory(dir.clone()));
    }
    if args.demo {
        return demo_source(args);
    }
    Err(MonitorError::NoSource)
}

#[cfg(feature = "demo")]
fn demo_source(args: &Args) -> Result<DataSource> {
    use luggage_testdata::{generate_fleet, FleetConfig, GeneratorConfig, Scenario};

    let scenario = Scenario::from_name(&args.scenario).unwrap_or_else(|| {
        warn!("Unknown scenario {}, using normal_trip", args.scenario);
        Scenario::NormalTrip
    });

    // Six hours of minute samples ending now
    let samples = 360;
    let interval_ms = 60_000;
    let start = Utc::now().timestamp_millis() - (samples as i64 - 1) * interval_ms;
    let mut config = GeneratorConfig::new()
        .with_start_time(start)
        .with_sample_interval_secs(60)
        .with_num_samples(samples);
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    let fleet = FleetConfig::new().with_items(args.items);
    let dataset = generate_fleet(&config, &fleet, scenario)?;
    info!(
        "Generated {} items, {} records ({})",
        dataset.items.len(),
        dataset.record_count(),
        scenario.name()
    );
    Ok(DataSource::Demo(dataset))
}

#[cfg(not(feature = "demo"))]
fn demo_source(_args: &Args) -> Result<DataSource> {
    warn!("Demo feature not enabled, ignoring --demo");
    Err(MonitorError::NoSource)
}
