//! CLI entry point for the transit rater.
//!
//! Provides subcommands for scoring a live snapshot, enriching it with
//! per-vehicle status, and running the daily bunching and performance jobs
//! over a directory of arrival-log CSVs.

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use transit_rater::{
    config::{LogFormat, LoggingConfig, RaterConfig},
    history::{aggregator::PerformanceAggregator, bunching::BunchingDetector},
    infra::{
        FileArrivalLog, InMemoryCatalog, InMemoryFeedbackStore, InMemoryIncidentStore,
        InMemoryPerformanceStore, InMemoryWeather, StaticSchedule,
    },
    output::{print_json, write_json},
    parser::{parse_catalog, parse_schedule, parse_snapshot, parse_weather},
    scoring::{
        adherence::ScheduleAdherenceCalculator, headway::HeadwayCalculator,
        interpolator::PositionInterpolator, scorer::HeadwayScorer,
    },
    status::{Snapshot, VehicleStatusService, reason::HeuristicTrafficReasonProvider},
};

#[derive(Parser)]
#[command(name = "transit_rater")]
#[command(about = "Scores transit service from live positions and arrival logs", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, env = "TRANSIT_RATER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade every route and direction in a vehicle snapshot
    Score {
        /// Vehicle snapshot JSON
        #[arg(long)]
        snapshot: PathBuf,

        /// Static schedule JSON
        #[arg(long)]
        schedule: PathBuf,

        /// Write scores to this JSON file instead of logging them
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Attach punctuality status to every vehicle in a snapshot
    Enrich {
        #[arg(long)]
        snapshot: PathBuf,

        #[arg(long)]
        schedule: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Find bunching incidents in one day of arrival predictions
    DetectBunching {
        /// Directory of date=YYYY-MM-DD.csv arrival logs
        #[arg(short = 'd', long, default_value = "arrivals")]
        arrivals_dir: PathBuf,

        /// Route catalog JSON
        #[arg(long)]
        catalog: PathBuf,

        /// Weather observations JSON
        #[arg(long)]
        weather: Option<PathBuf>,

        /// Day to process (defaults to yesterday)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Bunching window in seconds (overrides the config)
        #[arg(long)]
        time_window: Option<i64>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Detect bunching, then aggregate daily performance per route
    Aggregate {
        #[arg(short = 'd', long, default_value = "arrivals")]
        arrivals_dir: PathBuf,

        #[arg(long)]
        catalog: PathBuf,

        #[arg(long)]
        weather: Option<PathBuf>,

        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => RaterConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => RaterConfig::default(),
    };

    let _file_guard = init_logging(&config.logging)?;

    match cli.command {
        Commands::Score {
            snapshot,
            schedule,
            output,
        } => {
            let snapshot = load_snapshot(&snapshot)?;
            let schedule = Arc::new(load_schedule(&schedule)?);
            let interpolator = Arc::new(PositionInterpolator::new(schedule.clone(), schedule.clone()));

            let scorer = HeadwayScorer::new(
                HeadwayCalculator::standard(
                    schedule.clone(),
                    interpolator.clone(),
                    config.headway.reference_progress,
                ),
                ScheduleAdherenceCalculator::new(schedule, interpolator),
            );

            let as_of = snapshot.timestamp.unwrap_or_else(|| Utc::now().timestamp());
            let positions: Vec<_> = snapshot.vehicles.into_iter().map(|v| v.position).collect();
            let scores = scorer.compute(&positions, as_of);

            info!(routes = scores.len(), vehicles = positions.len(), "Snapshot scored");
            emit(output.as_deref(), &scores)?;
        }
        Commands::Enrich {
            snapshot,
            schedule,
            output,
        } => {
            let snapshot = load_snapshot(&snapshot)?;
            let schedule = Arc::new(load_schedule(&schedule)?);

            let service = VehicleStatusService::new(
                schedule,
                Arc::new(HeuristicTrafficReasonProvider::new(
                    config.status.easter_egg_probability,
                )),
                Arc::new(InMemoryFeedbackStore::default()),
                &config.status,
            );

            let now = snapshot.timestamp.unwrap_or_else(|| Utc::now().timestamp());
            let enriched = service.enrich_snapshot(snapshot, now).await;
            emit(output.as_deref(), &enriched)?;
        }
        Commands::DetectBunching {
            arrivals_dir,
            catalog,
            weather,
            date,
            time_window,
            output,
        } => {
            let config = config
                .with_time_window(time_window)
                .context("invalid --time-window")?;
            let catalog = Arc::new(load_catalog(&catalog)?);
            let weather = Arc::new(load_weather(weather.as_deref())?);
            let incidents = Arc::new(InMemoryIncidentStore::default());
            let arrivals = Arc::new(FileArrivalLog::new(arrivals_dir, catalog.clone()));

            let detector = BunchingDetector::new(arrivals, catalog, incidents.clone(), weather)
                .with_time_window(config.bunching.time_window_secs)
                .with_utc_offset(config.aggregation.utc_offset_minutes);

            let date = date.unwrap_or_else(yesterday);
            let summary = detector.detect_for_date(date).await?;
            info!(%date, detected = summary.detected, skipped = summary.skipped, "Bunching summary");

            emit(output.as_deref(), &incidents.all())?;
        }
        Commands::Aggregate {
            arrivals_dir,
            catalog,
            weather,
            date,
            output,
        } => {
            let catalog = Arc::new(load_catalog(&catalog)?);
            let weather = Arc::new(load_weather(weather.as_deref())?);
            let incidents = Arc::new(InMemoryIncidentStore::default());
            let performance = Arc::new(InMemoryPerformanceStore::default());
            let arrivals = Arc::new(FileArrivalLog::new(arrivals_dir, catalog.clone()));
            let date = date.unwrap_or_else(yesterday);

            let detector = BunchingDetector::new(
                arrivals.clone(),
                catalog.clone(),
                incidents.clone(),
                weather.clone(),
            )
            .with_time_window(config.bunching.time_window_secs)
            .with_utc_offset(config.aggregation.utc_offset_minutes);
            detector.detect_for_date(date).await?;

            let aggregator = PerformanceAggregator::new(
                arrivals,
                catalog,
                incidents,
                performance.clone(),
                weather,
                config.aggregation.clone(),
            );
            let summary = aggregator.aggregate_date(date).await?;
            info!(%date, success = summary.success, failed = summary.failed, "Aggregation summary");

            emit(output.as_deref(), &performance.all())?;
        }
    }

    Ok(())
}

/// Colored stderr (or JSON, per config) plus a JSON daily rolling log file.
fn init_logging(logging: &LoggingConfig) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/transit_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("transit_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_filter = EnvFilter::try_from_env("RUST_LOG")
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("invalid log level")?;

    let stderr_layer = match logging.format {
        LogFormat::Pretty => fmt::layer()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_ansi(true)
            .with_writer(std::io::stderr)
            .with_filter(stderr_filter)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(stderr_filter)
            .boxed(),
    };

    let json_filter = EnvFilter::try_from_env("RUST_LOG_JSON")
        .unwrap_or_else(|_| EnvFilter::new("debug"));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(json_filter);

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    Ok(file_guard)
}

fn yesterday() -> NaiveDate {
    let today = Utc::now().date_naive();
    today.pred_opt().unwrap_or(today)
}

fn emit<T: serde::Serialize + ?Sized>(output: Option<&Path>, value: &T) -> Result<()> {
    match output {
        Some(path) => {
            write_json(path, value)?;
            info!(path = %path.display(), "Results written");
        }
        None => print_json(value)?,
    }
    Ok(())
}

fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(parse_snapshot(&bytes)?)
}

fn load_schedule(path: &Path) -> Result<StaticSchedule> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let schedule = parse_schedule(&bytes)?;
    info!(trips = schedule.trip_count(), "Schedule loaded");
    Ok(schedule)
}

fn load_catalog(path: &Path) -> Result<InMemoryCatalog> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(parse_catalog(&bytes)?)
}

fn load_weather(path: Option<&Path>) -> Result<InMemoryWeather> {
    let Some(path) = path else {
        return Ok(InMemoryWeather::default());
    };
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(InMemoryWeather::new(parse_weather(&bytes)?))
}
