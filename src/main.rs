//! CLI entry point for the telesignal dashboard engine.
//!
//! Every command loads the dataset and the persisted filter selection;
//! commands that change the selection save it back.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use telesignal::analyzers::Metric;
use telesignal::config::Settings;
use telesignal::dashboard::Dashboard;
use telesignal::fetch::BasicClient;
use telesignal::filters::{Field, FilterAction, FilterFile};
use telesignal::geo::Coordinates;
use telesignal::location::{FixedGeolocator, LocationOutcome, LocationResolver, NominatimGeocoder};
use telesignal::output::{append_rows, fixed2, millis, print_json};
use telesignal::publish::{DashboardSnapshot, write_json_to_s3};
use telesignal::store::fetch_dataset;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "telesignal")]
#[command(about = "Filter and aggregate telecom network measurements", long_about = None)]
struct Cli {
    /// Dataset path or URL (overrides TELESIGNAL_DATASET)
    #[arg(long, global = true)]
    dataset: Option<String>,

    /// Persisted filter state file (overrides TELESIGNAL_FILTER_STATE)
    #[arg(long, global = true)]
    state_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the values each filter currently offers
    Options {
        /// Only list this field
        #[arg(short, long)]
        field: Option<String>,

        /// Search available pincodes containing this text
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Inspect or change the filter selection
    Filter {
        #[command(subcommand)]
        action: FilterCommand,
    },
    /// Show headline KPIs for the current view
    Kpis {
        /// Ranking metric: download, upload, latency or score
        #[arg(short, long, default_value = "score")]
        metric: String,
    },
    /// Print chart data for the current view as JSON
    Charts,
    /// Show the area × operator table
    Areas {
        /// CSV file to append the rows to
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show per-operator performance
    Operators,
    /// Resolve a position to a dataset location
    Locate {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        /// Apply the matched location to the filters
        #[arg(long, default_value_t = false)]
        apply: bool,
    },
    /// Upload a dashboard snapshot to S3
    Publish {
        /// S3 bucket name (e.g., "my-bucket")
        #[arg(long)]
        s3_bucket: String,

        /// Key prefix inside the bucket
        #[arg(long, default_value = "snapshots")]
        prefix: String,

        #[arg(short, long, default_value = "score")]
        metric: String,

        /// Gzip compress the snapshot before uploading
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
}

#[derive(Subcommand)]
enum FilterCommand {
    /// Select a value ("All" clears it)
    Set { field: String, value: String },
    /// Add or remove a year
    ToggleYear { year: i32 },
    /// First month (1-12) to include
    MonthStart { month: u8 },
    /// Clear every filter
    Reset,
    /// Print the current selection
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let settings = Settings::from_env();

    // Logging setup: colored stderr + JSON rolling log file
    let log_dir = settings
        .log_file
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = settings
        .log_file
        .file_name()
        .unwrap_or(OsStr::new("telesignal.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::try_from_env("RUST_LOG").unwrap_or_else(|_| EnvFilter::new("info")));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::try_from_env("RUST_LOG_JSON").unwrap_or_else(|_| EnvFilter::new("debug")));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let source = cli.dataset.unwrap_or_else(|| settings.dataset.clone());
    let state_file = FilterFile::new(cli.state_file.unwrap_or_else(|| settings.filter_state.clone()));

    let store = fetch_dataset(&BasicClient::new(), &source)
        .await
        .with_context(|| format!("failed to load dataset from {source}"))?;
    let mut dashboard = Dashboard::new(store);
    dashboard.restore_from(&state_file)?;

    match cli.command {
        Commands::Options { field, search } => {
            if let Some(term) = search {
                for pincode in dashboard.search_pincodes(&term) {
                    println!("{pincode}");
                }
                return Ok(());
            }
            let fields = match field {
                Some(name) => vec![name.parse::<Field>()?],
                None => vec![
                    Field::State,
                    Field::City,
                    Field::Area,
                    Field::Pincode,
                    Field::Network,
                    Field::Operator,
                    Field::Year,
                ],
            };
            for field in fields {
                let values = dashboard.available_values(field);
                println!("{field}: {}", values.join(", "));
            }
        }
        Commands::Filter { action } => {
            let action = match action {
                FilterCommand::Set { field, value } => FilterAction::select(field.parse::<Field>()?, &value)?,
                FilterCommand::ToggleYear { year } => FilterAction::ToggleYear(year),
                FilterCommand::MonthStart { month } => {
                    if !(1..=12).contains(&month) {
                        warn!(month, "Month outside 1-12, clamping");
                    }
                    FilterAction::SetMonthStart(month)
                }
                FilterCommand::Reset => FilterAction::Reset,
                FilterCommand::Show => {
                    print_filters(&dashboard);
                    return Ok(());
                }
            };
            dashboard.dispatch(action);
            dashboard.save_to(&state_file)?;
            info!(path = %state_file.path().display(), "Filter state saved");
            print_filters(&dashboard);
        }
        Commands::Kpis { metric } => {
            let metric = metric.parse::<Metric>().unwrap_or_default();
            let kpis = dashboard.kpis(metric);
            println!("Records:        {}", dashboard.view().len());
            println!("Best operator:  {} (by {metric})", kpis.best_operator);
            println!("Avg download:   {} Mbps", fixed2(Some(kpis.avg_download)));
            println!("Avg upload:     {} Mbps", fixed2(Some(kpis.avg_upload)));
            println!("Avg latency:    {} ms", millis(Some(kpis.avg_latency)));
            println!("Avg score:      {}", fixed2(Some(kpis.avg_score)));
        }
        Commands::Charts => {
            println!("{}", serde_json::to_string_pretty(&dashboard.charts())?);
        }
        Commands::Areas { output } => {
            let rows = dashboard.area_table();
            for row in &rows {
                println!(
                    "{:<24} {:<10} {:>8} {:>8} {:>6}",
                    row.area,
                    row.operator,
                    fixed2(Some(row.avg_download)),
                    fixed2(Some(row.avg_upload)),
                    fixed2(Some(row.avg_score)),
                );
            }
            if let Some(path) = output {
                append_rows(&path, &rows)?;
                info!(path = %path.display(), rows = rows.len(), "Area table appended");
            }
        }
        Commands::Operators => {
            for op in dashboard.operator_performance() {
                println!(
                    "{:<10} n={:<6} down={:>8} up={:>8} latency={:>6} score={:>6} signal={:>6} {}",
                    op.operator,
                    op.count,
                    fixed2(op.avg_download),
                    fixed2(op.avg_upload),
                    millis(op.avg_latency),
                    fixed2(op.avg_score),
                    fixed2(op.avg_signal),
                    op.label.map_or("N/A", |l| l.as_str()),
                );
            }
        }
        Commands::Locate { lat, lon, apply } => {
            let geocoder = NominatimGeocoder::new(&settings.geocoder_url, settings.geolocation_timeout)?;
            let mut resolver = LocationResolver::new(FixedGeolocator(Coordinates::new(lat, lon)), geocoder)
                .with_timeout(settings.geolocation_timeout)
                .with_cache_ttl(settings.location_cache_ttl);

            let outcome = resolver.detect(dashboard.store()).await;
            println!("{}", serde_json::to_string_pretty(&outcome)?);

            if let (true, LocationOutcome::Success(location)) = (apply, &outcome) {
                dashboard.apply_location(location);
                dashboard.save_to(&state_file)?;
                print_filters(&dashboard);
            }
        }
        Commands::Publish {
            s3_bucket,
            prefix,
            metric,
            gzip,
        } => {
            let metric = metric.parse::<Metric>().unwrap_or_default();
            let snapshot = DashboardSnapshot::capture(&dashboard, metric, Utc::now());
            let key = snapshot.key(&prefix, gzip);

            let config = aws_config::load_from_env().await;
            let s3 = aws_sdk_s3::Client::new(&config);
            info!(bucket = %s3_bucket, key = %key, gzip, "S3 upload enabled");

            write_json_to_s3(&s3, &s3_bucket, &key, &snapshot, gzip).await?;
            print_json(&snapshot.kpis)?;
        }
    }

    Ok(())
}

fn print_filters(dashboard: &Dashboard) {
    let filters = dashboard.filters();
    println!("state:       {}", filters.state);
    println!("city:        {}", filters.city);
    println!("area:        {}", filters.area);
    println!("pincode:     {}", filters.pincode);
    println!("network:     {}", filters.network);
    println!("operator:    {}", filters.operator);
    let years = if filters.years.is_empty() {
        "All".to_string()
    } else {
        filters
            .years
            .iter()
            .map(i32::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };
    println!("years:       {years}");
    println!("month start: {}", filters.month_start);
    println!("records:     {}", dashboard.view().len());
}
