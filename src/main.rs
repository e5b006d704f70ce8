//! Fertiview - reactive fertility rate dashboard engine
//!
//! A CLI tool that loads an age-specific fertility table, replays
//! dashboard input signals against a session and renders the resulting
//! views as a Markdown or JSON report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (config, dataset, output, etc.)
//!   2 - At least one signal was rejected and --strict was set

mod analysis;
mod cli;
mod config;
mod dashboard;
mod error;
mod ingest;
mod models;
mod report;
mod store;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use dashboard::{SelectionDefaults, Session};
use models::{Report, ReportMetadata};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration before logging so [general] verbose is honored
    let (mut config, config_source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(config.log_level(args.quiet));

    info!("Fertiview v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    match config_source {
        Some(path) => info!("Loaded config from {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }

    match run_dashboard(&args, &config) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Dashboard failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .fertiview.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE_NAME);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to set the dataset path, default selection and ranking size.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load the dataset, replay signals and write the report. Returns the exit code.
fn run_dashboard(args: &Args, config: &Config) -> Result<i32> {
    // Step 1: Load the record store
    let store = Arc::new(ingest::load_store(&config.dataset.path, &config.dataset.years())?);

    // Step 2: Open a session with the configured defaults
    let defaults = SelectionDefaults::from(&config.selection);
    let mut session =
        Session::open_with_ranking_size(store, &defaults, config.views.ranking_size)
            .context("Failed to build the initial dashboard")?;

    // Step 3: Replay input signals
    let signals = collect_signals(args)?;
    let mut applied = 0usize;
    let mut rejected = Vec::new();

    for line in &signals {
        match session.dispatch_assignment(line) {
            Ok(update) => {
                applied += 1;
                debug!("{} -> {:?}", update.signal, update.recomputed);
            }
            Err(e) => rejected.push(format!("{}: {}", line, e)),
        }
    }

    if !rejected.is_empty() {
        warn!("{} of {} signals rejected", rejected.len(), signals.len());
    }

    // Step 4: Build and save the report
    let store = session.store();
    let year_range = store.years().next().zip(store.latest_year());
    let report = Report {
        metadata: ReportMetadata {
            dataset: config.dataset.path.display().to_string(),
            generated_at: Utc::now(),
            records: store.len(),
            countries: store.countries().count(),
            year_range,
            signals_applied: applied,
            signals_rejected: rejected.clone(),
        },
        selection: session.selection().clone(),
        views: session.bundle().clone(),
    };

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    let output_path = Path::new(&config.general.output);
    std::fs::write(output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    println!("\n📊 Dashboard Summary:");
    println!("   Records: {} ({} countries)", store.len(), store.countries().count());
    println!(
        "   Selection: {} / {} / {}",
        session.selection().year,
        session.selection().age_band,
        session.selection().focused_country
    );
    println!("   Signals: {} applied, {} rejected", applied, rejected.len());
    for reason in &rejected {
        println!("   - {}", reason);
    }
    println!("\n✅ Dashboard saved to: {}", output_path.display());

    if args.strict && !rejected.is_empty() {
        eprintln!("\n⛔ Some signals were rejected. Failing (exit code 2).");
        return Ok(2);
    }

    Ok(0)
}

/// Gather `name=value` lines in dispatch order: selection flags, --signal, then --events.
fn collect_signals(args: &Args) -> Result<Vec<String>> {
    let mut signals: Vec<String> = args
        .selection_signals()
        .into_iter()
        .map(|(kind, value)| format!("{}={}", kind, value))
        .collect();

    signals.extend(args.signals.iter().map(|raw| raw.trim().to_string()));

    if let Some(ref events) = args.events {
        let content = std::fs::read_to_string(events)
            .with_context(|| format!("Failed to read events file: {}", events.display()))?;
        for line in content.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            signals.push(line.to_string());
        }
    }

    debug!("Collected {} signals", signals.len());
    Ok(signals)
}

/// Load configuration from file or use defaults.
///
/// Runs before the subscriber is installed, so problems with the default
/// file are reported on stderr. Returns the path the config came from.
fn load_config(args: &Args) -> Result<(Config, Option<PathBuf>)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Ok((Config::load(config_path)?, Some(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, Some(PathBuf::from(CONFIG_FILE_NAME)))),
        Ok(None) => Ok((Config::default(), None)),
        Err(e) => {
            eprintln!("⚠️  Failed to load config, using defaults: {:#}", e);
            Ok((Config::default(), None))
        }
    }
}
