//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::dashboard::SignalKind;
use clap::Parser;
use std::path::PathBuf;

/// Fertiview - fertility rate dashboard engine
///
/// Loads an age-specific fertility table, applies dashboard input
/// signals and renders the resulting views as Markdown or JSON.
///
/// Examples:
///   fertiview --data age_specific_fertility_rates.csv
///   fertiview --data rates.csv --year 2000 --age-band 25-29 --country France
///   fertiview --data rates.csv --compare France,Japan --comparison-age-band 30-34
///   fertiview --data rates.csv --events clicks.txt --format json --strict
///   fertiview --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Wide CSV table of age-specific fertility rates
    ///
    /// Overrides the dataset path from the configuration file.
    #[arg(short, long, value_name = "FILE", env = "FERTIVIEW_DATA")]
    pub data: Option<PathBuf>,

    /// Output file path for the rendered dashboard
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .fertiview.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Year slider value
    #[arg(short, long, value_name = "YEAR")]
    pub year: Option<String>,

    /// Age band for the map, headlines and rankings (e.g. 25-29)
    #[arg(short, long, value_name = "BAND")]
    pub age_band: Option<String>,

    /// Country to drill into, as if clicked on the map
    #[arg(long, value_name = "COUNTRY")]
    pub country: Option<String>,

    /// Countries to compare (comma-separated)
    #[arg(long, value_name = "COUNTRIES")]
    pub compare: Option<String>,

    /// Age band for the country comparison
    #[arg(long, value_name = "BAND")]
    pub comparison_age_band: Option<String>,

    /// Age band for the deviation view
    #[arg(long, value_name = "BAND")]
    pub deviation_age_band: Option<String>,

    /// Raw input signal, applied after the selection flags
    ///
    /// Example: --signal map_click=Japan --signal year=1990
    #[arg(long = "signal", value_name = "NAME=VALUE")]
    pub signals: Vec<String>,

    /// File with one NAME=VALUE signal per line, applied last
    ///
    /// Blank lines and lines starting with '#' are skipped.
    #[arg(long, value_name = "FILE")]
    pub events: Option<PathBuf>,

    /// Length of the top and bottom country lists
    #[arg(long, value_name = "COUNT")]
    pub ranking_size: Option<usize>,

    /// Exit with code 2 if any signal was rejected
    #[arg(long)]
    pub strict: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .fertiview.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the rendered dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.ranking_size == Some(0) {
            return Err("Ranking size must be at least 1".to_string());
        }

        if let Some(ref data) = self.data {
            if !data.is_file() {
                return Err(format!("Dataset file does not exist: {}", data.display()));
            }
        }

        if let Some(ref events) = self.events {
            if !events.is_file() {
                return Err(format!("Events file does not exist: {}", events.display()));
            }
        }

        Ok(())
    }

    /// Selection flags as named signals, in dispatch order.
    pub fn selection_signals(&self) -> Vec<(SignalKind, String)> {
        [
            (SignalKind::Year, &self.year),
            (SignalKind::AgeBand, &self.age_band),
            (SignalKind::MapClick, &self.country),
            (SignalKind::ComparedCountries, &self.compare),
            (SignalKind::ComparisonAgeBand, &self.comparison_age_band),
            (SignalKind::DeviationAgeBand, &self.deviation_age_band),
        ]
        .into_iter()
        .filter_map(|(kind, value)| value.clone().map(|v| (kind, v)))
        .collect()
    }
}
