//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.fertiview.toml` files.

use crate::dashboard::SelectionDefaults;
use crate::models::{AgeBand, MAX_YEAR, MIN_YEAR};
use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".fertiview.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Dataset settings.
    #[serde(default)]
    pub dataset: DatasetConfig,

    /// Initial selection.
    #[serde(default)]
    pub selection: SelectionConfig,

    /// View settings.
    #[serde(default)]
    pub views: ViewsConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "fertility_dashboard.md".to_string()
}

/// Source dataset settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Path to the wide CSV table.
    #[serde(default = "default_dataset_path")]
    pub path: PathBuf,

    /// First year kept during ingestion.
    #[serde(default = "default_min_year")]
    pub min_year: i64,

    /// Last year kept during ingestion.
    #[serde(default = "default_max_year")]
    pub max_year: i64,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: default_dataset_path(),
            min_year: default_min_year(),
            max_year: default_max_year(),
        }
    }
}

impl DatasetConfig {
    /// Years kept during ingestion.
    pub fn years(&self) -> RangeInclusive<i64> {
        self.min_year..=self.max_year
    }

    /// Check the year range against what the record store admits.
    pub fn validate(&self) -> Result<()> {
        let admitted = i64::from(MIN_YEAR)..=i64::from(MAX_YEAR);
        ensure!(
            admitted.contains(&self.min_year) && admitted.contains(&self.max_year),
            "dataset years {}..={} must lie within {}..={}",
            self.min_year,
            self.max_year,
            MIN_YEAR,
            MAX_YEAR
        );
        ensure!(
            self.min_year <= self.max_year,
            "dataset min_year {} is after max_year {}",
            self.min_year,
            self.max_year
        );
        Ok(())
    }
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("age_specific_fertility_rates.csv")
}

fn default_min_year() -> i64 {
    i64::from(MIN_YEAR)
}

fn default_max_year() -> i64 {
    i64::from(MAX_YEAR)
}

/// Initial values of the dashboard inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Initial year; the latest year in the dataset when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,

    /// Initial age band for the map and rankings.
    #[serde(default)]
    pub age_band: AgeBand,

    /// Country shown before any map click.
    #[serde(default = "default_fallback_country")]
    pub fallback_country: String,

    /// Initial age band of the country comparison.
    #[serde(default)]
    pub comparison_age_band: AgeBand,

    /// Initial age band of the deviation view.
    #[serde(default)]
    pub deviation_age_band: AgeBand,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            year: None,
            age_band: AgeBand::default(),
            fallback_country: default_fallback_country(),
            comparison_age_band: AgeBand::default(),
            deviation_age_band: AgeBand::default(),
        }
    }
}

impl From<&SelectionConfig> for SelectionDefaults {
    fn from(config: &SelectionConfig) -> Self {
        Self {
            year: config.year,
            age_band: config.age_band,
            fallback_country: config.fallback_country.clone(),
            comparison_age_band: config.comparison_age_band,
            deviation_age_band: config.deviation_age_band,
        }
    }
}

fn default_fallback_country() -> String {
    "Germany".to_string()
}

/// View settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewsConfig {
    /// Length of the top and bottom country lists.
    #[serde(default = "default_ranking_size")]
    pub ranking_size: usize,
}

impl Default for ViewsConfig {
    fn default() -> Self {
        Self {
            ranking_size: default_ranking_size(),
        }
    }
}

fn default_ranking_size() -> usize {
    crate::dashboard::composer::DEFAULT_RANKING_SIZE
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .dataset
            .validate()
            .with_context(|| format!("Invalid [dataset] in {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref data) = args.data {
            self.dataset.path = data.clone();
        }
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(size) = args.ranking_size {
            self.views.ranking_size = size;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Log level: `--quiet` wins over `verbose`, otherwise INFO.
    pub fn log_level(&self, quiet: bool) -> tracing::Level {
        if quiet {
            tracing::Level::ERROR
        } else if self.general.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.selection.fallback_country, "Germany");
        assert_eq!(config.selection.age_band, AgeBand::From15To19);
        assert_eq!(config.views.ranking_size, 10);
        assert_eq!(config.dataset.years(), 1970..=2023);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "custom_dashboard.json"
verbose = true

[dataset]
path = "data/rates.csv"
min_year = 1990

[selection]
year = 2010
age_band = "25-29"
fallback_country = "France"
deviation_age_band = "40-44"

[views]
ranking_size = 5
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output, "custom_dashboard.json");
        assert!(config.general.verbose);
        assert_eq!(config.dataset.path, PathBuf::from("data/rates.csv"));
        assert_eq!(config.dataset.years(), 1990..=2023);
        assert_eq!(config.selection.year, Some(2010));
        assert_eq!(config.selection.age_band, AgeBand::From25To29);
        assert_eq!(config.selection.comparison_age_band, AgeBand::From15To19);
        assert_eq!(config.selection.deviation_age_band, AgeBand::From40To44);
        assert_eq!(config.views.ranking_size, 5);

        let defaults = SelectionDefaults::from(&config.selection);
        assert_eq!(defaults.fallback_country, "France");
        assert_eq!(defaults.year, Some(2010));
    }

    #[test]
    fn test_parse_config_rejects_unknown_band() {
        let toml_content = r#"
[selection]
age_band = "45-49"
"#;
        assert!(toml::from_str::<Config>(toml_content).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[views]\nranking_size = 3\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.views.ranking_size, 3);
        assert_eq!(config.selection.fallback_country, "Germany");

        assert!(Config::load(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[dataset]"));
        assert!(toml_str.contains("[selection]"));
        assert!(toml_str.contains("[views]"));

        let back: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(back.selection.age_band, AgeBand::From15To19);
    }

    #[test]
    fn test_log_level() {
        let mut config = Config::default();
        assert_eq!(config.log_level(false), tracing::Level::INFO);
        assert_eq!(config.log_level(true), tracing::Level::ERROR);

        config.general.verbose = true;
        assert_eq!(config.log_level(false), tracing::Level::DEBUG);
        assert_eq!(config.log_level(true), tracing::Level::ERROR);
    }

    #[test]
    fn test_load_rejects_years_outside_store_range() {
        let dir = tempfile::tempdir().unwrap();

        let path = dir.path().join("early.toml");
        std::fs::write(&path, "[dataset]\nmin_year = 1960\n").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("must lie within 1970..=2023"));

        let path = dir.path().join("inverted.toml");
        std::fs::write(&path, "[dataset]\nmin_year = 2000\nmax_year = 1990\n").unwrap();
        assert!(Config::load(&path).is_err());

        assert!(DatasetConfig::default().validate().is_ok());
    }
}
