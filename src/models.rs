//! Data models for the fertility dashboard.
//!
//! This module contains the core record and key types shared by the
//! store, the aggregation functions and the view composer.

use crate::dashboard::{SelectionState, ViewBundle};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Earliest year admitted into the record store.
pub const MIN_YEAR: u16 = 1970;

/// Latest year admitted into the record store.
pub const MAX_YEAR: u16 = 2023;

/// Five-year maternal age bracket.
///
/// The `45-49` bracket exists in the source data but is dropped during
/// ingestion, so it has no variant here.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum AgeBand {
    #[default]
    #[serde(rename = "15-19")]
    From15To19,
    #[serde(rename = "20-24")]
    From20To24,
    #[serde(rename = "25-29")]
    From25To29,
    #[serde(rename = "30-34")]
    From30To34,
    #[serde(rename = "35-39")]
    From35To39,
    #[serde(rename = "40-44")]
    From40To44,
}

impl AgeBand {
    /// All bands, youngest first.
    pub const ALL: [AgeBand; 6] = [
        AgeBand::From15To19,
        AgeBand::From20To24,
        AgeBand::From25To29,
        AgeBand::From30To34,
        AgeBand::From35To39,
        AgeBand::From40To44,
    ];

    /// Returns the display label, e.g. `"25-29"`.
    pub fn label(&self) -> &'static str {
        match self {
            AgeBand::From15To19 => "15-19",
            AgeBand::From20To24 => "20-24",
            AgeBand::From25To29 => "25-29",
            AgeBand::From30To34 => "30-34",
            AgeBand::From35To39 => "35-39",
            AgeBand::From40To44 => "40-44",
        }
    }

    /// Returns the column name used by the wide source table.
    pub fn column_name(&self) -> &'static str {
        match self {
            AgeBand::From15To19 => "fertility_rate_15_19",
            AgeBand::From20To24 => "fertility_rate_20_24",
            AgeBand::From25To29 => "fertility_rate_25_29",
            AgeBand::From30To34 => "fertility_rate_30_34",
            AgeBand::From35To39 => "fertility_rate_35_39",
            AgeBand::From40To44 => "fertility_rate_40_44",
        }
    }
}

impl fmt::Display for AgeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AgeBand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        AgeBand::ALL
            .into_iter()
            .find(|band| band.label() == trimmed)
            .ok_or_else(|| format!("unknown age band '{}'", trimmed))
    }
}

/// One validated observation: a country's rate for one year and age band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FertilityRecord {
    /// Short country identifier (e.g. `"FR"`).
    pub country_code: String,
    /// Display name; the join key for map and ranking views.
    pub country_name: String,
    /// Observation year, within `MIN_YEAR..=MAX_YEAR`.
    pub year: u16,
    /// Maternal age band.
    pub age_band: AgeBand,
    /// Births per 1000 women in the band, non-negative.
    pub rate: f64,
}

/// A long-format row as handed over by the ingestion step, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub country_code: String,
    pub country_name: String,
    pub year: i64,
    pub age_band: String,
    pub rate: f64,
}

/// Sort direction for rankings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Highest rates first.
    High,
    /// Lowest rates first.
    Low,
}

/// A country paired with a single rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryRate {
    pub country_name: String,
    pub rate: f64,
}

impl CountryRate {
    pub fn new(country_name: impl Into<String>, rate: f64) -> Self {
        Self {
            country_name: country_name.into(),
            rate,
        }
    }
}

/// A single point of a per-year series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearRate {
    pub year: u16,
    pub rate: f64,
}

/// Metadata about a rendered dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Path of the source dataset.
    pub dataset: String,
    /// Date and time the report was rendered.
    pub generated_at: DateTime<Utc>,
    /// Number of records in the store.
    pub records: usize,
    /// Number of distinct countries in the store.
    pub countries: usize,
    /// First and last year in the store.
    pub year_range: Option<(u16, u16)>,
    /// Number of signals committed.
    pub signals_applied: usize,
    /// Rejection messages for signals that were not applied.
    pub signals_rejected: Vec<String>,
}

/// A rendered dashboard: the final selection and its view bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Metadata about the report.
    pub metadata: ReportMetadata,
    /// Selection the views were computed for.
    pub selection: SelectionState,
    /// The published view bundle.
    pub views: ViewBundle,
}
