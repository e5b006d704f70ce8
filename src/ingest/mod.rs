//! Wide CSV ingestion.
//!
//! Reads the census age-specific fertility table (one column per age band)
//! and reshapes it into long rows for the record store. Rows outside the
//! configured year range and the `45-49` column are dropped; empty cells
//! are missing data and produce no row.

use crate::models::{AgeBand, RawRecord};
use crate::store::RecordStore;
use anyhow::{Context, Result};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::ops::RangeInclusive;
use std::path::Path;
use tracing::{debug, info, warn};

/// One row of the wide source table. Unlisted columns are ignored.
#[derive(Debug, Deserialize)]
struct WideRow {
    country_code: String,
    country_name: String,
    year: i64,
    fertility_rate_15_19: Option<f64>,
    fertility_rate_20_24: Option<f64>,
    fertility_rate_25_29: Option<f64>,
    fertility_rate_30_34: Option<f64>,
    fertility_rate_35_39: Option<f64>,
    fertility_rate_40_44: Option<f64>,
}

impl WideRow {
    fn rate(&self, band: AgeBand) -> Option<f64> {
        match band {
            AgeBand::From15To19 => self.fertility_rate_15_19,
            AgeBand::From20To24 => self.fertility_rate_20_24,
            AgeBand::From25To29 => self.fertility_rate_25_29,
            AgeBand::From30To34 => self.fertility_rate_30_34,
            AgeBand::From35To39 => self.fertility_rate_35_39,
            AgeBand::From40To44 => self.fertility_rate_40_44,
        }
    }

    /// Unpivot into one long row per band with a value.
    fn melt(self) -> impl Iterator<Item = RawRecord> {
        AgeBand::ALL.into_iter().filter_map(move |band| {
            self.rate(band).map(|rate| RawRecord {
                country_code: self.country_code.clone(),
                country_name: self.country_name.clone(),
                year: self.year,
                age_band: band.label().to_string(),
                rate,
            })
        })
    }
}

/// Reshape a wide table into long rows, keeping years in `years`.
pub fn read_wide<R: Read>(reader: R, years: &RangeInclusive<i64>) -> Result<Vec<RawRecord>> {
    let mut csv_reader = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for (line, result) in csv_reader.deserialize::<WideRow>().enumerate() {
        let wide = result.with_context(|| format!("Failed to parse data row {}", line + 1))?;

        if !years.contains(&wide.year) {
            skipped += 1;
            continue;
        }

        rows.extend(wide.melt());
    }

    debug!(
        "Reshaped {} long rows ({} wide rows outside {}..={})",
        rows.len(),
        skipped,
        years.start(),
        years.end()
    );

    Ok(rows)
}

/// Read a wide CSV file and build the record store from it.
pub fn load_store(path: &Path, years: &RangeInclusive<i64>) -> Result<RecordStore> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open dataset: {}", path.display()))?;

    let rows = read_wide(BufReader::new(file), years)
        .with_context(|| format!("Failed to read dataset: {}", path.display()))?;

    let store = RecordStore::load(rows)
        .with_context(|| format!("Dataset rejected: {}", path.display()))?;

    if store.is_empty() {
        warn!(
            "Dataset {} has no records for years {}..={}",
            path.display(),
            years.start(),
            years.end()
        );
    }

    info!(
        "Loaded {} records for {} countries from {}",
        store.len(),
        store.countries().count(),
        path.display()
    );

    Ok(store)
}
