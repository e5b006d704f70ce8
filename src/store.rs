//! Immutable record store.
//!
//! The store is built once per process from validated long-format rows and
//! is only read afterwards, so a single instance can be shared behind an
//! `Arc` by any number of dashboard sessions.

use crate::error::StoreError;
use crate::models::{AgeBand, FertilityRecord, RawRecord, MAX_YEAR, MIN_YEAR};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// The normalized dataset for a session.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<FertilityRecord>,
    index: HashMap<(String, u16, AgeBand), usize>,
    years: BTreeSet<u16>,
    countries: BTreeMap<String, String>,
}

impl RecordStore {
    /// Build a store from typed records.
    ///
    /// Fails on the first record with a year out of range, a negative or
    /// non-finite rate, an empty country name, or a duplicate
    /// (country, year, age band) key. Nothing is admitted on failure.
    pub fn new(records: Vec<FertilityRecord>) -> Result<Self, StoreError> {
        let mut index = HashMap::with_capacity(records.len());
        let mut years = BTreeSet::new();
        let mut countries = BTreeMap::new();

        for (i, record) in records.iter().enumerate() {
            validate(i, record)?;

            let key = (record.country_name.clone(), record.year, record.age_band);
            if index.insert(key, i).is_some() {
                return Err(StoreError::Validation {
                    index: i,
                    reason: format!(
                        "duplicate record for {} / {} / {}",
                        record.country_name, record.year, record.age_band
                    ),
                });
            }

            years.insert(record.year);
            countries
                .entry(record.country_name.clone())
                .or_insert_with(|| record.country_code.clone());
        }

        debug!(
            "Record store built: {} records, {} countries, {} years",
            records.len(),
            countries.len(),
            years.len()
        );

        Ok(Self {
            records,
            index,
            years,
            countries,
        })
    }

    /// Build a store from untyped long-format rows.
    pub fn load<I>(rows: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = RawRecord>,
    {
        let records = rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| into_record(i, row))
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(records)
    }

    /// Records matching `predicate`, in load order.
    pub fn records_filtered<P>(&self, predicate: P) -> Vec<&FertilityRecord>
    where
        P: Fn(&FertilityRecord) -> bool,
    {
        self.records.iter().filter(|r| predicate(r)).collect()
    }

    /// Look up the single record for a (country, year, age band) key.
    pub fn get(&self, country_name: &str, year: u16, age_band: AgeBand) -> Option<&FertilityRecord> {
        self.index
            .get(&(country_name.to_string(), year, age_band))
            .and_then(|&i| self.records.get(i))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Years present in the store, ascending.
    pub fn years(&self) -> impl Iterator<Item = u16> + '_ {
        self.years.iter().copied()
    }

    pub fn latest_year(&self) -> Option<u16> {
        self.years.last().copied()
    }

    pub fn has_year(&self, year: u16) -> bool {
        self.years.contains(&year)
    }

    /// Country names present in the store, ascending.
    pub fn countries(&self) -> impl Iterator<Item = &str> + '_ {
        self.countries.keys().map(String::as_str)
    }

    pub fn has_country(&self, country_name: &str) -> bool {
        self.countries.contains_key(country_name)
    }

    /// Country code recorded for a country name.
    pub fn country_code(&self, country_name: &str) -> Option<&str> {
        self.countries.get(country_name).map(String::as_str)
    }
}

fn validate(index: usize, record: &FertilityRecord) -> Result<(), StoreError> {
    let reason = if !(MIN_YEAR..=MAX_YEAR).contains(&record.year) {
        format!(
            "year {} outside {}..={}",
            record.year, MIN_YEAR, MAX_YEAR
        )
    } else if !record.rate.is_finite() || record.rate < 0.0 {
        format!("rate {} is not a non-negative number", record.rate)
    } else if record.country_name.trim().is_empty() {
        "empty country name".to_string()
    } else {
        return Ok(());
    };

    Err(StoreError::Validation { index, reason })
}

fn into_record(index: usize, row: RawRecord) -> Result<FertilityRecord, StoreError> {
    let age_band = row
        .age_band
        .parse::<AgeBand>()
        .map_err(|reason| StoreError::Validation { index, reason })?;

    let year = u16::try_from(row.year).map_err(|_| StoreError::Validation {
        index,
        reason: format!("year {} outside {}..={}", row.year, MIN_YEAR, MAX_YEAR),
    })?;

    Ok(FertilityRecord {
        country_code: row.country_code,
        country_name: row.country_name,
        year,
        age_band,
        rate: row.rate,
    })
}
