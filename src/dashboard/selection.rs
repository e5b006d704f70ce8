//! Selection state and input signals.
//!
//! [`SelectionState`] holds the current value of every dashboard input. It
//! stores keys into the record store, never records, and is mutated only
//! through [`SelectionState::apply`], which validates the new value against
//! the store's domain and reports the view groups it made stale.

use super::router::{affected_groups, SignalKind, ViewGroup};
use crate::error::SelectionError;
use crate::models::AgeBand;
use crate::store::RecordStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

/// An input event carrying a typed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    Year(u16),
    AgeBand(AgeBand),
    MapClick(String),
    ComparedCountries(BTreeSet<String>),
    ComparisonAgeBand(AgeBand),
    DeviationAgeBand(AgeBand),
}

impl Signal {
    pub fn kind(&self) -> SignalKind {
        match self {
            Signal::Year(_) => SignalKind::Year,
            Signal::AgeBand(_) => SignalKind::AgeBand,
            Signal::MapClick(_) => SignalKind::MapClick,
            Signal::ComparedCountries(_) => SignalKind::ComparedCountries,
            Signal::ComparisonAgeBand(_) => SignalKind::ComparisonAgeBand,
            Signal::DeviationAgeBand(_) => SignalKind::DeviationAgeBand,
        }
    }

    /// Parse a named signal and its textual value.
    ///
    /// Only the syntax is checked here; domain membership is checked by
    /// [`SelectionState::apply`]. Compared countries are comma separated and
    /// may be empty.
    pub fn parse(name: &str, value: &str) -> Result<Self, SelectionError> {
        let kind = SignalKind::from_name(name.trim())
            .ok_or_else(|| SelectionError::UnknownSignal(name.trim().to_string()))?;
        let value = value.trim();

        let band = || {
            value
                .parse::<AgeBand>()
                .map_err(|_| SelectionError::unknown_key(kind.name(), value))
        };

        Ok(match kind {
            SignalKind::Year => Signal::Year(
                value
                    .parse::<u16>()
                    .map_err(|_| SelectionError::unknown_key(kind.name(), value))?,
            ),
            SignalKind::AgeBand => Signal::AgeBand(band()?),
            SignalKind::MapClick => Signal::MapClick(value.to_string()),
            SignalKind::ComparedCountries => Signal::ComparedCountries(
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect(),
            ),
            SignalKind::ComparisonAgeBand => Signal::ComparisonAgeBand(band()?),
            SignalKind::DeviationAgeBand => Signal::DeviationAgeBand(band()?),
        })
    }

    /// Parse a `name=value` line.
    pub fn parse_assignment(line: &str) -> Result<Self, SelectionError> {
        match line.split_once('=') {
            Some((name, value)) => Self::parse(name, value),
            None => Err(SelectionError::UnknownSignal(line.trim().to_string())),
        }
    }
}

/// Outcome of a successfully applied signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalResult {
    /// The signal that was applied.
    pub signal: SignalKind,
    /// View groups that must be recomputed.
    pub stale: BTreeSet<ViewGroup>,
}

/// Starting values for a new selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionDefaults {
    /// Initial year; `None` picks the latest year in the store.
    pub year: Option<u16>,
    pub age_band: AgeBand,
    /// Country shown before any map click.
    pub fallback_country: String,
    pub comparison_age_band: AgeBand,
    pub deviation_age_band: AgeBand,
}

impl Default for SelectionDefaults {
    fn default() -> Self {
        Self {
            year: None,
            age_band: AgeBand::From15To19,
            fallback_country: "Germany".to_string(),
            comparison_age_band: AgeBand::From15To19,
            deviation_age_band: AgeBand::From15To19,
        }
    }
}

/// Current value of every dashboard input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    pub year: u16,
    pub age_band: AgeBand,
    pub focused_country: String,
    pub compared_countries: BTreeSet<String>,
    pub comparison_age_band: AgeBand,
    pub deviation_age_band: AgeBand,
}

impl SelectionState {
    /// Build the initial selection.
    ///
    /// An explicit default year must exist in the store. The fallback
    /// country is kept even when the store has no records for it; its views
    /// then render as "no data".
    pub fn with_defaults(
        store: &RecordStore,
        defaults: &SelectionDefaults,
    ) -> Result<Self, SelectionError> {
        let year = match defaults.year {
            Some(year) if store.has_year(year) => year,
            Some(year) => return Err(SelectionError::unknown_key(SignalKind::Year.name(), year)),
            None => store
                .latest_year()
                .ok_or_else(|| SelectionError::unknown_key(SignalKind::Year.name(), "<empty store>"))?,
        };

        if !store.has_country(&defaults.fallback_country) {
            warn!(
                "Fallback country '{}' has no records; its views will show no data",
                defaults.fallback_country
            );
        }

        Ok(Self {
            year,
            age_band: defaults.age_band,
            focused_country: defaults.fallback_country.clone(),
            compared_countries: BTreeSet::from([defaults.fallback_country.clone()]),
            comparison_age_band: defaults.comparison_age_band,
            deviation_age_band: defaults.deviation_age_band,
        })
    }

    /// Apply one signal.
    ///
    /// On error the selection is left untouched.
    pub fn apply(
        &mut self,
        store: &RecordStore,
        signal: Signal,
    ) -> Result<SignalResult, SelectionError> {
        let kind = signal.kind();

        match signal {
            Signal::Year(year) => {
                if !store.has_year(year) {
                    return Err(SelectionError::unknown_key(kind.name(), year));
                }
                self.year = year;
            }
            Signal::AgeBand(band) => self.age_band = band,
            Signal::MapClick(country) => {
                if !store.has_country(&country) {
                    return Err(SelectionError::unknown_key(kind.name(), country));
                }
                self.compared_countries = BTreeSet::from([country.clone()]);
                self.focused_country = country;
            }
            Signal::ComparedCountries(countries) => {
                if let Some(unknown) = countries.iter().find(|c| !store.has_country(c)) {
                    return Err(SelectionError::unknown_key(kind.name(), unknown));
                }
                self.compared_countries = countries;
            }
            Signal::ComparisonAgeBand(band) => self.comparison_age_band = band,
            Signal::DeviationAgeBand(band) => self.deviation_age_band = band,
        }

        Ok(SignalResult {
            signal: kind,
            stale: affected_groups(kind),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FertilityRecord;

    fn create_test_store() -> RecordStore {
        let rows = [
            ("France", 2000, 40.0),
            ("France", 2023, 30.0),
            ("Germany", 2000, 12.0),
            ("Germany", 2023, 10.0),
        ];
        RecordStore::new(
            rows.into_iter()
                .map(|(country, year, rate)| FertilityRecord {
                    country_code: country[..2].to_uppercase(),
                    country_name: country.to_string(),
                    year,
                    age_band: AgeBand::From15To19,
                    rate,
                })
                .collect(),
        )
        .unwrap()
    }

    fn create_test_selection(store: &RecordStore) -> SelectionState {
        SelectionState::with_defaults(store, &SelectionDefaults::default()).unwrap()
    }

    #[test]
    fn test_defaults() {
        let store = create_test_store();
        let selection = create_test_selection(&store);

        assert_eq!(selection.year, 2023);
        assert_eq!(selection.age_band, AgeBand::From15To19);
        assert_eq!(selection.focused_country, "Germany");
        assert_eq!(
            selection.compared_countries,
            BTreeSet::from(["Germany".to_string()])
        );
    }

    #[test]
    fn test_defaults_reject_unknown_year() {
        let store = create_test_store();
        let defaults = SelectionDefaults {
            year: Some(1999),
            ..SelectionDefaults::default()
        };
        assert!(SelectionState::with_defaults(&store, &defaults).is_err());
    }

    #[test]
    fn test_apply_year() {
        let store = create_test_store();
        let mut selection = create_test_selection(&store);

        let result = selection.apply(&store, Signal::Year(2000)).unwrap();
        assert_eq!(selection.year, 2000);
        assert_eq!(result.signal, SignalKind::Year);
        assert!(result.stale.contains(&ViewGroup::Map));
    }

    #[test]
    fn test_apply_unknown_year_leaves_state() {
        let store = create_test_store();
        let mut selection = create_test_selection(&store);
        let before = selection.clone();

        let err = selection.apply(&store, Signal::Year(1800)).unwrap_err();
        assert!(matches!(err, SelectionError::UnknownKey { .. }));
        assert_eq!(selection, before);
    }

    #[test]
    fn test_map_click_resets_compared() {
        let store = create_test_store();
        let mut selection = create_test_selection(&store);
        selection
            .apply(
                &store,
                Signal::ComparedCountries(BTreeSet::from([
                    "France".to_string(),
                    "Germany".to_string(),
                ])),
            )
            .unwrap();

        let result = selection
            .apply(&store, Signal::MapClick("France".to_string()))
            .unwrap();

        assert_eq!(selection.focused_country, "France");
        assert_eq!(selection.compared_countries, BTreeSet::from(["France".to_string()]));
        assert!(result.stale.contains(&ViewGroup::Trends));
    }

    #[test]
    fn test_unknown_country_rejected() {
        let store = create_test_store();
        let mut selection = create_test_selection(&store);
        let before = selection.clone();

        assert!(selection
            .apply(&store, Signal::MapClick("Atlantis".to_string()))
            .is_err());
        assert!(selection
            .apply(
                &store,
                Signal::ComparedCountries(BTreeSet::from([
                    "France".to_string(),
                    "Atlantis".to_string()
                ]))
            )
            .is_err());
        assert_eq!(selection, before);
    }

    #[test]
    fn test_band_signals_are_independent() {
        let store = create_test_store();
        let mut selection = create_test_selection(&store);

        selection
            .apply(&store, Signal::ComparisonAgeBand(AgeBand::From30To34))
            .unwrap();
        selection
            .apply(&store, Signal::DeviationAgeBand(AgeBand::From40To44))
            .unwrap();

        assert_eq!(selection.age_band, AgeBand::From15To19);
        assert_eq!(selection.comparison_age_band, AgeBand::From30To34);
        assert_eq!(selection.deviation_age_band, AgeBand::From40To44);
    }

    #[test]
    fn test_parse_signals() {
        assert_eq!(Signal::parse("year", "2001"), Ok(Signal::Year(2001)));
        assert_eq!(
            Signal::parse("age_band", "30-34"),
            Ok(Signal::AgeBand(AgeBand::From30To34))
        );
        assert_eq!(
            Signal::parse("map_click", " France "),
            Ok(Signal::MapClick("France".to_string()))
        );
        assert_eq!(
            Signal::parse("compared_countries", "France, Germany,"),
            Ok(Signal::ComparedCountries(BTreeSet::from([
                "France".to_string(),
                "Germany".to_string()
            ])))
        );
        assert_eq!(
            Signal::parse("compared_countries", ""),
            Ok(Signal::ComparedCountries(BTreeSet::new()))
        );
    }

    #[test]
    fn test_parse_rejections() {
        assert_eq!(
            Signal::parse("zoom", "3"),
            Err(SelectionError::UnknownSignal("zoom".to_string()))
        );
        assert!(matches!(
            Signal::parse("year", "nineteen"),
            Err(SelectionError::UnknownKey { .. })
        ));
        assert!(matches!(
            Signal::parse("deviation_age_band", "45-49"),
            Err(SelectionError::UnknownKey { .. })
        ));
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            Signal::parse_assignment("comparison_age_band=20-24"),
            Ok(Signal::ComparisonAgeBand(AgeBand::From20To24))
        );
        assert!(matches!(
            Signal::parse_assignment("year 2000"),
            Err(SelectionError::UnknownSignal(_))
        ));
    }
}
