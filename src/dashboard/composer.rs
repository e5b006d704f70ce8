//! View composition.
//!
//! [`ViewComposer::recompute`] builds the requested view groups for a
//! selection from the record store. Output depends only on the store and
//! the selection: slices keep store order, series are sorted by key and
//! rankings break ties by name, so repeated calls are bit-identical.

use super::bundle::{
    BandTrend, ComparisonPoint, ComparisonSeries, Delta, DeviationBar, DeviationView,
    FocusHeadline, Headline, HeadlineMetrics, Indicator, MapPoint, MapSeries, RankedSeries,
    Rankings, TrendPanel, ViewBundle,
};
use super::router::ViewGroup;
use super::selection::SelectionState;
use crate::analysis::{delta_percent, deviation, group_mean_by_year, mean_rate, rank_top_n};
use crate::error::AggregateError;
use crate::models::{AgeBand, Direction, FertilityRecord, YearRate};
use crate::store::RecordStore;
use std::collections::BTreeSet;
use tracing::debug;

/// Default length of the top and bottom lists.
pub const DEFAULT_RANKING_SIZE: usize = 10;

/// Truncate toward zero for display, as integer casts do.
pub fn display_truncate(value: f64) -> i64 {
    value.trunc() as i64
}

/// Builds view groups from the store for a given selection.
#[derive(Debug, Clone, Copy)]
pub struct ViewComposer<'a> {
    store: &'a RecordStore,
    ranking_size: usize,
}

impl<'a> ViewComposer<'a> {
    pub fn new(store: &'a RecordStore) -> Self {
        Self {
            store,
            ranking_size: DEFAULT_RANKING_SIZE,
        }
    }

    pub fn with_ranking_size(mut self, ranking_size: usize) -> Self {
        self.ranking_size = ranking_size;
        self
    }

    /// Compute exactly the listed groups.
    pub fn recompute(
        &self,
        selection: &SelectionState,
        groups: &BTreeSet<ViewGroup>,
    ) -> Result<ViewBundle, AggregateError> {
        let mut bundle = ViewBundle::default();

        for group in groups {
            debug!("Recomputing view group {:?}", group);
            match group {
                ViewGroup::Headlines => bundle.headlines = Some(self.headlines(selection)),
                ViewGroup::Map => bundle.map = Some(self.map(selection)),
                ViewGroup::Rankings => bundle.rankings = Some(self.rankings(selection)?),
                ViewGroup::FocusHeadline => bundle.focus = Some(focus_headline(selection)),
                ViewGroup::Trends => bundle.trends = Some(self.trends(selection)?),
                ViewGroup::Comparison => bundle.comparison = Some(self.comparison(selection)),
                ViewGroup::Deviation => bundle.deviation = Some(self.deviation(selection)?),
            }
        }

        Ok(bundle)
    }

    fn headlines(&self, selection: &SelectionState) -> HeadlineMetrics {
        let year = selection.year;
        let band = selection.age_band;

        let year_band = self
            .store
            .records_filtered(|r| r.year == year && r.age_band == band);
        let year_all_bands = self.store.records_filtered(|r| r.year == year);
        let band_all_years = self.store.records_filtered(|r| r.age_band == band);

        HeadlineMetrics {
            year_band: Headline {
                text: format!("out of 1000 women aged {} gave birth in {}", band, year),
                value: display_mean(&year_band),
            },
            year_all_bands: Headline {
                text: format!("out of 1000 women aged 15-44 gave birth in {}", year),
                value: display_mean(&year_all_bands),
            },
            band_all_years: Headline {
                text: format!("out of 1000 women aged {} gave birth over all years", band),
                value: display_mean(&band_all_years),
            },
        }
    }

    fn map(&self, selection: &SelectionState) -> MapSeries {
        let points = self
            .store
            .countries()
            .map(|country| MapPoint {
                country_name: country.to_string(),
                country_code: self.store.country_code(country).unwrap_or_default().to_string(),
                rate: self
                    .store
                    .get(country, selection.year, selection.age_band)
                    .map(|r| r.rate),
            })
            .collect();

        MapSeries {
            year: selection.year,
            age_band: selection.age_band,
            points,
        }
    }

    fn rankings(&self, selection: &SelectionState) -> Result<Rankings, AggregateError> {
        let slice = self
            .store
            .records_filtered(|r| r.year == selection.year && r.age_band == selection.age_band);
        let mean = mean_rate(&slice).ok();

        Ok(Rankings {
            year: selection.year,
            age_band: selection.age_band,
            top: RankedSeries {
                entries: rank_top_n(&slice, self.ranking_size, Direction::High)?,
                mean,
            },
            bottom: RankedSeries {
                entries: rank_top_n(&slice, self.ranking_size, Direction::Low)?,
                mean,
            },
        })
    }

    fn trends(&self, selection: &SelectionState) -> Result<TrendPanel, AggregateError> {
        let country = selection.focused_country.as_str();
        let country_records = self.store.records_filtered(|r| r.country_name == country);

        let y_max = country_records
            .iter()
            .map(|r| r.rate)
            .max_by(f64::total_cmp);

        let bands = AgeBand::ALL
            .into_iter()
            .map(|band| {
                let mut series: Vec<YearRate> = country_records
                    .iter()
                    .filter(|r| r.age_band == band)
                    .map(|r| YearRate {
                        year: r.year,
                        rate: r.rate,
                    })
                    .collect();
                series.sort_by_key(|p| p.year);

                Ok(BandTrend {
                    age_band: band,
                    indicator: indicator(&series)?,
                    series,
                })
            })
            .collect::<Result<Vec<_>, AggregateError>>()?;

        Ok(TrendPanel {
            country: country.to_string(),
            headline: format!("Development of Fertility Rates: {}", country),
            y_max,
            bands,
        })
    }

    fn comparison(&self, selection: &SelectionState) -> ComparisonSeries {
        let band = selection.comparison_age_band;
        let mut points: Vec<ComparisonPoint> = self
            .store
            .records_filtered(|r| {
                r.age_band == band && selection.compared_countries.contains(&r.country_name)
            })
            .into_iter()
            .map(|r| ComparisonPoint {
                year: r.year,
                country_name: r.country_name.clone(),
                rate: r.rate,
            })
            .collect();

        points.sort_by(|a, b| {
            a.year
                .cmp(&b.year)
                .then_with(|| a.country_name.cmp(&b.country_name))
        });

        ComparisonSeries {
            age_band: band,
            countries: selection.compared_countries.iter().cloned().collect(),
            points,
        }
    }

    fn deviation(&self, selection: &SelectionState) -> Result<DeviationView, AggregateError> {
        let band = selection.deviation_age_band;
        let country = selection.focused_country.as_str();

        let band_slice = self.store.records_filtered(|r| r.age_band == band);
        let year_means = group_mean_by_year(&band_slice);

        let mut country_slice: Vec<&FertilityRecord> = band_slice
            .iter()
            .copied()
            .filter(|r| r.country_name == country)
            .collect();
        country_slice.sort_by_key(|r| r.year);

        let bars = deviation(&country_slice, &year_means)?
            .into_iter()
            .map(|point| DeviationBar {
                year: point.year,
                rate: point.rate,
                deviation: display_truncate(point.deviation),
            })
            .collect();

        Ok(DeviationView {
            country: country.to_string(),
            age_band: band,
            headline: format!("Deviation from mean fertility rate: {}", country),
            bars,
        })
    }
}

fn focus_headline(selection: &SelectionState) -> FocusHeadline {
    let country = &selection.focused_country;
    FocusHeadline {
        country: country.clone(),
        info: format!("You have selected: {}", country),
        headline: format!("Deep Dive: {}", country),
    }
}

/// Mean of a slice truncated for display; `None` on an empty slice.
fn display_mean(records: &[&FertilityRecord]) -> Option<i64> {
    mean_rate(records).ok().map(display_truncate)
}

/// Indicator for a year-sorted series.
fn indicator(series: &[YearRate]) -> Result<Indicator, AggregateError> {
    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        return Ok(Indicator::Unavailable);
    };

    let delta = match delta_percent(first.rate, last.rate) {
        Ok(change) => Delta::Relative(change),
        Err(AggregateError::DivideByZero) => Delta::Undefined,
        Err(other) => return Err(other),
    };

    Ok(Indicator::Available {
        first_year: first.year,
        last_year: last.year,
        current: display_truncate(last.rate),
        delta,
    })
}
