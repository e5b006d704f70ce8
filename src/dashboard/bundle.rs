//! View bundle types.
//!
//! A [`ViewBundle`] holds one optional entry per view group. A partial
//! bundle returned by the composer only fills the groups it recomputed;
//! [`ViewBundle::merge`] overlays it onto the retained one.

use super::router::ViewGroup;
use crate::models::{AgeBand, CountryRate, YearRate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A headline sentence and its value, `None` when there is no data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headline {
    pub text: String,
    pub value: Option<i64>,
}

/// The three headline metrics above the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadlineMetrics {
    /// Mean for the selected year and age band.
    pub year_band: Headline,
    /// Mean for the selected year across all age bands.
    pub year_all_bands: Headline,
    /// Mean for the selected age band across all years.
    pub band_all_years: Headline,
}

/// One country on the map; `rate` is `None` for "no data".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapPoint {
    pub country_name: String,
    pub country_code: String,
    pub rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapSeries {
    pub year: u16,
    pub age_band: AgeBand,
    pub points: Vec<MapPoint>,
}

/// A ranked list with the slice mean as a reference line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedSeries {
    pub entries: Vec<CountryRate>,
    pub mean: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rankings {
    pub year: u16,
    pub age_band: AgeBand,
    pub top: RankedSeries,
    pub bottom: RankedSeries,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusHeadline {
    pub country: String,
    pub info: String,
    pub headline: String,
}

/// Relative change, or an explicit marker when the baseline is zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Delta {
    Relative(f64),
    Undefined,
}

/// Current value and change since the first recorded year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Indicator {
    Available {
        first_year: u16,
        last_year: u16,
        current: i64,
        delta: Delta,
    },
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandTrend {
    pub age_band: AgeBand,
    pub series: Vec<YearRate>,
    pub indicator: Indicator,
}

/// The six trend + indicator pairs for the focused country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPanel {
    pub country: String,
    pub headline: String,
    /// Shared y-axis bound: highest rate across all bands.
    pub y_max: Option<f64>,
    pub bands: Vec<BandTrend>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonPoint {
    pub year: u16,
    pub country_name: String,
    pub rate: f64,
}

/// Year series for several countries, sorted by (year, country).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSeries {
    pub age_band: AgeBand,
    pub countries: Vec<String>,
    pub points: Vec<ComparisonPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviationBar {
    pub year: u16,
    pub rate: f64,
    pub deviation: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviationView {
    pub country: String,
    pub age_band: AgeBand,
    pub headline: String,
    pub bars: Vec<DeviationBar>,
}

/// Every derived view of the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewBundle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headlines: Option<HeadlineMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map: Option<MapSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rankings: Option<Rankings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus: Option<FocusHeadline>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trends: Option<TrendPanel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<ComparisonSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deviation: Option<DeviationView>,
}

impl ViewBundle {
    /// Overlay every group present in `partial`, replacing retained values.
    pub fn merge(&mut self, partial: ViewBundle) {
        let ViewBundle {
            headlines,
            map,
            rankings,
            focus,
            trends,
            comparison,
            deviation,
        } = partial;

        if headlines.is_some() {
            self.headlines = headlines;
        }
        if map.is_some() {
            self.map = map;
        }
        if rankings.is_some() {
            self.rankings = rankings;
        }
        if focus.is_some() {
            self.focus = focus;
        }
        if trends.is_some() {
            self.trends = trends;
        }
        if comparison.is_some() {
            self.comparison = comparison;
        }
        if deviation.is_some() {
            self.deviation = deviation;
        }
    }

    /// Groups that currently hold a value.
    pub fn groups(&self) -> BTreeSet<ViewGroup> {
        let present = [
            (ViewGroup::Headlines, self.headlines.is_some()),
            (ViewGroup::Map, self.map.is_some()),
            (ViewGroup::Rankings, self.rankings.is_some()),
            (ViewGroup::FocusHeadline, self.focus.is_some()),
            (ViewGroup::Trends, self.trends.is_some()),
            (ViewGroup::Comparison, self.comparison.is_some()),
            (ViewGroup::Deviation, self.deviation.is_some()),
        ];

        present
            .into_iter()
            .filter_map(|(group, is_set)| is_set.then_some(group))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.groups().len() == ViewGroup::ALL.len()
    }
}
