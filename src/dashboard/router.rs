//! Signal to view-group routing.
//!
//! A static table deciding which view groups go stale when an input signal
//! changes. Anything not listed for a signal keeps its retained value.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// The six recognized input signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Year,
    AgeBand,
    MapClick,
    ComparedCountries,
    ComparisonAgeBand,
    DeviationAgeBand,
}

impl SignalKind {
    pub const ALL: [SignalKind; 6] = [
        SignalKind::Year,
        SignalKind::AgeBand,
        SignalKind::MapClick,
        SignalKind::ComparedCountries,
        SignalKind::ComparisonAgeBand,
        SignalKind::DeviationAgeBand,
    ];

    /// Wire name of the signal.
    pub fn name(&self) -> &'static str {
        match self {
            SignalKind::Year => "year",
            SignalKind::AgeBand => "age_band",
            SignalKind::MapClick => "map_click",
            SignalKind::ComparedCountries => "compared_countries",
            SignalKind::ComparisonAgeBand => "comparison_age_band",
            SignalKind::DeviationAgeBand => "deviation_age_band",
        }
    }

    /// Resolve a wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Independently recomputable groups of output views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewGroup {
    /// The three headline text + value pairs.
    Headlines,
    /// World map series.
    Map,
    /// Top-N and bottom-N lists.
    Rankings,
    /// "You have selected" / "Deep Dive" texts.
    FocusHeadline,
    /// Six per-age-band trend + indicator pairs.
    Trends,
    /// Multi-country comparison series.
    Comparison,
    /// Deviation-from-mean series and its headline.
    Deviation,
}

impl ViewGroup {
    pub const ALL: [ViewGroup; 7] = [
        ViewGroup::Headlines,
        ViewGroup::Map,
        ViewGroup::Rankings,
        ViewGroup::FocusHeadline,
        ViewGroup::Trends,
        ViewGroup::Comparison,
        ViewGroup::Deviation,
    ];

    /// Every group, for the initial full build.
    pub fn all() -> BTreeSet<ViewGroup> {
        Self::ALL.into_iter().collect()
    }
}

/// Groups made stale by a change of `signal`.
///
/// A map click also resets the compared countries and moves the country
/// the deviation series is restricted to, so those groups follow it.
pub fn affected_groups(signal: SignalKind) -> BTreeSet<ViewGroup> {
    let groups: &[ViewGroup] = match signal {
        SignalKind::Year | SignalKind::AgeBand => {
            &[ViewGroup::Headlines, ViewGroup::Map, ViewGroup::Rankings]
        }
        SignalKind::MapClick => &[
            ViewGroup::FocusHeadline,
            ViewGroup::Trends,
            ViewGroup::Comparison,
            ViewGroup::Deviation,
        ],
        SignalKind::ComparedCountries | SignalKind::ComparisonAgeBand => &[ViewGroup::Comparison],
        SignalKind::DeviationAgeBand => &[ViewGroup::Deviation],
    };

    groups.iter().copied().collect()
}
