//! Rate aggregation and statistics.
//!
//! Pure functions over slices of store records: means, per-year means,
//! rankings, relative deltas and deviations from the cross-country mean.
//! Results are raw `f64`; display rounding happens in the view composer.

use crate::error::AggregateError;
use crate::models::{CountryRate, Direction, FertilityRecord};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A record's distance from the mean of its year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviationPoint {
    pub country_name: String,
    pub year: u16,
    pub rate: f64,
    pub deviation: f64,
}

/// Arithmetic mean of `rate`.
pub fn mean_rate(records: &[&FertilityRecord]) -> Result<f64, AggregateError> {
    if records.is_empty() {
        return Err(AggregateError::EmptySet);
    }

    let total: f64 = records.iter().map(|r| r.rate).sum();
    Ok(total / records.len() as f64)
}

/// Mean rate per year over whatever the slice holds constant.
pub fn group_mean_by_year(records: &[&FertilityRecord]) -> BTreeMap<u16, f64> {
    let mut sums: BTreeMap<u16, (f64, usize)> = BTreeMap::new();

    for record in records {
        let entry = sums.entry(record.year).or_insert((0.0, 0));
        entry.0 += record.rate;
        entry.1 += 1;
    }

    sums.into_iter()
        .map(|(year, (sum, count))| (year, sum / count as f64))
        .collect()
}

/// Rank countries of a single (year, age band) slice.
///
/// Returns at most `n` entries ordered by rate in `direction`, ties broken
/// by country name ascending.
pub fn rank_top_n(
    records: &[&FertilityRecord],
    n: usize,
    direction: Direction,
) -> Result<Vec<CountryRate>, AggregateError> {
    let Some(first) = records.first() else {
        return Ok(Vec::new());
    };

    let mut seen = BTreeSet::new();
    for record in records {
        if record.year != first.year || record.age_band != first.age_band {
            return Err(AggregateError::Precondition(format!(
                "ranking slice mixes {} / {} with {} / {}",
                first.year, first.age_band, record.year, record.age_band
            )));
        }
        if !seen.insert(record.country_name.as_str()) {
            return Err(AggregateError::Precondition(format!(
                "ranking slice has more than one rate for {}",
                record.country_name
            )));
        }
    }

    let mut ranked: Vec<CountryRate> = records
        .iter()
        .map(|r| CountryRate::new(r.country_name.clone(), r.rate))
        .collect();

    ranked.sort_by(|a, b| {
        let by_rate = match direction {
            Direction::High => b.rate.total_cmp(&a.rate),
            Direction::Low => a.rate.total_cmp(&b.rate),
        };
        by_rate.then_with(|| a.country_name.cmp(&b.country_name))
    });
    ranked.truncate(n);

    Ok(ranked)
}

/// Relative change from `old_value` to `new_value` (`0.5` means +50%).
pub fn delta_percent(old_value: f64, new_value: f64) -> Result<f64, AggregateError> {
    if old_value == 0.0 {
        return Err(AggregateError::DivideByZero);
    }

    Ok((new_value - old_value) / old_value)
}

/// Deviation of each record from the mean of its year.
///
/// `year_means` must come from [`group_mean_by_year`] over the full
/// cross-country slice; a record whose year has no mean is a precondition
/// violation.
pub fn deviation(
    records: &[&FertilityRecord],
    year_means: &BTreeMap<u16, f64>,
) -> Result<Vec<DeviationPoint>, AggregateError> {
    records
        .iter()
        .map(|r| {
            let mean = year_means.get(&r.year).ok_or_else(|| {
                AggregateError::Precondition(format!("no mean available for year {}", r.year))
            })?;

            Ok(DeviationPoint {
                country_name: r.country_name.clone(),
                year: r.year,
                rate: r.rate,
                deviation: r.rate - mean,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AgeBand;

    fn create_test_record(country: &str, year: u16, rate: f64) -> FertilityRecord {
        FertilityRecord {
            country_code: country.chars().take(2).collect::<String>().to_uppercase(),
            country_name: country.to_string(),
            year,
            age_band: AgeBand::From15To19,
            rate,
        }
    }

    fn refs(records: &[FertilityRecord]) -> Vec<&FertilityRecord> {
        records.iter().collect()
    }

    #[test]
    fn test_mean_rate() {
        let records = vec![
            create_test_record("France", 2023, 30.0),
            create_test_record("Germany", 2023, 10.0),
        ];
        assert_eq!(mean_rate(&refs(&records)), Ok(20.0));
    }

    #[test]
    fn test_mean_rate_empty() {
        assert_eq!(mean_rate(&[]), Err(AggregateError::EmptySet));
    }

    #[test]
    fn test_group_mean_by_year() {
        let records = vec![
            create_test_record("France", 2000, 30.0),
            create_test_record("Germany", 2000, 10.0),
            create_test_record("France", 2001, 12.0),
        ];

        let means = group_mean_by_year(&refs(&records));
        assert_eq!(means.len(), 2);
        assert_eq!(means[&2000], 20.0);
        assert_eq!(means[&2001], 12.0);
    }

    fn twelve_countries() -> Vec<FertilityRecord> {
        // Two ties (Cc/Cb at 50, Kk/Ka at 5) to exercise the name tie-break.
        [
            ("Aa", 90.0),
            ("Bb", 80.0),
            ("Cc", 50.0),
            ("Cb", 50.0),
            ("Dd", 45.0),
            ("Ee", 40.0),
            ("Ff", 35.0),
            ("Gg", 30.0),
            ("Hh", 20.0),
            ("Ii", 10.0),
            ("Kk", 5.0),
            ("Ka", 5.0),
        ]
        .into_iter()
        .map(|(name, rate)| create_test_record(name, 2020, rate))
        .collect()
    }

    #[test]
    fn test_rank_top_n_high() {
        let records = twelve_countries();
        let top = rank_top_n(&refs(&records), 10, Direction::High).unwrap();

        assert_eq!(top.len(), 10);
        assert!(top.windows(2).all(|w| w[0].rate >= w[1].rate));
        assert_eq!(top[0].country_name, "Aa");
        assert_eq!(top[2].country_name, "Cb");
        assert_eq!(top[3].country_name, "Cc");
        assert_eq!(top[9].country_name, "Ii");
    }

    #[test]
    fn test_rank_top_n_low_mirrors_high() {
        let records = twelve_countries();
        let low = rank_top_n(&refs(&records), 10, Direction::Low).unwrap();

        assert_eq!(low.len(), 10);
        assert!(low.windows(2).all(|w| w[0].rate <= w[1].rate));
        assert_eq!(low[0].country_name, "Ka");
        assert_eq!(low[1].country_name, "Kk");
        assert_eq!(low[8].country_name, "Cb");
        assert_eq!(low[9].country_name, "Cc");
    }

    #[test]
    fn test_rank_top_and_low_disjoint_for_large_slices() {
        let records: Vec<FertilityRecord> = (0..25)
            .map(|i| create_test_record(&format!("Country{:02}", i), 2020, i as f64))
            .collect();

        let top = rank_top_n(&refs(&records), 10, Direction::High).unwrap();
        let low = rank_top_n(&refs(&records), 10, Direction::Low).unwrap();

        let top_names: BTreeSet<_> = top.iter().map(|c| c.country_name.as_str()).collect();
        assert!(low.iter().all(|c| !top_names.contains(c.country_name.as_str())));
    }

    #[test]
    fn test_rank_top_and_low_overlap_for_small_slices() {
        // Twelve countries: the two lists of ten must share members.
        let records = twelve_countries();
        let top = rank_top_n(&refs(&records), 10, Direction::High).unwrap();
        let low = rank_top_n(&refs(&records), 10, Direction::Low).unwrap();

        let shared = top
            .iter()
            .filter(|t| low.iter().any(|l| l.country_name == t.country_name))
            .count();
        assert_eq!(shared, 8);
    }

    #[test]
    fn test_rank_top_n_shorter_than_n() {
        let records = vec![
            create_test_record("France", 2023, 30.0),
            create_test_record("Germany", 2023, 10.0),
        ];
        let top = rank_top_n(&refs(&records), 10, Direction::High).unwrap();
        assert_eq!(top, vec![CountryRate::new("France", 30.0), CountryRate::new("Germany", 10.0)]);

        assert!(rank_top_n(&[], 10, Direction::High).unwrap().is_empty());
    }

    #[test]
    fn test_rank_top_n_rejects_mixed_years() {
        let records = vec![
            create_test_record("France", 2023, 30.0),
            create_test_record("Germany", 2022, 10.0),
        ];
        let err = rank_top_n(&refs(&records), 10, Direction::High).unwrap_err();
        assert!(matches!(err, AggregateError::Precondition(_)));
    }

    #[test]
    fn test_rank_top_n_rejects_duplicate_country() {
        let records = vec![
            create_test_record("France", 2023, 30.0),
            create_test_record("France", 2023, 10.0),
        ];
        assert!(rank_top_n(&refs(&records), 10, Direction::Low).is_err());
    }

    #[test]
    fn test_delta_percent() {
        assert_eq!(delta_percent(50.0, 75.0), Ok(0.5));
        assert_eq!(delta_percent(80.0, 20.0), Ok(-0.75));
        assert_eq!(delta_percent(0.0, 10.0), Err(AggregateError::DivideByZero));
    }

    #[test]
    fn test_deviation_sums_to_zero_per_year() {
        let records = vec![
            create_test_record("France", 2000, 31.3),
            create_test_record("Germany", 2000, 10.9),
            create_test_record("Niger", 2000, 201.7),
            create_test_record("France", 2001, 29.1),
            create_test_record("Germany", 2001, 11.4),
        ];
        let slice = refs(&records);
        let means = group_mean_by_year(&slice);
        let points = deviation(&slice, &means).unwrap();

        for year in [2000, 2001] {
            let sum: f64 = points
                .iter()
                .filter(|p| p.year == year)
                .map(|p| p.deviation)
                .sum();
            assert!(sum.abs() < 1e-9, "year {} sums to {}", year, sum);
        }
    }

    #[test]
    fn test_deviation_missing_mean() {
        let records = vec![create_test_record("France", 2000, 30.0)];
        let err = deviation(&refs(&records), &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, AggregateError::Precondition(_)));
    }
}
