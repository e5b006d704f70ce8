//! Markdown dashboard generation.
//!
//! This module renders the published view bundle as a Markdown document
//! or as JSON for downstream rendering layers.

use crate::dashboard::bundle::{
    ComparisonSeries, Delta, DeviationView, FocusHeadline, HeadlineMetrics, Indicator, MapSeries,
    RankedSeries, Rankings, TrendPanel,
};
use crate::dashboard::SelectionState;
use crate::models::{Report, ReportMetadata};
use anyhow::Result;

/// Marker rendered for missing values.
const NO_DATA: &str = "—";

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# Fertility Rate Dashboard\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_selection_section(&report.selection));

    let views = &report.views;
    if let Some(ref headlines) = views.headlines {
        output.push_str(&generate_headlines_section(headlines));
    }
    if let Some(ref map) = views.map {
        output.push_str(&generate_map_section(map));
    }
    if let Some(ref rankings) = views.rankings {
        output.push_str(&generate_rankings_section(rankings));
    }
    if let Some(ref focus) = views.focus {
        output.push_str(&generate_focus_section(focus));
    }
    if let Some(ref trends) = views.trends {
        output.push_str(&generate_trends_section(trends));
    }
    if let Some(ref comparison) = views.comparison {
        output.push_str(&generate_comparison_section(comparison));
    }
    if let Some(ref deviation) = views.deviation {
        output.push_str(&generate_deviation_section(deviation));
    }

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Dataset:** `{}`\n", metadata.dataset));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Records:** {}\n", metadata.records));
    section.push_str(&format!("- **Countries:** {}\n", metadata.countries));
    if let Some((first, last)) = metadata.year_range {
        section.push_str(&format!("- **Years:** {}–{}\n", first, last));
    }
    section.push_str(&format!(
        "- **Signals Applied:** {}\n",
        metadata.signals_applied
    ));
    if !metadata.signals_rejected.is_empty() {
        section.push_str(&format!(
            "- **Signals Rejected:** {}\n",
            metadata.signals_rejected.len()
        ));
        for reason in &metadata.signals_rejected {
            section.push_str(&format!("  - {}\n", reason));
        }
    }
    section.push('\n');

    section
}

fn generate_selection_section(selection: &SelectionState) -> String {
    let mut section = String::new();

    section.push_str("## Selection\n\n");
    section.push_str("| Input | Value |\n");
    section.push_str("|:---|:---|\n");
    section.push_str(&format!("| Year | {} |\n", selection.year));
    section.push_str(&format!("| Age band | {} |\n", selection.age_band));
    section.push_str(&format!("| Focused country | {} |\n", selection.focused_country));
    section.push_str(&format!(
        "| Compared countries | {} |\n",
        selection
            .compared_countries
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    ));
    section.push_str(&format!(
        "| Comparison age band | {} |\n",
        selection.comparison_age_band
    ));
    section.push_str(&format!(
        "| Deviation age band | {} |\n\n",
        selection.deviation_age_band
    ));

    section
}

fn generate_headlines_section(headlines: &HeadlineMetrics) -> String {
    let mut section = String::new();

    section.push_str("## Headlines\n\n");
    section.push_str("| Value | |\n");
    section.push_str("|---:|:---|\n");

    for headline in [
        &headlines.year_band,
        &headlines.year_all_bands,
        &headlines.band_all_years,
    ] {
        let value = headline
            .value
            .map(|v| v.to_string())
            .unwrap_or_else(|| NO_DATA.to_string());
        section.push_str(&format!("| **{}** | {} |\n", value, headline.text));
    }
    section.push('\n');

    section
}

fn generate_map_section(map: &MapSeries) -> String {
    let mut section = String::new();

    section.push_str("## The Fertility Rate across the World\n\n");
    section.push_str(&format!(
        "*Women aged {} in {}. Countries marked {} have no data for this selection.*\n\n",
        map.age_band, map.year, NO_DATA
    ));
    section.push_str("| Country | Code | Rate |\n");
    section.push_str("|:---|:---:|---:|\n");

    for point in &map.points {
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            point.country_name,
            point.country_code,
            format_rate(point.rate)
        ));
    }
    section.push('\n');

    section
}

fn generate_rankings_section(rankings: &Rankings) -> String {
    let mut section = String::new();

    section.push_str(&generate_ranked_table(
        "The countries with the highest fertility rates",
        &rankings.top,
    ));
    section.push_str(&generate_ranked_table(
        "The countries with the lowest fertility rates",
        &rankings.bottom,
    ));

    section
}

fn generate_ranked_table(title: &str, series: &RankedSeries) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", title));
    if series.entries.is_empty() {
        section.push_str("No data for this selection.\n\n");
        return section;
    }

    section.push_str(&format!("*Mean: {}*\n\n", format_rate(series.mean)));
    section.push_str("| # | Country | Rate |\n");
    section.push_str("|---:|:---|---:|\n");
    for (i, entry) in series.entries.iter().enumerate() {
        section.push_str(&format!(
            "| {} | {} | {:.1} |\n",
            i + 1,
            entry.country_name,
            entry.rate
        ));
    }
    section.push('\n');

    section
}

fn generate_focus_section(focus: &FocusHeadline) -> String {
    format!("## {}\n\n{}\n\n", focus.headline, focus.info)
}

fn generate_trends_section(trends: &TrendPanel) -> String {
    let mut section = String::new();

    section.push_str(&format!("### {}\n\n", trends.headline));
    section.push_str(&format!("*Axis maximum: {}*\n\n", format_rate(trends.y_max)));

    for band in &trends.bands {
        section.push_str(&format!(
            "#### Fertility rate among women aged {} years\n\n",
            band.age_band
        ));
        section.push_str(&format!("{}\n\n", format_indicator(&band.indicator)));

        if band.series.is_empty() {
            continue;
        }

        let years: Vec<String> = band.series.iter().map(|p| p.year.to_string()).collect();
        let rates: Vec<String> = band.series.iter().map(|p| format!("{:.1}", p.rate)).collect();
        section.push_str(&format!("| Year | {} |\n", years.join(" | ")));
        section.push_str(&format!("|:---|{}\n", "---:|".repeat(years.len())));
        section.push_str(&format!("| Rate | {} |\n\n", rates.join(" | ")));
    }

    section
}

fn generate_comparison_section(comparison: &ComparisonSeries) -> String {
    let mut section = String::new();

    section.push_str("## Country Comparison\n\n");
    section.push_str(&format!("*Women aged {}.*\n\n", comparison.age_band));

    if comparison.points.is_empty() {
        section.push_str("No data for the selected countries.\n\n");
        return section;
    }

    section.push_str("| Year | Country | Rate |\n");
    section.push_str("|---:|:---|---:|\n");
    for point in &comparison.points {
        section.push_str(&format!(
            "| {} | {} | {:.1} |\n",
            point.year, point.country_name, point.rate
        ));
    }
    section.push('\n');

    section
}

fn generate_deviation_section(deviation: &DeviationView) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", deviation.headline));
    section.push_str(&format!("*Women aged {}.*\n\n", deviation.age_band));

    if deviation.bars.is_empty() {
        section.push_str("No data for this selection.\n\n");
        return section;
    }

    section.push_str("| Year | Rate | Deviation |\n");
    section.push_str("|---:|---:|---:|\n");
    for bar in &deviation.bars {
        section.push_str(&format!(
            "| {} | {:.1} | {:+} |\n",
            bar.year, bar.rate, bar.deviation
        ));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Source: The U.S. Census Bureau, age-specific fertility rates*\n");

    footer
}

fn format_rate(rate: Option<f64>) -> String {
    rate.map(|r| format!("{:.1}", r))
        .unwrap_or_else(|| NO_DATA.to_string())
}

fn format_indicator(indicator: &Indicator) -> String {
    match indicator {
        Indicator::Available {
            first_year,
            last_year,
            current,
            delta,
        } => {
            let change = match delta {
                Delta::Relative(change) => format!("{:+.1}%", change * 100.0),
                Delta::Undefined => "undefined".to_string(),
            };
            format!(
                "Current fertility rate: **{}** ({} since {}, latest {})",
                current, change, first_year, last_year
            )
        }
        Indicator::Unavailable => format!("Current fertility rate: {}", NO_DATA),
    }
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::{SelectionDefaults, Session};
    use crate::models::{AgeBand, FertilityRecord};
    use crate::store::RecordStore;
    use chrono::Utc;
    use std::sync::Arc;

    fn create_test_report() -> Report {
        let records = [
            ("France", 2000, 40.0),
            ("France", 2023, 30.0),
            ("Germany", 2000, 0.0),
            ("Germany", 2023, 10.0),
            ("Spain", 2000, 8.0),
        ]
        .into_iter()
        .map(|(country, year, rate)| FertilityRecord {
            country_code: country[..2].to_uppercase(),
            country_name: country.to_string(),
            year,
            age_band: AgeBand::From15To19,
            rate,
        })
        .collect();

        let store = Arc::new(RecordStore::new(records).unwrap());
        let session = Session::open(store, &SelectionDefaults::default()).unwrap();

        Report {
            metadata: ReportMetadata {
                dataset: "fixtures/sample.csv".to_string(),
                generated_at: Utc::now(),
                records: 5,
                countries: 3,
                year_range: Some((2000, 2023)),
                signals_applied: 1,
                signals_rejected: vec!["unknown year value '1800'".to_string()],
            },
            selection: session.selection().clone(),
            views: session.bundle().clone(),
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("# Fertility Rate Dashboard"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## Selection"));
        assert!(markdown.contains("## Headlines"));
        assert!(markdown.contains("## The Fertility Rate across the World"));
        assert!(markdown.contains("## Deep Dive: Germany"));
        assert!(markdown.contains("### Development of Fertility Rates: Germany"));
        assert!(markdown.contains("## Country Comparison"));
        assert!(markdown.contains("## Deviation from mean fertility rate: Germany"));
    }

    #[test]
    fn test_map_marks_missing_countries() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report);

        // Spain has no 2023 record.
        assert!(markdown.contains("| Spain | SP | — |"));
        assert!(markdown.contains("| France | FR | 30.0 |"));
    }

    #[test]
    fn test_undefined_delta_rendered() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report);

        // Germany's first recorded 15-19 rate is zero.
        assert!(markdown.contains("Current fertility rate: **10** (undefined since 2000"));
    }

    #[test]
    fn test_generate_metadata_section() {
        let report = create_test_report();
        let section = generate_metadata_section(&report.metadata);

        assert!(section.contains("fixtures/sample.csv"));
        assert!(section.contains("- **Records:** 5"));
        assert!(section.contains("2000–2023"));
        assert!(section.contains("Signals Rejected:"));
        assert!(section.contains("unknown year value '1800'"));
    }

    #[test]
    fn test_format_indicator() {
        let indicator = Indicator::Available {
            first_year: 1970,
            last_year: 2023,
            current: 75,
            delta: Delta::Relative(0.5),
        };
        assert_eq!(
            format_indicator(&indicator),
            "Current fertility rate: **75** (+50.0% since 1970, latest 2023)"
        );
        assert_eq!(format_indicator(&Indicator::Unavailable), "Current fertility rate: —");
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"metadata\""));
        assert!(json.contains("\"selection\""));
        assert!(json.contains("\"views\""));
        assert!(json.contains("\"rankings\""));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["views"]["focus"]["country"], "Germany");
        assert!(value["views"]["map"]["points"][2]["rate"].is_null());
    }
}
