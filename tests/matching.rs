mod common;

use std::collections::HashSet;

use area_lens::{
    aggregate,
    dataset::{Dataset, DatasetSource, ReadOptions},
    matcher::{MatchTier, match_areas},
    normalize::normalize_text,
};

fn prices() -> Dataset {
    let source = DatasetSource::Path(common::fixture_path("prices.csv"));
    Dataset::read(&source, &ReadOptions::default()).expect("fixture dataset")
}

#[test]
fn fixture_columns_are_detected() {
    let data = prices();
    assert_eq!(data.area_column().column, "final_location");
    assert_eq!(
        data.price_column().expect("price column").column,
        "flat___weighted_average_rate"
    );
    assert_eq!(data.headers().last().map(String::as_str), Some("area_norm"));
}

#[test]
fn verbatim_areas_match_exactly() {
    let data = prices();
    let area_index = data.column_index("final_location").unwrap();
    let verbatim = data
        .rows()
        .iter()
        .map(|row| row[area_index].to_string())
        .collect::<Vec<_>>();
    for area in verbatim {
        let outcome = match_areas(&data, &[area.as_str()]);
        assert!(!outcome.is_empty(), "no rows for {area}");
        assert_eq!(outcome.resolutions[0].tier, Some(MatchTier::Exact));
        let norm = normalize_text(&area);
        assert!(outcome.rows.iter().all(|row| data.area_norm(row) == norm));
    }
}

#[test]
fn token_fallback_finds_rows_containing_one_token() {
    let data = prices();
    let outcome = match_areas(&data, &["Sarjapur Whitefield"]);
    assert_eq!(outcome.resolutions[0].tier, Some(MatchTier::Token));
    assert_eq!(outcome.rows.len(), 2);
    assert!(outcome.rows.iter().all(|row| data.area_norm(row).contains("whitefield")));
}

#[test]
fn overlapping_queries_never_duplicate_rows() {
    let data = prices();
    let outcome = match_areas(&data, &["Koramangala", "koramangala 5th block", "korama"]);
    let unique = outcome.rows.iter().collect::<HashSet<_>>();
    assert_eq!(unique.len(), outcome.rows.len());
    assert_eq!(outcome.rows.len(), 3);
}

#[test]
fn koramangala_chart_has_one_point_per_year() {
    let data = prices();
    let outcome = match_areas(&data, &["Koramangala"]);
    let (summary, chart) = aggregate::area_report(&data, &outcome.rows, "Koramangala");
    assert_eq!(summary.count, 2);
    assert_eq!(summary.average_price, Some(150.0));
    assert_eq!(
        chart.points().collect::<Vec<_>>(),
        vec![(2020, 100.0), (2021, 200.0)]
    );
}

#[test]
fn token_matches_can_be_missing_from_the_per_area_subset() {
    let data = prices();
    let outcome = match_areas(&data, &["Sarjapur Whitefield"]);
    let summary = aggregate::summarize(&data, &outcome.rows, "Sarjapur Whitefield");
    assert_eq!(outcome.rows.len(), 2);
    assert_eq!(summary.count, 0);
    assert_eq!(summary.average_price, None);
}

#[test]
fn missing_prices_are_skipped_in_averages_and_charts() {
    let data = prices();
    let outcome = match_areas(&data, &["HSR Layout"]);
    let (summary, chart) = aggregate::area_report(&data, &outcome.rows, "HSR Layout");
    assert_eq!(summary.count, 3);
    assert_eq!(summary.average_price, Some(100.0));
    assert_eq!(chart.years, vec![2019, 2020]);
}
