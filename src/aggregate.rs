//! Per-area summaries and yearly price series.
//!
//! The matcher only keeps the union of matched rows, so each requested area's
//! subset is re-derived here: rows whose `area_norm` contains the normalized
//! area, falling back to exact equality when that is empty. A token-tier match
//! can therefore contribute rows to the union that no per-area subset picks up;
//! the subset computed here is what summaries and charts report.

use std::{collections::BTreeMap, fmt};

use serde::Serialize;

use crate::{
    dataset::{Dataset, Row},
    normalize::normalize_text,
};

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub area: String,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_price: Option<f64>,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} records found.", self.area, self.count)?;
        if let Some(avg) = self.average_price {
            write!(f, " Avg price = {}", format_price(avg))?;
        }
        Ok(())
    }
}

/// Renders with at least one decimal place (`200.0`, `123.45`).
pub fn format_price(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

/// Year/price pairs sorted by year, ready for plotting.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    pub years: Vec<i64>,
    pub prices: Vec<f64>,
}

impl ChartSeries {
    pub fn points(&self) -> impl Iterator<Item = (i64, f64)> + '_ {
        self.years.iter().copied().zip(self.prices.iter().copied())
    }
}

impl FromIterator<(i64, f64)> for ChartSeries {
    fn from_iter<I: IntoIterator<Item = (i64, f64)>>(iter: I) -> Self {
        let (years, prices) = iter.into_iter().unzip();
        Self { years, prices }
    }
}

/// Rows of `matched` attributed to `requested` for reporting.
pub fn area_subset<'a>(dataset: &Dataset, matched: &[&'a Row], requested: &str) -> Vec<&'a Row> {
    let norm = normalize_text(requested);
    let contains = matched
        .iter()
        .copied()
        .filter(|row| dataset.area_norm(row).contains(norm.as_str()))
        .collect::<Vec<_>>();
    if !contains.is_empty() {
        return contains;
    }
    matched
        .iter()
        .copied()
        .filter(|row| dataset.area_norm(row) == norm)
        .collect()
}

fn price_index(dataset: &Dataset) -> Option<usize> {
    dataset
        .price_column()
        .and_then(|resolved| dataset.column_index(&resolved.column))
}

fn summary_of(requested: &str, subset: &[&Row], price_col: Option<usize>) -> Summary {
    let average_price = match price_col {
        Some(idx) if !subset.is_empty() => {
            let prices = subset
                .iter()
                .filter_map(|row| row.get(idx).and_then(|cell| cell.as_number()))
                .collect::<Vec<_>>();
            mean(&prices).map(round2)
        }
        _ => None,
    };
    Summary {
        area: requested.to_string(),
        count: subset.len(),
        average_price,
    }
}

/// Count plus the rounded mean of the numeric prices in the area's subset.
pub fn summarize(dataset: &Dataset, matched: &[&Row], requested: &str) -> Summary {
    let subset = area_subset(dataset, matched, requested);
    summary_of(requested, &subset, price_index(dataset))
}

/// Mean price per year over rows that carry both values, rounded to cents.
/// Empty when either column index is missing.
pub fn chart_series(subset: &[&Row], year_col: Option<usize>, price_col: Option<usize>) -> ChartSeries {
    let (Some(year_col), Some(price_col)) = (year_col, price_col) else {
        return ChartSeries::default();
    };
    let mut by_year: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
    for row in subset {
        let year = row.get(year_col).and_then(|cell| cell.as_number());
        let price = row.get(price_col).and_then(|cell| cell.as_number());
        if let (Some(year), Some(price)) = (year, price) {
            by_year.entry(year.trunc() as i64).or_default().push(price);
        }
    }
    by_year
        .into_iter()
        .filter_map(|(year, prices)| mean(&prices).map(|avg| (year, round2(avg))))
        .collect()
}

/// Summary and chart for one requested area, sharing one subset.
pub fn area_report(dataset: &Dataset, matched: &[&Row], requested: &str) -> (Summary, ChartSeries) {
    let subset = area_subset(dataset, matched, requested);
    let price_col = price_index(dataset);
    let summary = summary_of(requested, &subset, price_col);
    let chart = chart_series(&subset, dataset.year_column(), price_col);
    (summary, chart)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::read_delimited;
    use encoding_rs::UTF_8;

    fn load(csv: &str) -> Dataset {
        read_delimited(csv.as_bytes(), b',', UTF_8).unwrap()
    }

    fn all_rows(dataset: &Dataset) -> Vec<&Row> {
        dataset.rows().iter().collect()
    }

    #[test]
    fn average_price_is_rounded_mean() {
        let data = load("area,price\nIndiranagar,100\nIndiranagar,200\nIndiranagar,300\n");
        let summary = summarize(&data, &all_rows(&data), "Indiranagar");
        assert_eq!(summary.count, 3);
        assert_eq!(summary.average_price, Some(200.0));
        assert_eq!(summary.to_string(), "Indiranagar: 3 records found. Avg price = 200.0");
    }

    #[test]
    fn average_rounds_to_two_decimals() {
        let data = load("area,rate\nA,10\nA,10\nA,10.01\n");
        let summary = summarize(&data, &all_rows(&data), "a");
        assert_eq!(summary.average_price, Some(10.0));
        let data = load("area,rate\nA,1\nA,2.345\n");
        assert_eq!(summarize(&data, &all_rows(&data), "a").average_price, Some(1.67));
    }

    #[test]
    fn summary_is_count_only_without_price_column() {
        let data = load("area,units\nA,3\n");
        let summary = summarize(&data, &all_rows(&data), "A");
        assert_eq!(summary.average_price, None);
        assert_eq!(summary.to_string(), "A: 1 records found.");
    }

    #[test]
    fn summary_is_count_only_without_numeric_prices() {
        let data = load("area,price\nA,n/a\nA,\n");
        let summary = summarize(&data, &all_rows(&data), "A");
        assert_eq!(summary.count, 2);
        assert_eq!(summary.average_price, None);
    }

    #[test]
    fn subset_uses_contains_then_exact() {
        let data = load("area,price\nHSR Layout,1\nHSR Layout Sector 2,2\n");
        let rows = all_rows(&data);
        assert_eq!(area_subset(&data, &rows, "hsr layout").len(), 2);
        assert!(area_subset(&data, &rows, "bellandur hsr").is_empty());
    }

    #[test]
    fn chart_groups_by_year_in_ascending_order() {
        let data = load(
            "area,year,price\nKoramangala,2021,200\nKoramangala,2020,100\nKoramangala,2021,300\nKoramangala,,999\n",
        );
        let (_, chart) = area_report(&data, &all_rows(&data), "Koramangala");
        assert_eq!(chart.years, vec![2020, 2021]);
        assert_eq!(chart.prices, vec![100.0, 250.0]);
    }

    #[test]
    fn chart_is_empty_when_a_column_is_missing() {
        let data = load("area,price\nA,1\n");
        let (_, chart) = area_report(&data, &all_rows(&data), "A");
        assert_eq!(chart, ChartSeries::default());
        assert!(chart_series(&all_rows(&data), None, Some(1)).years.is_empty());
    }

    #[test]
    fn chart_truncates_fractional_years() {
        let data = load("area,year,price\nA,2020.0,10\nA,2020.7,20\n");
        let series = chart_series(&all_rows(&data), data.year_column(), Some(2));
        assert_eq!(series.points().collect::<Vec<_>>(), vec![(2020, 15.0)]);
    }
}
