//! Query, export, and upload operations as the caller sees them.
//!
//! [`AreaService`] ties an injectable [`DatasetStore`] to the matcher,
//! aggregator, and serializers. An HTTP layer (or the CLI in this crate) passes
//! raw parameters in and maps [`AreaError`] values onto its own status codes.

use log::info;
use serde_json::{Map, Value as JsonValue, json};

use crate::{
    aggregate::{self, ChartSeries, Summary},
    config::{DEFAULT_ROW_LIMIT, DEFAULT_SUGGESTION_LIMIT},
    dataset::{Dataset, DatasetSource},
    error::AreaError,
    matcher::{self, Resolution},
    serialize,
    store::DatasetStore,
};

/// Splits a comma-separated area parameter into trimmed, non-empty names.
pub fn parse_area_query(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|area| !area.is_empty())
        .map(str::to_string)
        .collect()
}

/// The first non-blank of the `area` and `areas` parameters.
pub fn pick_area_param<'a>(area: Option<&'a str>, areas: Option<&'a str>) -> &'a str {
    [area, areas]
        .into_iter()
        .flatten()
        .find(|value| !value.is_empty())
        .unwrap_or("")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportLimits {
    pub rows: usize,
    pub suggestions: usize,
}

impl Default for ReportLimits {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROW_LIMIT,
            suggestions: DEFAULT_SUGGESTION_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AreaReport {
    pub requested: String,
    pub summary: Summary,
    pub chart: ChartSeries,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryReport {
    pub areas: Vec<AreaReport>,
    pub resolutions: Vec<Resolution>,
    /// JSON-safe row objects, capped at the row limit.
    pub rows: Vec<JsonValue>,
    pub total_rows: usize,
}

impl QueryReport {
    /// `{status, summary, chart, rows, resolved}`, keyed by requested area in
    /// request order.
    pub fn to_json(&self) -> Result<JsonValue, AreaError> {
        let mut summary = Map::new();
        let mut chart = Map::new();
        for area in &self.areas {
            summary.insert(area.requested.clone(), json!(area.summary.to_string()));
            chart.insert(area.requested.clone(), serialize::to_json_safe(&area.chart)?);
        }
        let mut resolved = Map::new();
        for resolution in &self.resolutions {
            resolved.insert(
                resolution.requested.clone(),
                serialize::to_json_safe(&resolution.resolved)?,
            );
        }
        Ok(json!({
            "status": "ok",
            "summary": summary,
            "chart": chart,
            "rows": self.rows,
            "resolved": resolved,
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub filename: String,
    pub content_type: &'static str,
    pub rows: usize,
    pub bytes: Vec<u8>,
}

impl CsvExport {
    /// `filename` with path separators replaced, safe to create in one directory.
    pub fn local_filename(&self) -> String {
        self.filename.replace(['/', '\\'], "_")
    }
}

fn requested_areas(raw_area: &str) -> Result<Vec<String>, AreaError> {
    let areas = parse_area_query(raw_area);
    if areas.is_empty() {
        return Err(AreaError::NoAreaProvided);
    }
    Ok(areas)
}

/// Matches, summarizes, and charts the areas named in `raw_area`.
pub fn query(
    dataset: &Dataset,
    raw_area: &str,
    limits: &ReportLimits,
) -> Result<QueryReport, AreaError> {
    let areas = requested_areas(raw_area)?;
    let outcome = matcher::match_areas(dataset, &areas);
    if outcome.is_empty() {
        return Err(AreaError::NoRecordsFound {
            suggestions: Some(dataset.distinct_areas(limits.suggestions)),
        });
    }

    let reports = areas
        .iter()
        .map(|requested| {
            let (summary, chart) = aggregate::area_report(dataset, &outcome.rows, requested);
            AreaReport {
                requested: requested.clone(),
                summary,
                chart,
            }
        })
        .collect();

    let rows = outcome
        .rows
        .iter()
        .take(limits.rows)
        .map(|row| serialize::row_to_json(dataset.headers(), row))
        .collect::<Result<Vec<_>, _>>()?;

    info!(
        "Query for {} area(s) matched {} row(s)",
        areas.len(),
        outcome.rows.len()
    );
    Ok(QueryReport {
        areas: reports,
        resolutions: outcome.resolutions,
        rows,
        total_rows: outcome.rows.len(),
    })
}

/// CSV extract of every row matched by `raw_area`.
pub fn export(dataset: &Dataset, raw_area: &str) -> Result<CsvExport, AreaError> {
    let areas = requested_areas(raw_area)?;
    let outcome = matcher::match_areas(dataset, &areas);
    if outcome.is_empty() {
        return Err(AreaError::NoRecordsFound { suggestions: None });
    }
    let bytes = serialize::to_csv(dataset.headers(), &outcome.rows)?;
    info!(
        "Exported {} row(s) for '{raw_area}' ({} bytes)",
        outcome.rows.len(),
        bytes.len()
    );
    Ok(CsvExport {
        filename: format!("filtered_{raw_area}.csv"),
        content_type: "text/csv",
        rows: outcome.rows.len(),
        bytes,
    })
}

/// Entry point for callers that own a dataset slot.
#[derive(Debug)]
pub struct AreaService {
    store: DatasetStore,
    limits: ReportLimits,
}

impl AreaService {
    pub fn new(store: DatasetStore, limits: ReportLimits) -> Self {
        Self { store, limits }
    }

    pub fn store(&self) -> &DatasetStore {
        &self.store
    }

    pub fn limits(&self) -> &ReportLimits {
        &self.limits
    }

    /// Replaces the active dataset; returns its row count.
    pub fn upload(&self, source: &DatasetSource) -> Result<usize, AreaError> {
        Ok(self.store.load(source)?.len())
    }

    pub fn query(&self, raw_area: &str) -> Result<QueryReport, AreaError> {
        let snapshot = self.store.get_active()?;
        query(&snapshot, raw_area, &self.limits)
    }

    pub fn export(&self, raw_area: &str) -> Result<CsvExport, AreaError> {
        let snapshot = self.store.get_active()?;
        export(&snapshot, raw_area)
    }

    pub fn suggestions(&self) -> Result<Vec<String>, AreaError> {
        let snapshot = self.store.get_active()?;
        Ok(snapshot.distinct_areas(self.limits.suggestions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn area_query_is_split_trimmed_and_filtered() {
        assert_eq!(
            parse_area_query(" Koramangala , ,HSR Layout,"),
            vec!["Koramangala", "HSR Layout"]
        );
        assert!(parse_area_query(" , ").is_empty());
    }

    #[test]
    fn local_filename_flattens_path_separators() {
        let export = CsvExport {
            filename: "filtered_a/b\\..\\c.csv".to_string(),
            content_type: "text/csv",
            rows: 0,
            bytes: Vec::new(),
        };
        assert_eq!(export.local_filename(), "filtered_a_b_.._c.csv");
    }

    #[test]
    fn area_param_prefers_non_blank_area() {
        assert_eq!(pick_area_param(Some("HSR"), Some("BTM")), "HSR");
        assert_eq!(pick_area_param(Some(""), Some("BTM")), "BTM");
        assert_eq!(pick_area_param(None, None), "");
    }
}
