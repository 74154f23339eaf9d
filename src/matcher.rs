//! Tiered area matching.
//!
//! Each requested area is normalized and run through [`TIERS`] in order:
//! exact equality on `area_norm`, then literal substring containment, then the
//! first space-separated token of the query that appears anywhere in
//! `area_norm`. The first tier that yields rows decides the match for that
//! area. Rows from all areas are unioned and de-duplicated by full-row
//! equality, keeping first-occurrence order.

use std::collections::HashSet;

use log::{debug, warn};
use serde::Serialize;

use crate::{
    dataset::{Dataset, Row},
    normalize::normalize_text,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Exact,
    Contains,
    Token,
}

/// A tier strategy: row indices matching the normalized query, or `None`.
pub type TierFn = fn(&Dataset, &str) -> Option<Vec<usize>>;

pub const TIERS: &[(MatchTier, TierFn)] = &[
    (MatchTier::Exact, match_exact),
    (MatchTier::Contains, match_contains),
    (MatchTier::Token, match_token),
];

fn matching_rows<F>(dataset: &Dataset, predicate: F) -> Option<Vec<usize>>
where
    F: Fn(&str) -> bool,
{
    let indices = dataset
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| predicate(dataset.area_norm(row)))
        .map(|(idx, _)| idx)
        .collect::<Vec<_>>();
    (!indices.is_empty()).then_some(indices)
}

pub fn match_exact(dataset: &Dataset, norm: &str) -> Option<Vec<usize>> {
    matching_rows(dataset, |area| area == norm)
}

pub fn match_contains(dataset: &Dataset, norm: &str) -> Option<Vec<usize>> {
    matching_rows(dataset, |area| area.contains(norm))
}

pub fn match_token(dataset: &Dataset, norm: &str) -> Option<Vec<usize>> {
    norm.split(' ')
        .find_map(|token| matching_rows(dataset, |area| area.contains(token)))
}

/// How one requested area was resolved. `resolved` is the normalized key, or
/// `None` when no tier matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub requested: String,
    pub resolved: Option<String>,
    pub tier: Option<MatchTier>,
    pub rows: usize,
}

/// De-duplicated union of matched rows plus one [`Resolution`] per request.
#[derive(Debug, Clone)]
pub struct MatchOutcome<'a> {
    pub rows: Vec<&'a Row>,
    pub resolutions: Vec<Resolution>,
}

impl MatchOutcome<'_> {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn unmatched(&self) -> impl Iterator<Item = &str> {
        self.resolutions
            .iter()
            .filter(|r| r.resolved.is_none())
            .map(|r| r.requested.as_str())
    }
}

/// Resolves a single area against the tiers.
pub fn resolve_area(dataset: &Dataset, requested: &str) -> (Resolution, Vec<usize>) {
    let norm = normalize_text(requested);
    for (tier, strategy) in TIERS {
        if let Some(indices) = strategy(dataset, &norm) {
            debug!(
                "Area '{requested}' matched {} row(s) via {tier:?} on '{norm}'",
                indices.len()
            );
            let resolution = Resolution {
                requested: requested.to_string(),
                resolved: Some(norm),
                tier: Some(*tier),
                rows: indices.len(),
            };
            return (resolution, indices);
        }
    }
    warn!("Area '{requested}' did not match any row");
    let resolution = Resolution {
        requested: requested.to_string(),
        resolved: None,
        tier: None,
        rows: 0,
    };
    (resolution, Vec::new())
}

pub fn match_areas<'a, S: AsRef<str>>(dataset: &'a Dataset, requested: &[S]) -> MatchOutcome<'a> {
    let mut resolutions = Vec::with_capacity(requested.len());
    let mut seen: HashSet<&Row> = HashSet::new();
    let mut rows = Vec::new();
    for area in requested {
        let (resolution, indices) = resolve_area(dataset, area.as_ref());
        resolutions.push(resolution);
        for idx in indices {
            let row = &dataset.rows()[idx];
            if seen.insert(row) {
                rows.push(row);
            }
        }
    }
    MatchOutcome { rows, resolutions }
}
