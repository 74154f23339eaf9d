//! Best-effort detection of the area and price columns.
//!
//! Real-estate exports name these columns inconsistently, so each resolver is
//! an ordered list of named rules evaluated in priority order. The first rule
//! that matches any column wins; within a rule the first matching column wins.
//! Column names are expected to be normalized already (see
//! [`crate::normalize::normalize_column_name`]).

use log::debug;

/// One detection rule: a label for diagnostics plus a predicate over a column name.
pub struct ColumnRule {
    pub name: &'static str,
    pub matches: fn(&str) -> bool,
}

impl ColumnRule {
    const fn new(name: &'static str, matches: fn(&str) -> bool) -> Self {
        Self { name, matches }
    }
}

/// Outcome of a resolution, keeping which rule fired for logging and display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumn {
    pub column: String,
    pub rule: &'static str,
}

fn final_location(column: &str) -> bool {
    column.contains("final") && column.contains("location")
}

fn area_alias(column: &str) -> bool {
    matches!(column, "area" | "locality" | "location")
}

pub const AREA_RULES: &[ColumnRule] = &[
    ColumnRule::new("final-location", final_location),
    ColumnRule::new("area-alias", area_alias),
];

/// Known price column spellings, highest priority first.
pub const PRICE_ALIASES: &[&str] = &[
    "flat___weighted_average_rate",
    "flat__weighted_average_rate",
    "flat_weighted_average_rate",
    "flatweightedaveragerate",
    "weighted_average_rate",
    "flat_avg_rate",
    "avg_price",
    "avgprice",
    "price",
    "rate",
];

fn flat_average_rate(column: &str) -> bool {
    let collapsed = column.replace("__", "_");
    collapsed.contains("flat") && collapsed.contains("average") && collapsed.contains("rate")
}

fn contains_rate(column: &str) -> bool {
    column.contains("rate")
}

pub const PRICE_RULES: &[ColumnRule] = &[
    ColumnRule::new("flat-average-rate", flat_average_rate),
    ColumnRule::new("contains-rate", contains_rate),
];

fn first_by_rules<S: AsRef<str>>(columns: &[S], rules: &[ColumnRule]) -> Option<ResolvedColumn> {
    rules.iter().find_map(|rule| {
        columns
            .iter()
            .map(|column| column.as_ref())
            .find(|column| (rule.matches)(column))
            .map(|column| ResolvedColumn {
                column: column.to_string(),
                rule: rule.name,
            })
    })
}

fn first_by_alias<S: AsRef<str>>(columns: &[S]) -> Option<ResolvedColumn> {
    PRICE_ALIASES.iter().find_map(|alias| {
        columns
            .iter()
            .map(|column| column.as_ref())
            .find(|column| column == alias)
            .map(|column| ResolvedColumn {
                column: column.to_string(),
                rule: "price-alias",
            })
    })
}

/// Picks the column holding area names.
///
/// Falls back to the first column when no rule matches. That default is a
/// guess and may point at an unrelated column. Returns `None` only when
/// `columns` is empty.
pub fn resolve_area_column<S: AsRef<str>>(columns: &[S]) -> Option<ResolvedColumn> {
    let resolved = first_by_rules(columns, AREA_RULES).or_else(|| {
        columns.first().map(|column| ResolvedColumn {
            column: column.as_ref().to_string(),
            rule: "first-column",
        })
    });
    if let Some(found) = &resolved {
        debug!("Area column '{}' (rule {})", found.column, found.rule);
    }
    resolved
}

/// Picks the column holding prices, or `None` when nothing looks like one.
pub fn resolve_price_column<S: AsRef<str>>(columns: &[S]) -> Option<ResolvedColumn> {
    let (primary, fallback) = PRICE_RULES.split_at(1);
    let resolved = first_by_rules(columns, primary)
        .or_else(|| first_by_alias(columns))
        .or_else(|| first_by_rules(columns, fallback));
    match &resolved {
        Some(found) => debug!("Price column '{}' (rule {})", found.column, found.rule),
        None => debug!("No price column detected"),
    }
    resolved
}
