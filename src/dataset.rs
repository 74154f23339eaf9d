//! In-memory dataset model and readers.
//!
//! A [`Dataset`] is an ordered list of rows aligned with a list of normalized
//! column names. Every dataset carries exactly one derived `area_norm` column
//! holding the normalized text of the resolved area column, and a `year`
//! column (when present) is coerced to numbers with unparseable values
//! becoming null.

use std::{
    borrow::Cow,
    fmt,
    fs,
    hash::{Hash, Hasher},
    io::{Cursor, Read},
    path::{Path, PathBuf},
};

use calamine::{Data, Reader, Xlsx};
use encoding_rs::Encoding;
use log::{debug, info};
use serde::{Serialize, Serializer};

use crate::{
    columns::{self, ResolvedColumn},
    error::LoadError,
    io_utils::{self, DatasetFormat},
    normalize::{normalize_column_name, normalize_text},
};

pub const AREA_NORM_COLUMN: &str = "area_norm";
pub const YEAR_COLUMN: &str = "year";

#[derive(Debug, Clone, Default)]
pub enum Cell {
    #[default]
    Null,
    Text(String),
    Number(f64),
}

/// Bit pattern used for equality and hashing: `-0.0` folds into `0.0` and
/// every NaN into one value, so row de-duplication sees them as equal.
fn canonical_bits(value: f64) -> u64 {
    if value.is_nan() {
        f64::NAN.to_bits()
    } else if value == 0.0 {
        0.0_f64.to_bits()
    } else {
        value.to_bits()
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Cell::Null, Cell::Null) => true,
            (Cell::Text(left), Cell::Text(right)) => left == right,
            (Cell::Number(left), Cell::Number(right)) => {
                canonical_bits(*left) == canonical_bits(*right)
            }
            _ => false,
        }
    }
}

impl Eq for Cell {}

impl Hash for Cell {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Cell::Null => {}
            Cell::Text(text) => text.hash(state),
            Cell::Number(number) => canonical_bits(*number).hash(state),
        }
    }
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Numeric view of the cell. Text is parsed leniently; non-finite values
    /// never come back.
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            Cell::Null => return None,
            Cell::Number(number) => *number,
            Cell::Text(text) => text.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }

    pub fn as_display(&self) -> Cow<'_, str> {
        match self {
            Cell::Null => Cow::Borrowed(""),
            Cell::Text(text) => Cow::Borrowed(text),
            Cell::Number(number) => Cow::Owned(format_number(*number)),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_display())
    }
}

/// Not-a-number and infinities serialize as `null` so JSON encoders never see
/// an invalid numeric literal.
impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Null => serializer.serialize_none(),
            Cell::Text(text) => serializer.serialize_str(text),
            Cell::Number(number) if number.is_finite() => serializer.serialize_f64(*number),
            Cell::Number(_) => serializer.serialize_none(),
        }
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

pub type Row = Vec<Cell>;

/// Where a dataset comes from: a file on disk or bytes handed over by an upload.
#[derive(Debug, Clone)]
pub enum DatasetSource {
    Path(PathBuf),
    Bytes { name: Option<String>, bytes: Vec<u8> },
}

impl DatasetSource {
    fn path_hint(&self) -> Option<&Path> {
        match self {
            DatasetSource::Path(path) => Some(path),
            DatasetSource::Bytes { name, .. } => name.as_deref().map(Path::new),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            DatasetSource::Path(path) => path.display().to_string(),
            DatasetSource::Bytes { name: Some(name), .. } => name.clone(),
            DatasetSource::Bytes { name: None, bytes } => format!("<{} uploaded bytes>", bytes.len()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    pub format: Option<DatasetFormat>,
    pub delimiter: Option<u8>,
    pub encoding: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    headers: Vec<String>,
    rows: Vec<Row>,
    area_column: ResolvedColumn,
    area_norm_index: usize,
}

impl Dataset {
    /// Reads and prepares a dataset from `source`.
    pub fn read(source: &DatasetSource, options: &ReadOptions) -> Result<Self, LoadError> {
        let bytes = match source {
            DatasetSource::Path(path) => fs::read(path).map_err(|source| LoadError::Io {
                path: path.clone(),
                source,
            })?,
            DatasetSource::Bytes { bytes, .. } => bytes.clone(),
        };
        let hint = source.path_hint();
        let format = options
            .format
            .or_else(|| hint.and_then(DatasetFormat::from_extension))
            .unwrap_or_else(|| DatasetFormat::sniff(&bytes));
        debug!("Reading {} as {:?}", source.describe(), format);
        let dataset = match format {
            DatasetFormat::Workbook => read_workbook(bytes)?,
            DatasetFormat::Delimited => {
                let delimiter = io_utils::resolve_input_delimiter(hint, options.delimiter);
                let encoding = io_utils::resolve_encoding(options.encoding.as_deref())?;
                read_delimited(Cursor::new(bytes), delimiter, encoding)?
            }
        };
        info!(
            "Loaded {} row(s) across {} column(s) from {} (area column '{}')",
            dataset.len(),
            dataset.headers.len(),
            source.describe(),
            dataset.area_column.column
        );
        Ok(dataset)
    }

    /// Builds a dataset from raw headers and typed rows: normalizes column
    /// names, coerces `year`, and derives `area_norm`.
    pub fn from_table(raw_headers: &[String], mut rows: Vec<Row>) -> Result<Self, LoadError> {
        let mut headers = raw_headers
            .iter()
            .map(|name| normalize_column_name(name))
            .collect::<Vec<_>>();
        let area_column = columns::resolve_area_column(&headers).ok_or(LoadError::Empty)?;
        let area_index = headers
            .iter()
            .position(|h| *h == area_column.column)
            .ok_or(LoadError::Empty)?;

        for row in &mut rows {
            row.resize(headers.len(), Cell::Null);
        }

        if let Some(year_index) = headers.iter().position(|h| h == YEAR_COLUMN) {
            for row in &mut rows {
                let cell = &mut row[year_index];
                *cell = cell.as_number().map(Cell::Number).unwrap_or(Cell::Null);
            }
        }

        let area_norm_index = match headers.iter().position(|h| h == AREA_NORM_COLUMN) {
            Some(existing) => existing,
            None => {
                headers.push(AREA_NORM_COLUMN.to_string());
                headers.len() - 1
            }
        };
        for row in &mut rows {
            let norm = match &row[area_index] {
                Cell::Null => String::new(),
                cell => normalize_text(&cell.as_display()),
            };
            if area_norm_index == row.len() {
                row.push(Cell::Text(norm));
            } else {
                row[area_norm_index] = Cell::Text(norm);
            }
        }

        Ok(Self {
            headers,
            rows,
            area_column,
            area_norm_index,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn area_column(&self) -> &ResolvedColumn {
        &self.area_column
    }

    /// First column with the given name; duplicate names resolve to the earliest.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Normalized area key of a row belonging to this dataset.
    pub fn area_norm<'a>(&self, row: &'a Row) -> &'a str {
        match row.get(self.area_norm_index) {
            Some(Cell::Text(norm)) => norm,
            _ => "",
        }
    }

    pub fn price_column(&self) -> Option<ResolvedColumn> {
        columns::resolve_price_column(&self.headers)
    }

    pub fn year_column(&self) -> Option<usize> {
        self.column_index(YEAR_COLUMN)
    }

    /// Distinct `area_norm` values in first-seen order.
    pub fn distinct_areas(&self, limit: usize) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.rows
            .iter()
            .map(|row| self.area_norm(row))
            .filter(|norm| seen.insert(*norm))
            .take(limit)
            .map(str::to_string)
            .collect()
    }
}

/// Reads delimited text. A column whose non-empty values all parse as finite
/// numbers is stored numerically; empty fields become null.
pub fn read_delimited<R: Read>(
    reader: R,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<Dataset, LoadError> {
    let mut reader = io_utils::open_csv_reader(reader, delimiter);
    let headers = io_utils::decode_record(reader.byte_headers()?, encoding)?;
    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err(LoadError::Empty);
    }

    let mut raw_rows = Vec::new();
    for record in reader.byte_records() {
        raw_rows.push(io_utils::decode_record(&record?, encoding)?);
    }

    let numeric = (0..headers.len())
        .map(|idx| {
            raw_rows
                .iter()
                .filter_map(|row| row.get(idx).map(|v| v.trim()))
                .filter(|v| !v.is_empty())
                .all(|v| v.parse::<f64>().is_ok_and(f64::is_finite))
        })
        .collect::<Vec<_>>();

    let rows = raw_rows
        .into_iter()
        .map(|raw| {
            raw.into_iter()
                .enumerate()
                .map(|(idx, value)| typed_cell(value, numeric[idx]))
                .collect()
        })
        .collect();

    Dataset::from_table(&headers, rows)
}

fn typed_cell(value: String, numeric: bool) -> Cell {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Cell::Null;
    }
    if numeric && let Ok(number) = trimmed.parse::<f64>() {
        return Cell::Number(number);
    }
    Cell::Text(value)
}

/// Reads the first worksheet of an `.xlsx` workbook; its first row is the header.
pub fn read_workbook(bytes: Vec<u8>) -> Result<Dataset, LoadError> {
    let mut workbook: Xlsx<_> =
        Xlsx::new(Cursor::new(bytes)).map_err(|e| LoadError::Workbook(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LoadError::Workbook("No worksheet found".to_string()))?
        .map_err(|e| LoadError::Workbook(e.to_string()))?;

    let mut sheet_rows = range.rows();
    let headers = sheet_rows
        .next()
        .map(|row| row.iter().map(|cell| workbook_cell(cell).to_string()).collect::<Vec<_>>())
        .ok_or(LoadError::Empty)?;
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(LoadError::Empty);
    }
    let rows = sheet_rows
        .map(|row| row.iter().map(workbook_cell).collect())
        .collect();
    Dataset::from_table(&headers, rows)
}

fn workbook_cell(cell: &Data) -> Cell {
    match cell {
        Data::Empty | Data::Error(_) => Cell::Null,
        Data::Int(value) => Cell::Number(*value as f64),
        Data::Float(value) => Cell::Number(*value),
        Data::String(text) if text.trim().is_empty() => Cell::Null,
        Data::String(text) => Cell::Text(text.clone()),
        other => Cell::Text(other.to_string()),
    }
}
