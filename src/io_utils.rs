//! Input plumbing for dataset loading.
//!
//! - **Format detection**: explicit hint, then file extension, then the ZIP
//!   signature that every `.xlsx` workbook starts with.
//! - **Delimiter resolution**: `.tsv` → tab, everything else → comma, with a
//!   manual override.
//! - **Encoding**: input decoding via `encoding_rs`, defaulting to UTF-8.

use std::{io::Read, path::Path};

use encoding_rs::{Encoding, UTF_8};

use crate::error::LoadError;

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Delimited,
    Workbook,
}

impl DatasetFormat {
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension().and_then(|ext| ext.to_str())?;
        if ext.eq_ignore_ascii_case("xlsx") || ext.eq_ignore_ascii_case("xlsm") {
            Some(DatasetFormat::Workbook)
        } else if ext.eq_ignore_ascii_case("csv") || ext.eq_ignore_ascii_case("tsv") {
            Some(DatasetFormat::Delimited)
        } else {
            None
        }
    }

    pub fn sniff(bytes: &[u8]) -> Self {
        if bytes.starts_with(ZIP_MAGIC) {
            DatasetFormat::Workbook
        } else {
            DatasetFormat::Delimited
        }
    }
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding, LoadError> {
    match label {
        Some(value) => Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| LoadError::Encoding(value.to_string())),
        None => Ok(UTF_8),
    }
}

pub fn resolve_input_delimiter(path: Option<&Path>, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.and_then(|p| p.extension()).and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(false);
    builder.from_reader(reader)
}

/// Decodes one field. `Encoding::decode` sniffs and drops a leading BOM.
pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String, LoadError> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(LoadError::Decode(encoding.name()))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(
    record: &csv::ByteRecord,
    encoding: &'static Encoding,
) -> Result<Vec<String>, LoadError> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}
