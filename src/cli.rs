use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Look up, summarize, and export area pricing data", long_about = None)]
pub struct Cli {
    /// YAML settings file (dataset path, row and suggestion limits)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Match areas and print summaries, yearly price charts, and rows as JSON
    Query(QueryArgs),
    /// Write the rows matched by one or more areas to a CSV file
    Export(ExportArgs),
    /// List distinct normalized area names from the dataset
    Areas(AreasArgs),
    /// Show the detected area and price columns
    Columns(ColumnsArgs),
}

#[derive(Debug, Clone, Args)]
pub struct SourceArgs {
    /// Dataset to load (.csv, .tsv, or .xlsx); defaults to the configured dataset
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct QueryArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Comma-separated area names
    #[arg(short = 'a', long = "area")]
    pub area: Option<String>,
    /// Alias for --area
    #[arg(long = "areas")]
    pub areas: Option<String>,
    /// Maximum rows included in the response
    #[arg(long)]
    pub rows: Option<usize>,
    /// Print single-line JSON instead of pretty output
    #[arg(long)]
    pub compact: bool,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Comma-separated area names
    #[arg(short = 'a', long = "area")]
    pub area: String,
    /// Output CSV file (`-` for stdout); defaults to filtered_<area>.csv
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct AreasArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Maximum names to list (defaults to the configured suggestion limit)
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Args)]
pub struct ColumnsArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
