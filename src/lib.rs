pub mod aggregate;
pub mod cli;
pub mod columns;
pub mod config;
pub mod dataset;
pub mod error;
pub mod io_utils;
pub mod matcher;
pub mod normalize;
pub mod report;
pub mod serialize;
pub mod store;

use std::{env, fs, io::Write, path::Path, sync::OnceLock};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::{
    cli::{Cli, Commands, SourceArgs},
    config::Settings,
    dataset::DatasetSource,
    error::AreaError,
    report::{AreaService, ReportLimits},
    store::DatasetStore,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("area_lens", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let settings = Settings::resolve(cli.config.as_deref())?;
    debug!("Settings: {settings:?}");
    match cli.command {
        Commands::Query(args) => handle_query(&settings, &args),
        Commands::Export(args) => handle_export(&settings, &args),
        Commands::Areas(args) => handle_areas(&settings, &args),
        Commands::Columns(args) => handle_columns(&settings, &args),
    }
}

/// Builds the service for one invocation. An explicit `--input` goes through
/// the upload path so it replaces the configured default.
fn build_service(
    settings: &Settings,
    source: &SourceArgs,
    rows: Option<usize>,
) -> Result<AreaService> {
    let mut options = settings.read_options()?;
    if source.delimiter.is_some() {
        options.delimiter = source.delimiter;
    }
    if source.input_encoding.is_some() {
        options.encoding = source.input_encoding.clone();
    }
    let limits = ReportLimits {
        rows: rows.unwrap_or(settings.row_limit),
        suggestions: settings.suggestion_limit,
    };
    let store = DatasetStore::new(settings.default_source(), options.clone());
    let service = AreaService::new(store, limits);
    if let Some(input) = &source.input {
        let delimiter = io_utils::resolve_input_delimiter(Some(input.as_path()), options.delimiter);
        info!(
            "Loading '{}' (delimiter '{}')",
            input.display(),
            printable_delimiter(delimiter)
        );
        let rows = service
            .upload(&DatasetSource::Path(input.clone()))
            .with_context(|| format!("Loading dataset {input:?}"))?;
        debug!("Uploaded dataset holds {rows} row(s)");
    }
    Ok(service)
}

fn handle_query(settings: &Settings, args: &cli::QueryArgs) -> Result<()> {
    let service = build_service(settings, &args.source, args.rows)?;
    let raw = report::pick_area_param(args.area.as_deref(), args.areas.as_deref());
    let query_report = service.query(raw).map_err(report_failure)?;
    let payload = query_report.to_json()?;
    let rendered = if args.compact {
        serde_json::to_string(&payload)?
    } else {
        serde_json::to_string_pretty(&payload)?
    };
    println!("{rendered}");
    Ok(())
}

fn handle_export(settings: &Settings, args: &cli::ExportArgs) -> Result<()> {
    let service = build_service(settings, &args.source, None)?;
    let export = service.export(&args.area).map_err(report_failure)?;
    let target = args
        .output
        .clone()
        .unwrap_or_else(|| export.local_filename().into());
    if target == Path::new("-") {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&export.bytes)?;
        stdout.flush()?;
    } else {
        fs::write(&target, &export.bytes)
            .with_context(|| format!("Writing export to {target:?}"))?;
        info!("Wrote {} row(s) to {:?}", export.rows, target);
    }
    Ok(())
}

fn handle_areas(settings: &Settings, args: &cli::AreasArgs) -> Result<()> {
    let service = build_service(settings, &args.source, None)?;
    let snapshot = service.store().get_active()?;
    let limit = args.limit.unwrap_or(service.limits().suggestions);
    for area in snapshot.distinct_areas(limit) {
        println!("{area}");
    }
    Ok(())
}

fn handle_columns(settings: &Settings, args: &cli::ColumnsArgs) -> Result<()> {
    let service = build_service(settings, &args.source, None)?;
    let snapshot = service.store().get_active()?;
    let area = snapshot.area_column();
    println!("area column: {} ({})", area.column, area.rule);
    match snapshot.price_column() {
        Some(price) => println!("price column: {} ({})", price.column, price.rule),
        None => println!("price column: <none>"),
    }
    match snapshot.year_column() {
        Some(_) => println!("year column: {}", dataset::YEAR_COLUMN),
        None => println!("year column: <none>"),
    }
    println!("columns: {}", snapshot.headers().join(", "));
    Ok(())
}

/// Prints the caller-facing error body and converts the error for `main`.
fn report_failure(err: AreaError) -> anyhow::Error {
    println!("{}", err.payload());
    anyhow!("{err} (status {})", err.status_code())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
