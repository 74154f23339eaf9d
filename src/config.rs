//! Runtime settings.
//!
//! Values come from built-in defaults, optionally overlaid by a YAML file, then
//! by the `AREA_LENS_DATASET` environment variable. Command-line flags are
//! applied last by the command handlers. Without a configured dataset the
//! sample compiled into the binary is used, so lookups work from any directory.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    cli::parse_delimiter,
    dataset::{DatasetSource, ReadOptions},
};

pub const DATASET_ENV: &str = "AREA_LENS_DATASET";
pub const BUNDLED_DATASET_NAME: &str = "sample.csv";
pub const BUNDLED_DATASET: &[u8] = include_bytes!("../data/sample.csv");
pub const DEFAULT_ROW_LIMIT: usize = 200;
pub const DEFAULT_SUGGESTION_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Dataset read when nothing has been loaded explicitly; `None` selects
    /// the bundled sample.
    pub dataset: Option<PathBuf>,
    /// Maximum rows echoed back in a query response.
    pub row_limit: usize,
    /// Maximum suggestions attached to an empty query result.
    pub suggestion_limit: usize,
    pub delimiter: Option<String>,
    pub encoding: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dataset: None,
            row_limit: DEFAULT_ROW_LIMIT,
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
            delimiter: None,
            encoding: None,
        }
    }
}

impl Settings {
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            fs::read_to_string(path).with_context(|| format!("Reading config file {path:?}"))?;
        Self::from_yaml_str(&raw).with_context(|| format!("Parsing config file {path:?}"))
    }

    /// Defaults or `config`, then environment overrides.
    pub fn resolve(config: Option<&Path>) -> Result<Self> {
        let mut settings = match config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok());
        Ok(settings)
    }

    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dataset) = lookup(DATASET_ENV).filter(|v| !v.trim().is_empty()) {
            self.dataset = Some(PathBuf::from(dataset));
        }
    }

    pub fn default_source(&self) -> DatasetSource {
        match &self.dataset {
            Some(path) => DatasetSource::Path(path.clone()),
            None => DatasetSource::Bytes {
                name: Some(BUNDLED_DATASET_NAME.to_string()),
                bytes: BUNDLED_DATASET.to_vec(),
            },
        }
    }

    pub fn read_options(&self) -> Result<ReadOptions> {
        let delimiter = self
            .delimiter
            .as_deref()
            .map(parse_delimiter)
            .transpose()
            .map_err(anyhow::Error::msg)
            .context("Invalid delimiter in settings")?;
        Ok(ReadOptions {
            format: None,
            delimiter,
            encoding: self.encoding.clone(),
        })
    }
}
