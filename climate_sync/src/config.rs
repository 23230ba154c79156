//! Ingestion configuration: parsing, normalization, and loading.
//!
//! This module defines a TOML-backed dataset catalog that describes:
//! - Datasets (lowercase names) and where their CSV and metadata documents live
//! - The indicator group each dataset populates
//! - Optional column allowlists restricting which CSV columns are ingested
//! - Configured indicators: a stable key plus every column name (current and
//!   historical) that feeds it
//! - The inclusive year range accepted for observations
//!
//! Key behaviors:
//! - Normalization lowercases and trims dataset names, trims every key and
//!   column name, and de-duplicates column lists while preserving order.
//! - A column may feed at most one configured indicator within a dataset.
//! - Columns with no configured indicator are keyed `v1:<column>`.
//!
//! Entrypoints:
//! - Parse + normalize from a TOML string: [`load_config_str`]
//! - Parse + normalize from a file path: [`load_config_path`]
//! - The catalog bundled with the crate: [`IngestConfig::builtin`]

use std::collections::{HashMap, HashSet};
use std::mem;

use anyhow::{Context, bail};
use climate_source::models::{
    CODE_COLUMN, ColumnMeta, DatasetMetadata, ENTITY_COLUMN, Header, SourceDescriptor, YEAR_COLUMN,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use toml::from_str;

use crate::models::observation::{DEFAULT_YEAR_MAX, DEFAULT_YEAR_MIN, YearBounds};

/// Dataset catalog shipped with the crate.
pub const BUILTIN_DATASETS: &str = include_str!("../datasets.toml");

/// Key of the global average temperature anomaly indicator.
pub const TEMPERATURE_GLOBAL_AVERAGE: &str = "temperature.global_average";
/// Key of the upper bound of the temperature anomaly confidence interval.
pub const TEMPERATURE_UPPER: &str = "temperature.upper";
/// Key of the lower bound of the temperature anomaly confidence interval.
pub const TEMPERATURE_LOWER: &str = "temperature.lower";
/// Key of the total CO₂ emissions indicator.
pub const CO2_EMISSIONS_TOTAL: &str = "co2.emissions_total";

/// Prefix of keys derived from an unconfigured column name. Bump it if the
/// derivation ever changes so old and new keys never collide.
pub const DERIVED_KEY_PREFIX: &str = "v1:";

fn default_year_min() -> i32 {
    DEFAULT_YEAR_MIN
}

fn default_year_max() -> i32 {
    DEFAULT_YEAR_MAX
}

/// Top-level configuration mapping dataset names to their definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IngestConfig {
    /// Earliest accepted observation year (inclusive).
    #[serde(default = "default_year_min")]
    pub year_min: i32,
    /// Latest accepted observation year (inclusive).
    #[serde(default = "default_year_max")]
    pub year_max: i32,
    /// Map of dataset name -> definition.
    ///
    /// Names are normalized (trimmed, lowercase) by [`normalize_config`].
    pub datasets: IndexMap<String, DatasetCfg>,
}

/// Indicator group a dataset writes into.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GroupCfg {
    /// Unique group name (e.g., "Temperature").
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// One published dataset.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetCfg {
    pub group: GroupCfg,
    /// CSV payload location.
    pub csv_url: String,
    /// Metadata document location.
    pub meta_url: String,
    /// Human-readable publisher name stored on each indicator.
    pub data_source_name: String,
    /// Publisher landing page. Defaults to `csv_url`.
    pub data_source_url: Option<String>,
    /// Optional allowlist of CSV columns to ingest. When absent, every column
    /// the metadata flags numeric (plus every configured alias) is ingested.
    pub columns: Option<Vec<String>>,
    /// Configured indicators.
    #[serde(default)]
    pub indicators: Vec<IndicatorCfg>,
}

/// A configured indicator: stable key plus the column names that feed it.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IndicatorCfg {
    /// Stable identity within the group (e.g., "temperature.upper").
    pub key: String,
    /// Column names, current and historical.
    pub columns: Vec<String>,
    /// Display name; takes precedence over the column's metadata titles.
    pub name: Option<String>,
    /// Unit used when the metadata gives none.
    pub unit: Option<String>,
    /// Description used when the metadata gives none.
    pub description: Option<String>,
}

/// Summary of changes performed during normalization.
///
/// All counters are additive for the processed configuration.
#[derive(Debug, Default, Serialize)]
pub struct NormalizationReport {
    /// Number of dataset names that changed when lowercasing/trimming.
    pub datasets_renamed: usize,
    /// Duplicate entries removed from column allowlists.
    pub allowlist_columns_deduped: usize,
    /// Duplicate column aliases removed from indicator definitions.
    pub indicator_columns_deduped: usize,
}

impl IngestConfig {
    /// The catalog bundled with the crate (`datasets.toml`), normalized.
    pub fn builtin() -> anyhow::Result<Self> {
        load_config_str(BUILTIN_DATASETS).context("built-in dataset catalog is invalid")
    }

    pub fn year_bounds(&self) -> YearBounds {
        YearBounds::new(self.year_min, self.year_max)
    }

    /// Look up a dataset by name (case-insensitive, surrounding whitespace ignored).
    pub fn dataset(&self, name: &str) -> anyhow::Result<&DatasetCfg> {
        let key = name.trim().to_lowercase();
        match self.datasets.get(&key) {
            Some(ds) => Ok(ds),
            None => {
                let known: Vec<&str> = self.datasets.keys().map(String::as_str).collect();
                bail!("unknown dataset '{key}' (configured: {})", known.join(", "))
            }
        }
    }
}

impl DatasetCfg {
    pub fn descriptor(&self) -> SourceDescriptor {
        SourceDescriptor {
            csv_url: self.csv_url.clone(),
            meta_url: self.meta_url.clone(),
        }
    }

    pub fn data_source_url(&self) -> &str {
        self.data_source_url.as_deref().unwrap_or(&self.csv_url)
    }

    /// The configured indicator fed by `column`, if any.
    pub fn indicator_for_column(&self, column: &str) -> Option<&IndicatorCfg> {
        self.indicators
            .iter()
            .find(|ind| ind.columns.iter().any(|c| c == column))
    }

    /// The configured indicator with `key`, if any.
    pub fn indicator(&self, key: &str) -> Option<&IndicatorCfg> {
        self.indicators.iter().find(|ind| ind.key == key)
    }

    /// Persisted identity for values read from `column`.
    pub fn indicator_key_for(&self, column: &str) -> String {
        match self.indicator_for_column(column) {
            Some(ind) => ind.key.clone(),
            None => format!("{DERIVED_KEY_PREFIX}{column}"),
        }
    }

    /// The CSV columns to ingest, in header order, each paired with its
    /// metadata (default metadata when the document does not describe it).
    ///
    /// When the header carries several aliases of one configured indicator,
    /// only the alias listed first in [`IndicatorCfg::columns`] is read; the
    /// others are returned as [`ShadowedColumn`]s.
    pub fn value_columns(&self, header: &Header, metadata: &DatasetMetadata) -> ValueColumns {
        let candidates: Vec<&str> = header
            .names()
            .filter(|name| ![ENTITY_COLUMN, CODE_COLUMN, YEAR_COLUMN].contains(name))
            .filter(|name| match &self.columns {
                Some(allow) => allow.iter().any(|c| c == name),
                None => {
                    metadata.column(name).is_some_and(ColumnMeta::is_numeric)
                        || self.indicator_for_column(name).is_some()
                }
            })
            .collect();

        let mut out = ValueColumns::default();
        for &name in &candidates {
            let preferred = self
                .indicator_for_column(name)
                .and_then(|ind| {
                    ind.columns
                        .iter()
                        .map(String::as_str)
                        .find(|alias| candidates.contains(alias))
                })
                .unwrap_or(name);
            if preferred == name {
                out.ingested.push((
                    name.to_string(),
                    metadata.column(name).cloned().unwrap_or_default(),
                ));
            } else {
                out.shadowed.push(ShadowedColumn {
                    column: name.to_string(),
                    read_instead: preferred.to_string(),
                });
            }
        }
        out
    }
}

/// Value columns selected from one CSV header.
#[derive(Debug, Clone, Default)]
pub struct ValueColumns {
    /// Columns read, in header order, with their metadata.
    pub ingested: Vec<(String, ColumnMeta)>,
    /// Columns present in the header but not read.
    pub shadowed: Vec<ShadowedColumn>,
}

/// An alias ignored because another alias of the same indicator is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowedColumn {
    pub column: String,
    /// The alias read for the indicator instead.
    pub read_instead: String,
}

fn trimmed_non_empty(value: &str, what: &str) -> anyhow::Result<String> {
    let v = value.trim();
    if v.is_empty() {
        bail!("{what} cannot be empty after trimming");
    }
    Ok(v.to_string())
}

/// Trim every entry, reject blanks, drop repeats keeping the first. Returns
/// the number of entries dropped.
fn dedupe_columns(list: &mut Vec<String>, what: &str) -> anyhow::Result<usize> {
    let before = list.len();
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(before);
    for col in mem::take(list) {
        let col = trimmed_non_empty(&col, what)?;
        if seen.insert(col.clone()) {
            out.push(col);
        }
    }
    *list = out;
    Ok(before - list.len())
}

/// Normalize a configuration in-place.
///
/// What normalization does:
/// - Lowercase + trim dataset names; reject empty and duplicate names
/// - Trim group names, URLs and source names; reject empty ones
/// - Trim and de-duplicate column allowlists and indicator aliases
/// - Reject duplicate indicator keys and columns claimed by two indicators
/// - Reject `year_min > year_max`
///
/// Returns a [`NormalizationReport`] detailing the changes made.
pub fn normalize_config(cfg: &mut IngestConfig) -> anyhow::Result<NormalizationReport> {
    let mut report = NormalizationReport::default();

    if cfg.year_min > cfg.year_max {
        bail!(
            "year_min ({}) must not exceed year_max ({})",
            cfg.year_min,
            cfg.year_max
        );
    }

    let mut rebuilt: IndexMap<String, DatasetCfg> = IndexMap::new();
    for (raw_name, mut ds) in mem::take(&mut cfg.datasets) {
        let name = raw_name.trim().to_lowercase();
        if name.is_empty() {
            bail!("dataset name cannot be empty after trimming");
        }
        if name != raw_name {
            report.datasets_renamed += 1;
        }
        if rebuilt.contains_key(&name) {
            bail!("duplicate dataset name after normalization: {name}");
        }

        ds.group.name = trimmed_non_empty(&ds.group.name, "group.name")?;
        ds.group.description = ds.group.description.trim().to_string();
        ds.csv_url = trimmed_non_empty(&ds.csv_url, "csv_url")?;
        ds.meta_url = trimmed_non_empty(&ds.meta_url, "meta_url")?;
        ds.data_source_name = ds.data_source_name.trim().to_string();
        ds.data_source_url = ds
            .data_source_url
            .take()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());

        if let Some(allow) = ds.columns.as_mut() {
            report.allowlist_columns_deduped += dedupe_columns(allow, "columns entry")?;
        }

        let mut keys = HashSet::new();
        let mut claimed: HashMap<String, String> = HashMap::new();
        for ind in &mut ds.indicators {
            ind.key = trimmed_non_empty(&ind.key, "indicator key")?;
            if !keys.insert(ind.key.clone()) {
                bail!("duplicate indicator key '{}' in dataset {name}", ind.key);
            }
            report.indicator_columns_deduped +=
                dedupe_columns(&mut ind.columns, "indicator column")?;
            if ind.columns.is_empty() {
                bail!("indicator '{}' in dataset {name} lists no columns", ind.key);
            }
            for col in &ind.columns {
                if let Some(other) = claimed.insert(col.clone(), ind.key.clone()) {
                    bail!(
                        "column '{col}' in dataset {name} feeds both '{other}' and '{}'",
                        ind.key
                    );
                }
            }
            ind.name = ind
                .name
                .take()
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty());
        }

        rebuilt.insert(name, ds);
    }

    cfg.datasets = rebuilt;
    Ok(report)
}

/// Parse and normalize a configuration from a TOML string.
///
/// Errors:
/// - TOML parse failures (including unknown fields)
/// - Normalization errors (see [`normalize_config`])
pub fn load_config_str(toml_str: &str) -> anyhow::Result<IngestConfig> {
    let mut cfg: IngestConfig = from_str(toml_str).context("failed to parse dataset config TOML")?;
    let report = normalize_config(&mut cfg).context("normalize_config failed")?;
    tracing::debug!(?report, datasets = cfg.datasets.len(), "dataset config normalized");
    Ok(cfg)
}

/// Read a configuration file from disk, parse, and normalize it.
pub fn load_config_path(path: impl AsRef<std::path::Path>) -> anyhow::Result<IngestConfig> {
    let text = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("read dataset config {}", path.as_ref().display()))?;
    load_config_str(&text)
}
