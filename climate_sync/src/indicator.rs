//! Indicator identity: mapping dataset columns onto stable indicator rows.
//!
//! Columns are looked up by their *indicator key*, never by the raw column
//! name: configured columns use the key from the dataset config (which lists
//! every historical column name), anything else gets `v1:<column>`. An
//! upstream rename therefore keeps writing into the same indicator as long
//! as the new column name is added to the config.

use std::collections::HashMap;

use climate_source::models::ColumnMeta;
use diesel::prelude::*;
use indexmap::IndexMap;

use crate::config::DatasetCfg;
use crate::models::catalog::{Indicator, NewIndicator};

/// Everything needed to create an indicator row, derived from config and
/// column metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorSpec {
    pub indicator_key: String,
    pub name: String,
    pub column_key: String,
    pub unit: String,
    pub description: String,
    pub data_source_name: String,
    pub data_source_url: String,
    pub metadata_url: Option<String>,
}

fn first_present<'a>(candidates: impl IntoIterator<Item = Option<&'a str>>) -> Option<&'a str> {
    candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
}

impl IndicatorSpec {
    /// Build the row for `column` of dataset `ds`.
    ///
    /// Field precedence:
    /// - name: configured name, `titleShort`, `title`, then the column key
    /// - unit: `unit`, `shortUnit`, configured unit, else empty
    /// - description: `descriptionShort`, `description`, configured description, else empty
    /// - metadata URL: `fullMetadata`, else the dataset's metadata document
    pub fn from_column(ds: &DatasetCfg, column: &str, meta: &ColumnMeta) -> Self {
        let cfg = ds.indicator_for_column(column);
        let name = first_present([
            cfg.and_then(|c| c.name.as_deref()),
            meta.title_short.as_deref(),
            meta.title.as_deref(),
        ])
        .unwrap_or(column);
        let unit = first_present([
            meta.unit.as_deref(),
            meta.short_unit.as_deref(),
            cfg.and_then(|c| c.unit.as_deref()),
        ])
        .unwrap_or_default();
        let description = first_present([
            meta.description_short.as_deref(),
            meta.description.as_deref(),
            cfg.and_then(|c| c.description.as_deref()),
        ])
        .unwrap_or_default();
        let metadata_url = first_present([meta.full_metadata.as_deref(), Some(ds.meta_url.as_str())]);

        Self {
            indicator_key: ds.indicator_key_for(column),
            name: name.to_string(),
            column_key: column.to_string(),
            unit: unit.to_string(),
            description: description.to_string(),
            data_source_name: ds.data_source_name.clone(),
            data_source_url: ds.data_source_url().to_string(),
            metadata_url: metadata_url.map(str::to_string),
        }
    }

    pub fn as_new<'a>(&'a self, group_id: i32, fetched_at: &'a str) -> NewIndicator<'a> {
        NewIndicator {
            group_id,
            indicator_key: &self.indicator_key,
            name: &self.name,
            column_key: &self.column_key,
            unit: &self.unit,
            description: &self.description,
            data_source_name: &self.data_source_name,
            data_source_url: &self.data_source_url,
            metadata_url: self.metadata_url.as_deref(),
            fetched_at,
        }
    }
}

/// Indicators of one group known to an ingestion run, keyed by indicator key.
#[derive(Debug, Default)]
pub struct IndicatorCache {
    stored: HashMap<String, Indicator>,
    pending: IndexMap<String, IndicatorSpec>,
    /// indicator key -> column last read for it this run
    columns: IndexMap<String, String>,
}

impl IndicatorCache {
    /// Read every indicator of `group_id`. A group that does not exist yet
    /// has no indicators.
    pub fn load(conn: &mut SqliteConnection, group_id: Option<i32>) -> QueryResult<Self> {
        use crate::schema::indicator::dsl as i;
        let Some(gid) = group_id else {
            return Ok(Self::default());
        };
        let rows: Vec<Indicator> = i::indicator
            .filter(i::group_id.eq(gid))
            .select(Indicator::as_select())
            .load(conn)?;
        Ok(Self::from_indicators(rows))
    }

    pub fn from_indicators(rows: impl IntoIterator<Item = Indicator>) -> Self {
        Self {
            stored: rows
                .into_iter()
                .map(|ind| (ind.indicator_key.clone(), ind))
                .collect(),
            ..Default::default()
        }
    }

    /// Resolve `column` to its indicator key, registering a pending
    /// indicator on first sight of an unknown key.
    pub fn resolve(&mut self, ds: &DatasetCfg, column: &str, meta: &ColumnMeta) -> String {
        let key = ds.indicator_key_for(column);
        if !self.stored.contains_key(&key) && !self.pending.contains_key(&key) {
            let spec = IndicatorSpec::from_column(ds, column, meta);
            tracing::debug!(key = %key, column, name = %spec.name, "new indicator");
            self.pending.insert(key.clone(), spec);
        }
        match self.stored.get(&key) {
            Some(stored) if stored.column_key != column => {
                tracing::info!(key = %key, from = %stored.column_key, to = column, "indicator column renamed upstream");
            }
            _ => {}
        }
        self.columns.insert(key.clone(), column.to_string());
        key
    }

    pub fn get(&self, key: &str) -> Option<&Indicator> {
        self.stored.get(key)
    }

    /// Primary key of a stored indicator.
    pub fn id_of(&self, key: &str) -> Option<i32> {
        self.stored.get(key).map(|ind| ind.id)
    }

    /// Column last read for `key` during this run.
    pub fn column_of(&self, key: &str) -> Option<&str> {
        self.columns.get(key).map(String::as_str)
    }

    pub fn pending(&self) -> impl Iterator<Item = &IndicatorSpec> {
        self.pending.values()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Record a stored row, clearing its pending entry.
    pub fn insert(&mut self, ind: Indicator) {
        self.pending.shift_remove(&ind.indicator_key);
        self.stored.insert(ind.indicator_key.clone(), ind);
    }

    /// Ids of stored indicators among `keys`.
    pub fn stored_ids<'a>(&self, keys: impl IntoIterator<Item = &'a String>) -> Vec<i32> {
        keys.into_iter().filter_map(|k| self.id_of(k)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_str;

    const CFG: &str = r#"
        [datasets.t]
        csv_url = "https://example.org/t.csv"
        meta_url = "https://example.org/t.json"
        data_source_name = "Example"
        [datasets.t.group]
        name = "T"
        [[datasets.t.indicators]]
        key = "t.upper"
        columns = ["upper", "upper_v2"]
        name = "Upper bound"
        unit = "°C"
    "#;

    fn ds() -> DatasetCfg {
        load_config_str(CFG).unwrap().datasets["t"].clone()
    }

    fn stored(key: &str, column: &str) -> Indicator {
        Indicator {
            id: 3,
            group_id: 1,
            indicator_key: key.into(),
            name: "Upper bound".into(),
            column_key: column.into(),
            unit: "°C".into(),
            description: String::new(),
            data_source_name: "Example".into(),
            data_source_url: "https://example.org/t.csv".into(),
            metadata_url: None,
            fetched_at: "2025-01-01T00:00:00.000Z".into(),
        }
    }

    #[test]
    fn metadata_fallbacks() {
        let meta = ColumnMeta {
            title: Some("Mean anomaly".into()),
            short_unit: Some("°C".into()),
            description: Some("Long description".into()),
            ..Default::default()
        };
        let spec = IndicatorSpec::from_column(&ds(), "mean", &meta);
        assert_eq!(spec.indicator_key, "v1:mean");
        assert_eq!(spec.name, "Mean anomaly");
        assert_eq!(spec.unit, "°C");
        assert_eq!(spec.description, "Long description");
        assert_eq!(spec.metadata_url.as_deref(), Some("https://example.org/t.json"));
        assert_eq!(spec.data_source_url, "https://example.org/t.csv");
    }

    #[test]
    fn missing_metadata_defaults_to_empty() {
        let spec = IndicatorSpec::from_column(&ds(), "bare", &ColumnMeta::default());
        assert_eq!(spec.name, "bare");
        assert_eq!(spec.unit, "");
        assert_eq!(spec.description, "");
    }

    #[test]
    fn configured_name_wins_and_metadata_unit_wins() {
        let meta = ColumnMeta {
            title_short: Some("Upper".into()),
            unit: Some("K".into()),
            full_metadata: Some("https://example.org/upper".into()),
            ..Default::default()
        };
        let spec = IndicatorSpec::from_column(&ds(), "upper_v2", &meta);
        assert_eq!(spec.indicator_key, "t.upper");
        assert_eq!(spec.name, "Upper bound");
        assert_eq!(spec.unit, "K");
        assert_eq!(spec.column_key, "upper_v2");
        assert_eq!(spec.metadata_url.as_deref(), Some("https://example.org/upper"));
    }

    #[test]
    fn renamed_column_reuses_stored_indicator() {
        let mut cache = IndicatorCache::from_indicators([stored("t.upper", "upper")]);
        let key = cache.resolve(&ds(), "upper_v2", &ColumnMeta::default());
        assert_eq!(key, "t.upper");
        assert_eq!(cache.id_of(&key), Some(3));
        assert_eq!(cache.pending_len(), 0);
        assert_eq!(cache.column_of(&key), Some("upper_v2"));
    }

    #[test]
    fn unknown_column_pends_once() {
        let mut cache = IndicatorCache::default();
        let a = cache.resolve(&ds(), "mean", &ColumnMeta::default());
        let b = cache.resolve(&ds(), "mean", &ColumnMeta::default());
        assert_eq!(a, b);
        assert_eq!(cache.pending_len(), 1);
        assert_eq!(cache.id_of(&a), None);
    }
}
