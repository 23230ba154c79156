//! Read-only views over the store, reshaped into nested per-region and
//! per-year payloads.
//!
//! Example (no_run)
//! ```no_run
//! use climate_sync::{db::connection::connect_sqlite, query};
//!
//! let mut conn = connect_sqlite("climate.db").unwrap();
//! let by_region = query::temperature_by_region(&mut conn, &query::TemperatureKeys::default()).unwrap();
//! for (region, years) in &by_region {
//!     println!("{region}: {} years", years.len());
//! }
//! ```

use std::collections::BTreeMap;

use diesel::prelude::*;
use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

use crate::config::{TEMPERATURE_GLOBAL_AVERAGE, TEMPERATURE_LOWER, TEMPERATURE_UPPER};
use crate::models::catalog::{Indicator, IndicatorGroup};
use crate::schema::{climate_data as cd, indicator, indicator_group, region};

/// Group name the built-in temperature dataset writes into.
pub const TEMPERATURE_GROUP: &str = "Temperature";

/// Message returned when the temperature view cannot find its three indicators.
pub const TEMPERATURE_NOT_FOUND: &str = "Not all temperature indicators found.";

/// Errors raised by query functions.
#[derive(Debug, Error)]
pub enum QueryError {
    /// An expected group or indicator does not exist.
    #[error("{0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
}

/// One value of one year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearValue {
    pub year: i32,
    pub value: f64,
}

/// One year of the temperature view. A field is absent when that indicator
/// has no value for the year.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct YearlyTemperature {
    pub year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lower: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_average: Option<f64>,
}

/// Indicator keys feeding [`temperature_by_region`].
#[derive(Debug, Clone)]
pub struct TemperatureKeys {
    pub group: String,
    pub upper: String,
    pub lower: String,
    pub global_average: String,
}

impl Default for TemperatureKeys {
    fn default() -> Self {
        Self {
            group: TEMPERATURE_GROUP.to_string(),
            upper: TEMPERATURE_UPPER.to_string(),
            lower: TEMPERATURE_LOWER.to_string(),
            global_average: TEMPERATURE_GLOBAL_AVERAGE.to_string(),
        }
    }
}

/// region name -> observations ordered by year
pub type SeriesByRegion = IndexMap<String, Vec<YearValue>>;
/// region name -> year -> indicator key -> value
pub type GroupSeries = IndexMap<String, BTreeMap<i32, BTreeMap<String, f64>>>;
/// region name -> temperature rows ordered by year
pub type TemperatureByRegion = IndexMap<String, Vec<YearlyTemperature>>;
/// year -> region code -> value
pub type ValuesByYear = BTreeMap<i32, BTreeMap<String, f64>>;

fn find_group(conn: &mut SqliteConnection, group: &str) -> Result<IndicatorGroup, QueryError> {
    indicator_group::table
        .filter(indicator_group::name.eq(group))
        .select(IndicatorGroup::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| QueryError::NotFound(format!("Indicator group '{group}' not found.")))
}

/// Indicator `key` of group `group`.
pub fn find_indicator(
    conn: &mut SqliteConnection,
    group: &str,
    key: &str,
) -> Result<Indicator, QueryError> {
    indicator::table
        .inner_join(indicator_group::table)
        .filter(indicator_group::name.eq(group))
        .filter(indicator::indicator_key.eq(key))
        .select(Indicator::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| QueryError::NotFound(format!("Indicator '{key}' not found in '{group}'.")))
}

/// One indicator's series per region, optionally limited to one region code.
pub fn indicator_series(
    conn: &mut SqliteConnection,
    group: &str,
    key: &str,
    region_code: Option<&str>,
) -> Result<SeriesByRegion, QueryError> {
    let ind = find_indicator(conn, group, key)?;

    let mut q = cd::table
        .inner_join(region::table)
        .filter(cd::indicator_id.eq(ind.id))
        .select((region::name, cd::year, cd::value))
        .order((region::name.asc(), cd::year.asc()))
        .into_boxed();
    if let Some(code) = region_code {
        q = q.filter(region::code.eq(code.trim().to_ascii_uppercase()));
    }
    let rows: Vec<(String, i32, f64)> = q.load(conn)?;

    let mut out = SeriesByRegion::new();
    for (name, year, value) in rows {
        out.entry(name).or_default().push(YearValue { year, value });
    }
    Ok(out)
}

/// Every indicator of a group, nested by region and year.
pub fn group_series(conn: &mut SqliteConnection, group: &str) -> Result<GroupSeries, QueryError> {
    let g = find_group(conn, group)?;

    let rows: Vec<(String, i32, String, f64)> = cd::table
        .inner_join(region::table)
        .inner_join(indicator::table)
        .filter(indicator::group_id.eq(g.id))
        .select((region::name, cd::year, indicator::indicator_key, cd::value))
        .order((region::name.asc(), cd::year.asc()))
        .load(conn)?;

    let mut out = GroupSeries::new();
    for (name, year, key, value) in rows {
        out.entry(name)
            .or_default()
            .entry(year)
            .or_default()
            .insert(key, value);
    }
    Ok(out)
}

/// The temperature view: upper, lower and global average per region and year.
///
/// Errors with [`QueryError::NotFound`] carrying [`TEMPERATURE_NOT_FOUND`]
/// unless all three indicators exist.
pub fn temperature_by_region(
    conn: &mut SqliteConnection,
    keys: &TemperatureKeys,
) -> Result<TemperatureByRegion, QueryError> {
    let wanted = [
        keys.upper.as_str(),
        keys.lower.as_str(),
        keys.global_average.as_str(),
    ];
    let found: Vec<(i32, String)> = indicator::table
        .inner_join(indicator_group::table)
        .filter(indicator_group::name.eq(&keys.group))
        .filter(indicator::indicator_key.eq_any(wanted))
        .select((indicator::id, indicator::indicator_key))
        .load(conn)?;
    if found.len() != wanted.len() {
        return Err(QueryError::NotFound(TEMPERATURE_NOT_FOUND.to_string()));
    }
    let ids: Vec<i32> = found.iter().map(|(id, _)| *id).collect();
    let key_of: BTreeMap<i32, String> = found.into_iter().collect();

    let rows: Vec<(String, i32, i32, f64)> = cd::table
        .inner_join(region::table)
        .filter(cd::indicator_id.eq_any(&ids))
        .select((region::name, cd::indicator_id, cd::year, cd::value))
        .order((region::name.asc(), cd::year.asc()))
        .load(conn)?;

    let mut by_region: IndexMap<String, BTreeMap<i32, YearlyTemperature>> = IndexMap::new();
    for (name, indicator_id, year, value) in rows {
        let entry = by_region
            .entry(name)
            .or_default()
            .entry(year)
            .or_insert_with(|| YearlyTemperature {
                year,
                ..Default::default()
            });
        match key_of.get(&indicator_id) {
            Some(k) if *k == keys.upper => entry.upper = Some(value),
            Some(k) if *k == keys.lower => entry.lower = Some(value),
            Some(_) => entry.global_average = Some(value),
            None => {}
        }
    }

    Ok(by_region
        .into_iter()
        .map(|(name, years)| (name, years.into_values().collect()))
        .collect())
}

/// One indicator as year -> region code -> value.
pub fn values_by_year(
    conn: &mut SqliteConnection,
    group: &str,
    key: &str,
) -> Result<ValuesByYear, QueryError> {
    let ind = find_indicator(conn, group, key)?;

    let rows: Vec<(i32, String, f64)> = cd::table
        .inner_join(region::table)
        .filter(cd::indicator_id.eq(ind.id))
        .select((cd::year, region::code, cd::value))
        .load(conn)?;

    let mut out = ValuesByYear::new();
    for (year, code, value) in rows {
        out.entry(year).or_default().insert(code, value);
    }
    Ok(out)
}
