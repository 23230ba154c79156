use std::collections::{BTreeSet, HashMap};

use diesel::prelude::*;

use crate::reconcile::{
    RunCache,
    want::{ObservationKey, Wanted},
};

/// Stored observations overlapping a [`Wanted`] set: key -> `(row id, value)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Current {
    pub values: HashMap<ObservationKey, (i32, f64)>,
}

/// One bulk read of existing observations, scoped to the indicators, years
/// and regions present in `wanted`. Dimensions that are not stored yet cannot
/// have observations, so they are left out of the filter; when any of the
/// three sets is empty the query is skipped entirely.
pub fn read_current(
    conn: &mut SqliteConnection,
    wanted: &Wanted,
    cache: &RunCache,
) -> anyhow::Result<Current> {
    use crate::schema::{climate_data as cd, indicator, region};

    let codes: BTreeSet<&String> = wanted.values.keys().map(|(c, _, _)| c).collect();
    let keys: BTreeSet<&String> = wanted.values.keys().map(|(_, k, _)| k).collect();
    let years: BTreeSet<i32> = wanted.values.keys().map(|(_, _, y)| *y).collect();

    let region_ids = cache.regions.stored_ids(codes);
    let indicator_ids = cache.indicators.stored_ids(keys);
    if region_ids.is_empty() || indicator_ids.is_empty() || years.is_empty() {
        return Ok(Current::default());
    }
    let years: Vec<i32> = years.into_iter().collect();

    let rows = cd::table
        .inner_join(region::table)
        .inner_join(indicator::table)
        .filter(cd::indicator_id.eq_any(&indicator_ids))
        .filter(cd::year.eq_any(&years))
        .filter(cd::region_id.eq_any(&region_ids))
        .select((
            cd::id,
            region::code,
            indicator::indicator_key,
            cd::year,
            cd::value,
        ))
        .load::<(i32, String, String, i32, f64)>(conn)?;

    let values = rows
        .into_iter()
        .map(|(id, code, key, year, value)| ((code, key, year), (id, value)))
        .collect();
    Ok(Current { values })
}
