//! Store-boundary writes.
//!
//! Dimension rows (groups, regions, indicators) are created with
//! insert-or-ignore on their natural key followed by a lookup, so a concurrent
//! run that created the row first yields the existing row instead of a unique
//! violation.
use diesel::prelude::*;
use diesel::{ExpressionMethods, RunQueryDsl, SqliteConnection, insert_into};

use crate::models::catalog::{
    Indicator, IndicatorGroup, NewIndicator, NewIndicatorGroup, Region,
};
use crate::models::observation::{ClimateValueUpdate, NewClimateData};
use crate::region::RegionIdentity;
use crate::schema::{climate_data, indicator, indicator_group, region};

/// Rows per multi-row INSERT. Five binds per row keeps each statement well
/// under SQLite's bind-variable limit.
pub const INSERT_CHUNK: usize = 1000;

/// Group by name, if stored.
pub fn find_group(conn: &mut SqliteConnection, name: &str) -> anyhow::Result<Option<IndicatorGroup>> {
    let g = indicator_group::table
        .filter(indicator_group::name.eq(name))
        .select(IndicatorGroup::as_select())
        .first(conn)
        .optional()?;
    Ok(g)
}

/// fetch-or-create indicator group
pub fn get_or_create_group(
    conn: &mut SqliteConnection,
    name: &str,
    description: &str,
) -> anyhow::Result<IndicatorGroup> {
    insert_into(indicator_group::table)
        .values(&NewIndicatorGroup { name, description })
        .on_conflict(indicator_group::name)
        .do_nothing()
        .execute(conn)?;
    let g = indicator_group::table
        .filter(indicator_group::name.eq(name))
        .select(IndicatorGroup::as_select())
        .first(conn)?;
    Ok(g)
}

/// fetch-or-create region by code. Classification is only written on create.
pub fn get_or_create_region(
    conn: &mut SqliteConnection,
    identity: &RegionIdentity,
) -> anyhow::Result<Region> {
    insert_into(region::table)
        .values(&identity.as_new())
        .on_conflict(region::code)
        .do_nothing()
        .execute(conn)?;
    let r = region::table
        .filter(region::code.eq(&identity.code))
        .select(Region::as_select())
        .first(conn)?;
    Ok(r)
}

/// fetch-or-create indicator by `(group_id, indicator_key)`.
pub fn get_or_create_indicator(
    conn: &mut SqliteConnection,
    new: &NewIndicator<'_>,
) -> anyhow::Result<Indicator> {
    insert_into(indicator::table)
        .values(new)
        .on_conflict((indicator::group_id, indicator::indicator_key))
        .do_nothing()
        .execute(conn)?;
    let ind = indicator::table
        .filter(indicator::group_id.eq(new.group_id))
        .filter(indicator::indicator_key.eq(new.indicator_key))
        .select(Indicator::as_select())
        .first(conn)?;
    Ok(ind)
}

/// Refresh an indicator's timestamp and the column it was last read from.
pub fn touch_indicator(
    conn: &mut SqliteConnection,
    id: i32,
    column_key: &str,
    fetched_at: &str,
) -> anyhow::Result<usize> {
    let n = diesel::update(indicator::table.find(id))
        .set((
            indicator::column_key.eq(column_key),
            indicator::fetched_at.eq(fetched_at),
        ))
        .execute(conn)?;
    Ok(n)
}

/// Multi-row insert in chunks of [`INSERT_CHUNK`].
pub fn insert_climate_data(
    conn: &mut SqliteConnection,
    rows: &[NewClimateData<'_>],
) -> anyhow::Result<usize> {
    let mut n = 0;
    for chunk in rows.chunks(INSERT_CHUNK) {
        n += insert_into(climate_data::table).values(chunk).execute(conn)?;
    }
    Ok(n)
}

/// Overwrite one observation's value and timestamp.
pub fn update_climate_value(
    conn: &mut SqliteConnection,
    id: i32,
    change: &ClimateValueUpdate<'_>,
) -> anyhow::Result<usize> {
    let n = diesel::update(climate_data::table.find(id))
        .set(change)
        .execute(conn)?;
    Ok(n)
}
