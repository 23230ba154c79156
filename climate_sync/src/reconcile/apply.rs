use std::collections::BTreeSet;

use anyhow::Context;
use diesel::prelude::*;
use tracing::debug;

use crate::config::GroupCfg;
use crate::models::catalog::IndicatorGroup;
use crate::models::observation::{ClimateValueUpdate, NewClimateData};
use crate::reconcile::{RunCache, diff::ReconcilePlan};
use crate::repo::{
    get_or_create_group, get_or_create_indicator, get_or_create_region, insert_climate_data,
    touch_indicator, update_climate_value,
};

/// Apply the plan inside the current transaction.
/// Note: dimension rows are created first so observations can reference them.
pub fn apply_plan(
    conn: &mut SqliteConnection,
    plan: &ReconcilePlan,
    group: &GroupCfg,
    cache: &mut RunCache,
    fetched_at: &str,
) -> anyhow::Result<IndicatorGroup> {
    let g = get_or_create_group(conn, &group.name, &group.description)?;

    for identity in &plan.regions_create {
        let region = get_or_create_region(conn, identity)?;
        cache.regions.insert(region);
    }
    for spec in &plan.indicators_create {
        let ind = get_or_create_indicator(conn, &spec.as_new(g.id, fetched_at))?;
        cache.indicators.insert(ind);
    }

    let mut rows = Vec::with_capacity(plan.to_create.len());
    for o in &plan.to_create {
        let region_id = cache
            .regions
            .id_of(&o.region_code)
            .with_context(|| format!("region {} has no id after creation", o.region_code))?;
        let indicator_id = cache
            .indicators
            .id_of(&o.indicator_key)
            .with_context(|| format!("indicator {} has no id after creation", o.indicator_key))?;
        rows.push(NewClimateData {
            region_id,
            indicator_id,
            year: o.year,
            value: o.value,
            fetched_at,
        });
    }
    let inserted = insert_climate_data(conn, &rows)?;
    debug!(inserted, "observations inserted");

    for c in &plan.to_update {
        update_climate_value(
            conn,
            c.id,
            &ClimateValueUpdate {
                value: c.new,
                fetched_at,
            },
        )?;
    }

    let touched: BTreeSet<&String> = plan
        .to_create
        .iter()
        .map(|o| &o.indicator_key)
        .chain(plan.to_update.iter().map(|c| &c.indicator_key))
        .collect();
    for key in touched {
        let Some(ind) = cache.indicators.get(key) else {
            continue;
        };
        let column = cache.indicators.column_of(key).unwrap_or(ind.column_key.as_str());
        touch_indicator(conn, ind.id, column, fetched_at)?;
    }

    Ok(g)
}
