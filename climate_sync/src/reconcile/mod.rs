//! Reconciliation of a fetched dataset against the store.
//!
//! ## What this does
//! - Validates every CSV row and resolves its region and indicators
//!   (**want**), dropping bad rows and cells with a warning.
//! - Reads the stored observations for the same regions, indicators and years
//!   in one query (**read**).
//! - Partitions the wanted observations into creates, updates and no-ops
//!   (**diff**), producing a [`ReconcilePlan`].
//! - Writes the plan (**apply**): missing dimension rows, a chunked bulk
//!   insert, per-row value updates, and a `fetched_at` refresh of touched
//!   indicators.
//!
//! ## Transactions & consistency
//! Everything, reads included, runs inside a single **`BEGIN IMMEDIATE`**
//! transaction via `SqliteConnection::immediate_transaction`, so a concurrent
//! run cannot slip rows in between the read and the write, and the run either
//! applies its whole plan or none of it.
//!
//! ## Dry-run
//! When `SyncOptions::dry_run` is `true`, the plan is computed and returned but
//! nothing is written. Callers can pretty-print it.

pub mod apply;
pub mod diff;
pub mod read;
pub mod want;

use climate_source::models::FetchedDataset;
use diesel::SqliteConnection;
use diesel::prelude::*;
use tracing::info;

use crate::config::DatasetCfg;
use crate::indicator::IndicatorCache;
use crate::models::catalog::IndicatorGroup;
use crate::models::observation::YearBounds;
use crate::region::RegionCache;
use crate::repo::find_group;

pub use diff::{Observation, ReconcilePlan, ValueChange, make_plan};
pub use read::{Current, read_current};
pub use want::{ObservationKey, Wanted, wanted_from_table};

/// Options for one reconciliation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// If true, compute the plan only.
    pub dry_run: bool,
}

/// Dimension rows known to one run, loaded up front by bulk reads. No state
/// outlives the run.
#[derive(Debug, Default)]
pub struct RunCache {
    pub group: Option<IndicatorGroup>,
    pub regions: RegionCache,
    pub indicators: IndicatorCache,
}

impl RunCache {
    /// One read per table: the group by name, all regions, and the group's
    /// indicators.
    pub fn load(conn: &mut SqliteConnection, group_name: &str) -> anyhow::Result<Self> {
        let group = find_group(conn, group_name)?;
        let regions = RegionCache::load(conn)?;
        let indicators = IndicatorCache::load(conn, group.as_ref().map(|g| g.id))?;
        Ok(Self {
            group,
            regions,
            indicators,
        })
    }
}

/// Reconcile a fetched dataset into the store.
///
/// - Loads a [`RunCache`], builds the wanted set, reads current values, and
///   computes a [`ReconcilePlan`].
/// - Unless `opt.dry_run`, applies the plan stamping every written row with
///   `fetched_at`.
/// - Runs in a single immediate transaction to reduce SQLITE_BUSY surprises.
pub fn reconcile_dataset(
    conn: &mut SqliteConnection,
    ds: &DatasetCfg,
    bounds: &YearBounds,
    fetched: &FetchedDataset,
    fetched_at: &str,
    opt: SyncOptions,
) -> anyhow::Result<ReconcilePlan> {
    let columns = ds.value_columns(fetched.table.header(), &fetched.metadata);
    info!(
        rows = fetched.table.len(),
        columns = columns.ingested.len(),
        shadowed = columns.shadowed.len(),
        group = %ds.group.name,
        "reconciling dataset"
    );

    conn.immediate_transaction::<_, anyhow::Error, _>(|conn| {
        let mut cache = RunCache::load(conn, &ds.group.name)?;
        let wanted = wanted_from_table(&fetched.table, &columns, ds, bounds, &mut cache);
        let current = read_current(conn, &wanted, &cache)?;
        let plan = make_plan(&wanted, &current, &cache);

        info!(
            create = plan.to_create.len(),
            update = plan.to_update.len(),
            unchanged = plan.unchanged,
            skipped = plan.skipped,
            new_regions = plan.regions_create.len(),
            new_indicators = plan.indicators_create.len(),
            dry_run = opt.dry_run,
            "reconcile plan computed"
        );

        if !opt.dry_run {
            let group = apply::apply_plan(conn, &plan, &ds.group, &mut cache, fetched_at)?;
            cache.group = Some(group);
        }
        Ok(plan)
    })
}
