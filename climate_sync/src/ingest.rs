//! One ingestion run: fetch a configured dataset and reconcile it into the store.

use anyhow::Context;
use climate_source::models::FetchedDataset;
use climate_source::providers::DataSource;
use diesel::SqliteConnection;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::IngestConfig;
use crate::reconcile::{ReconcilePlan, SyncOptions, reconcile_dataset};
use crate::tz::now_rfc3339;

/// Options for one ingestion run.
#[derive(Debug, Clone, Copy, Default)]
pub struct IngestOptions {
    /// If true, compute the plan only.
    pub dry_run: bool,
}

/// Counts reported by a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub regions_created: usize,
    pub indicators_created: usize,
}

impl From<&ReconcilePlan> for RunSummary {
    fn from(plan: &ReconcilePlan) -> Self {
        Self {
            created: plan.to_create.len(),
            updated: plan.to_update.len(),
            unchanged: plan.unchanged,
            skipped: plan.skipped,
            regions_created: plan.regions_create.len(),
            indicators_created: plan.indicators_create.len(),
        }
    }
}

/// Fetch `dataset` through `source` and reconcile it.
///
/// Fetch failures are fatal and not retried. Row-level problems are skipped
/// and counted in the summary.
pub async fn ingest(
    conn: &mut SqliteConnection,
    source: &dyn DataSource,
    cfg: &IngestConfig,
    dataset: &str,
    opt: IngestOptions,
) -> anyhow::Result<RunSummary> {
    let fetched = fetch(source, cfg, dataset).await?;
    let plan = ingest_fetched(conn, cfg, dataset, &fetched, opt)?;
    Ok(RunSummary::from(&plan))
}

/// Fetch both documents of `dataset`.
pub async fn fetch(
    source: &dyn DataSource,
    cfg: &IngestConfig,
    dataset: &str,
) -> anyhow::Result<FetchedDataset> {
    let ds = cfg.dataset(dataset)?;
    let descriptor = ds.descriptor();
    info!(dataset, csv_url = %descriptor.csv_url, meta_url = %descriptor.meta_url, "fetching dataset");
    let fetched = source
        .fetch_dataset(&descriptor)
        .await
        .with_context(|| format!("fetch dataset {dataset}"))?;
    info!(
        dataset,
        rows = fetched.table.len(),
        described_columns = fetched.metadata.len(),
        "dataset fetched"
    );
    Ok(fetched)
}

/// Reconcile an already fetched dataset and return the plan that was
/// applied (or, for a dry run, would have been).
pub fn ingest_fetched(
    conn: &mut SqliteConnection,
    cfg: &IngestConfig,
    dataset: &str,
    fetched: &FetchedDataset,
    opt: IngestOptions,
) -> anyhow::Result<ReconcilePlan> {
    let ds = cfg.dataset(dataset)?;
    let fetched_at = now_rfc3339();
    let plan = reconcile_dataset(
        conn,
        ds,
        &cfg.year_bounds(),
        fetched,
        &fetched_at,
        SyncOptions {
            dry_run: opt.dry_run,
        },
    )
    .with_context(|| format!("reconcile dataset {dataset}"))?;

    let summary = RunSummary::from(&plan);
    if summary.skipped > 0 {
        warn!(dataset, skipped = summary.skipped, "rows or cells skipped during validation");
    }
    info!(
        dataset,
        created = summary.created,
        updated = summary.updated,
        unchanged = summary.unchanged,
        skipped = summary.skipped,
        regions_created = summary.regions_created,
        indicators_created = summary.indicators_created,
        dry_run = opt.dry_run,
        "ingestion finished"
    );
    Ok(plan)
}
