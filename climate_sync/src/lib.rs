//! Climate dataset ingestion and reconciliation.
//!
//! Published climate datasets (a CSV payload plus a JSON document describing
//! its columns) are fetched through `climate_source`, normalized into regions,
//! indicator groups, indicators and yearly observations, and reconciled into
//! SQLite so that re-running an ingestion only writes what changed.
//!
//! - [`config`]: TOML dataset catalog
//! - [`region`] and [`indicator`]: identity resolution for dimension rows
//! - [`reconcile`]: want / read / diff / apply against the store
//! - [`ingest`]: one end-to-end run
//! - [`query`]: read-only views over stored data

pub mod config;
pub mod db;
pub mod indicator;
pub mod ingest;
pub mod models;
pub mod query;
pub mod reconcile;
pub mod region;
pub mod repo;
pub mod schema;
pub mod tz;
