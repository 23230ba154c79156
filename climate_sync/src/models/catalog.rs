//! Dimension rows shared by many observations.
//!
//! Example (no_run)
//! ```no_run
//! use climate_sync::models::catalog::*;
//! use climate_sync::schema;
//! use diesel::prelude::*;
//!
//! fn seed(conn: &mut SqliteConnection) -> diesel::QueryResult<()> {
//!     diesel::insert_into(schema::region::table)
//!         .values(NewRegion {
//!             name: "Japan",
//!             code: "JPN",
//!             code_type: "iso",
//!             region_type: "country",
//!         })
//!         .execute(conn)?;
//!     diesel::insert_into(schema::indicator_group::table)
//!         .values(NewIndicatorGroup { name: "CO₂ Emissions", description: "Carbon dioxide emissions" })
//!         .execute(conn)?;
//!     Ok(())
//! }
//! ```

use diesel::prelude::*;
use serde::Serialize;

// ----------------------- region -------------------------

/// A row in [`crate::schema::region`].
///
/// `code_type` is one of "iso" | "owid" | "auto"; `region_type` one of
/// "country" | "continent" | "aggregate" | "unknown". Both are fixed at
/// creation time.
#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Selectable, Serialize)]
#[diesel(table_name = crate::schema::region, check_for_backend(diesel::sqlite::Sqlite))]
pub struct Region {
    /// Database primary key.
    pub id: i32,
    /// Display name as published by the source (e.g., "Japan").
    pub name: String,
    /// Unique code (e.g., "JPN", "OWID_WRL", "AUTO_AFRICA_1A2B3C").
    pub code: String,
    /// Code classification.
    pub code_type: String,
    /// Region classification.
    pub region_type: String,
}

/// Insertable form of [`Region`].
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::region)]
pub struct NewRegion<'a> {
    pub name: &'a str,
    pub code: &'a str,
    pub code_type: &'a str,
    pub region_type: &'a str,
}

// ------------------- indicator_group --------------------

/// A row in [`crate::schema::indicator_group`]. Unique by `name`.
#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Selectable, Serialize)]
#[diesel(table_name = crate::schema::indicator_group, check_for_backend(diesel::sqlite::Sqlite))]
pub struct IndicatorGroup {
    pub id: i32,
    /// Group name (e.g., "Temperature").
    pub name: String,
    pub description: String,
}

/// Insertable form of [`IndicatorGroup`].
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::indicator_group)]
pub struct NewIndicatorGroup<'a> {
    pub name: &'a str,
    pub description: &'a str,
}

// ----------------------- indicator ----------------------

/// A row in [`crate::schema::indicator`].
///
/// Looked up by `(group_id, indicator_key)`. `column_key` records the dataset
/// column the values were last read from and is never used for lookup.
#[derive(
    Debug, Clone, PartialEq, Queryable, Identifiable, Associations, Selectable, Serialize,
)]
#[diesel(table_name = crate::schema::indicator, check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(belongs_to(IndicatorGroup, foreign_key = group_id))]
pub struct Indicator {
    pub id: i32,
    /// FK to [`IndicatorGroup::id`].
    pub group_id: i32,
    /// Stable identity within the group (e.g., "temperature.upper", "v1:emissions_total").
    pub indicator_key: String,
    /// Display name, usually the column's short title.
    pub name: String,
    /// Dataset column key last seen for this indicator (provenance).
    pub column_key: String,
    pub unit: String,
    pub description: String,
    pub data_source_name: String,
    pub data_source_url: String,
    pub metadata_url: Option<String>,
    /// Last write touching this indicator, RFC3339 UTC.
    pub fetched_at: String,
}

/// Insertable form of [`Indicator`].
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::indicator)]
pub struct NewIndicator<'a> {
    pub group_id: i32,
    pub indicator_key: &'a str,
    pub name: &'a str,
    pub column_key: &'a str,
    pub unit: &'a str,
    pub description: &'a str,
    pub data_source_name: &'a str,
    pub data_source_url: &'a str,
    pub metadata_url: Option<&'a str>,
    pub fetched_at: &'a str,
}
