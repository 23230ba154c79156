//! Diesel models mapping to the database schema.
//!
//! These types mirror the tables defined in the embedded migrations and in
//! [`crate::schema`]:
//! - [`crate::schema::region`]: geographic or aggregate entities, unique by code
//! - [`crate::schema::indicator_group`]: named categories of indicators
//! - [`crate::schema::indicator`]: one measured quantity, unique per group by key
//! - [`crate::schema::climate_data`]: one observation per (region, indicator, year)
//!
//! Dimension rows live in [`catalog`], observations in [`observation`].

pub mod catalog;
pub mod observation;

pub use catalog::{Indicator, IndicatorGroup, NewIndicator, NewIndicatorGroup, NewRegion, Region};
pub use observation::{
    ClimateData, ClimateValueUpdate, NewClimateData, ValidationError, YearBounds,
};
