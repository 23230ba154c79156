//! Observation rows and their validation rules.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::catalog::{Indicator, Region};

/// Lowest year accepted by default.
pub const DEFAULT_YEAR_MIN: i32 = 1800;
/// Highest year accepted by default.
pub const DEFAULT_YEAR_MAX: i32 = 2200;

/// Validation failures for a single observation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("year {year} is outside the accepted range [{min}, {max}]")]
    YearOutOfRange { year: i32, min: i32, max: i32 },
}

/// Inclusive range of plausible observation years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearBounds {
    pub min: i32,
    pub max: i32,
}

impl Default for YearBounds {
    fn default() -> Self {
        Self {
            min: DEFAULT_YEAR_MIN,
            max: DEFAULT_YEAR_MAX,
        }
    }
}

impl YearBounds {
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.min..=self.max).contains(&year)
    }

    /// Returns `year` unchanged when it lies within the bounds.
    pub fn check(&self, year: i32) -> Result<i32, ValidationError> {
        if self.contains(year) {
            Ok(year)
        } else {
            Err(ValidationError::YearOutOfRange {
                year,
                min: self.min,
                max: self.max,
            })
        }
    }
}

/// A row in [`crate::schema::climate_data`]. Unique per
/// `(region_id, indicator_id, year)`.
#[derive(
    Debug, Clone, PartialEq, Queryable, Identifiable, Associations, Selectable, Serialize,
)]
#[diesel(table_name = crate::schema::climate_data, check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(belongs_to(Region))]
#[diesel(belongs_to(Indicator))]
pub struct ClimateData {
    pub id: i32,
    pub region_id: i32,
    pub indicator_id: i32,
    pub year: i32,
    pub value: f64,
    /// Last write of `value`, RFC3339 UTC.
    pub fetched_at: String,
}

/// Insertable form of [`ClimateData`].
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::climate_data)]
pub struct NewClimateData<'a> {
    pub region_id: i32,
    pub indicator_id: i32,
    pub year: i32,
    pub value: f64,
    pub fetched_at: &'a str,
}

/// Changeset for the only columns an ingestion run ever updates.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = crate::schema::climate_data)]
pub struct ClimateValueUpdate<'a> {
    pub value: f64,
    pub fetched_at: &'a str,
}
