use std::collections::BTreeMap;

use climate_source::models::{CsvTable, RawRow};
use tracing::{debug, warn};

use crate::config::{DatasetCfg, ValueColumns};
use crate::models::observation::YearBounds;
use crate::reconcile::RunCache;

/// `(region code, indicator key, year)`: the natural key of an observation.
pub type ObservationKey = (String, String, i32);

/// Cell values treated as "no observation".
pub const MISSING_SENTINELS: [&str; 3] = ["", "NaN", "nan"];

/// Observations a payload asks for, after validation and de-duplication.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Wanted {
    pub values: BTreeMap<ObservationKey, f64>,
    /// Rows dropped whole (bad year, no entity).
    pub skipped_rows: usize,
    /// Individual cells dropped (missing or unparseable value, or a value in
    /// a shadowed alias column).
    pub skipped_cells: usize,
    /// Repeated keys collapsed onto the last value.
    pub duplicates: usize,
}

impl Wanted {
    pub fn skipped(&self) -> usize {
        self.skipped_rows + self.skipped_cells
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Why a value cell was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellSkip {
    /// Missing-data sentinel.
    Missing,
    /// Not a number, or not finite.
    Invalid,
}

/// Parse one value cell.
pub fn parse_value(raw: &str) -> Result<f64, CellSkip> {
    let raw = raw.trim();
    if MISSING_SENTINELS.contains(&raw) {
        return Err(CellSkip::Missing);
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(CellSkip::Invalid),
    }
}

/// Parse and range-check the row's year. `None` means skip the row.
fn row_year(row: &RawRow, line: usize, bounds: &YearBounds) -> Option<i32> {
    let Some(raw) = row.year() else {
        warn!(line, entity = row.entity(), "skipping row without a year");
        return None;
    };
    let year = match raw.parse::<i32>() {
        Ok(y) => y,
        Err(_) => {
            warn!(line, entity = row.entity(), year = raw, "skipping row with a non-integer year");
            return None;
        }
    };
    match bounds.check(year) {
        Ok(y) => Some(y),
        Err(e) => {
            warn!(line, entity = row.entity(), "skipping row: {e}");
            None
        }
    }
}

/// Validate every row of `table` and resolve its region and indicators
/// through `cache`.
///
/// Rows are skipped for a missing, non-integer or out-of-range year, or when
/// both entity and code are blank. Cells are skipped for missing-data
/// sentinels and unparseable values, and for every value found in a
/// shadowed alias column. Nothing here aborts the run.
pub fn wanted_from_table(
    table: &CsvTable,
    columns: &ValueColumns,
    ds: &DatasetCfg,
    bounds: &YearBounds,
    cache: &mut RunCache,
) -> Wanted {
    let keyed: Vec<(&str, String)> = columns
        .ingested
        .iter()
        .map(|(col, meta)| (col.as_str(), cache.indicators.resolve(ds, col, meta)))
        .collect();

    let mut wanted = Wanted::default();
    let mut shadowed_values = vec![0usize; columns.shadowed.len()];
    for (i, row) in table.iter().enumerate() {
        // header is line 1
        let line = i + 2;
        let Some(year) = row_year(row, line, bounds) else {
            wanted.skipped_rows += 1;
            continue;
        };
        if row.entity().is_empty() && row.code().is_none() {
            warn!(line, "skipping row with neither entity nor code");
            wanted.skipped_rows += 1;
            continue;
        }

        let mut cells = Vec::with_capacity(keyed.len());
        for (col, key) in &keyed {
            let raw = row.get(col).unwrap_or_default();
            match parse_value(raw) {
                Ok(v) => cells.push((key, v)),
                Err(CellSkip::Missing) => {
                    debug!(line, column = *col, "missing value");
                    wanted.skipped_cells += 1;
                }
                Err(CellSkip::Invalid) => {
                    warn!(line, column = *col, value = raw, "skipping unparseable value");
                    wanted.skipped_cells += 1;
                }
            }
        }
        for (n, shadow) in shadowed_values.iter_mut().zip(&columns.shadowed) {
            let raw = row.get(&shadow.column).unwrap_or_default();
            if !matches!(parse_value(raw), Err(CellSkip::Missing)) {
                *n += 1;
            }
        }
        if cells.is_empty() {
            continue;
        }

        let code = cache.regions.resolve(row.entity(), row.code());
        for (key, v) in cells {
            if wanted
                .values
                .insert((code.clone(), key.clone(), year), v)
                .is_some()
            {
                debug!(line, code = %code, key = %key, year, "duplicate observation, last value wins");
                wanted.duplicates += 1;
            }
        }
    }

    for (n, shadow) in shadowed_values.into_iter().zip(&columns.shadowed) {
        if n > 0 {
            warn!(
                column = %shadow.column,
                read_instead = %shadow.read_instead,
                values = n,
                "ignoring alias column; another alias of the same indicator is present"
            );
            wanted.skipped_cells += n;
        }
    }
    wanted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_str;
    use climate_source::io::decode_csv;
    use climate_source::models::DatasetMetadata;

    const CFG: &str = r#"
        [datasets.co2]
        csv_url = "co2.csv"
        meta_url = "co2.json"
        data_source_name = "Example"
        columns = ["emissions_total"]
        [datasets.co2.group]
        name = "CO2"
        [[datasets.co2.indicators]]
        key = "co2.emissions_total"
        columns = ["emissions_total"]
    "#;

    const ALIASED: &str = r#"
        [datasets.temperature]
        csv_url = "t.csv"
        meta_url = "t.json"
        data_source_name = "Example"
        [datasets.temperature.group]
        name = "Temperature"
        [[datasets.temperature.indicators]]
        key = "temperature.global_average"
        columns = ["near_surface_temperature_anomaly", "temperature_anomaly"]
    "#;

    fn run_with(cfg: &str, dataset: &str, csv: &str) -> (Wanted, RunCache) {
        let cfg = load_config_str(cfg).unwrap();
        let ds = cfg.dataset(dataset).unwrap();
        let table = decode_csv(csv.as_bytes()).unwrap();
        let columns = ds.value_columns(table.header(), &DatasetMetadata::default());
        let mut cache = RunCache::default();
        let w = wanted_from_table(&table, &columns, ds, &cfg.year_bounds(), &mut cache);
        (w, cache)
    }

    fn run(csv: &str) -> (Wanted, RunCache) {
        run_with(CFG, "co2", csv)
    }

    #[test]
    fn sentinels_and_garbage_are_skipped() {
        assert_eq!(parse_value(" 1.5 "), Ok(1.5));
        assert_eq!(parse_value(""), Err(CellSkip::Missing));
        assert_eq!(parse_value("NaN"), Err(CellSkip::Missing));
        assert_eq!(parse_value("nan"), Err(CellSkip::Missing));
        assert_eq!(parse_value("n/a"), Err(CellSkip::Invalid));
        assert_eq!(parse_value("inf"), Err(CellSkip::Invalid));
    }

    #[test]
    fn bad_rows_and_cells_are_counted() {
        let csv = "\
Entity,Code,Year,emissions_total
Japan,JPN,2020,100
Japan,JPN,,1
Japan,JPN,1700,1
Japan,JPN,20x0,1
,,2020,1
Japan,JPN,2021,NaN
Japan,JPN,2022,abc
";
        let (w, _) = run(csv);
        assert_eq!(w.values.len(), 1);
        assert_eq!(w.skipped_rows, 4);
        assert_eq!(w.skipped_cells, 2);
        assert_eq!(w.skipped(), 6);
    }

    #[test]
    fn duplicate_keys_keep_last_value() {
        let csv = "\
Entity,Code,Year,emissions_total
Japan,JPN,2020,100
Japan,jpn,2020,105
";
        let (w, _) = run(csv);
        assert_eq!(w.duplicates, 1);
        let key = ("JPN".to_string(), "co2.emissions_total".to_string(), 2020);
        assert_eq!(w.values.get(&key), Some(&105.0));
    }

    #[test]
    fn regions_only_registered_for_rows_with_values() {
        let csv = "\
Entity,Code,Year,emissions_total
Japan,JPN,2020,
Africa,,2020,5
";
        let (w, cache) = run(csv);
        assert_eq!(w.values.len(), 1);
        let pending: Vec<_> = cache.regions.pending().map(|r| r.name.as_str()).collect();
        assert_eq!(pending, vec!["Africa"]);
        assert_eq!(cache.indicators.pending_len(), 1);
    }

    #[test]
    fn aliases_side_by_side_read_first_listed_and_count_the_other() {
        let csv = "\
Entity,Code,Year,temperature_anomaly,near_surface_temperature_anomaly
World,OWID_WRL,2000,0.9,0.5
World,OWID_WRL,2001,,0.6
World,OWID_WRL,2002,1.1,
";
        let (w, _) = run_with(ALIASED, "temperature", csv);
        let key = |year| {
            (
                "OWID_WRL".to_string(),
                "temperature.global_average".to_string(),
                year,
            )
        };
        assert_eq!(w.values.get(&key(2000)), Some(&0.5));
        assert_eq!(w.values.get(&key(2001)), Some(&0.6));
        assert_eq!(w.values.get(&key(2002)), None);
        assert_eq!(w.duplicates, 0);
        // 0.9 and 1.1 in the shadowed column, plus the blank in the read one
        assert_eq!(w.skipped_cells, 3);
    }
}
