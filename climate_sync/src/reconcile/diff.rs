use std::fmt;

use crate::indicator::IndicatorSpec;
use crate::reconcile::{RunCache, read::Current, want::Wanted};
use crate::region::RegionIdentity;

/// Rows listed per section when a plan is displayed.
const DISPLAY_LIMIT: usize = 20;

/// An observation to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub region_code: String,
    pub indicator_key: String,
    pub year: i32,
    pub value: f64,
}

/// A stored observation whose value changed upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueChange {
    /// `climate_data.id` of the stored row.
    pub id: i32,
    pub region_code: String,
    pub indicator_key: String,
    pub year: i32,
    pub old: f64,
    pub new: f64,
}

/// What needs to change to make the store match a payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcilePlan {
    pub regions_create: Vec<RegionIdentity>,
    pub indicators_create: Vec<IndicatorSpec>,
    pub to_create: Vec<Observation>,
    pub to_update: Vec<ValueChange>,
    /// Observations already stored with the same value.
    pub unchanged: usize,
    /// Rows and cells dropped during validation.
    pub skipped: usize,
}

impl ReconcilePlan {
    /// True if nothing would be written.
    pub fn is_noop(&self) -> bool {
        self.regions_create.is_empty()
            && self.indicators_create.is_empty()
            && self.to_create.is_empty()
            && self.to_update.is_empty()
    }
}

impl fmt::Display for ReconcilePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // helper: section header with underline
        let mut wrote_any = false;
        let mut section = |title: &str,
                           body: &mut dyn FnMut(&mut fmt::Formatter<'_>) -> fmt::Result|
         -> fmt::Result {
            if wrote_any {
                writeln!(f)?;
            }
            writeln!(f, "{title}")?;
            writeln!(f, "{}", "-".repeat(title.chars().count()))?;
            body(f)?;
            wrote_any = true;
            Ok(())
        };

        fn more(f: &mut fmt::Formatter<'_>, total: usize) -> fmt::Result {
            if total > DISPLAY_LIMIT {
                writeln!(f, "  ... and {} more", total - DISPLAY_LIMIT)?;
            }
            Ok(())
        }

        if !self.regions_create.is_empty() {
            section("Regions (CREATE)", &mut |f| {
                for r in self.regions_create.iter().take(DISPLAY_LIMIT) {
                    writeln!(
                        f,
                        "+ {}  \"{}\"  {}/{}",
                        r.code, r.name, r.code_type, r.region_type
                    )?;
                }
                more(f, self.regions_create.len())
            })?;
        }
        if !self.indicators_create.is_empty() {
            section("Indicators (CREATE)", &mut |f| {
                for ind in self.indicators_create.iter().take(DISPLAY_LIMIT) {
                    writeln!(
                        f,
                        "+ {}  \"{}\"  <- {}",
                        ind.indicator_key, ind.name, ind.column_key
                    )?;
                }
                more(f, self.indicators_create.len())
            })?;
        }
        if !self.to_create.is_empty() {
            section("Observations (CREATE)", &mut |f| {
                for o in self.to_create.iter().take(DISPLAY_LIMIT) {
                    writeln!(
                        f,
                        "+ {} {} {}  {}",
                        o.region_code, o.indicator_key, o.year, o.value
                    )?;
                }
                more(f, self.to_create.len())
            })?;
        }
        if !self.to_update.is_empty() {
            section("Observations (UPDATE)", &mut |f| {
                for c in self.to_update.iter().take(DISPLAY_LIMIT) {
                    writeln!(
                        f,
                        "~ {} {} {}  {} → {}",
                        c.region_code, c.indicator_key, c.year, c.old, c.new
                    )?;
                }
                more(f, self.to_update.len())
            })?;
        }

        if !wrote_any {
            write!(f, "No changes")
        } else {
            Ok(())
        }
    }
}

/// Partition `w` against `c`: absent keys are created, keys stored with a
/// different value are updated, identical values are left alone. Values are
/// compared exactly.
pub fn make_plan(w: &Wanted, c: &Current, cache: &RunCache) -> ReconcilePlan {
    let mut plan = ReconcilePlan {
        regions_create: cache.regions.pending().cloned().collect(),
        indicators_create: cache.indicators.pending().cloned().collect(),
        skipped: w.skipped(),
        ..Default::default()
    };

    for ((code, key, year), &value) in &w.values {
        match c.values.get(&(code.clone(), key.clone(), *year)) {
            None => plan.to_create.push(Observation {
                region_code: code.clone(),
                indicator_key: key.clone(),
                year: *year,
                value,
            }),
            Some(&(id, old)) if old != value => plan.to_update.push(ValueChange {
                id,
                region_code: code.clone(),
                indicator_key: key.clone(),
                year: *year,
                old,
                new: value,
            }),
            Some(_) => plan.unchanged += 1,
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, HashMap};

    fn key(code: &str, ind: &str, year: i32) -> (String, String, i32) {
        (code.to_string(), ind.to_string(), year)
    }

    fn wanted(values: &[((&str, &str, i32), f64)]) -> Wanted {
        Wanted {
            values: values
                .iter()
                .map(|((c, k, y), v)| (key(c, k, *y), *v))
                .collect::<BTreeMap<_, _>>(),
            ..Default::default()
        }
    }

    #[test]
    fn display_no_changes() {
        let d = make_plan(&Wanted::default(), &Current::default(), &RunCache::default());
        assert!(d.is_noop());
        assert_eq!(d.to_string(), "No changes");
    }

    #[test]
    fn partitions_create_update_unchanged() {
        let w = wanted(&[
            (("JPN", "co2", 2019), 90.0),
            (("JPN", "co2", 2020), 105.0),
            (("JPN", "co2", 2021), 110.0),
        ]);
        let c = Current {
            values: HashMap::from([
                (key("JPN", "co2", 2019), (1, 90.0)),
                (key("JPN", "co2", 2020), (2, 100.0)),
            ]),
        };
        let plan = make_plan(&w, &c, &RunCache::default());
        assert_eq!(plan.unchanged, 1);
        assert_eq!(plan.to_create.len(), 1);
        assert_eq!(plan.to_create[0].year, 2021);
        assert_eq!(
            plan.to_update,
            vec![ValueChange {
                id: 2,
                region_code: "JPN".into(),
                indicator_key: "co2".into(),
                year: 2020,
                old: 100.0,
                new: 105.0,
            }]
        );
    }

    #[test]
    fn display_sections_expected() {
        let w = wanted(&[(("JPN", "co2", 2020), 105.0), (("JPN", "co2", 2021), 1.5)]);
        let c = Current {
            values: HashMap::from([(key("JPN", "co2", 2020), (2, 100.0))]),
        };
        let got = make_plan(&w, &c, &RunCache::default()).to_string();

        let expected = "\
Observations (CREATE)
---------------------
+ JPN co2 2021  1.5

Observations (UPDATE)
---------------------
~ JPN co2 2020  100 → 105
";
        assert_eq!(got, expected, "pretty plan did not match");
    }

    #[test]
    fn long_sections_are_truncated() {
        let values: Vec<_> = (0..25).map(|i| (("JPN", "co2", 1990 + i), 1.0)).collect();
        let got = make_plan(&wanted(&values), &Current::default(), &RunCache::default()).to_string();
        assert!(got.ends_with("  ... and 5 more\n"));
    }
}
