//! Region identity: code classification, synthetic codes, and the per-run cache.
//!
//! A CSV row names its subject with an entity name and an optional code. The
//! code is classified as:
//! - `iso`: exactly three ASCII letters (e.g. "JPN")
//! - `owid`: prefixed with `OWID_` (e.g. "OWID_WRL")
//! - `auto`: anything else, or no code at all
//!
//! Rows without a usable code get a deterministic synthetic code derived from
//! the entity name, `AUTO_<NORMALIZED>_<HASH6>`, so the same entity resolves
//! to the same region on every run.
//!
//! Example:
//! ```
//! use climate_sync::region::{CodeType, RegionIdentity, RegionType};
//!
//! let jp = RegionIdentity::resolve("Japan", Some(" jpn "));
//! assert_eq!(jp.code, "JPN");
//! assert_eq!((jp.code_type, jp.region_type), (CodeType::Iso, RegionType::Country));
//!
//! let africa = RegionIdentity::resolve("Africa", None);
//! assert!(africa.code.starts_with("AUTO_AFRICA_"));
//! assert_eq!(africa.region_type, RegionType::Continent);
//! ```

use std::collections::HashMap;
use std::fmt;

use diesel::prelude::*;
use indexmap::IndexMap;
use sha2::{Digest, Sha256};

use crate::models::catalog::{NewRegion, Region};

/// Prefix of synthetic region codes.
pub const AUTO_PREFIX: &str = "AUTO_";
/// Prefix of Our World in Data aggregate codes.
pub const OWID_PREFIX: &str = "OWID_";

/// Names classified as continents (case-insensitive).
pub const CONTINENTS: [&str; 6] = [
    "Africa",
    "Asia",
    "Europe",
    "North America",
    "South America",
    "Oceania",
];

/// Names classified as aggregates (case-insensitive).
pub const AGGREGATES: [&str; 8] = [
    "World",
    "European Union",
    "High-income countries",
    "Low-income countries",
    "Upper-middle-income countries",
    "Lower-middle-income countries",
    "Northern Hemisphere",
    "Southern Hemisphere",
];

/// How a region's code was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeType {
    Iso,
    Owid,
    Auto,
}

impl CodeType {
    pub fn as_str(self) -> &'static str {
        match self {
            CodeType::Iso => "iso",
            CodeType::Owid => "owid",
            CodeType::Auto => "auto",
        }
    }
}

impl fmt::Display for CodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of place a region is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionType {
    Country,
    Continent,
    Aggregate,
    Unknown,
}

impl RegionType {
    pub fn as_str(self) -> &'static str {
        match self {
            RegionType::Country => "country",
            RegionType::Continent => "continent",
            RegionType::Aggregate => "aggregate",
            RegionType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RegionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a raw source code. Blank or absent codes are `auto`.
pub fn classify_code(raw: Option<&str>) -> CodeType {
    let Some(code) = raw.map(str::trim).filter(|c| !c.is_empty()) else {
        return CodeType::Auto;
    };
    let upper = code.to_ascii_uppercase();
    if upper.len() == 3 && upper.bytes().all(|b| b.is_ascii_alphabetic()) {
        CodeType::Iso
    } else if upper.starts_with(OWID_PREFIX) {
        CodeType::Owid
    } else {
        CodeType::Auto
    }
}

/// Classify a region from its code type and display name.
pub fn classify_region(code_type: CodeType, name: &str) -> RegionType {
    if code_type == CodeType::Iso {
        return RegionType::Country;
    }
    let name = name.trim();
    if CONTINENTS.iter().any(|c| c.eq_ignore_ascii_case(name)) {
        RegionType::Continent
    } else if AGGREGATES.iter().any(|a| a.eq_ignore_ascii_case(name)) {
        RegionType::Aggregate
    } else {
        RegionType::Unknown
    }
}

/// Trim, join whitespace runs with `_`, uppercase.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_uppercase()
}

/// Deterministic synthetic code for an entity name:
/// `AUTO_<NORMALIZED>_<first 6 hex digits of SHA-256(NORMALIZED)>`.
pub fn generate_code(name: &str) -> String {
    let normalized = normalize_name(name);
    let digest = Sha256::digest(normalized.as_bytes());
    format!(
        "{AUTO_PREFIX}{normalized}_{}",
        hex::encode_upper(&digest[..3])
    )
}

/// A fully resolved region: final code plus classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionIdentity {
    pub name: String,
    pub code: String,
    pub code_type: CodeType,
    pub region_type: RegionType,
}

impl RegionIdentity {
    /// Resolve a raw `(entity_name, code)` pair.
    ///
    /// ISO and OWID codes are kept, trimmed and uppercased. Codes already
    /// following the synthetic convention are kept as well; any other code
    /// (or none) is replaced by [`generate_code`] of the entity name. A blank
    /// entity name falls back to the code.
    pub fn resolve(entity_name: &str, raw_code: Option<&str>) -> Self {
        let raw_code = raw_code.map(str::trim).filter(|c| !c.is_empty());
        let name = match entity_name.trim() {
            "" => raw_code.unwrap_or_default(),
            n => n,
        };
        let code_type = classify_code(raw_code);
        let code = match (code_type, raw_code) {
            (CodeType::Iso | CodeType::Owid, Some(c)) => c.to_ascii_uppercase(),
            (CodeType::Auto, Some(c)) if c.to_ascii_uppercase().starts_with(AUTO_PREFIX) => {
                c.to_ascii_uppercase()
            }
            _ => generate_code(name),
        };
        Self {
            name: name.to_string(),
            code,
            code_type,
            region_type: classify_region(code_type, name),
        }
    }

    pub fn as_new(&self) -> NewRegion<'_> {
        NewRegion {
            name: &self.name,
            code: &self.code,
            code_type: self.code_type.as_str(),
            region_type: self.region_type.as_str(),
        }
    }
}

/// Regions known to one ingestion run, keyed by final code.
///
/// Populated from a single bulk read; identities first seen during the run
/// are held as pending until the write transaction creates them.
#[derive(Debug, Default)]
pub struct RegionCache {
    stored: HashMap<String, Region>,
    pending: IndexMap<String, RegionIdentity>,
}

impl RegionCache {
    /// Read every stored region.
    pub fn load(conn: &mut SqliteConnection) -> QueryResult<Self> {
        use crate::schema::region::dsl as r;
        let rows: Vec<Region> = r::region.select(Region::as_select()).load(conn)?;
        Ok(Self::from_regions(rows))
    }

    pub fn from_regions(rows: impl IntoIterator<Item = Region>) -> Self {
        Self {
            stored: rows.into_iter().map(|r| (r.code.clone(), r)).collect(),
            pending: IndexMap::new(),
        }
    }

    /// Resolve a raw pair to its final code, registering a pending identity
    /// on first sight. The first identity seen for a code wins.
    pub fn resolve(&mut self, entity_name: &str, raw_code: Option<&str>) -> String {
        let identity = RegionIdentity::resolve(entity_name, raw_code);
        let code = identity.code.clone();
        if !self.stored.contains_key(&code) && !self.pending.contains_key(&code) {
            tracing::debug!(code = %code, name = %identity.name, "new region");
            self.pending.insert(code.clone(), identity);
        }
        code
    }

    /// Primary key of a stored region.
    pub fn id_of(&self, code: &str) -> Option<i32> {
        self.stored.get(code).map(|r| r.id)
    }

    /// Identities seen this run that are not stored yet.
    pub fn pending(&self) -> impl Iterator<Item = &RegionIdentity> {
        self.pending.values()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Record a stored row, clearing its pending entry.
    pub fn insert(&mut self, region: Region) {
        self.pending.shift_remove(&region.code);
        self.stored.insert(region.code.clone(), region);
    }

    /// Ids of stored regions among `codes`.
    pub fn stored_ids<'a>(&self, codes: impl IntoIterator<Item = &'a String>) -> Vec<i32> {
        codes.into_iter().filter_map(|c| self.id_of(c)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn iso_code_is_country() {
        let id = RegionIdentity::resolve("Japan", Some("JPN"));
        assert_eq!(id.code, "JPN");
        assert_eq!(id.code_type, CodeType::Iso);
        assert_eq!(id.region_type, RegionType::Country);
    }

    #[test]
    fn lowercase_iso_is_uppercased() {
        let id = RegionIdentity::resolve("Japan", Some(" jpn"));
        assert_eq!(id.code, "JPN");
        assert_eq!(id.code_type, CodeType::Iso);
    }

    #[test]
    fn owid_code_is_kept() {
        let id = RegionIdentity::resolve("World", Some("OWID_WRL"));
        assert_eq!(id.code, "OWID_WRL");
        assert_eq!(id.code_type, CodeType::Owid);
        assert_eq!(id.region_type, RegionType::Aggregate);
    }

    #[test]
    fn missing_code_on_continent() {
        let id = RegionIdentity::resolve("Africa", Some(""));
        assert_eq!(id.code_type, CodeType::Auto);
        assert_eq!(id.region_type, RegionType::Continent);
        assert_eq!(id.code, generate_code("Africa"));
    }

    #[test]
    fn unknown_name_without_code() {
        let id = RegionIdentity::resolve("Wakanda", None);
        assert_eq!(id.code_type, CodeType::Auto);
        assert_eq!(id.region_type, RegionType::Unknown);
    }

    #[test]
    fn existing_auto_code_is_kept() {
        let code = generate_code("Asia (excl. China and India)");
        let id = RegionIdentity::resolve("Asia (excl. China and India)", Some(code.as_str()));
        assert_eq!(id.code, code);
        assert_eq!(id.code_type, CodeType::Auto);
    }

    #[test]
    fn nonstandard_code_is_replaced() {
        let id = RegionIdentity::resolve("Kosovo", Some("XK-1"));
        assert_eq!(id.code_type, CodeType::Auto);
        assert_eq!(id.code, generate_code("Kosovo"));
    }

    #[test]
    fn region_classification_ignores_case() {
        assert_eq!(classify_region(CodeType::Auto, "north america"), RegionType::Continent);
        assert_eq!(classify_region(CodeType::Owid, "EUROPEAN UNION"), RegionType::Aggregate);
        assert_eq!(classify_region(CodeType::Iso, "Atlantis"), RegionType::Country);
    }

    #[test]
    fn generated_code_shape() {
        let code = generate_code("  North   America ");
        let (head, hash) = code.rsplit_once('_').unwrap();
        assert_eq!(head, "AUTO_NORTH_AMERICA");
        assert_eq!(hash.len(), 6);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }

    #[test]
    fn cache_registers_pending_once() {
        let mut cache = RegionCache::from_regions([Region {
            id: 7,
            name: "Japan".into(),
            code: "JPN".into(),
            code_type: "iso".into(),
            region_type: "country".into(),
        }]);

        assert_eq!(cache.resolve("Japan", Some("JPN")), "JPN");
        assert_eq!(cache.id_of("JPN"), Some(7));
        let africa = cache.resolve("Africa", None);
        let again = cache.resolve(" Africa ", None);
        assert_eq!(africa, again);
        assert_eq!(cache.pending_len(), 1);
        assert_eq!(cache.id_of(&africa), None);
    }

    proptest! {
        #[test]
        fn generate_code_ignores_surrounding_whitespace(
            name in "[A-Za-z][A-Za-z ]{0,20}",
            lead in " {0,3}",
            trail in " {0,3}",
        ) {
            let padded = format!("{lead}{name}{trail}");
            prop_assert_eq!(generate_code(&name), generate_code(&padded));
        }

        #[test]
        fn generated_codes_classify_as_auto(name in "[A-Za-z ]{1,20}") {
            let code = generate_code(&name);
            prop_assert!(code.starts_with(AUTO_PREFIX));
            prop_assert_eq!(classify_code(Some(code.as_str())), CodeType::Auto);
        }
    }
}
