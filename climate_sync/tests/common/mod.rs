#![allow(dead_code)]

use climate_source::io::decode_csv;
use climate_source::models::{DatasetMetadata, FetchedDataset, SourceDescriptor};
use climate_sync::config::{IngestConfig, load_config_str};
use climate_sync::db::{connection, migrate};
use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Integer, Text};
use std::path::PathBuf;
use tempfile::TempDir;

#[derive(QueryableByName)]
struct JournalMode {
    #[diesel(sql_type = Text)]
    journal_mode: String,
}
#[derive(QueryableByName)]
struct ForeignKeys {
    #[diesel(sql_type = Integer)]
    foreign_keys: i32,
}
#[derive(QueryableByName)]
struct BusyTimeout {
    #[diesel(sql_type = Integer, column_name = "timeout")]
    busy_timeout: i32,
}
#[derive(QueryableByName)]
struct Cnt {
    #[diesel(sql_type = BigInt)]
    cnt: i64,
}
#[derive(QueryableByName)]
struct FkViolation {
    #[diesel(sql_type = Text)]
    table: String,
}

pub struct TestDb {
    pub dir: TempDir, // keep alive for the life of the test
    pub path: String, // <tmpdir>/test.db
}

pub fn setup_db() -> (TestDb, SqliteConnection) {
    let dir = TempDir::new().expect("tempdir");
    let mut p = PathBuf::from(dir.path());
    p.push("test.db");
    let path = p.to_string_lossy().to_string();

    migrate::run_all(&path).expect("migrations");

    // open a connection with PRAGMAs applied
    let conn = connection::connect_sqlite(&path).expect("connect");
    (TestDb { dir, path }, conn)
}

pub fn assert_sqlite_pragmas(conn: &mut SqliteConnection) {
    use diesel::sql_query;

    let jm: JournalMode = sql_query("PRAGMA journal_mode;").get_result(conn).unwrap();
    assert_eq!(jm.journal_mode.to_lowercase(), "wal"); // WAL is persistent per DB file

    let fk: ForeignKeys = sql_query("PRAGMA foreign_keys;").get_result(conn).unwrap();
    assert_eq!(fk.foreign_keys, 1);

    let bt: BusyTimeout = sql_query("PRAGMA busy_timeout;").get_result(conn).unwrap();
    assert_eq!(bt.busy_timeout, 5000);
}

pub fn count(conn: &mut SqliteConnection, table: &str) -> i64 {
    let c: Cnt = diesel::sql_query(format!("SELECT COUNT(*) AS cnt FROM {table};"))
        .get_result(conn)
        .unwrap();
    c.cnt
}

pub fn fk_check_empty(conn: &mut SqliteConnection) {
    let rows: Vec<FkViolation> = diesel::sql_query("PRAGMA foreign_key_check;")
        .load(conn)
        .unwrap();
    let tables: Vec<String> = rows.into_iter().map(|r| r.table).collect();
    assert!(tables.is_empty(), "foreign key violations in {tables:?}");
}

/// Two small datasets shaped like the published ones.
pub const TEST_CONFIG: &str = r#"
[datasets.temperature]
csv_url = "temperature.csv"
meta_url = "temperature.metadata.json"
data_source_name = "Test Data"

[datasets.temperature.group]
name = "Temperature"
description = "Temperature anomaly"

[[datasets.temperature.indicators]]
key = "temperature.global_average"
columns = ["near_surface_temperature_anomaly", "temperature_anomaly"]

[[datasets.temperature.indicators]]
key = "temperature.upper"
columns = ["near_surface_temperature_anomaly_upper"]

[[datasets.temperature.indicators]]
key = "temperature.lower"
columns = ["near_surface_temperature_anomaly_lower"]

[datasets.co2]
csv_url = "co2.csv"
meta_url = "co2.metadata.json"
data_source_name = "Test Data"
data_source_url = "https://example.org/co2"
columns = ["emissions_total"]

[datasets.co2.group]
name = "CO₂ Emissions"
description = "Carbon dioxide emissions"

[[datasets.co2.indicators]]
key = "co2.emissions_total"
columns = ["emissions_total"]
"#;

pub const CO2_META: &str = r#"{
  "columns": {
    "emissions_total": {
      "titleShort": "Annual CO₂ emissions",
      "unit": "tonnes",
      "shortUnit": "t",
      "descriptionShort": "Annual total emissions of carbon dioxide.",
      "type": "Numeric",
      "fullMetadata": "https://example.org/co2/emissions_total.json"
    }
  }
}"#;

pub const TEMPERATURE_META: &str = r#"{
  "columns": {
    "near_surface_temperature_anomaly": { "titleShort": "Global average", "unit": "°C", "type": "Numeric" },
    "near_surface_temperature_anomaly_upper": { "titleShort": "Upper bound", "unit": "°C", "type": "Numeric" },
    "near_surface_temperature_anomaly_lower": { "titleShort": "Lower bound", "unit": "°C", "type": "Numeric" }
  }
}"#;

pub fn test_config() -> IngestConfig {
    load_config_str(TEST_CONFIG).expect("test config")
}

/// Decode in-memory documents the way a source would.
pub fn fetched(csv: &str, meta: &str) -> FetchedDataset {
    FetchedDataset {
        descriptor: SourceDescriptor {
            csv_url: "memory.csv".into(),
            meta_url: "memory.metadata.json".into(),
        },
        table: decode_csv(csv.as_bytes()).expect("csv"),
        metadata: DatasetMetadata::from_json_str(meta).expect("metadata"),
    }
}
