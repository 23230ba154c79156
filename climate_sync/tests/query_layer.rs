mod common;
use common::{CO2_META, TEMPERATURE_META, fetched, setup_db, test_config};

use climate_sync::config::{CO2_EMISSIONS_TOTAL, TEMPERATURE_GLOBAL_AVERAGE};
use climate_sync::ingest::{IngestOptions, ingest_fetched};
use climate_sync::query::{
    QueryError, TEMPERATURE_NOT_FOUND, TemperatureKeys, YearValue, group_series,
    indicator_series, temperature_by_region, values_by_year,
};

use diesel::SqliteConnection;

const TEMPERATURE_CSV: &str = "\
Entity,Code,Year,near_surface_temperature_anomaly,near_surface_temperature_anomaly_upper,near_surface_temperature_anomaly_lower
World,OWID_WRL,1901,-0.2,-0.1,-0.3
World,OWID_WRL,1900,-0.25,-0.15,
Northern Hemisphere,,1900,-0.3,-0.2,-0.4
";

fn load(conn: &mut SqliteConnection, dataset: &str, csv: &str, meta: &str) {
    ingest_fetched(
        conn,
        &test_config(),
        dataset,
        &fetched(csv, meta),
        IngestOptions::default(),
    )
    .expect("ingest");
}

#[test]
fn temperature_view_nests_by_region_and_year() {
    let (_db, mut conn) = setup_db();
    load(&mut conn, "temperature", TEMPERATURE_CSV, TEMPERATURE_META);

    let got = temperature_by_region(&mut conn, &TemperatureKeys::default()).unwrap();
    insta::assert_json_snapshot!(got, @r#"
    {
      "Northern Hemisphere": [
        {
          "year": 1900,
          "upper": -0.2,
          "lower": -0.4,
          "global_average": -0.3
        }
      ],
      "World": [
        {
          "year": 1900,
          "upper": -0.15,
          "global_average": -0.25
        },
        {
          "year": 1901,
          "upper": -0.1,
          "lower": -0.3,
          "global_average": -0.2
        }
      ]
    }
    "#);
}

#[test]
fn temperature_view_requires_all_three_indicators() {
    let (_db, mut conn) = setup_db();
    let csv = "Entity,Code,Year,near_surface_temperature_anomaly\nWorld,OWID_WRL,1900,-0.25\n";
    load(&mut conn, "temperature", csv, TEMPERATURE_META);

    let err = temperature_by_region(&mut conn, &TemperatureKeys::default()).unwrap_err();
    assert!(matches!(&err, QueryError::NotFound(msg) if msg == TEMPERATURE_NOT_FOUND));
    assert_eq!(err.to_string(), "Not all temperature indicators found.");
}

#[test]
fn co2_view_is_year_then_code() {
    let (_db, mut conn) = setup_db();
    let csv = "\
Entity,Code,Year,emissions_total
Japan,JPN,2020,100
World,OWID_WRL,2020,1000
Japan,JPN,2019,90
";
    load(&mut conn, "co2", csv, CO2_META);

    let got = values_by_year(&mut conn, "CO₂ Emissions", CO2_EMISSIONS_TOTAL).unwrap();
    assert_eq!(got.keys().copied().collect::<Vec<_>>(), vec![2019, 2020]);
    assert_eq!(got[&2020]["JPN"], 100.0);
    assert_eq!(got[&2020]["OWID_WRL"], 1000.0);
    assert_eq!(got[&2019].len(), 1);
}

#[test]
fn missing_indicator_is_not_found() {
    let (_db, mut conn) = setup_db();
    let err = values_by_year(&mut conn, "CO₂ Emissions", CO2_EMISSIONS_TOTAL).unwrap_err();
    assert!(matches!(err, QueryError::NotFound(_)));

    let err = group_series(&mut conn, "Rainfall").unwrap_err();
    assert!(matches!(err, QueryError::NotFound(_)));
}

#[test]
fn indicator_series_can_filter_one_region() {
    let (_db, mut conn) = setup_db();
    load(&mut conn, "temperature", TEMPERATURE_CSV, TEMPERATURE_META);

    let all = indicator_series(&mut conn, "Temperature", TEMPERATURE_GLOBAL_AVERAGE, None).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(
        all["World"],
        vec![
            YearValue {
                year: 1900,
                value: -0.25
            },
            YearValue {
                year: 1901,
                value: -0.2
            },
        ]
    );

    let world = indicator_series(
        &mut conn,
        "Temperature",
        TEMPERATURE_GLOBAL_AVERAGE,
        Some("owid_wrl"),
    )
    .unwrap();
    assert_eq!(world.keys().collect::<Vec<_>>(), vec!["World"]);
}

#[test]
fn group_series_nests_every_indicator() {
    let (_db, mut conn) = setup_db();
    load(&mut conn, "temperature", TEMPERATURE_CSV, TEMPERATURE_META);

    let got = group_series(&mut conn, "Temperature").unwrap();
    let world_1900 = &got["World"][&1900];
    assert_eq!(world_1900.len(), 2);
    assert_eq!(world_1900["temperature.upper"], -0.15);
    assert_eq!(got["Northern Hemisphere"][&1900].len(), 3);
}
