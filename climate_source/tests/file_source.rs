use climate_source::models::SourceDescriptor;
use climate_source::providers::{DataSource, ProviderError, file::FileSource};
use tempfile::TempDir;

const CSV: &str = "Entity,Code,Year,emissions_total\n\
Japan,JPN,2019,1106153000\n\
Japan,JPN,2020,1030775000\n\
Africa,,2020,1384123000\n";

const META: &str = r#"{
  "columns": {
    "emissions_total": {
      "titleShort": "Annual CO₂ emissions",
      "unit": "tonnes",
      "descriptionShort": "Annual total emissions of carbon dioxide (CO₂), excluding land-use change.",
      "type": "Numeric"
    }
  }
}"#;

fn fixture() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(dir.path().join("co2.csv"), CSV).unwrap();
    std::fs::write(dir.path().join("co2.metadata.json"), META).unwrap();
    dir
}

#[tokio::test]
async fn fetches_both_documents_relative_to_root() {
    let dir = fixture();
    let source = FileSource::with_root(dir.path());

    let fetched = source
        .fetch_dataset(&SourceDescriptor {
            csv_url: "co2.csv".into(),
            meta_url: "co2.metadata.json".into(),
        })
        .await
        .expect("fetch");

    assert_eq!(fetched.table.len(), 3);
    assert_eq!(fetched.table.rows()[2].entity(), "Africa");
    assert_eq!(fetched.table.rows()[2].code(), None);

    let numeric: Vec<&str> = fetched.metadata.numeric_columns().map(|(k, _)| k).collect();
    assert_eq!(numeric, vec!["emissions_total"]);
}

#[tokio::test]
async fn accepts_file_urls() {
    let dir = fixture();
    let url = format!("file://{}", dir.path().join("co2.csv").display());
    let table = FileSource::new().fetch(&url).await.expect("fetch");
    assert_eq!(table.len(), 3);
}

#[tokio::test]
async fn missing_file_is_an_io_error() {
    let dir = fixture();
    let err = FileSource::with_root(dir.path())
        .fetch("nope.csv")
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Io { .. }), "got {err}");
}

#[tokio::test]
async fn undecodable_payload_is_a_decode_error() {
    let dir = fixture();
    std::fs::write(dir.path().join("bad.csv"), "Entity,Code\nJapan,JPN\n").unwrap();
    let err = FileSource::with_root(dir.path())
        .fetch("bad.csv")
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Decode { .. }), "got {err}");
}
