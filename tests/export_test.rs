use serde_json::json;
use solar_cli::api_client::{ScoreRange, SolarApiClient};
use solar_cli::export::{download_csv, download_json, DirectorySink, ExportSink};
use std::path::PathBuf;
use std::sync::Mutex;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Sink that records what it was asked to save, without touching disk.
struct RecordingSink {
    saved: Mutex<Vec<(String, Vec<u8>)>>,
}

impl RecordingSink {
    fn new() -> Self {
        Self {
            saved: Mutex::new(Vec::new()),
        }
    }
}

impl ExportSink for RecordingSink {
    fn save(&self, filename: &str, contents: &[u8]) -> anyhow::Result<PathBuf> {
        self.saved
            .lock()
            .unwrap()
            .push((filename.to_string(), contents.to_vec()));
        Ok(PathBuf::from(filename))
    }
}

#[tokio::test]
async fn download_csv_writes_dated_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/export"))
        .and(query_param("format", "csv"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("id,name\n1,Mesa Flats\n", "text/csv"),
        )
        .mount(&server)
        .await;

    let client = SolarApiClient::new(&server.uri()).unwrap();
    let tmp = tempfile::tempdir().unwrap();
    let sink = DirectorySink::new(tmp.path());

    let saved = download_csv(&client, &sink, &ScoreRange::default())
        .await
        .unwrap();

    let filename = saved.file_name().unwrap().to_str().unwrap();
    assert!(filename.starts_with("solar_sites_"));
    assert!(filename.ends_with(".csv"));
    assert_eq!(std::fs::read(&saved).unwrap(), b"id,name\n1,Mesa Flats\n");
}

#[tokio::test]
async fn download_json_pretty_prints() {
    let server = MockServer::start().await;
    let payload = json!({"sites": [{"id": 1, "name": "Mesa Flats"}], "total": 1});
    Mock::given(method("GET"))
        .and(path("/api/export"))
        .and(query_param("format", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(payload.clone()))
        .mount(&server)
        .await;

    let client = SolarApiClient::new(&server.uri()).unwrap();
    let sink = RecordingSink::new();

    download_json(&client, &sink, &ScoreRange::default())
        .await
        .unwrap();

    let saved = sink.saved.lock().unwrap();
    let (filename, contents) = &saved[0];
    assert!(filename.ends_with(".json"));

    // Indented output, and parses back to the original payload
    let text = std::str::from_utf8(contents).unwrap();
    assert!(text.contains('\n'));
    let reparsed: serde_json::Value = serde_json::from_str(text).unwrap();
    assert_eq!(reparsed, payload);
}

#[tokio::test]
async fn failed_fetch_saves_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/export"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = SolarApiClient::new(&server.uri()).unwrap();
    let sink = RecordingSink::new();

    let result = download_csv(&client, &sink, &ScoreRange::default()).await;
    assert!(result.is_err());
    assert!(sink.saved.lock().unwrap().is_empty());
}

#[tokio::test]
async fn score_bounds_travel_with_export_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/export"))
        .and(query_param("format", "csv"))
        .and(query_param("min_score", "70.5"))
        .and(query_param("max_score", "95.5"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("id,name\n", "text/csv"))
        .expect(1)
        .mount(&server)
        .await;

    let client = SolarApiClient::new(&server.uri()).unwrap();
    let sink = RecordingSink::new();
    let range = ScoreRange {
        min_score: Some(70.5),
        max_score: Some(95.5),
    };

    download_csv(&client, &sink, &range).await.unwrap();
    assert_eq!(sink.saved.lock().unwrap().len(), 1);
}
