//! API Regression Tests
//!
//! In-process tests that build the Axum app via `create_app()` and exercise
//! the endpoints using `tower::ServiceExt::oneshot()`.
//! No binary spawn, no network port — runs in CI without `#[ignore]`.

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use gmma_assoc::api::{create_app, ApiState, PredictResponse};
use gmma_assoc::associator::MixtureAssociator;
use gmma_assoc::pipeline::AssociationPipeline;
use gmma_assoc::publish::EventPublisher;
use gmma_assoc::types::{CatalogEntry, Station, StationRecord};
use gmma_assoc::{PartialGmmaConfig, ServiceContext};

/// Publisher test double recording every (key, event_idx) pair.
struct RecordingPublisher {
    published: Mutex<Vec<(String, i64)>>,
}

impl RecordingPublisher {
    fn new() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
        }
    }

    fn published(&self) -> Vec<(String, i64)> {
        self.published.lock().unwrap().clone()
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish(&self, key: &str, event: &CatalogEntry) {
        self.published
            .lock()
            .unwrap()
            .push((key.to_string(), event.event_idx));
    }

    fn name(&self) -> &'static str {
        "Recording"
    }
}

fn station_records() -> Vec<StationRecord> {
    [
        ("HV.AHUD", -155.26, 19.37, 1045.0),
        ("HV.BYL", -155.30, 19.41, 1085.0),
        ("HV.DEVL", -155.24, 19.39, 1130.0),
    ]
    .into_iter()
    .map(|(id, lon, lat, elev)| StationRecord {
        id: id.to_string(),
        longitude: Some(lon),
        latitude: Some(lat),
        elevation_m: Some(elev),
    })
    .collect()
}

/// Context tuned so a 3-station test network can form events.
fn test_state() -> (ApiState, Arc<RecordingPublisher>) {
    let records = station_records();
    let mut config = PartialGmmaConfig::default().resolve(&records).unwrap();
    config.dbscan_min_samples = 2;
    config.min_picks_per_eq = 3;
    let stations = Station::from_records(&records, config.center, config.degree2km).unwrap();

    let publisher = Arc::new(RecordingPublisher::new());
    let state = ApiState {
        context: Arc::new(ServiceContext { stations, config }),
        pipeline: Arc::new(AssociationPipeline::new(Arc::new(MixtureAssociator::new()))),
        publisher: publisher.clone(),
    };
    (state, publisher)
}

/// Six picks within a few seconds: one event's worth of arrivals.
fn event_picks() -> Value {
    json!([
        {"id": "HV.AHUD", "type": "p", "timestamp": "2021-07-29T06:15:49.248", "prob": 0.98, "amp": 2.1e-5},
        {"id": "HV.BYL",  "type": "p", "timestamp": "2021-07-29T06:15:50.101", "prob": 0.95, "amp": 1.7e-5},
        {"id": "HV.DEVL", "type": "p", "timestamp": "2021-07-29T06:15:50.920", "prob": 0.91, "amp": 1.2e-5},
        {"id": "HV.AHUD", "type": "s", "timestamp": "2021-07-29T06:15:51.530", "prob": 0.88, "amp": 3.4e-5},
        {"id": "HV.BYL",  "type": "s", "timestamp": "2021-07-29T06:15:52.270", "prob": 0.85, "amp": 2.9e-5},
        {"id": "HV.DEVL", "type": "s", "timestamp": "2021-07-29T06:15:53.080", "prob": 0.82, "amp": 2.2e-5}
    ])
}

async fn send_json(
    state: ApiState,
    method: &str,
    uri: &str,
    body: Value,
) -> (StatusCode, Value) {
    let app = create_app(state);
    let response = app
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_healthz_returns_ok() {
    let (state, _) = test_state();
    let app = create_app(state);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_predict_full_request() {
    let (state, _) = test_state();
    let body = json!({
        "picks": event_picks(),
        "stations": [
            {"id": "HV.AHUD", "longitude": -155.26, "latitude": 19.37, "elevation(m)": 1045.0},
            {"id": "HV.BYL",  "longitude": -155.30, "latitude": 19.41, "elevation(m)": 1085.0},
            {"id": "HV.DEVL", "longitude": -155.24, "latitude": 19.39, "elevation(m)": 1130.0}
        ],
        "config": {"dbscan_min_samples": 2, "min_picks_per_eq": 3}
    });

    let (status, value) = send_json(state, "POST", "/predict", body).await;
    assert_eq!(status, StatusCode::OK);

    let response: PredictResponse = serde_json::from_value(value).unwrap();
    assert_eq!(response.catalog.len(), 1);
    let event = &response.catalog[0];
    assert_eq!(event.event_idx, 0);
    // Three comma-separated covariance values: amplitude is on by default.
    assert_eq!(event.covariance.split(',').count(), 3);
    // Located within the network's neighborhood.
    assert!(event.longitude < -155.0 && event.longitude > -155.5);
    assert!(event.latitude > 19.3 && event.latitude < 19.5);

    // Every input pick appears exactly once, all claimed by event 0.
    assert_eq!(response.picks.len(), 6);
    for pick in &response.picks {
        assert_eq!(pick.event_idx, 0);
        assert!(pick.prob_gmma > 0.0 && pick.prob_gmma <= 1.0);
    }
}

#[tokio::test]
async fn test_predict_missing_station_geometry_is_422() {
    let (state, _) = test_state();
    let body = json!({
        "picks": event_picks(),
        "stations": [
            {"id": "HV.AHUD", "longitude": -155.26, "latitude": 19.37}
        ],
        "config": {}
    });
    let (status, value) = send_json(state, "POST", "/predict", body).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(value["error"].as_str().unwrap().contains("elevation(m)"));
}

#[tokio::test]
async fn test_predict_bad_timestamp_is_422() {
    let (state, _) = test_state();
    let body = json!({
        "picks": [{"id": "HV.AHUD", "type": "p", "timestamp": "29/07/2021 06:15"}],
        "stations": [
            {"id": "HV.AHUD", "longitude": -155.26, "latitude": 19.37, "elevation(m)": 1045.0}
        ],
        "config": {}
    });
    let (status, _) = send_json(state, "POST", "/predict", body).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_predict_stream_publishes_each_event() {
    let (state, publisher) = test_state();
    let (status, value) = send_json(
        state,
        "GET",
        "/predict_stream",
        json!({"picks": event_picks()}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let catalog: Vec<CatalogEntry> = serde_json::from_value(value).unwrap();
    assert_eq!(catalog.len(), 1);

    let published = publisher.published();
    assert_eq!(published.len(), 1);
    // Keyed by the event's time string.
    assert_eq!(published[0].0, catalog[0].time);
    assert_eq!(published[0].1, 0);
}

#[tokio::test]
async fn test_predict_stream_empty_picks_publishes_nothing() {
    let (state, publisher) = test_state();
    let (status, value) = send_json(state, "GET", "/predict_stream", json!({"picks": []})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value, json!([]));
    assert!(publisher.published().is_empty());
}
