//! API route handlers
//!
//! Request handling for the association endpoints. Malformed input (bad
//! timestamps, missing station geometry) fails the whole request with a
//! 422; no silent skipping of malformed picks. An associator failure is
//! a 500 and the already-computed partial results are discarded.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};

use crate::config::PartialGmmaConfig;
use crate::context::ServiceContext;
use crate::pipeline::{catalog, AssociationPipeline};
use crate::publish::EventPublisher;
use crate::types::{
    AssociatedPick, CatalogEntry, Pick, PickRecord, Station, StationRecord,
};

// ============================================================================
// API State
// ============================================================================

/// Shared state for the association endpoints.
#[derive(Clone)]
pub struct ApiState {
    /// Preloaded stations/config for `/predict_stream`.
    pub context: Arc<ServiceContext>,
    /// Windowed batch orchestrator.
    pub pipeline: Arc<AssociationPipeline>,
    /// Event bus sink for finalized events.
    pub publisher: Arc<dyn EventPublisher>,
}

// ============================================================================
// Errors
// ============================================================================

/// Handler-level error with its HTTP mapping.
pub enum ApiError {
    /// Malformed request data (bad timestamp, missing station geometry).
    UnprocessableEntity(String),
    /// Association run failed.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::UnprocessableEntity(message) => {
                warn!(error = %message, "Rejected malformed request");
                (StatusCode::UNPROCESSABLE_ENTITY, message)
            }
            ApiError::Internal(message) => {
                error!(error = %message, "Association run failed");
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

// ============================================================================
// Predict Endpoint
// ============================================================================

/// Body of `POST /predict`.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictRequest {
    pub picks: Vec<PickRecord>,
    pub stations: Vec<StationRecord>,
    #[serde(default)]
    pub config: PartialGmmaConfig,
}

/// Response of `POST /predict`: the catalog plus the pick table with
/// assignments joined on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub catalog: Vec<CatalogEntry>,
    pub picks: Vec<AssociatedPick>,
}

/// Associate request-supplied picks against request-supplied stations and
/// configuration.
pub async fn predict(
    State(state): State<ApiState>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, ApiError> {
    let picks = Pick::parse_all(&request.picks)
        .map_err(|e| ApiError::UnprocessableEntity(e.to_string()))?;

    let config = request
        .config
        .resolve(&request.stations)
        .map_err(|e| ApiError::UnprocessableEntity(e.to_string()))?;
    let stations = Station::from_records(&request.stations, config.center, config.degree2km)
        .map_err(|e| ApiError::UnprocessableEntity(e.to_string()))?;

    let run = state
        .pipeline
        .run(&picks, &stations, &config)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let response = PredictResponse {
        catalog: catalog::assemble(&run.catalog, &config),
        picks: catalog::join_assignments(&picks, &run.assignments),
    };
    info!(
        picks = response.picks.len(),
        events = response.catalog.len(),
        "Predict request served"
    );
    Ok(Json(response))
}

// ============================================================================
// Predict Stream Endpoint
// ============================================================================

/// Body of `GET /predict_stream`.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamRequest {
    pub picks: Vec<PickRecord>,
}

/// Associate picks against the preloaded context and publish each
/// finalized event to the bus.
pub async fn predict_stream(
    State(state): State<ApiState>,
    Json(request): Json<StreamRequest>,
) -> Result<Json<Vec<CatalogEntry>>, ApiError> {
    if request.picks.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let picks = Pick::parse_all(&request.picks)
        .map_err(|e| ApiError::UnprocessableEntity(e.to_string()))?;

    let context = &state.context;
    let run = state
        .pipeline
        .run(&picks, &context.stations, &context.config)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let entries = catalog::assemble(&run.catalog, &context.config);
    // Publish in catalog order, keyed by event time. Best-effort: delivery
    // problems are the publisher's to log, never the response's to carry.
    for event in &entries {
        state.publisher.publish(&event.time, event);
    }
    info!(
        picks = picks.len(),
        events = entries.len(),
        publisher = state.publisher.name(),
        "Stream request served"
    );
    Ok(Json(entries))
}

// ============================================================================
// Health Endpoint
// ============================================================================

/// Liveness probe.
pub async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
