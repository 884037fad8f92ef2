//! API route definitions
//!
//! Organizes the association service endpoints:
//! - POST /predict - request-scoped association
//! - GET /predict_stream - context-scoped association + event publication
//! - GET /healthz - liveness probe

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use super::handlers::{self, ApiState};

/// Create the application router.
pub fn create_app(state: ApiState) -> Router {
    Router::new()
        .route("/predict", post(handlers::predict))
        .route("/predict_stream", get(handlers::predict_stream))
        .route("/healthz", get(handlers::healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
