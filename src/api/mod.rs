//! REST API module using Axum
//!
//! Thin transport layer over the association pipeline:
//! - `POST /predict` - associate request-supplied picks/stations/config
//! - `GET /predict_stream` - associate against the preloaded context and
//!   publish each event to the bus
//! - `GET /healthz` - liveness probe

mod handlers;
mod routes;

pub use handlers::{ApiState, PredictRequest, PredictResponse, StreamRequest};
pub use routes::create_app;
