//! System-wide default constants.
//!
//! Centralises the fixed association defaults and pipeline limits.
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Geospatial
// ============================================================================

/// Kilometres per degree at the deployment latitude.
pub const DEGREE2KM: f64 = 112.195;

/// Default depth search range (km). Shallow crustal seismicity only.
pub const Z_KM_RANGE: (f64, f64) = (0.0, 41.0);

/// Feature dimension names, in local-frame order.
pub const DIMS: [&str; 3] = ["x(km)", "y(km)", "z(km)"];

// ============================================================================
// Clustering
// ============================================================================

/// DBSCAN neighborhood radius over arrival times (seconds).
pub const DBSCAN_EPS_SECS: f64 = 6.0;

/// Minimum neighbors (self included) for a DBSCAN core point.
pub const DBSCAN_MIN_SAMPLES: usize = 3;

/// Whether DBSCAN pre-clustering is enabled.
pub const USE_DBSCAN: bool = true;

/// Whether amplitudes participate in association and magnitude estimation.
pub const USE_AMPLITUDE: bool = true;

/// Minimum picks for a cluster to become a catalog event.
pub const MIN_PICKS_PER_EQ: usize = 10;

/// Mixture-component oversampling factor for the clustering engine.
pub const OVERSAMPLE_FACTOR: usize = 10;

/// Network-diagonal divisor for the startup eps derivation.
///
/// 6/1.75 ~ the diagonal crossing time of the network at crustal P speed.
pub const EPS_DIAGONAL_DIVISOR: f64 = 6.0 / 1.75;

/// Upper cap on the derived DBSCAN radius (seconds).
pub const EPS_CAP_SECS: f64 = 10.0;

// ============================================================================
// Pipeline
// ============================================================================

/// Pick count at or above which a request is split into hourly windows.
///
/// Bounds the per-call clustering cost; hourly buckets are a
/// domain-appropriate unit since seismic sequences rarely span bucket
/// boundaries meaningfully.
pub const MAX_PICKS_PER_BATCH: usize = 5000;

// ============================================================================
// Event bus
// ============================================================================

/// Kafka topic finalized events are published to.
pub const EVENT_TOPIC: &str = "gmma_events";

/// In-cluster broker address tried first at startup.
pub const CLUSTER_BROKER: &str = "quakeflow-kafka-headless:9092";

/// Local broker fallback for development runs.
pub const LOCAL_BROKER: &str = "localhost:9092";

/// Broker metadata probe timeout (seconds).
pub const BROKER_PROBE_TIMEOUT_SECS: u64 = 10;
