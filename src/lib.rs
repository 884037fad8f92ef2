//! gmma-assoc: Seismic Phase Association Service
//!
//! Assigns phase-arrival picks reported by a seismic network to discrete
//! earthquake events, producing a located catalog plus per-pick assignment
//! probabilities.
//!
//! ## Architecture
//!
//! - **Config**: typed partial/resolved configuration with geometry-derived
//!   gap filling
//! - **Geo**: geographic <-> local Cartesian frame transforms
//! - **Associator**: swappable clustering engine behind a one-operation trait
//! - **Pipeline**: hourly windowed batch orchestration with a single global
//!   event-index accumulator, plus catalog assembly
//! - **Publish**: fire-and-forget event delivery to the message bus
//! - **Api**: the HTTP surface (`/predict`, `/predict_stream`, `/healthz`)

pub mod api;
pub mod associator;
pub mod config;
pub mod context;
pub mod geo;
pub mod pipeline;
pub mod publish;
pub mod types;

// Re-export the request-facing configuration pair
pub use config::{GmmaConfig, PartialGmmaConfig};

// Re-export commonly used types
pub use types::{
    AssociatedPick, Assignment, CatalogEntry, CatalogRow, Phase, Pick, PickRecord, Station,
    StationRecord,
};

// Re-export the pipeline entry points
pub use associator::{Associator, MixtureAssociator};
pub use context::ServiceContext;
pub use pipeline::{AssociationError, AssociationPipeline};
pub use publish::{EventPublisher, KafkaPublisher, NoOpPublisher};
