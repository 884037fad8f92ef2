//! gmma-assoc - Seismic Phase Association Service
//!
//! HTTP service that assigns phase-arrival picks to earthquake events and
//! publishes the finalized catalog to the event bus.
//!
//! # Usage
//!
//! ```bash
//! # Run against the bundled Hawaii station table
//! cargo run --release -- --stations data/stations_hawaii.csv
//!
//! # Run without a broker (no event publication)
//! cargo run --release -- --stations data/stations_hawaii.csv --no-publish
//! ```
//!
//! # Environment Variables
//!
//! - `GMMA_BROKERS`: Kafka bootstrap servers (overrides the built-in
//!   in-cluster/localhost fallback chain)
//! - `RUST_LOG`: Logging level (default: info)

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gmma_assoc::api::{create_app, ApiState};
use gmma_assoc::associator::MixtureAssociator;
use gmma_assoc::config::defaults::{CLUSTER_BROKER, LOCAL_BROKER};
use gmma_assoc::context::ServiceContext;
use gmma_assoc::pipeline::AssociationPipeline;
use gmma_assoc::publish::{EventPublisher, KafkaPublisher, NoOpPublisher};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "gmma-assoc")]
#[command(about = "Seismic phase association service")]
#[command(version)]
struct CliArgs {
    /// Server address (default: "0.0.0.0:8000")
    #[arg(short, long, default_value = "0.0.0.0:8000")]
    addr: String,

    /// Path to the tab-delimited station table
    #[arg(long, default_value = "data/stations_hawaii.csv")]
    stations: PathBuf,

    /// Path to the association config TOML (optional; defaults plus
    /// geometry-derived values are used when absent)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Kafka bootstrap servers (falls back to the in-cluster address, then
    /// localhost)
    #[arg(long, env = "GMMA_BROKERS")]
    brokers: Option<String>,

    /// Disable event publication entirely
    #[arg(long)]
    no_publish: bool,
}

/// Connect the event bus, trying the in-cluster broker first, then the
/// local one. A dead bus downgrades to the no-op publisher — association
/// still works, delivery is best-effort.
fn connect_publisher(args: &CliArgs) -> Arc<dyn EventPublisher> {
    if args.no_publish {
        info!("Event publication disabled (--no-publish)");
        return Arc::new(NoOpPublisher);
    }

    let candidates: Vec<String> = match &args.brokers {
        Some(brokers) => vec![brokers.clone()],
        None => vec![CLUSTER_BROKER.to_string(), LOCAL_BROKER.to_string()],
    };

    for brokers in &candidates {
        match KafkaPublisher::connect(brokers) {
            Ok(publisher) => return Arc::new(publisher),
            Err(e) => warn!(brokers = %brokers, error = %e, "Event bus connection failed"),
        }
    }

    warn!("No event bus reachable — events will not be published");
    Arc::new(NoOpPublisher)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();

    let context = ServiceContext::load(&args.stations, args.config.as_deref())
        .with_context(|| format!("loading service context from {}", args.stations.display()))?;

    let state = ApiState {
        context: Arc::new(context),
        pipeline: Arc::new(AssociationPipeline::new(Arc::new(MixtureAssociator::new()))),
        publisher: connect_publisher(&args),
    };

    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(&args.addr)
        .await
        .with_context(|| format!("binding {}", args.addr))?;
    info!(addr = %args.addr, "Association service listening");
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
