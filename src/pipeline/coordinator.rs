//! Association Pipeline Coordinator — windowed batch orchestration.
//!
//! Drives the clustering engine over one request's picks:
//!
//! ```text
//! STEP 1: Empty input short-circuit (empty catalog, empty assignments)
//! STEP 2: Volume check (< 5000 picks -> one batch)
//! STEP 3: Hourly windowing (>= 5000 picks -> one chunk per hour bucket)
//! STEP 4: Per-chunk association, ascending chronological order
//! STEP 5: Result accumulation with a single global event-index offset
//! ```
//!
//! HARD ORDERING DEPENDENCY: each chunk's starting event index equals the
//! number of events issued by all prior chunks, so chunk processing is
//! strictly sequential. The offset is an explicit accumulator threaded
//! through each call — never a shared counter.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info};

use crate::associator::{features, Associator, AssociatorError};
use crate::config::defaults::MAX_PICKS_PER_BATCH;
use crate::config::GmmaConfig;
use crate::types::{Assignment, CatalogRow, Pick, Station};

/// A chunk's association failed; the whole run is aborted and partial
/// catalogs from prior chunks are discarded.
#[derive(Debug, Error)]
#[error("association failed for window {window}: {source}")]
pub struct AssociationError {
    /// Time-window identifier of the failing chunk.
    pub window: String,
    #[source]
    pub source: AssociatorError,
}

/// Accumulated output of one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct AssociationRun {
    pub catalog: Vec<CatalogRow>,
    pub assignments: Vec<Assignment>,
    /// Associator invocations performed (one per non-empty chunk).
    pub chunks_processed: usize,
}

impl AssociationRun {
    /// Number of events issued across all chunks.
    pub fn events(&self) -> usize {
        self.catalog.len()
    }
}

/// Windowed batch orchestrator over a swappable clustering engine.
pub struct AssociationPipeline {
    associator: Arc<dyn Associator>,
}

impl AssociationPipeline {
    pub fn new(associator: Arc<dyn Associator>) -> Self {
        Self { associator }
    }

    /// Associate one request's picks into a catalog and assignment set.
    ///
    /// Pick indices in the returned assignments refer to positions in
    /// `picks`. Event indices are unique and contiguous from 0 across the
    /// whole run.
    pub fn run(
        &self,
        picks: &[Pick],
        stations: &[Station],
        config: &GmmaConfig,
    ) -> Result<AssociationRun, AssociationError> {
        if picks.is_empty() {
            debug!("No picks in request — empty catalog");
            return Ok(AssociationRun::default());
        }

        let start = Instant::now();
        let mut run = AssociationRun::default();

        if picks.len() < MAX_PICKS_PER_BATCH {
            let indexed: Vec<(usize, &Pick)> = picks.iter().enumerate().collect();
            self.run_chunk("all", &indexed, stations, config, 0, &mut run)?;
        } else {
            // Bucket by timestamp truncated to the hour. BTreeMap keys are
            // the bucket labels, whose lexicographic order is chronological.
            let mut buckets: BTreeMap<String, Vec<(usize, &Pick)>> = BTreeMap::new();
            for (idx, pick) in picks.iter().enumerate() {
                buckets.entry(pick.hour_bucket()).or_default().push((idx, pick));
            }
            info!(
                picks = picks.len(),
                windows = buckets.len(),
                "Pick volume above batch ceiling — processing by hour window"
            );
            let mut event_idx0: i64 = 0;
            for (window, chunk) in &buckets {
                if chunk.is_empty() {
                    continue;
                }
                event_idx0 =
                    self.run_chunk(window, chunk, stations, config, event_idx0, &mut run)?;
            }
        }

        info!(
            picks = picks.len(),
            events = run.events(),
            assignments = run.assignments.len(),
            chunks = run.chunks_processed,
            elapsed_ms = start.elapsed().as_millis(),
            engine = self.associator.name(),
            "Association run complete"
        );
        Ok(run)
    }

    /// Process one chunk, appending its results and returning the advanced
    /// event-index offset.
    fn run_chunk(
        &self,
        window: &str,
        chunk: &[(usize, &Pick)],
        stations: &[Station],
        config: &GmmaConfig,
        event_idx0: i64,
        run: &mut AssociationRun,
    ) -> Result<i64, AssociationError> {
        let features = features::extract(chunk, stations);
        if features.is_empty() {
            debug!(window, "No locatable picks in window — skipping");
            return Ok(event_idx0);
        }

        let batch = self
            .associator
            .associate(&features, config, event_idx0)
            .map_err(|source| AssociationError {
                window: window.to_string(),
                source,
            })?;

        debug!(
            window,
            picks = chunk.len(),
            events = batch.len(),
            event_idx0,
            "Window associated"
        );

        let advanced = event_idx0 + batch.len() as i64;
        run.catalog.extend(batch.catalog);
        run.assignments.extend(batch.assignments);
        run.chunks_processed += 1;
        Ok(advanced)
    }
}
