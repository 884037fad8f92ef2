//! Pick-to-feature transformation for the clustering engine.
//!
//! Counterpart of the pick table preprocessing step: arrival times become
//! epoch seconds, each pick is joined to its station's local coordinates,
//! and the picker confidence becomes the phase weight. Indices into the
//! original pick table are carried through so assignments can be joined
//! back after association.

use std::collections::HashMap;

use tracing::warn;

use crate::types::{Phase, Pick, Station};

/// Feature-transformed pick data for one association batch.
#[derive(Debug, Clone, Default)]
pub struct PhaseFeatures {
    /// Arrival times, fractional seconds since the Unix epoch.
    pub times_s: Vec<f64>,
    /// Peak amplitudes, where the picker reported one.
    pub amps: Vec<Option<f64>>,
    /// Local coordinates of the pick's station: `[x_km, y_km, z_km]`.
    pub locs: Vec<[f64; 3]>,
    /// Phase type per pick.
    pub phase_types: Vec<Phase>,
    /// Phase weight per pick (picker confidence).
    pub phase_weights: Vec<f64>,
    /// Index of each pick in the original request pick table.
    pub pick_idx: Vec<usize>,
    /// Number of stations in the network.
    pub n_stations: usize,
}

impl PhaseFeatures {
    /// Number of picks in the feature set.
    pub fn len(&self) -> usize {
        self.times_s.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times_s.is_empty()
    }
}

/// Build the feature set for one batch of picks.
///
/// Picks referencing a station absent from the table cannot be located and
/// are left out of the feature set; they surface as unassociated in the
/// final join.
pub fn extract(picks: &[(usize, &Pick)], stations: &[Station]) -> PhaseFeatures {
    let by_id: HashMap<&str, &Station> =
        stations.iter().map(|s| (s.id.as_str(), s)).collect();

    let mut features = PhaseFeatures {
        n_stations: stations.len(),
        ..Default::default()
    };

    for &(idx, pick) in picks {
        let Some(station) = by_id.get(pick.station_id.as_str()) else {
            warn!(
                station = %pick.station_id,
                pick_idx = idx,
                "Pick references unknown station — left unassociated"
            );
            continue;
        };
        features.times_s.push(pick.epoch_seconds());
        features.amps.push(pick.amp);
        features.locs.push([station.x_km, station.y_km, station.z_km]);
        features.phase_types.push(pick.phase);
        features.phase_weights.push(pick.prob);
        features.pick_idx.push(idx);
    }

    features
}
