//! Association configuration: partial wire form and resolved form.
//!
//! The wire/request form (`PartialGmmaConfig`) has every parameter
//! optional; `resolve()` fills the gaps deterministically from fixed
//! defaults and station geometry, producing a `GmmaConfig` where every
//! field the associator consumes is guaranteed present. "Missing key" is
//! "field not yet set" — there are no existence checks downstream.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::defaults;
use crate::types::{MissingStationField, StationRecord};

/// Configuration errors surfaced during resolution or startup loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    MissingStationField(#[from] MissingStationField),

    #[error("station table is empty: cannot derive spatial bounds")]
    NoStations,
}

/// Inclusive (lower, upper) bound pair for one dimension. `None` marks an
/// unbounded side (the optimizer's time dimension).
pub type OptimBound = (Option<f64>, Option<f64>);

/// Request-supplied configuration with every parameter optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartialGmmaConfig {
    /// Geographic center (longitude, latitude) of the local frame.
    #[serde(default)]
    pub center: Option<(f64, f64)>,
    /// Kilometres per degree at the deployment latitude.
    #[serde(default)]
    pub degree2km: Option<f64>,
    /// Longitude bounds in degrees.
    #[serde(default)]
    pub xlim_degree: Option<(f64, f64)>,
    /// Latitude bounds in degrees.
    #[serde(default)]
    pub ylim_degree: Option<(f64, f64)>,
    /// Local-frame x bounds in km.
    #[serde(default, rename = "x(km)")]
    pub x_km: Option<(f64, f64)>,
    /// Local-frame y bounds in km.
    #[serde(default, rename = "y(km)")]
    pub y_km: Option<(f64, f64)>,
    /// Depth bounds in km.
    #[serde(default, rename = "z(km)")]
    pub z_km: Option<(f64, f64)>,
    /// Per-dimension optimizer bounds plus an unbounded time dimension.
    #[serde(default)]
    pub bfgs_bounds: Option<Vec<OptimBound>>,
    #[serde(default)]
    pub use_dbscan: Option<bool>,
    #[serde(default)]
    pub use_amplitude: Option<bool>,
    /// DBSCAN neighborhood radius in seconds of arrival time.
    #[serde(default)]
    pub dbscan_eps: Option<f64>,
    #[serde(default)]
    pub dbscan_min_samples: Option<usize>,
    #[serde(default)]
    pub min_picks_per_eq: Option<usize>,
    #[serde(default)]
    pub oversample_factor: Option<usize>,
    /// Feature dimension names, in local-frame order.
    #[serde(default)]
    pub dims: Option<Vec<String>>,
}

/// Fully resolved configuration. Every parameter the associator consumes
/// is present; construction goes through [`PartialGmmaConfig::resolve`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GmmaConfig {
    pub center: (f64, f64),
    pub degree2km: f64,
    pub xlim_degree: (f64, f64),
    pub ylim_degree: (f64, f64),
    #[serde(rename = "x(km)")]
    pub x_km: (f64, f64),
    #[serde(rename = "y(km)")]
    pub y_km: (f64, f64),
    #[serde(rename = "z(km)")]
    pub z_km: (f64, f64),
    pub bfgs_bounds: Vec<OptimBound>,
    pub use_dbscan: bool,
    pub use_amplitude: bool,
    pub dbscan_eps: f64,
    pub dbscan_min_samples: usize,
    pub min_picks_per_eq: usize,
    pub oversample_factor: usize,
    pub dims: Vec<String>,
}

impl PartialGmmaConfig {
    /// Resolve into a complete configuration, deriving missing geospatial
    /// parameters from station geometry.
    ///
    /// Consumes the partial by value, so the caller's copy is never mutated
    /// in place. Fails when a geometry column needed for a derivation is
    /// absent from the station table.
    pub fn resolve(self, stations: &[StationRecord]) -> Result<GmmaConfig, ConfigError> {
        let degree2km = self.degree2km.unwrap_or(defaults::DEGREE2KM);
        let use_amplitude = self.use_amplitude.unwrap_or(defaults::USE_AMPLITUDE);
        let use_dbscan = self.use_dbscan.unwrap_or(defaults::USE_DBSCAN);
        let dbscan_eps = self.dbscan_eps.unwrap_or(defaults::DBSCAN_EPS_SECS);
        let dbscan_min_samples = self
            .dbscan_min_samples
            .unwrap_or(defaults::DBSCAN_MIN_SAMPLES);
        let oversample_factor = self.oversample_factor.unwrap_or(defaults::OVERSAMPLE_FACTOR);
        let min_picks_per_eq = self.min_picks_per_eq.unwrap_or(defaults::MIN_PICKS_PER_EQ);
        let dims = self
            .dims
            .unwrap_or_else(|| defaults::DIMS.iter().map(|d| d.to_string()).collect());

        // Spatial bounds from station extents when not supplied.
        let (xlim_degree, ylim_degree) = match (self.xlim_degree, self.ylim_degree) {
            (Some(x), Some(y)) => (x, y),
            (x, y) => {
                let extents = station_extents(stations)?;
                (x.unwrap_or(extents.0), y.unwrap_or(extents.1))
            }
        };

        let center = self.center.unwrap_or((
            (xlim_degree.0 + xlim_degree.1) / 2.0,
            (ylim_degree.0 + ylim_degree.1) / 2.0,
        ));

        // Local-frame bounds project the geographic bounds through the
        // same center/scale every later transform uses.
        let x_km = self.x_km.unwrap_or((
            (xlim_degree.0 - center.0) * degree2km,
            (xlim_degree.1 - center.0) * degree2km,
        ));
        let y_km = self.y_km.unwrap_or((
            (ylim_degree.0 - center.1) * degree2km,
            (ylim_degree.1 - center.1) * degree2km,
        ));
        let z_km = self.z_km.unwrap_or(defaults::Z_KM_RANGE);

        // Per-dimension local bounds plus an unbounded time dimension.
        let bfgs_bounds = self.bfgs_bounds.unwrap_or_else(|| {
            vec![
                (Some(x_km.0), Some(x_km.1)),
                (Some(y_km.0), Some(y_km.1)),
                (Some(z_km.0), Some(z_km.1)),
                (None, None),
            ]
        });

        Ok(GmmaConfig {
            center,
            degree2km,
            xlim_degree,
            ylim_degree,
            x_km,
            y_km,
            z_km,
            bfgs_bounds,
            use_dbscan,
            use_amplitude,
            dbscan_eps,
            dbscan_min_samples,
            min_picks_per_eq,
            oversample_factor,
            dims,
        })
    }
}

impl GmmaConfig {
    /// Tighten the clustering parameters to the actual network geometry.
    ///
    /// Applied once at startup for the preloaded context: the DBSCAN
    /// radius scales with the network diagonal (capped at 10 s), and the
    /// sample/pick thresholds scale with the station count so small
    /// networks still form events.
    pub fn tune_for_network(&mut self, stations: &[crate::types::Station]) {
        if stations.is_empty() {
            return;
        }
        let (min_x, max_x) = extent(stations.iter().map(|s| s.x_km));
        let (min_y, max_y) = extent(stations.iter().map(|s| s.y_km));
        let diagonal = ((max_x - min_x).powi(2) + (max_y - min_y).powi(2)).sqrt();

        let n = stations.len();
        self.dbscan_eps = (diagonal / defaults::EPS_DIAGONAL_DIVISOR).min(defaults::EPS_CAP_SECS);
        self.dbscan_min_samples = n.min(defaults::DBSCAN_MIN_SAMPLES);
        self.min_picks_per_eq = (n / 2).min(defaults::MIN_PICKS_PER_EQ);
        self.oversample_factor = (n / 2).min(defaults::OVERSAMPLE_FACTOR);
    }
}

/// Min/max longitude and latitude over the station table.
fn station_extents(
    stations: &[StationRecord],
) -> Result<((f64, f64), (f64, f64)), ConfigError> {
    if stations.is_empty() {
        return Err(ConfigError::NoStations);
    }
    let mut lon = (f64::INFINITY, f64::NEG_INFINITY);
    let mut lat = (f64::INFINITY, f64::NEG_INFINITY);
    for station in stations {
        let (longitude, latitude, _) = station.geometry()?;
        lon = (lon.0.min(longitude), lon.1.max(longitude));
        lat = (lat.0.min(latitude), lat.1.max(latitude));
    }
    Ok((lon, lat))
}

fn extent(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}
