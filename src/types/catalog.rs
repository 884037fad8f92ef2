//! Catalog and assignment row types.

use serde::{Deserialize, Serialize};

use super::{Phase, Pick};

/// Event index sentinel for picks that no event claimed.
pub const UNASSOCIATED: i64 = -1;

/// A located event in associator output form: origin time in epoch seconds,
/// local-frame coordinates, magnitude, and the 2x2 residual covariance
/// (time and log-amplitude residuals).
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogRow {
    pub event_idx: i64,
    pub time_s: f64,
    pub x_km: f64,
    pub y_km: f64,
    pub z_km: f64,
    pub magnitude: f64,
    pub covariance: [[f64; 2]; 2],
}

/// One pick-to-event assignment produced by the associator.
///
/// `pick_idx` indexes the original pick table for the whole request, not
/// the chunk the associator saw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assignment {
    pub pick_idx: usize,
    pub event_idx: i64,
    pub prob: f64,
}

/// A finalized catalog entry in the public schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Origin time, millisecond-precision text.
    pub time: String,
    pub magnitude: f64,
    pub longitude: f64,
    pub latitude: f64,
    #[serde(rename = "depth(m)")]
    pub depth_m: f64,
    /// Formatted residual covariance: one value, or three when amplitude
    /// was used (`var_t,var_amp,cov`), each to 3 decimal places.
    pub covariance: String,
    /// Global event index, unique and contiguous across the whole run.
    pub event_idx: i64,
}

/// A pick with its event assignment joined on, in the public schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssociatedPick {
    pub id: String,
    #[serde(rename = "type")]
    pub phase: Phase,
    /// Timestamp re-serialized at millisecond precision.
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amp: Option<f64>,
    /// Picker confidence carried through from the input.
    pub prob: f64,
    /// Assigned event index, or -1 when unassociated.
    pub event_idx: i64,
    /// Membership probability, or -1 when unassociated.
    pub prob_gmma: f64,
}

impl AssociatedPick {
    /// Build the joined row for a pick, using sentinels when no event
    /// claimed it.
    pub fn new(pick: &Pick, assignment: Option<&Assignment>) -> Self {
        let (event_idx, prob_gmma) = match assignment {
            Some(a) => (a.event_idx, a.prob),
            None => (UNASSOCIATED, -1.0),
        };
        Self {
            id: pick.station_id.clone(),
            phase: pick.phase,
            timestamp: pick.timestamp_ms(),
            amp: pick.amp,
            prob: pick.prob,
            event_idx,
            prob_gmma,
        }
    }
}
