//! Catalog assembly: raw event tuples to the public schema, and the
//! assignment join back onto the pick table.

use std::collections::HashMap;

use chrono::DateTime;

use crate::config::GmmaConfig;
use crate::geo;
use crate::types::{
    AssociatedPick, Assignment, CatalogEntry, CatalogRow, Pick, TIMESTAMP_FORMAT_MS,
};

/// Render epoch seconds as millisecond-precision UTC text.
pub fn from_seconds(time_s: f64) -> String {
    let micros = (time_s * 1e6).round() as i64;
    // Out-of-range timestamps clamp to the epoch rather than panic; the
    // associator never emits them for parseable picks.
    let datetime = DateTime::from_timestamp_micros(micros).unwrap_or(DateTime::UNIX_EPOCH);
    datetime.naive_utc().format(TIMESTAMP_FORMAT_MS).to_string()
}

/// Format the residual covariance for the public catalog.
///
/// Three values (`var_t,var_amp,cov`) when amplitude was used, one value
/// otherwise, each to 3 decimal places.
pub fn format_covariance(covariance: &[[f64; 2]; 2], use_amplitude: bool) -> String {
    if use_amplitude {
        format!(
            "{:.3},{:.3},{:.3}",
            covariance[0][0], covariance[1][1], covariance[0][1]
        )
    } else {
        format!("{:.3}", covariance[0][0])
    }
}

/// Convert accumulated catalog rows into the public catalog schema.
///
/// Performs the inverse coordinate transform through the same center and
/// scale recorded in the resolved config, and drops the internal
/// local-coordinate columns.
pub fn assemble(rows: &[CatalogRow], config: &GmmaConfig) -> Vec<CatalogEntry> {
    rows.iter()
        .map(|row| {
            let (longitude, latitude, depth_m) =
                geo::inverse(row.x_km, row.y_km, row.z_km, config.center, config.degree2km);
            CatalogEntry {
                time: from_seconds(row.time_s),
                magnitude: row.magnitude,
                longitude,
                latitude,
                depth_m,
                covariance: format_covariance(&row.covariance, config.use_amplitude),
                event_idx: row.event_idx,
            }
        })
        .collect()
}

/// Join the assignment set onto the original pick table by pick index.
///
/// Every input pick appears exactly once in the output; picks no event
/// claimed keep the -1 sentinels. Timestamps are re-serialized at
/// millisecond precision.
pub fn join_assignments(picks: &[Pick], assignments: &[Assignment]) -> Vec<AssociatedPick> {
    let by_pick: HashMap<usize, &Assignment> =
        assignments.iter().map(|a| (a.pick_idx, a)).collect();
    picks
        .iter()
        .enumerate()
        .map(|(idx, pick)| AssociatedPick::new(pick, by_pick.get(&idx).copied()))
        .collect()
}
