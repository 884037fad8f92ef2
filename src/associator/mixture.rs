//! Built-in clustering engine: DBSCAN pre-clustering over arrival times
//! with a single weighted Gaussian summary per dense cluster.
//!
//! This is a coarse stand-in for a full Bayesian mixture engine, sharing
//! its contract: deterministic, no side effects, contiguous event indices
//! from the supplied offset. Arrival-time clustering is a good first cut
//! because a local event's picks span only the network crossing time,
//! which is what `dbscan_eps` encodes.

use statrs::statistics::{Data, OrderStatistics};
use tracing::debug;

use super::{AssociationBatch, Associator, AssociatorError, PhaseFeatures};
use crate::config::GmmaConfig;
use crate::types::{Assignment, CatalogRow};

/// Magnitude sentinel when amplitudes are unused or unavailable.
pub const MAGNITUDE_UNKNOWN: f64 = -999.0;

/// Hutton–Boore local-magnitude distance coefficient.
const ML_DISTANCE_COEFF: f64 = 1.110;
/// Hutton–Boore anelastic attenuation coefficient (per km).
const ML_ATTENUATION_COEFF: f64 = 0.00189;
/// Reference hypocentral distance for the magnitude scale (km).
const ML_REFERENCE_KM: f64 = 100.0;
/// Magnitude scale offset at the reference distance.
const ML_OFFSET: f64 = 3.0;

/// Floor on the time-residual standard deviation when scoring membership.
const MIN_SIGMA_T_SECS: f64 = 1e-3;

/// DBSCAN + per-cluster Gaussian summary associator.
#[derive(Debug, Clone, Copy, Default)]
pub struct MixtureAssociator;

impl MixtureAssociator {
    pub fn new() -> Self {
        Self
    }
}

impl Associator for MixtureAssociator {
    fn associate(
        &self,
        features: &PhaseFeatures,
        config: &GmmaConfig,
        event_idx0: i64,
    ) -> Result<AssociationBatch, AssociatorError> {
        if features.is_empty() {
            return Ok(AssociationBatch::default());
        }
        if features.times_s.iter().any(|t| !t.is_finite()) {
            return Err(AssociatorError::Degenerate(
                "non-finite arrival time".to_string(),
            ));
        }

        // Pre-cluster over arrival times; without DBSCAN the whole batch
        // is fit as one candidate cluster.
        let labels = if config.use_dbscan {
            dbscan_times(
                &features.times_s,
                config.dbscan_eps,
                config.dbscan_min_samples,
            )
        } else {
            vec![0; features.len()]
        };

        let n_clusters = labels.iter().copied().max().map_or(0, |m| (m + 1) as usize);
        let mut members: Vec<Vec<usize>> = vec![Vec::new(); n_clusters];
        for (i, &label) in labels.iter().enumerate() {
            if label >= 0 {
                members[label as usize].push(i);
            }
        }

        // Fit each dense cluster; thin ones stay unassociated.
        let mut fits: Vec<ClusterFit> = members
            .iter()
            .filter(|m| m.len() >= config.min_picks_per_eq)
            .map(|m| fit_cluster(m, features, config.use_amplitude))
            .collect();

        // Stable output order: ascending origin time.
        fits.sort_by(|a, b| a.time_s.total_cmp(&b.time_s));

        let mut batch = AssociationBatch::default();
        for (k, fit) in fits.into_iter().enumerate() {
            let event_idx = event_idx0 + k as i64;
            batch.catalog.push(CatalogRow {
                event_idx,
                time_s: fit.time_s,
                x_km: fit.x_km,
                y_km: fit.y_km,
                z_km: fit.z_km,
                magnitude: fit.magnitude,
                covariance: fit.covariance,
            });
            let sigma_t = fit.covariance[0][0].sqrt().max(MIN_SIGMA_T_SECS);
            for &i in &fit.members {
                let residual = (features.times_s[i] - fit.time_s) / sigma_t;
                batch.assignments.push(Assignment {
                    pick_idx: features.pick_idx[i],
                    event_idx,
                    prob: (-0.5 * residual * residual).exp(),
                });
            }
        }

        debug!(
            picks = features.len(),
            clusters = n_clusters,
            events = batch.len(),
            "Mixture association complete"
        );
        Ok(batch)
    }

    fn name(&self) -> &'static str {
        "Mixture"
    }
}

/// Fitted summary of one dense cluster.
struct ClusterFit {
    members: Vec<usize>,
    time_s: f64,
    x_km: f64,
    y_km: f64,
    z_km: f64,
    magnitude: f64,
    covariance: [[f64; 2]; 2],
}

/// Weighted Gaussian summary of a cluster: phase-weighted origin time and
/// centroid location, time/log-amplitude residual covariance, and a
/// local-magnitude estimate from the amplitudes.
fn fit_cluster(members: &[usize], features: &PhaseFeatures, use_amplitude: bool) -> ClusterFit {
    let weight_sum: f64 = members.iter().map(|&i| features.phase_weights[i]).sum();
    let weight_sum = if weight_sum > 0.0 {
        weight_sum
    } else {
        members.len() as f64
    };
    let w = |i: usize| {
        let w = features.phase_weights[i];
        if w > 0.0 {
            w
        } else {
            1.0
        }
    };

    let time_s = members.iter().map(|&i| w(i) * features.times_s[i]).sum::<f64>() / weight_sum;
    let mut centroid = [0.0; 3];
    for &i in members {
        for (axis, c) in centroid.iter_mut().enumerate() {
            *c += w(i) * features.locs[i][axis];
        }
    }
    for c in centroid.iter_mut() {
        *c /= weight_sum;
    }

    let var_t = members
        .iter()
        .map(|&i| w(i) * (features.times_s[i] - time_s).powi(2))
        .sum::<f64>()
        / weight_sum;

    // Log-amplitude moments over the members that carry an amplitude.
    let with_amp: Vec<usize> = members
        .iter()
        .copied()
        .filter(|&i| matches!(features.amps[i], Some(a) if a > 0.0))
        .collect();

    let (var_amp, cov_t_amp, magnitude) = if use_amplitude && !with_amp.is_empty() {
        let log_amp = |i: usize| features.amps[i].unwrap_or(f64::MIN_POSITIVE).log10();
        let amp_weight_sum: f64 = with_amp.iter().map(|&i| w(i)).sum();
        let mean_la =
            with_amp.iter().map(|&i| w(i) * log_amp(i)).sum::<f64>() / amp_weight_sum;
        let var_amp = with_amp
            .iter()
            .map(|&i| w(i) * (log_amp(i) - mean_la).powi(2))
            .sum::<f64>()
            / amp_weight_sum;
        let cov_t_amp = with_amp
            .iter()
            .map(|&i| w(i) * (features.times_s[i] - time_s) * (log_amp(i) - mean_la))
            .sum::<f64>()
            / amp_weight_sum;

        let station_mags: Vec<f64> = with_amp
            .iter()
            .map(|&i| {
                let [x, y, z] = features.locs[i];
                let r = ((x - centroid[0]).powi(2)
                    + (y - centroid[1]).powi(2)
                    + (z - centroid[2]).powi(2))
                .sqrt()
                .max(0.1);
                log_amp(i)
                    + ML_DISTANCE_COEFF * (r / ML_REFERENCE_KM).log10()
                    + ML_ATTENUATION_COEFF * (r - ML_REFERENCE_KM)
                    + ML_OFFSET
            })
            .collect();
        // Median over stations rejects single-station amplitude outliers.
        let mut station_mags = Data::new(station_mags);
        let magnitude = station_mags.median();
        (var_amp, cov_t_amp, magnitude)
    } else {
        (0.0, 0.0, MAGNITUDE_UNKNOWN)
    };

    ClusterFit {
        members: members.to_vec(),
        time_s,
        x_km: centroid[0],
        y_km: centroid[1],
        z_km: centroid[2],
        magnitude,
        covariance: [[var_t, cov_t_amp], [cov_t_amp, var_amp]],
    }
}

/// One-dimensional DBSCAN over arrival times.
///
/// Returns a label per pick: `-1` for noise, otherwise a cluster id.
/// Cluster ids are assigned in ascending time order. A point is a core
/// point when at least `min_samples` points (itself included) lie within
/// `eps` seconds; core points chain into clusters, non-core points attach
/// to the nearest core point within `eps`.
fn dbscan_times(times: &[f64], eps: f64, min_samples: usize) -> Vec<i64> {
    let n = times.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| times[a].total_cmp(&times[b]));

    // Neighbor counts via a sliding window over the sorted times.
    let sorted: Vec<f64> = order.iter().map(|&i| times[i]).collect();
    let mut core = vec![false; n];
    let mut lo = 0usize;
    let mut hi = 0usize;
    for k in 0..n {
        while sorted[k] - sorted[lo] > eps {
            lo += 1;
        }
        while hi < n && sorted[hi] - sorted[k] <= eps {
            hi += 1;
        }
        core[order[k]] = hi - lo >= min_samples;
    }

    // Chain core points: consecutive cores within eps share a cluster.
    let mut labels = vec![-1i64; n];
    let mut cluster = -1i64;
    let mut last_core_time: Option<f64> = None;
    for &i in &order {
        if !core[i] {
            continue;
        }
        match last_core_time {
            Some(t) if times[i] - t <= eps => {}
            _ => cluster += 1,
        }
        labels[i] = cluster;
        last_core_time = Some(times[i]);
    }

    // Attach border points to the nearest core point within eps.
    let core_sorted: Vec<usize> = order.iter().copied().filter(|&i| core[i]).collect();
    if core_sorted.is_empty() {
        return labels;
    }
    for &i in &order {
        if core[i] {
            continue;
        }
        let t = times[i];
        let pos = core_sorted.partition_point(|&c| times[c] < t);
        let mut best: Option<(f64, usize)> = None;
        for candidate in [pos.checked_sub(1), Some(pos)].into_iter().flatten() {
            if let Some(&c) = core_sorted.get(candidate) {
                let dist = (times[c] - t).abs();
                if dist <= eps && best.is_none_or(|(d, _)| dist < d) {
                    best = Some((dist, c));
                }
            }
        }
        if let Some((_, c)) = best {
            labels[i] = labels[c];
        }
    }

    labels
}
