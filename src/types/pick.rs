//! Phase-arrival pick types.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Wire format for pick timestamps (microsecond text form, fraction optional).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Output format for pick and event timestamps (millisecond precision).
pub const TIMESTAMP_FORMAT_MS: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// Hour-bucket label used for windowed batching, e.g. `2021-07-29T14`.
pub const HOUR_BUCKET_FORMAT: &str = "%Y-%m-%dT%H";

/// Pick parsing errors. Malformed picks fail the whole request; nothing is
/// silently skipped.
#[derive(Debug, Error)]
pub enum PickError {
    #[error("invalid timestamp {value:?}: expected %Y-%m-%dT%H:%M:%S%.f")]
    InvalidTimestamp { value: String },

    #[error("unknown phase type {0:?} (expected P or S)")]
    UnknownPhase(String),
}

/// Seismic phase type of a pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Phase {
    P,
    S,
}

impl Phase {
    /// Wire form: lowercase, matching the picker's output convention.
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::P => "p",
            Phase::S => "s",
        }
    }
}

impl TryFrom<String> for Phase {
    type Error = PickError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim() {
            "p" | "P" => Ok(Phase::P),
            "s" | "S" => Ok(Phase::S),
            other => Err(PickError::UnknownPhase(other.to_string())),
        }
    }
}

impl From<Phase> for String {
    fn from(phase: Phase) -> Self {
        phase.as_str().to_string()
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pick as received over the wire.
///
/// Unknown extra keys from the picker are ignored. `prob` is the picker's
/// confidence in the arrival and becomes the phase weight during
/// association; `amp` is the peak ground-motion amplitude and is only
/// consumed when `use_amplitude` is enabled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickRecord {
    /// Station identifier the arrival was detected at.
    pub id: String,
    /// Phase type, `p` or `s`.
    #[serde(rename = "type")]
    pub phase: Phase,
    /// Arrival time in `%Y-%m-%dT%H:%M:%S.%f` text form.
    pub timestamp: String,
    /// Peak amplitude, if the picker reports one.
    #[serde(default)]
    pub amp: Option<f64>,
    /// Picker confidence in [0, 1]. Defaults to 1 when absent.
    #[serde(default = "default_prob")]
    pub prob: f64,
}

fn default_prob() -> f64 {
    1.0
}

/// A pick with its timestamp parsed. One pick belongs to exactly one
/// station and, after association, to at most one event.
#[derive(Debug, Clone)]
pub struct Pick {
    pub station_id: String,
    pub phase: Phase,
    pub timestamp: NaiveDateTime,
    pub amp: Option<f64>,
    pub prob: f64,
}

impl Pick {
    /// Parse a wire record, validating the timestamp against the fixed format.
    pub fn parse(record: &PickRecord) -> Result<Self, PickError> {
        let timestamp = NaiveDateTime::parse_from_str(&record.timestamp, TIMESTAMP_FORMAT)
            .map_err(|_| PickError::InvalidTimestamp {
                value: record.timestamp.clone(),
            })?;
        Ok(Self {
            station_id: record.id.clone(),
            phase: record.phase,
            timestamp,
            amp: record.amp,
            prob: record.prob,
        })
    }

    /// Parse a whole pick table, failing on the first malformed record.
    pub fn parse_all(records: &[PickRecord]) -> Result<Vec<Self>, PickError> {
        records.iter().map(Self::parse).collect()
    }

    /// Arrival time as fractional seconds since the Unix epoch (UTC).
    pub fn epoch_seconds(&self) -> f64 {
        self.timestamp.and_utc().timestamp_micros() as f64 / 1e6
    }

    /// Hour-bucket label for windowed batching. Lexicographic order on the
    /// label is chronological order.
    pub fn hour_bucket(&self) -> String {
        self.timestamp.format(HOUR_BUCKET_FORMAT).to_string()
    }

    /// Timestamp re-serialized at millisecond precision.
    pub fn timestamp_ms(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT_MS).to_string()
    }
}
