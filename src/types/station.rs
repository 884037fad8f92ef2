//! Station geometry types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo;

/// A required geometry column was absent from the station table.
#[derive(Debug, Error)]
#[error("station {station}: missing required field `{field}`")]
pub struct MissingStationField {
    pub station: String,
    pub field: &'static str,
}

/// A station as received over the wire or read from the station table.
///
/// Geometry fields are optional at the serde layer so an absent column is
/// reported as a [`MissingStationField`] naming the station and column,
/// rather than an opaque deserialization failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationRecord {
    /// Station identifier (the table header may call this `station`).
    #[serde(alias = "station")]
    pub id: String,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default, rename = "elevation(m)")]
    pub elevation_m: Option<f64>,
}

impl StationRecord {
    /// Validate that all geometry columns are present.
    ///
    /// Returns `(longitude, latitude, elevation_m)`.
    pub fn geometry(&self) -> Result<(f64, f64, f64), MissingStationField> {
        let missing = |field| MissingStationField {
            station: self.id.clone(),
            field,
        };
        let longitude = self.longitude.ok_or_else(|| missing("longitude"))?;
        let latitude = self.latitude.ok_or_else(|| missing("latitude"))?;
        let elevation_m = self.elevation_m.ok_or_else(|| missing("elevation(m)"))?;
        Ok((longitude, latitude, elevation_m))
    }
}

/// A station with its local-frame coordinates derived. Immutable once
/// derived for a request; the projection always uses the center and scale
/// recorded in the resolved configuration.
#[derive(Debug, Clone, Serialize)]
pub struct Station {
    pub id: String,
    pub longitude: f64,
    pub latitude: f64,
    #[serde(rename = "elevation(m)")]
    pub elevation_m: f64,
    #[serde(rename = "x(km)")]
    pub x_km: f64,
    #[serde(rename = "y(km)")]
    pub y_km: f64,
    #[serde(rename = "z(km)")]
    pub z_km: f64,
}

impl Station {
    /// Project a wire record into the local frame.
    pub fn from_record(
        record: &StationRecord,
        center: (f64, f64),
        degree2km: f64,
    ) -> Result<Self, MissingStationField> {
        let (longitude, latitude, elevation_m) = record.geometry()?;
        let (x_km, y_km, z_km) = geo::forward(longitude, latitude, elevation_m, center, degree2km);
        Ok(Self {
            id: record.id.clone(),
            longitude,
            latitude,
            elevation_m,
            x_km,
            y_km,
            z_km,
        })
    }

    /// Project a whole station table, failing on the first incomplete record.
    pub fn from_records(
        records: &[StationRecord],
        center: (f64, f64),
        degree2km: f64,
    ) -> Result<Vec<Self>, MissingStationField> {
        records
            .iter()
            .map(|r| Self::from_record(r, center, degree2km))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, lon: f64, lat: f64, elev: f64) -> StationRecord {
        StationRecord {
            id: id.to_string(),
            longitude: Some(lon),
            latitude: Some(lat),
            elevation_m: Some(elev),
        }
    }

    #[test]
    fn test_projection_uses_center_and_scale() {
        let center = (-155.0, 19.0);
        let station =
            Station::from_record(&record("HV.AHUD", -154.5, 19.5, 1000.0), center, 100.0).unwrap();
        assert!((station.x_km - 50.0).abs() < 1e-9);
        assert!((station.y_km - 50.0).abs() < 1e-9);
        assert!((station.z_km + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_field_names_station_and_column() {
        let mut rec = record("HV.AHUD", -154.5, 19.5, 1000.0);
        rec.elevation_m = None;
        let err = Station::from_record(&rec, (-155.0, 19.0), 100.0).unwrap_err();
        assert_eq!(err.station, "HV.AHUD");
        assert_eq!(err.field, "elevation(m)");
    }

    #[test]
    fn test_station_alias_on_id_column() {
        let json = r#"{"station": "HV.AHUD", "longitude": -154.5, "latitude": 19.5, "elevation(m)": 1000.0}"#;
        let rec: StationRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.id, "HV.AHUD");
    }
}
