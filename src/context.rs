//! Process-wide service context: the preloaded station table and resolved
//! configuration.
//!
//! Loaded once at startup and injected into the request handlers as a
//! read-only object — never module-level shared state. `/predict_stream`
//! associates against this context; `/predict` carries its own stations
//! and config in the request body.

use std::path::Path;

use thiserror::Error;
use tracing::info;

use crate::config::{ConfigError, GmmaConfig, PartialGmmaConfig};
use crate::types::{Station, StationRecord};

/// Startup loading errors. All of these are fatal: the service cannot
/// associate without a station table.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse station table {path}: {source}")]
    StationTable { path: String, source: csv::Error },

    #[error("failed to parse config {path}: {source}")]
    ConfigFile {
        path: String,
        source: toml::de::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Read-only context shared by all `/predict_stream` requests.
#[derive(Debug, Clone)]
pub struct ServiceContext {
    pub stations: Vec<Station>,
    pub config: GmmaConfig,
}

impl ServiceContext {
    /// Load the station table and configuration, resolve the config
    /// against the station geometry, tune the clustering parameters to
    /// the network, and project the stations into the local frame.
    pub fn load(station_path: &Path, config_path: Option<&Path>) -> Result<Self, ContextError> {
        let records = load_stations(station_path)?;
        let partial = match config_path {
            Some(path) => load_partial_config(path)?,
            None => PartialGmmaConfig::default(),
        };

        let mut config = partial.resolve(&records)?;
        let stations = Station::from_records(&records, config.center, config.degree2km)
            .map_err(ConfigError::from)?;
        config.tune_for_network(&stations);

        info!(
            stations = stations.len(),
            center_lon = config.center.0,
            center_lat = config.center.1,
            dbscan_eps = config.dbscan_eps,
            min_picks_per_eq = config.min_picks_per_eq,
            "Service context loaded"
        );
        Ok(Self { stations, config })
    }
}

/// Load the tab-delimited station table. The header's `station` column is
/// accepted as the id.
pub fn load_stations(path: &Path) -> Result<Vec<StationRecord>, ContextError> {
    let display = path.display().to_string();
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_path(path)
        .map_err(|source| ContextError::StationTable {
            path: display.clone(),
            source,
        })?;

    let mut records = Vec::new();
    for result in reader.deserialize() {
        let record: StationRecord = result.map_err(|source| ContextError::StationTable {
            path: display.clone(),
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Load the startup configuration TOML into its partial form.
pub fn load_partial_config(path: &Path) -> Result<PartialGmmaConfig, ContextError> {
    let display = path.display().to_string();
    let contents = std::fs::read_to_string(path).map_err(|source| ContextError::Io {
        path: display.clone(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ContextError::ConfigFile {
        path: display,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const STATION_TSV: &str = "station\tlongitude\tlatitude\televation(m)\n\
HV.AHUD\t-155.26\t19.37\t1045.0\n\
HV.BYL\t-155.30\t19.41\t1085.0\n\
HV.DEVL\t-155.24\t19.39\t1130.0\n";

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_station_table() {
        let file = write_temp(STATION_TSV);
        let records = load_stations(file.path()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].id, "HV.AHUD");
        assert_eq!(records[1].elevation_m, Some(1085.0));
    }

    #[test]
    fn test_load_context_without_config_file() {
        let file = write_temp(STATION_TSV);
        let context = ServiceContext::load(file.path(), None).unwrap();
        assert_eq!(context.stations.len(), 3);
        // Center sits at the midpoint of the station extents.
        assert!((context.config.center.0 - (-155.27)).abs() < 1e-9);
        assert!((context.config.center.1 - 19.39).abs() < 1e-9);
        // Network tuning shrinks the pick threshold for a 3-station net.
        assert_eq!(context.config.min_picks_per_eq, 1);
    }

    #[test]
    fn test_load_context_with_config_file() {
        let stations = write_temp(STATION_TSV);
        let config = write_temp(
            "degree2km = 111.0\n\
dbscan_eps = 4.5\n\
use_amplitude = false\n",
        );
        let context = ServiceContext::load(stations.path(), Some(config.path())).unwrap();
        assert_eq!(context.config.degree2km, 111.0);
        assert!(!context.config.use_amplitude);
        // Network tuning recomputes eps from the station diagonal.
        assert!(context.config.dbscan_eps <= 10.0);
    }

    #[test]
    fn test_missing_station_file_is_an_error() {
        let err = load_stations(Path::new("/nonexistent/stations.csv")).unwrap_err();
        assert!(matches!(err, ContextError::StationTable { .. }));
    }
}
