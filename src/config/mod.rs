//! Association Configuration Module
//!
//! Provides the request-level configuration for the association pipeline,
//! replacing ad hoc key-existence checks with a typed partial/resolved
//! pair.
//!
//! ## Resolution Order
//!
//! 1. Values supplied in the request (or the startup TOML file)
//! 2. Values derived from station geometry (bounds, center, local frame)
//! 3. Built-in defaults (`config::defaults`)
//!
//! ## Usage
//!
//! ```ignore
//! let config = partial.resolve(&station_records)?;
//! let stations = Station::from_records(&station_records, config.center, config.degree2km)?;
//! ```

pub mod defaults;
mod gmma;

pub use gmma::{ConfigError, GmmaConfig, OptimBound, PartialGmmaConfig};
