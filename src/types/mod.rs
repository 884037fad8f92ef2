//! Shared data structures for the pick-association pipeline
//!
//! Wire-facing types (`PickRecord`, `StationRecord`, `CatalogEntry`,
//! `AssociatedPick`) carry serde derives matching the external schemas;
//! parsed types (`Pick`, `Station`) are what the pipeline works with
//! internally.

mod catalog;
mod pick;
mod station;

pub use catalog::*;
pub use pick::*;
pub use station::*;
