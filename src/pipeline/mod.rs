//! Association Pipeline Module
//!
//! ## Pipeline Steps
//!
//! ```text
//! STEP 1: Pick parsing (timestamp validation, fail-fast)
//! STEP 2: Config resolution + station projection
//! STEP 3: Windowed batch association (coordinator)
//! STEP 4: Catalog assembly (inverse transform, covariance formatting)
//! STEP 5: Assignment join onto the pick table
//! STEP 6: Event publication (stream endpoint only)
//! ```

pub mod catalog;
mod coordinator;

pub use coordinator::{AssociationError, AssociationPipeline, AssociationRun};
