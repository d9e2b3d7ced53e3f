//! plexfold-common — Shared error type and confidence classification
//! used across all Plexfold crates.

pub mod confidence;
pub mod error;

pub use confidence::{AuxTier, ConfidenceBand, InterfaceTier};
pub use error::{PlexfoldError, Result};
