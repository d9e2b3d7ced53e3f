//! plexfold-ingestion — Structural-prediction result reconciliation.
//!
//! Ingests heterogeneous prediction result files (two tool generations,
//! free-text and JSON forms, schema v3/v4) and reconciles them into one
//! canonical, deduplicated, confidence-classified interaction table:
//! - format parsers emitting canonical prediction records
//! - identifier normalisation (accessions, pseudo-accessions, bait/prey)
//! - multi-subunit complex assembly
//! - duplicate-equivalence grouping with explicit precedence
//! - idempotent Postgres reconciliation writer

pub mod complexes;
pub mod dedup;
pub mod discover;
pub mod formats;
pub mod models;
pub mod normalise;
pub mod pg_repository;
pub mod pipeline;
