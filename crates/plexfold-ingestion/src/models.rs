//! Canonical data models for the reconciliation pipeline.
//!
//! Every format parser emits `PredictionRecord`s of this one shape; the
//! parsers own all per-format default substitution, so nothing
//! downstream ever sees a partially decoded entry.

use plexfold_common::confidence::{AuxTier, ConfidenceBand, InterfaceTier};
use serde::{Deserialize, Serialize};

/// Ordered schema-version token. The derived `Ord` is the reconciliation
/// precedence: `Legacy < V3 < V4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVersion {
    Legacy,
    V3,
    V4,
}

impl SchemaVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaVersion::Legacy => "legacy",
            SchemaVersion::V3     => "v3",
            SchemaVersion::V4     => "v4",
        }
    }

    /// Parse a stored token. Unknown tokens rank with `legacy` ("other"
    /// precedence), they are never an error.
    pub fn parse(token: &str) -> Self {
        match token {
            "v4" => SchemaVersion::V4,
            "v3" => SchemaVersion::V3,
            _    => SchemaVersion::Legacy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolGeneration {
    Legacy,
    Current,
}

impl ToolGeneration {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolGeneration::Legacy  => "legacy",
            ToolGeneration::Current => "current",
        }
    }
}

/// A resolved protein reference: canonical accession plus whatever
/// display metadata the source supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProteinRef {
    pub accession: String,
    pub display_name: Option<String>,
}

impl ProteinRef {
    pub fn new(accession: impl Into<String>) -> Self {
        Self { accession: accession.into(), display_name: None }
    }

    pub fn with_name(accession: impl Into<String>, name: impl Into<String>) -> Self {
        Self { accession: accession.into(), display_name: Some(name.into()) }
    }
}

/// The fixed-partner side of a prediction: a single protein or a
/// multi-subunit bait complex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BaitRef {
    Protein(ProteinRef),
    Complex {
        /// Members in source order (the complex key sorts them itself).
        members: Vec<ProteinRef>,
        variant_tag: String,
        /// Directory token the complex was parsed from.
        directory: String,
    },
}

impl BaitRef {
    pub fn is_complex(&self) -> bool {
        matches!(self, BaitRef::Complex { .. })
    }
}

/// One canonical prediction, as emitted by any of the format parsers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub bait: BaitRef,
    pub prey: ProteinRef,
    /// Primary interaction score, 0..1.
    pub primary_score: f64,
    /// Strict-threshold interface contact count.
    pub contact_count: Option<i32>,
    /// Mean interface confidence, 0..100.
    pub interface_confidence: Option<f64>,
    /// Auxiliary per-interface score, 0..1 (schema v4 only).
    pub auxiliary_score: Option<f64>,
    /// PAE cutoff the auxiliary score was computed under (v4 only).
    pub aux_pae_cutoff: Option<f64>,
    pub tool_generation: ToolGeneration,
    pub schema_version: SchemaVersion,
    /// Opaque origin string; part of the store identity, distinguishes
    /// independent runs of the same pair.
    pub source_origin: String,
    /// Parse-time band (legacy banners / JSON confidence_class).
    pub band: Option<ConfidenceBand>,
    /// Derived interface-quality tier (current generation only).
    pub interface_tier: Option<InterfaceTier>,
    /// Derived auxiliary tier (v4 only).
    pub aux_tier: Option<AuxTier>,
}

impl PredictionRecord {
    /// The tier string persisted in `confidence_tier`: legacy records
    /// pass their band through unchanged, current-generation records
    /// store the computed interface tier, alternate-legacy records store
    /// nothing.
    pub fn stored_tier(&self) -> Option<&'static str> {
        match self.tool_generation {
            ToolGeneration::Legacy  => self.band.map(|b| b.label()),
            ToolGeneration::Current => self.interface_tier.map(|t| t.as_str()),
        }
    }
}

/// Why a single source entry was skipped. Skips are counted by the
/// caller; they never abort a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseSkip {
    /// Entry failed grammar or numeric extraction.
    Malformed,
    /// Fewer accessions than the record shape requires.
    Unresolvable,
    /// Lowest-band JSON object, not store-eligible.
    BelowBand,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_version_precedence_order() {
        assert!(SchemaVersion::V4 > SchemaVersion::V3);
        assert!(SchemaVersion::V3 > SchemaVersion::Legacy);
    }

    #[test]
    fn test_schema_version_parse_unknown_ranks_lowest() {
        assert_eq!(SchemaVersion::parse("v4"), SchemaVersion::V4);
        assert_eq!(SchemaVersion::parse("v3"), SchemaVersion::V3);
        assert_eq!(SchemaVersion::parse("v2"), SchemaVersion::Legacy);
        assert_eq!(SchemaVersion::parse("legacy"), SchemaVersion::Legacy);
    }

    #[test]
    fn test_stored_tier_by_generation() {
        let mut rec = PredictionRecord {
            bait: BaitRef::Protein(ProteinRef::new("Q9P2L0")),
            prey: ProteinRef::new("Q13635"),
            primary_score: 0.47,
            contact_count: Some(30),
            interface_confidence: Some(62.0),
            auxiliary_score: None,
            aux_pae_cutoff: None,
            tool_generation: ToolGeneration::Legacy,
            schema_version: SchemaVersion::Legacy,
            source_origin: "run1".to_string(),
            band: Some(ConfidenceBand::VeryHigh),
            interface_tier: None,
            aux_tier: None,
        };
        assert_eq!(rec.stored_tier(), Some("Very High Confidence"));

        rec.tool_generation = ToolGeneration::Current;
        rec.interface_tier = Some(InterfaceTier::Low);
        assert_eq!(rec.stored_tier(), Some("Low"));

        rec.interface_tier = None;
        assert_eq!(rec.stored_tier(), None);
    }
}
