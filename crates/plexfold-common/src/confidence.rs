//! Confidence classification for predicted interactions.
//!
//! Two independent, total, pure schemes:
//! - the interface-quality scheme, mapping (primary score, interface
//!   contact count, mean interface confidence) to High/Medium/Low —
//!   applied to current-generation records only; legacy records keep
//!   their parse-time band;
//! - the auxiliary-score scheme (schema v4 only), a four-tier
//!   classification of the per-interface auxiliary score.
//!
//! Every parser and the reconciliation writer call into this module;
//! no other code computes tiers.

use serde::{Deserialize, Serialize};

// Interface-quality thresholds.
const HIGH_SCORE: f64 = 0.70;
const MEDIUM_SCORE: f64 = 0.60;
const SPARSE_SCORE_CEILING: f64 = 0.75;
const SPARSE_CONTACT_FLOOR: i64 = 5;

/// Output of the interface-quality scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterfaceTier {
    High,
    Medium,
    Low,
}

impl InterfaceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterfaceTier::High   => "High",
            InterfaceTier::Medium => "Medium",
            InterfaceTier::Low    => "Low",
        }
    }
}

/// Output of the auxiliary-score scheme (schema v4 only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuxTier {
    High,
    Medium,
    Low,
    VeryLow,
}

impl AuxTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuxTier::High    => "High",
            AuxTier::Medium  => "Medium",
            AuxTier::Low     => "Low",
            AuxTier::VeryLow => "Very-Low",
        }
    }
}

/// The three-band vocabulary shared by legacy report banners and the
/// v3/v4 `confidence_class` field. Medium is the lowest band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceBand {
    VeryHigh,
    High,
    Medium,
}

impl ConfidenceBand {
    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceBand::VeryHigh => "Very High Confidence",
            ConfidenceBand::High     => "High Confidence",
            ConfidenceBand::Medium   => "Medium Confidence",
        }
    }

    /// Recognise a band from a banner line or a `confidence_class`
    /// string. Case-insensitive; "very high" must be tested before
    /// "high".
    pub fn from_label(s: &str) -> Option<Self> {
        let u = s.to_uppercase();
        if !u.contains("CONFIDENCE") {
            return None;
        }
        if u.contains("VERY HIGH") {
            Some(ConfidenceBand::VeryHigh)
        } else if u.contains("HIGH") {
            Some(ConfidenceBand::High)
        } else if u.contains("MEDIUM") {
            Some(ConfidenceBand::Medium)
        } else {
            None
        }
    }

    /// Lowest-band objects are not store-eligible in the JSON formats.
    pub fn is_lowest(&self) -> bool {
        matches!(self, ConfidenceBand::Medium)
    }
}

/// Interface-quality scheme. Null inputs coerce to 0 before evaluation.
///
/// A sparse interface (score < 0.75 and fewer than 5 contacts) cannot be
/// rescued by the contact-supported branches, and its pure-score Medium
/// branch is also withheld; only a primary score of at least 0.70
/// classifies such a record above Low.
pub fn interface_tier(
    primary_score: f64,
    contact_count: Option<i64>,
    interface_confidence: Option<f64>,
) -> InterfaceTier {
    let score = primary_score;
    let contacts = contact_count.unwrap_or(0);
    let iface = interface_confidence.unwrap_or(0.0);

    let sparse = score < SPARSE_SCORE_CEILING && contacts < SPARSE_CONTACT_FLOOR;

    if score >= HIGH_SCORE {
        return InterfaceTier::High;
    }
    if !sparse
        && ((contacts >= 40 && iface >= 80.0)
            || (contacts >= 30 && score >= 0.50 && iface >= 80.0))
    {
        return InterfaceTier::High;
    }
    if (!sparse && score >= MEDIUM_SCORE)
        || (contacts >= 20 && iface >= 75.0)
        || (contacts >= 15 && score >= 0.45)
    {
        return InterfaceTier::Medium;
    }
    InterfaceTier::Low
}

/// Auxiliary-score scheme: numeric fallback used when the producer did
/// not supply an `ipsae_confidence_class`.
pub fn aux_tier_from_score(aux_score: f64) -> AuxTier {
    if aux_score > 0.70 {
        AuxTier::High
    } else if aux_score >= 0.50 {
        AuxTier::Medium
    } else if aux_score >= 0.30 {
        AuxTier::Low
    } else {
        AuxTier::VeryLow
    }
}

/// Normalise a producer-side auxiliary class name to the four-value
/// enum. The source vocabulary is differently capitalised and decorated
/// ("Low/Ambiguous", "Very low", "Very-Low").
pub fn normalise_aux_class(label: &str) -> Option<AuxTier> {
    let l = label.trim().to_lowercase();
    if l.starts_with("very") {
        Some(AuxTier::VeryLow)
    } else if l.starts_with("high") {
        Some(AuxTier::High)
    } else if l.starts_with("medium") {
        Some(AuxTier::Medium)
    } else if l.starts_with("low") {
        Some(AuxTier::Low)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_high_boundary_score_alone() {
        // Pure-score High branch ignores the sparse-interface guard.
        assert_eq!(interface_tier(0.70, Some(0), Some(0.0)), InterfaceTier::High);
    }

    #[test]
    fn test_just_below_high_sparse_falls_to_low() {
        // 0.699999 with no contacts: the sparse guard withholds the
        // pure-score Medium branch, and the remaining Medium branches
        // need at least 15 contacts.
        assert_eq!(interface_tier(0.699999, Some(0), Some(0.0)), InterfaceTier::Low);
    }

    #[test]
    fn test_contact_supported_high() {
        assert_eq!(interface_tier(0.40, Some(40), Some(80.0)), InterfaceTier::High);
        assert_eq!(interface_tier(0.50, Some(30), Some(80.0)), InterfaceTier::High);
        // Same contacts but weak interface confidence: not High.
        assert_eq!(interface_tier(0.50, Some(30), Some(70.0)), InterfaceTier::Medium);
    }

    #[test]
    fn test_medium_branches() {
        assert_eq!(interface_tier(0.60, Some(10), Some(0.0)), InterfaceTier::Medium);
        assert_eq!(interface_tier(0.30, Some(20), Some(75.0)), InterfaceTier::Medium);
        assert_eq!(interface_tier(0.45, Some(15), Some(0.0)), InterfaceTier::Medium);
        assert_eq!(interface_tier(0.44, Some(15), Some(0.0)), InterfaceTier::Low);
    }

    #[test]
    fn test_null_inputs_coerce_to_zero() {
        assert_eq!(interface_tier(0.468, None, None), InterfaceTier::Low);
        assert_eq!(interface_tier(0.70, None, None), InterfaceTier::High);
    }

    #[test]
    fn test_deterministic() {
        for _ in 0..3 {
            assert_eq!(interface_tier(0.55, Some(22), Some(76.0)), InterfaceTier::Medium);
        }
    }

    #[test]
    fn test_aux_score_boundaries() {
        assert_eq!(aux_tier_from_score(0.71), AuxTier::High);
        assert_eq!(aux_tier_from_score(0.70), AuxTier::Medium); // strict > for High
        assert_eq!(aux_tier_from_score(0.50), AuxTier::Medium);
        assert_eq!(aux_tier_from_score(0.30), AuxTier::Low);
        assert_eq!(aux_tier_from_score(0.279), AuxTier::VeryLow);
    }

    #[test]
    fn test_aux_class_normalisation() {
        assert_eq!(normalise_aux_class("Low/Ambiguous"), Some(AuxTier::Low));
        assert_eq!(normalise_aux_class("Very low"), Some(AuxTier::VeryLow));
        assert_eq!(normalise_aux_class("Very-Low"), Some(AuxTier::VeryLow));
        assert_eq!(normalise_aux_class("HIGH"), Some(AuxTier::High));
        assert_eq!(normalise_aux_class("medium"), Some(AuxTier::Medium));
        assert_eq!(normalise_aux_class("bogus"), None);
    }

    #[test]
    fn test_band_from_label() {
        assert_eq!(
            ConfidenceBand::from_label("VERY HIGH CONFIDENCE"),
            Some(ConfidenceBand::VeryHigh)
        );
        assert_eq!(
            ConfidenceBand::from_label("High Confidence"),
            Some(ConfidenceBand::High)
        );
        assert_eq!(
            ConfidenceBand::from_label("=== MEDIUM CONFIDENCE INTERACTIONS ==="),
            Some(ConfidenceBand::Medium)
        );
        assert_eq!(ConfidenceBand::from_label("ift121_and_ptch1 0.47 30"), None);
    }

    #[test]
    fn test_lowest_band() {
        assert!(ConfidenceBand::Medium.is_lowest());
        assert!(!ConfidenceBand::High.is_lowest());
        assert!(!ConfidenceBand::VeryHigh.is_lowest());
    }
}
