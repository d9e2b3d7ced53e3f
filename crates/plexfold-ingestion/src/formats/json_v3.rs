//! Current-generation JSON parser, schema v3.
//!
//! A document carries a top-level prediction array (field
//! `predictions`, alias `interface_predictions`); each object has a
//! `directory_name`, numeric interface metrics and a `confidence_class`
//! from the same three-band vocabulary as the legacy report banners.
//! Only non-lowest-band objects are store-eligible. Default
//! substitution happens here, once: every metric other than `iptm` is
//! optional and decodes to `None`, never to a guessed value.
//!
//! A document that fails to decode is fatal for the file; a single
//! malformed array entry is skipped and counted.

use std::collections::BTreeMap;

use plexfold_common::confidence::{interface_tier, ConfidenceBand};
use plexfold_common::{PlexfoldError, Result};
use serde::Deserialize;

use crate::models::{ParseSkip, PredictionRecord, SchemaVersion, ToolGeneration};
use crate::normalise::AccessionNormaliser;

use super::resolve_directory;

#[derive(Debug, Deserialize)]
pub struct PredictionDoc {
    #[serde(alias = "interface_predictions")]
    predictions: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawPrediction {
    directory_name: String,
    iptm: f64,
    #[serde(default)]
    contacts_pae3: Option<i32>,
    #[serde(default)]
    contacts_pae6: Option<i32>,
    #[serde(default)]
    mean_interface_plddt: Option<f64>,
    #[serde(default)]
    confidence_class: Option<String>,
    #[serde(default)]
    bait_chains: Option<Vec<String>>,
    #[serde(default)]
    prey_chain: Option<String>,
    #[serde(default)]
    chain_lengths: Option<BTreeMap<String, u32>>,
}

/// Decode the document envelope. Fatal when the file is not a valid
/// prediction document.
pub fn parse(content: &str) -> Result<PredictionDoc> {
    let doc: PredictionDoc = serde_json::from_str(content)
        .map_err(|e| PlexfoldError::Parse(format!("v3 document decode failed: {e}")))?;
    Ok(doc)
}

impl PredictionDoc {
    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }

    /// Lazy, restartable sequence of canonical records.
    pub fn records<'a>(
        &'a self,
        origin: &'a str,
        normaliser: &'a AccessionNormaliser,
    ) -> impl Iterator<Item = std::result::Result<PredictionRecord, ParseSkip>> + 'a {
        self.predictions
            .iter()
            .map(move |value| decode_entry(value, origin, normaliser))
    }
}

fn decode_entry(
    value: &serde_json::Value,
    origin: &str,
    normaliser: &AccessionNormaliser,
) -> std::result::Result<PredictionRecord, ParseSkip> {
    let raw: RawPrediction =
        serde_json::from_value(value.clone()).map_err(|_| ParseSkip::Malformed)?;

    let band = raw.confidence_class.as_deref().and_then(ConfidenceBand::from_label);
    if band.is_some_and(|b| b.is_lowest()) {
        return Err(ParseSkip::BelowBand);
    }

    let (bait, prey) = resolve_directory(&raw.directory_name, normaliser)?;
    if bait.is_complex() {
        tracing::debug!(
            directory = %raw.directory_name,
            chains = ?bait_chain_ids(&raw.bait_chains, &raw.prey_chain, &raw.chain_lengths),
            "multi-subunit v3 prediction"
        );
    }

    let tier = interface_tier(
        raw.iptm,
        raw.contacts_pae3.map(i64::from),
        raw.mean_interface_plddt,
    );
    let _ = raw.contacts_pae6; // loose-threshold count, not stored

    Ok(PredictionRecord {
        bait,
        prey,
        primary_score: raw.iptm,
        contact_count: raw.contacts_pae3,
        interface_confidence: raw.mean_interface_plddt,
        auxiliary_score: None,
        aux_pae_cutoff: None,
        tool_generation: ToolGeneration::Current,
        schema_version: SchemaVersion::V3,
        source_origin: origin.to_string(),
        band,
        interface_tier: Some(tier),
        aux_tier: None,
    })
}

/// Ordered bait chain letters: explicit arrays when the producer wrote
/// them, otherwise inferred from the chain-length mapping (prey is the
/// last chain).
pub(crate) fn bait_chain_ids(
    bait_chains: &Option<Vec<String>>,
    prey_chain: &Option<String>,
    chain_lengths: &Option<BTreeMap<String, u32>>,
) -> Option<Vec<String>> {
    if let Some(chains) = bait_chains {
        return Some(chains.clone());
    }
    let lengths = chain_lengths.as_ref()?;
    let mut chains: Vec<String> = lengths.keys().cloned().collect();
    match prey_chain {
        Some(prey) => chains.retain(|c| c != prey),
        None => {
            chains.pop();
        }
    }
    Some(chains)
}

#[cfg(test)]
mod tests {
    use super::*;
    use plexfold_common::confidence::InterfaceTier;

    #[test]
    fn test_eligible_record_decodes() {
        let doc = parse(
            r#"{"predictions": [{
                "directory_name": "q9p2l0_and_q13635",
                "iptm": 0.82,
                "contacts_pae3": 41,
                "contacts_pae6": 55,
                "mean_interface_plddt": 85.5,
                "confidence_class": "High Confidence"
            }]}"#,
        )
        .unwrap();
        let n = AccessionNormaliser::new();
        let recs: Vec<_> = doc
            .records("predictions_v3.json", &n)
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(recs.len(), 1);

        let r = &recs[0];
        assert_eq!(r.primary_score, 0.82);
        assert_eq!(r.contact_count, Some(41));
        assert_eq!(r.schema_version, SchemaVersion::V3);
        assert_eq!(r.tool_generation, ToolGeneration::Current);
        assert_eq!(r.interface_tier, Some(InterfaceTier::High));
        assert_eq!(r.stored_tier(), Some("High"));
    }

    #[test]
    fn test_lowest_band_filtered() {
        let doc = parse(
            r#"{"predictions": [{
                "directory_name": "q9p2l0_and_q13635",
                "iptm": 0.41,
                "confidence_class": "Medium Confidence"
            }]}"#,
        )
        .unwrap();
        let n = AccessionNormaliser::new();
        let items: Vec<_> = doc.records("o", &n).collect();
        assert_eq!(items, vec![Err(ParseSkip::BelowBand)]);
    }

    #[test]
    fn test_alias_field_name_accepted() {
        let doc = parse(
            r#"{"interface_predictions": [{
                "directory_name": "q9p2l0_and_q13635",
                "iptm": 0.75,
                "confidence_class": "Very High Confidence"
            }]}"#,
        )
        .unwrap();
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_malformed_entry_skipped_others_survive() {
        let doc = parse(
            r#"{"predictions": [
                {"iptm": "not an object shape"},
                {"directory_name": "q9p2l0_and_q13635", "iptm": 0.71,
                 "confidence_class": "High Confidence"}
            ]}"#,
        )
        .unwrap();
        let n = AccessionNormaliser::new();
        let items: Vec<_> = doc.records("o", &n).collect();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], Err(ParseSkip::Malformed));
        assert!(items[1].is_ok());
    }

    #[test]
    fn test_document_decode_failure_is_fatal() {
        assert!(parse("not json at all").is_err());
        assert!(parse(r#"{"something_else": []}"#).is_err());
    }

    #[test]
    fn test_chain_inference() {
        let lengths: BTreeMap<String, u32> =
            [("A".into(), 120u32), ("B".into(), 88), ("C".into(), 240)]
                .into_iter()
                .collect();
        // Explicit arrays win.
        assert_eq!(
            bait_chain_ids(&Some(vec!["A".into(), "B".into()]), &None, &Some(lengths.clone())),
            Some(vec!["A".to_string(), "B".to_string()])
        );
        // Prey chain named: everything else is bait.
        assert_eq!(
            bait_chain_ids(&None, &Some("C".into()), &Some(lengths.clone())),
            Some(vec!["A".to_string(), "B".to_string()])
        );
        // Nothing named: last chain letter is the prey.
        assert_eq!(
            bait_chain_ids(&None, &None, &Some(lengths)),
            Some(vec!["A".to_string(), "B".to_string()])
        );
        assert_eq!(bait_chain_ids(&None, &None, &None), None);
    }
}
