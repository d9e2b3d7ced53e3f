//! Current-generation JSON parser, schema v4.
//!
//! Superset of v3: each object additionally carries the auxiliary
//! per-interface score `ipsae` (0..1), its producer-side
//! `ipsae_confidence_class` (a differently-capitalised vocabulary that
//! normalises to the four-tier aux enum) and `ipsae_pae_cutoff`
//! (default 10.0). Upstream pre-filters to `ipsae >= 0.3`, but lower
//! values must still decode.

use std::collections::BTreeMap;

use plexfold_common::confidence::{
    aux_tier_from_score, interface_tier, normalise_aux_class, ConfidenceBand,
};
use plexfold_common::{PlexfoldError, Result};
use serde::Deserialize;

use crate::models::{ParseSkip, PredictionRecord, SchemaVersion, ToolGeneration};
use crate::normalise::AccessionNormaliser;

use super::json_v3::bait_chain_ids;
use super::resolve_directory;

const DEFAULT_PAE_CUTOFF: f64 = 10.0;

fn default_pae_cutoff() -> f64 {
    DEFAULT_PAE_CUTOFF
}

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
    ipsae: Option<f64>,
    #[serde(default)]
    ipsae_confidence_class: Option<String>,
    #[serde(default = "default_pae_cutoff")]
    ipsae_pae_cutoff: f64,
    #[serde(default)]
    bait_chains: Option<Vec<String>>,
    #[serde(default)]
    prey_chain: Option<String>,
    #[serde(default)]
    chain_lengths: Option<BTreeMap<String, u32>>,
}

pub fn parse(content: &str) -> Result<PredictionDoc> {
    let doc: PredictionDoc = serde_json::from_str(content)
        .map_err(|e| PlexfoldError::Parse(format!("v4 document decode failed: {e}")))?;
    Ok(doc)
}

impl PredictionDoc {
    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }

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
            "multi-subunit v4 prediction"
        );
    }

    let tier = interface_tier(
        raw.iptm,
        raw.contacts_pae3.map(i64::from),
        raw.mean_interface_plddt,
    );
    // Producer class wins over the score mapping when both are present.
    let aux_tier = raw
        .ipsae_confidence_class
        .as_deref()
        .and_then(normalise_aux_class)
        .or_else(|| raw.ipsae.map(aux_tier_from_score));
    let _ = raw.contacts_pae6; // loose-threshold count, not stored

    Ok(PredictionRecord {
        bait,
        prey,
        primary_score: raw.iptm,
        contact_count: raw.contacts_pae3,
        interface_confidence: raw.mean_interface_plddt,
        auxiliary_score: raw.ipsae,
        aux_pae_cutoff: Some(raw.ipsae_pae_cutoff),
        tool_generation: ToolGeneration::Current,
        schema_version: SchemaVersion::V4,
        source_origin: origin.to_string(),
        band,
        interface_tier: Some(tier),
        aux_tier,
    })
}
