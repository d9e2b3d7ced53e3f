//! Multi-subunit complex assembly.
//!
//! Groups multi-subunit-bait records into one `ComplexDefinition` per
//! complex key (sorted member accessions + variant tag) plus the
//! per-prey interaction records that hang off it. Assembly is pure;
//! idempotent creation against the store is the repository's concern.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{BaitRef, PredictionRecord, ProteinRef};

/// Default construct variant: full-length.
pub const VARIANT_FULL_LENGTH: &str = "FL";

/// A unique multi-subunit bait. Membership is immutable once created;
/// re-assembly under the same key is a no-op.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplexDefinition {
    pub key: String,
    /// Members in source order (`member_index` in the store).
    pub members: Vec<ProteinRef>,
    pub variant_tag: String,
}

impl ComplexDefinition {
    /// Display label: member display names (accession fallback) joined
    /// with " & ", suffixed with the variant unless full-length. A
    /// recomputable view, refreshed whenever member names change.
    pub fn display_label(&self) -> String {
        let joined = self
            .members
            .iter()
            .map(|m| m.display_name.as_deref().unwrap_or(&m.accession))
            .collect::<Vec<_>>()
            .join(" & ");
        if self.variant_tag == VARIANT_FULL_LENGTH {
            joined
        } else {
            format!("{joined} ({})", self.variant_tag)
        }
    }
}

/// One complex and the interaction records parsed against it.
#[derive(Debug, Clone)]
pub struct ComplexGroup {
    pub definition: ComplexDefinition,
    pub records: Vec<PredictionRecord>,
}

/// A parsed file split into its pairwise and multi-subunit halves.
#[derive(Debug, Default)]
pub struct FileBatch {
    pub pairwise: Vec<PredictionRecord>,
    pub complexes: Vec<ComplexGroup>,
}

impl FileBatch {
    pub fn record_count(&self) -> usize {
        self.pairwise.len() + self.complexes.iter().map(|g| g.records.len()).sum::<usize>()
    }
}

/// Extract the construct variant tag from a directory token:
/// `Cterm`/`Nterm` markers anywhere in the token, or an explicit `fl`
/// segment; defaults to full-length.
pub fn variant_tag(directory: &str) -> String {
    let lower = directory.to_lowercase();
    if lower.contains("cterm") {
        "Cterm".to_string()
    } else if lower.contains("nterm") {
        "Nterm".to_string()
    } else {
        // An explicit "fl" segment and no marker at all both mean
        // full-length.
        VARIANT_FULL_LENGTH.to_string()
    }
}

/// Canonical complex key: sorted member accessions joined with `+`,
/// then the variant tag.
pub fn complex_key(member_accessions: &[String], variant_tag: &str) -> String {
    let mut sorted: Vec<&str> = member_accessions.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    format!("{}|{}", sorted.join("+"), variant_tag)
}

/// Split records into pairwise and complex groups, keyed and ordered
/// deterministically.
pub fn assemble(records: Vec<PredictionRecord>) -> FileBatch {
    let mut pairwise = Vec::new();
    let mut groups: BTreeMap<String, ComplexGroup> = BTreeMap::new();

    for record in records {
        match &record.bait {
            BaitRef::Protein(_) => pairwise.push(record),
            BaitRef::Complex { members, variant_tag, .. } => {
                let accessions: Vec<String> =
                    members.iter().map(|m| m.accession.clone()).collect();
                let key = complex_key(&accessions, variant_tag);
                groups
                    .entry(key.clone())
                    .or_insert_with(|| ComplexGroup {
                        definition: ComplexDefinition {
                            key,
                            members: members.clone(),
                            variant_tag: variant_tag.clone(),
                        },
                        records: Vec::new(),
                    })
                    .records
                    .push(record);
            }
        }
    }

    FileBatch { pairwise, complexes: groups.into_values().collect() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SchemaVersion, ToolGeneration};

    fn complex_record(members: &[&str], variant: &str, prey: &str) -> PredictionRecord {
        PredictionRecord {
            bait: BaitRef::Complex {
                members: members.iter().map(|m| ProteinRef::new(*m)).collect(),
                variant_tag: variant.to_string(),
                directory: "dir".to_string(),
            },
            prey: ProteinRef::new(prey),
            primary_score: 0.5,
            contact_count: Some(10),
            interface_confidence: None,
            auxiliary_score: None,
            aux_pae_cutoff: None,
            tool_generation: ToolGeneration::Current,
            schema_version: SchemaVersion::V4,
            source_origin: "o".to_string(),
            band: None,
            interface_tier: None,
            aux_tier: None,
        }
    }

    #[test]
    fn test_complex_key_sorts_members() {
        let a = complex_key(&["Q9P2L0".into(), "A1BC23".into()], "FL");
        let b = complex_key(&["A1BC23".into(), "Q9P2L0".into()], "FL");
        assert_eq!(a, b);
        assert_eq!(a, "A1BC23+Q9P2L0|FL");
    }

    #[test]
    fn test_variant_tag_extraction() {
        assert_eq!(variant_tag("q9p2l0_Cterm_with_q13635"), "Cterm");
        assert_eq!(variant_tag("q9p2l0_nterm_with_q13635"), "Nterm");
        assert_eq!(variant_tag("q9p2l0_fl_with_q13635"), "FL");
        assert_eq!(variant_tag("q9p2l0_with_q13635"), "FL");
    }

    #[test]
    fn test_display_label() {
        let def = ComplexDefinition {
            key: "k".into(),
            members: vec![
                ProteinRef::with_name("Q9P2L0", "IFT121"),
                ProteinRef::new("A1BC23"),
            ],
            variant_tag: "Cterm".to_string(),
        };
        assert_eq!(def.display_label(), "IFT121 & A1BC23 (Cterm)");

        let fl = ComplexDefinition { variant_tag: "FL".into(), ..def };
        assert_eq!(fl.display_label(), "IFT121 & A1BC23");
    }

    #[test]
    fn test_assemble_groups_by_key() {
        let records = vec![
            complex_record(&["Q9P2L0", "A1BC23"], "FL", "Q13635"),
            complex_record(&["A1BC23", "Q9P2L0"], "FL", "B2CD34"),
            complex_record(&["Q9P2L0", "A1BC23"], "Cterm", "Q13635"),
        ];
        let batch = assemble(records);
        assert!(batch.pairwise.is_empty());
        // Same members + same variant collapse; the Cterm variant is
        // a distinct complex.
        assert_eq!(batch.complexes.len(), 2);
        let fl = batch
            .complexes
            .iter()
            .find(|g| g.definition.variant_tag == "FL")
            .unwrap();
        assert_eq!(fl.records.len(), 2);
        assert_eq!(batch.record_count(), 3);
    }
}
