//! Alternate-legacy free-text report parser.
//!
//! Same line-oriented report family as the legacy text format, but data
//! lines carry the marker token `Pulldown` in column 2 and every other
//! column shifts right by one: fields 2-4 are primary score,
//! strict-threshold contacts and loose-threshold contacts. There is no
//! interface-confidence column and no bracketed accession suffix —
//! identities are `LEGACY:` pseudo-accessions synthesised from the
//! directory token in column 1. These records never receive an
//! interface-quality tier; they are displayed separately and never
//! merged with current-generation bands.

use crate::models::{
    BaitRef, ParseSkip, PredictionRecord, ProteinRef, SchemaVersion, ToolGeneration,
};
use crate::normalise::AccessionNormaliser;

use super::legacy_text::header_path;

const MARKER: &str = "Pulldown";

/// Lazy record sequence over one report; re-create to restart.
pub struct PulldownTextRecords<'a> {
    lines: std::str::Lines<'a>,
    normaliser: &'a AccessionNormaliser,
    file_origin: &'a str,
    current_origin: Option<String>,
}

pub fn records<'a>(
    content: &'a str,
    origin: &'a str,
    normaliser: &'a AccessionNormaliser,
) -> PulldownTextRecords<'a> {
    PulldownTextRecords {
        lines: content.lines(),
        normaliser,
        file_origin: origin,
        current_origin: None,
    }
}

impl Iterator for PulldownTextRecords<'_> {
    type Item = Result<PredictionRecord, ParseSkip>;

    fn next(&mut self) -> Option<Self::Item> {
        for line in self.lines.by_ref() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(path) = header_path(line) {
                self.current_origin = Some(path);
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.get(1) != Some(&MARKER) {
                continue;
            }
            // A marked line is a data entry; missing columns make it
            // malformed, not ignorable prose.
            if fields.len() < 5 {
                return Some(Err(ParseSkip::Malformed));
            }
            return Some(self.parse_data_fields(&fields));
        }
        None
    }
}

impl PulldownTextRecords<'_> {
    fn parse_data_fields(&self, fields: &[&str]) -> Result<PredictionRecord, ParseSkip> {
        let primary_score: f64 = fields[2].parse().map_err(|_| ParseSkip::Malformed)?;
        let strict_contacts: i32 = fields[3].parse().map_err(|_| ParseSkip::Malformed)?;
        let _loose_contacts: i32 = fields[4].parse().map_err(|_| ParseSkip::Malformed)?;

        let mut pseudo = self.normaliser.pseudo(fields[0]).into_iter();
        let (Some(bait), Some(prey)) = (pseudo.next(), pseudo.next()) else {
            return Err(ParseSkip::Unresolvable);
        };

        Ok(PredictionRecord {
            bait: BaitRef::Protein(ProteinRef::new(bait)),
            prey: ProteinRef::new(prey),
            primary_score,
            contact_count: Some(strict_contacts),
            interface_confidence: None,
            auxiliary_score: None,
            aux_pae_cutoff: None,
            tool_generation: ToolGeneration::Legacy,
            schema_version: SchemaVersion::Legacy,
            source_origin: self
                .current_origin
                .clone()
                .unwrap_or_else(|| self.file_origin.to_string()),
            band: None,
            interface_tier: None,
            aux_tier: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_line_parses_shifted_columns() {
        let n = AccessionNormaliser::new();
        let report = "\
--- Results from: /pulldown/run7 ---
ift121_and_ptch1 Pulldown 0.47 30 30
";
        let recs: Vec<_> = records(report, "pulldown_report.txt", &n)
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(recs.len(), 1);

        let r = &recs[0];
        assert_eq!(r.bait, BaitRef::Protein(ProteinRef::new("LEGACY:IFT121")));
        assert_eq!(r.prey, ProteinRef::new("LEGACY:PTCH1"));
        assert_eq!(r.primary_score, 0.47);
        assert_eq!(r.contact_count, Some(30));
        assert_eq!(r.interface_confidence, None);
        assert_eq!(r.source_origin, "/pulldown/run7");
        // Alternate-legacy records never carry an interface tier.
        assert_eq!(r.stored_tier(), None);
    }

    #[test]
    fn test_unmarked_lines_are_ignored() {
        let n = AccessionNormaliser::new();
        let report = "ift121_and_ptch1 0.47 30 30 62.0\n";
        assert_eq!(records(report, "f", &n).count(), 0);
    }

    #[test]
    fn test_single_name_is_unresolvable() {
        let n = AccessionNormaliser::new();
        let report = "ift121 Pulldown 0.47 30 30\n";
        let items: Vec<_> = records(report, "f", &n).collect();
        assert_eq!(items, vec![Err(ParseSkip::Unresolvable)]);
    }

    #[test]
    fn test_marked_short_line_is_malformed() {
        let n = AccessionNormaliser::new();
        let report = "ift121_and_ptch1 Pulldown 0.47 30\n";
        let items: Vec<_> = records(report, "f", &n).collect();
        assert_eq!(items, vec![Err(ParseSkip::Malformed)]);
    }

    #[test]
    fn test_bad_number_is_malformed() {
        let n = AccessionNormaliser::new();
        let report = "ift121_and_ptch1 Pulldown zero 30 30\n";
        let items: Vec<_> = records(report, "f", &n).collect();
        assert_eq!(items, vec![Err(ParseSkip::Malformed)]);
    }
}
