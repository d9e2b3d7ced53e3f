//! Legacy free-text report parser.
//!
//! The report interleaves three kinds of line:
//! - a header `--- Results from: <path> ---` naming the source run;
//! - one of three confidence banners (`VERY HIGH CONFIDENCE`, …);
//! - data lines with at least five whitespace fields and a bracketed
//!   `[ACC:GENE & ACC:GENE]` suffix.
//!
//! Header path and banner band are fold state threaded through the
//! line scan; each emitted record captures the fold state at emission
//! time. Fields 1-4 of a data line are primary score, strict-threshold
//! contacts, loose-threshold contacts and interface confidence, in
//! fixed order (the loose count is validated but not stored).

use plexfold_common::confidence::ConfidenceBand;

use crate::models::{
    BaitRef, ParseSkip, PredictionRecord, ProteinRef, SchemaVersion, ToolGeneration,
};
use crate::normalise::AccessionNormaliser;

const HEADER_PREFIX: &str = "--- Results from:";

/// Lazy record sequence over one report. Re-create it (it borrows the
/// content) to restart from the top.
pub struct LegacyTextRecords<'a> {
    lines: std::str::Lines<'a>,
    normaliser: &'a AccessionNormaliser,
    file_origin: &'a str,
    current_origin: Option<String>,
    current_band: Option<ConfidenceBand>,
}

/// Start a scan of `content`. `origin` is the file path, used until a
/// header line overrides it.
pub fn records<'a>(
    content: &'a str,
    origin: &'a str,
    normaliser: &'a AccessionNormaliser,
) -> LegacyTextRecords<'a> {
    LegacyTextRecords {
        lines: content.lines(),
        normaliser,
        file_origin: origin,
        current_origin: None,
        current_band: None,
    }
}

/// Parse a `--- Results from: <path> ---` header.
pub(crate) fn header_path(line: &str) -> Option<String> {
    let rest = line.strip_prefix(HEADER_PREFIX)?;
    let rest = rest.trim_end().strip_suffix("---")?;
    let path = rest.trim();
    if path.is_empty() {
        None
    } else {
        Some(path.to_string())
    }
}

impl Iterator for LegacyTextRecords<'_> {
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
            if let Some(band) = ConfidenceBand::from_label(line) {
                self.current_band = Some(band);
                continue;
            }
            // Data lines end in the bracketed accession suffix; anything
            // else is prose and is not counted against the file.
            if !line.ends_with(']') {
                continue;
            }
            return Some(self.parse_data_line(line));
        }
        None
    }
}

impl LegacyTextRecords<'_> {
    fn parse_data_line(&self, line: &str) -> Result<PredictionRecord, ParseSkip> {
        let (fields_part, bracket) = line
            .rsplit_once('[')
            .ok_or(ParseSkip::Malformed)?;
        let bracket = bracket.strip_suffix(']').ok_or(ParseSkip::Malformed)?;

        let fields: Vec<&str> = fields_part.split_whitespace().collect();
        if fields.len() < 5 {
            return Err(ParseSkip::Malformed);
        }

        let primary_score: f64 = fields[1].parse().map_err(|_| ParseSkip::Malformed)?;
        let strict_contacts: i32 = fields[2].parse().map_err(|_| ParseSkip::Malformed)?;
        let _loose_contacts: i32 = fields[3].parse().map_err(|_| ParseSkip::Malformed)?;
        let interface_confidence: f64 = fields[4].parse().map_err(|_| ParseSkip::Malformed)?;

        let (bait, prey) = self.parse_bracket(bracket)?;

        Ok(PredictionRecord {
            bait: BaitRef::Protein(bait),
            prey,
            primary_score,
            contact_count: Some(strict_contacts),
            interface_confidence: Some(interface_confidence),
            auxiliary_score: None,
            aux_pae_cutoff: None,
            tool_generation: ToolGeneration::Legacy,
            schema_version: SchemaVersion::Legacy,
            source_origin: self
                .current_origin
                .clone()
                .unwrap_or_else(|| self.file_origin.to_string()),
            band: self.current_band,
            interface_tier: None,
            aux_tier: None,
        })
    }

    /// `Q9P2L0:IFT121 & Q13635:PTCH1` → bait and prey references. Fewer
    /// than two resolvable accessions is an unresolvable identity.
    fn parse_bracket(&self, bracket: &str) -> Result<(ProteinRef, ProteinRef), ParseSkip> {
        let mut refs = Vec::new();
        for part in bracket.split('&') {
            let part = part.trim();
            let (acc_token, gene) = match part.split_once(':') {
                Some((a, g)) => (a.trim(), Some(g.trim())),
                None => (part, None),
            };
            let Some(accession) = self.normaliser.extract(acc_token).into_iter().next() else {
                continue;
            };
            refs.push(ProteinRef {
                accession,
                display_name: gene.filter(|g| !g.is_empty()).map(str::to_string),
            });
        }
        if refs.len() < 2 {
            return Err(ParseSkip::Unresolvable);
        }
        let prey = refs.swap_remove(1);
        let bait = refs.swap_remove(0);
        Ok((bait, prey))
    }
}
