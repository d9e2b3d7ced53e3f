//! Prediction result format parsers.
//!
//! Four source variants, one module each. Every parser turns one source
//! file into a lazy, finite, restartable sequence of
//! `Result<PredictionRecord, ParseSkip>`: `Err` items are single
//! entries the caller skips and counts; only a missing or unreadable
//! file is fatal, and then only for that file's unit.

pub mod json_v3;
pub mod json_v4;
pub mod legacy_text;
pub mod pulldown_text;

use std::path::Path;

use crate::models::{BaitRef, ParseSkip, ProteinRef};
use crate::normalise::AccessionNormaliser;

/// The source formats, each tied to a fixed discovery basename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    LegacyText,
    PulldownText,
    JsonV3,
    JsonV4,
}

impl SourceFormat {
    pub const ALL: [SourceFormat; 4] = [
        SourceFormat::LegacyText,
        SourceFormat::PulldownText,
        SourceFormat::JsonV3,
        SourceFormat::JsonV4,
    ];

    pub const fn basename(&self) -> &'static str {
        match self {
            SourceFormat::LegacyText   => "interactions_report.txt",
            SourceFormat::PulldownText => "pulldown_report.txt",
            SourceFormat::JsonV3       => "predictions_v3.json",
            SourceFormat::JsonV4       => "predictions_v4.json",
        }
    }

    /// Match a path against the fixed basenames.
    pub fn for_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        Self::ALL.iter().copied().find(|f| f.basename() == name)
    }
}

/// Resolve a JSON `directory_name` token into a bait reference and a
/// prey: multi-subunit when the token carries the `_with_` marker,
/// pairwise otherwise. Shared by the v3 and v4 parsers so the two
/// schemas cannot drift apart.
pub(crate) fn resolve_directory(
    directory: &str,
    normaliser: &AccessionNormaliser,
) -> Result<(BaitRef, ProteinRef), ParseSkip> {
    if directory.contains(crate::normalise::accession::WITH_MARKER) {
        let split = normaliser
            .resolve_with_pattern(directory)
            .ok_or(ParseSkip::Unresolvable)?;
        let members = split.baits.into_iter().map(ProteinRef::new).collect();
        Ok((
            BaitRef::Complex {
                members,
                variant_tag: crate::complexes::variant_tag(directory),
                directory: directory.to_string(),
            },
            ProteinRef::new(split.prey),
        ))
    } else {
        let pair = normaliser
            .resolve_pairwise(directory)
            .ok_or(ParseSkip::Unresolvable)?;
        Ok((
            BaitRef::Protein(ProteinRef::new(pair.bait)),
            ProteinRef::new(pair.prey),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_format_for_path() {
        assert_eq!(
            SourceFormat::for_path(&PathBuf::from("/data/run1/predictions_v4.json")),
            Some(SourceFormat::JsonV4)
        );
        assert_eq!(
            SourceFormat::for_path(&PathBuf::from("interactions_report.txt")),
            Some(SourceFormat::LegacyText)
        );
        assert_eq!(SourceFormat::for_path(&PathBuf::from("notes.txt")), None);
    }

    #[test]
    fn test_resolve_directory_pairwise_and_complex() {
        let n = AccessionNormaliser::new();

        let (bait, prey) = resolve_directory("q9p2l0_and_q13635", &n).unwrap();
        assert_eq!(bait, BaitRef::Protein(ProteinRef::new("Q9P2L0")));
        assert_eq!(prey.accession, "Q13635");

        let (bait, prey) = resolve_directory("q9p2l0_and_o15335_with_q13635", &n).unwrap();
        assert!(bait.is_complex());
        assert_eq!(prey.accession, "Q13635");

        assert_eq!(
            resolve_directory("no_accessions_here", &n),
            Err(ParseSkip::Unresolvable)
        );
    }
}
