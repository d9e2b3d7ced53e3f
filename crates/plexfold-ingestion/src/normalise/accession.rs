//! Accession extraction and bait/prey resolution.
//!
//! The accession grammar is a letter, a digit, then four alphanumerics
//! (case-insensitive), e.g. `Q9P2L0`. Legacy tokens that carry no such
//! substring fall back to splitting on the fixed `_and_` separator and
//! synthesising a `LEGACY:`-namespaced pseudo-accession; the namespace
//! separator can never appear in a real accession, so the two are never
//! confused.
//!
//! Callers skip and count records this module cannot resolve — it never
//! guesses.

use regex::Regex;

/// Fixed separator used by legacy directory names.
const LEGACY_SEPARATOR: &str = "_and_";

/// Namespace prefix for synthesised pseudo-accessions.
pub const PSEUDO_NAMESPACE: &str = "LEGACY:";

/// Multi-subunit directory marker splitting the bait set from the prey.
pub const WITH_MARKER: &str = "_with_";

/// Resolved bait/prey pair for a pairwise record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairSplit {
    pub bait: String,
    pub prey: String,
}

/// Resolved bait set and prey for a multi-subunit `_with_` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSplit {
    /// Bait accessions in the order they appear in the token.
    pub baits: Vec<String>,
    pub prey: String,
}

/// Accession normaliser. Build once and share by reference; extraction
/// is pure.
pub struct AccessionNormaliser {
    re: Regex,
}

impl AccessionNormaliser {
    pub fn new() -> Self {
        Self {
            re: Regex::new(r"(?i)[A-Z][0-9][A-Z0-9]{4}").unwrap(),
        }
    }

    /// Extract an ordered, deduplicated, uppercased list of
    /// accession-like substrings from a raw token.
    pub fn extract(&self, token: &str) -> Vec<String> {
        let mut seen = Vec::new();
        for m in self.re.find_iter(token) {
            let acc = m.as_str().to_uppercase();
            if !seen.contains(&acc) {
                seen.push(acc);
            }
        }
        seen
    }

    /// Synthesise pseudo-accessions for a legacy token lacking the
    /// accession grammar: split on `_and_`, uppercase, namespace.
    pub fn pseudo(&self, token: &str) -> Vec<String> {
        token
            .split(LEGACY_SEPARATOR)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| format!("{PSEUDO_NAMESPACE}{}", p.to_uppercase()))
            .collect()
    }

    /// Resolve a pairwise token: first extracted accession is the bait,
    /// second is the prey. Returns `None` when fewer than two
    /// accessions are found.
    pub fn resolve_pairwise(&self, token: &str) -> Option<PairSplit> {
        let mut accs = self.extract(token).into_iter();
        let bait = accs.next()?;
        let prey = accs.next()?;
        Some(PairSplit { bait, prey })
    }

    /// Resolve a multi-subunit `_with_` token: accessions before the
    /// marker form the bait set, the prey is the extracted accession not
    /// in that set. Returns `None` on zero bait or zero prey accessions.
    pub fn resolve_with_pattern(&self, directory: &str) -> Option<ComplexSplit> {
        let (bait_part, _) = directory.split_once(WITH_MARKER)?;
        let baits = self.extract(bait_part);
        if baits.is_empty() {
            return None;
        }
        let prey = self
            .extract(directory)
            .into_iter()
            .find(|acc| !baits.contains(acc))?;
        Some(ComplexSplit { baits, prey })
    }
}

impl Default for AccessionNormaliser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_uppercases_and_orders() {
        let n = AccessionNormaliser::new();
        assert_eq!(n.extract("q9p2l0_and_q13635"), vec!["Q9P2L0", "Q13635"]);
    }

    #[test]
    fn test_extract_deduplicates() {
        let n = AccessionNormaliser::new();
        assert_eq!(n.extract("Q9P2L0_and_q9p2l0"), vec!["Q9P2L0"]);
    }

    #[test]
    fn test_extract_ignores_gene_style_tokens() {
        let n = AccessionNormaliser::new();
        assert!(n.extract("ift121_and_ptch1").is_empty());
    }

    #[test]
    fn test_pseudo_accessions_are_namespaced() {
        let n = AccessionNormaliser::new();
        assert_eq!(
            n.pseudo("ift121_and_ptch1"),
            vec!["LEGACY:IFT121", "LEGACY:PTCH1"]
        );
    }

    #[test]
    fn test_resolve_pairwise_roles() {
        let n = AccessionNormaliser::new();
        let pair = n.resolve_pairwise("q9p2l0_and_q13635").unwrap();
        assert_eq!(pair.bait, "Q9P2L0");
        assert_eq!(pair.prey, "Q13635");
    }

    #[test]
    fn test_resolve_pairwise_requires_two() {
        let n = AccessionNormaliser::new();
        assert!(n.resolve_pairwise("q9p2l0_alone").is_none());
        assert!(n.resolve_pairwise("ift121_and_ptch1").is_none());
    }

    #[test]
    fn test_resolve_with_pattern() {
        let n = AccessionNormaliser::new();
        let split = n
            .resolve_with_pattern("q9p2l0_and_o15335_with_q13635")
            .unwrap();
        assert_eq!(split.baits, vec!["Q9P2L0", "O15335"]);
        assert_eq!(split.prey, "Q13635");
    }

    #[test]
    fn test_resolve_with_pattern_missing_sides() {
        let n = AccessionNormaliser::new();
        // No bait accessions before the marker.
        assert!(n.resolve_with_pattern("baitless_with_q13635").is_none());
        // Prey token carries no accession outside the bait set.
        assert!(n.resolve_with_pattern("q9p2l0_with_preyless").is_none());
        // Not a _with_ token at all.
        assert!(n.resolve_with_pattern("q9p2l0_and_q13635").is_none());
    }
}
