//! Identifier normalisation.
//!
//! Canonicalises raw directory tokens into protein accessions and
//! resolves bait/prey roles for pairwise and multi-subunit records.

pub mod accession;

pub use accession::{AccessionNormaliser, ComplexSplit, PairSplit};
