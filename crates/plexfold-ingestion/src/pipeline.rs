//! Reconciliation pipeline.
//!
//! One run: discover input files under the base paths, parse and
//! assemble each file, commit it as its own unit, then resolve
//! duplicates corpus-wide. A failed file is recorded and skipped; it
//! never aborts the run.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::complexes::{self, FileBatch};
use crate::discover::{self, InputFile};
use crate::formats::{json_v3, json_v4, legacy_text, pulldown_text, SourceFormat};
use crate::models::{ParseSkip, PredictionRecord};
use crate::normalise::AccessionNormaliser;
use crate::pg_repository::PgReconRepository;

/// What to reconcile and how.
#[derive(Debug, Clone)]
pub struct ReconcileJob {
    pub base_paths: Vec<PathBuf>,
    /// Parse and report only; no writes, no deletions.
    pub dry_run: bool,
}

/// Per-run parse tallies, accumulated across files.
#[derive(Debug, Default, Clone, Copy)]
pub struct ParseCounters {
    pub records_parsed: usize,
    pub skipped_malformed: usize,
    pub skipped_unresolved: usize,
    pub filtered_low_band: usize,
}

impl ParseCounters {
    fn count_skip(&mut self, skip: ParseSkip) {
        match skip {
            ParseSkip::Malformed => self.skipped_malformed += 1,
            ParseSkip::Unresolvable => self.skipped_unresolved += 1,
            ParseSkip::BelowBand => self.filtered_low_band += 1,
        }
    }
}

/// Outcome summary for one reconciliation run.
#[derive(Debug)]
pub struct ReconcileResult {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub files_discovered: usize,
    pub files_processed: usize,
    pub files_failed: usize,
    pub counters: ParseCounters,
    pub new_records: usize,
    pub updated_records: usize,
    pub complexes_created: usize,
    pub duplicate_groups: usize,
    pub deleted_records: u64,
    /// Dry run only: records that would have been written.
    pub suppressed_writes: usize,
    /// Dry run only: rows a real run would have deleted.
    pub would_delete: usize,
    pub errors: Vec<String>,
    pub duration_ms: u64,
}

impl ReconcileResult {
    fn new(run_id: Uuid, files_discovered: usize) -> Self {
        Self {
            run_id,
            started_at: Utc::now(),
            files_discovered,
            files_processed: 0,
            files_failed: 0,
            counters: ParseCounters::default(),
            new_records: 0,
            updated_records: 0,
            complexes_created: 0,
            duplicate_groups: 0,
            deleted_records: 0,
            suppressed_writes: 0,
            would_delete: 0,
            errors: Vec::new(),
            duration_ms: 0,
        }
    }
}

/// Parse one discovered file into an assembled batch, tallying skipped
/// entries. Only an unreadable file or an undecodable JSON document is
/// an error, and that error is scoped to this file.
pub fn parse_file(
    input: &InputFile,
    normaliser: &AccessionNormaliser,
    counters: &mut ParseCounters,
) -> Result<FileBatch> {
    let content = std::fs::read_to_string(&input.path)
        .with_context(|| format!("failed to read {}", input.path.display()))?;
    let origin = input.path.display().to_string();

    let mut records: Vec<PredictionRecord> = Vec::new();
    let mut tally = |item: std::result::Result<PredictionRecord, ParseSkip>| match item {
        Ok(record) => records.push(record),
        Err(skip) => counters.count_skip(skip),
    };

    match input.format {
        SourceFormat::LegacyText => {
            legacy_text::records(&content, &origin, normaliser).for_each(&mut tally);
        }
        SourceFormat::PulldownText => {
            pulldown_text::records(&content, &origin, normaliser).for_each(&mut tally);
        }
        SourceFormat::JsonV3 => {
            let doc = json_v3::parse(&content)
                .with_context(|| format!("failed to decode {}", input.path.display()))?;
            doc.records(&origin, normaliser).for_each(&mut tally);
        }
        SourceFormat::JsonV4 => {
            let doc = json_v4::parse(&content)
                .with_context(|| format!("failed to decode {}", input.path.display()))?;
            doc.records(&origin, normaliser).for_each(&mut tally);
        }
    }

    counters.records_parsed += records.len();
    Ok(complexes::assemble(records))
}

/// Run a full reconciliation. The caller has already bootstrapped the
/// schema.
pub async fn run_reconciliation(
    job: ReconcileJob,
    repository: Arc<PgReconRepository>,
) -> Result<ReconcileResult> {
    let run_id = Uuid::new_v4();
    let start = Instant::now();
    let normaliser = AccessionNormaliser::new();

    let inputs = discover::find_inputs(&job.base_paths);
    let mut result = ReconcileResult::new(run_id, inputs.len());

    tracing::info!(
        run_id = %run_id,
        files = inputs.len(),
        dry_run = job.dry_run,
        "starting reconciliation"
    );

    for input in &inputs {
        let batch = match parse_file(input, &normaliser, &mut result.counters) {
            Ok(batch) => batch,
            Err(e) => {
                tracing::warn!(path = %input.path.display(), error = %e, "file failed to parse");
                result.files_failed += 1;
                result.errors.push(format!("{}: {e:#}", input.path.display()));
                continue;
            }
        };

        if job.dry_run {
            result.suppressed_writes += batch.record_count();
            result.files_processed += 1;
            tracing::info!(
                path = %input.path.display(),
                records = batch.record_count(),
                "dry run, writes suppressed"
            );
            continue;
        }

        match repository.commit_file(&batch).await {
            Ok(counts) => {
                result.files_processed += 1;
                result.new_records += counts.new;
                result.updated_records += counts.updated;
                result.complexes_created += counts.complexes_created;
                tracing::info!(
                    path = %input.path.display(),
                    new = counts.new,
                    updated = counts.updated,
                    "file committed"
                );
            }
            Err(e) => {
                tracing::warn!(path = %input.path.display(), error = %e, "file failed to commit");
                result.files_failed += 1;
                result.errors.push(format!("{}: {e:#}", input.path.display()));
            }
        }
    }

    // Corpus-wide duplicate resolution runs after every file unit has
    // settled, so it sees rows from earlier runs too.
    let pairwise = repository.dedup_pairwise(!job.dry_run).await?;
    let complexes = repository.dedup_complexes(!job.dry_run).await?;
    result.duplicate_groups = pairwise.groups_found + complexes.groups_found;
    result.deleted_records = pairwise.deleted + complexes.deleted;
    result.would_delete = pairwise.would_delete + complexes.would_delete;

    result.duration_ms = start.elapsed().as_millis() as u64;
    tracing::info!(
        run_id = %run_id,
        files_processed = result.files_processed,
        files_failed = result.files_failed,
        records_parsed = result.counters.records_parsed,
        new = result.new_records,
        updated = result.updated_records,
        duplicate_groups = result.duplicate_groups,
        deleted = result.deleted_records,
        duration_ms = result.duration_ms,
        "reconciliation finished"
    );

    Ok(result)
}
