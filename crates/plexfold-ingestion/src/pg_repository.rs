//! PostgreSQL reconciliation writer.
//!
//! Handles:
//! - protein get-or-create ("insert, treat natural-key collision as
//!   found" — no check-then-insert window)
//! - interaction upsert on the store key with monotonic schema-version
//!   advance
//! - idempotent complex and membership creation
//! - corpus-wide duplicate resolution with bounded-batch deletion
//!
//! Each source file's records commit as one transaction; a mid-file
//! failure rolls back only that file's unit.

use anyhow::{Context, Result};
use sqlx::{PgPool, Postgres, Transaction};

use crate::complexes::{ComplexGroup, FileBatch};
use crate::dedup::{self, DedupCandidate};
use crate::models::{BaitRef, PredictionRecord, ProteinRef, SchemaVersion};

/// Upper bound on ids per duplicate-deletion statement.
const DELETE_BATCH_SIZE: usize = 500;

/// Upsert counts for one committed file.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileCounts {
    pub new: usize,
    pub updated: usize,
    pub complexes_created: usize,
}

/// Result of one duplicate-resolution pass over a table.
#[derive(Debug, Default, Clone, Copy)]
pub struct DedupReport {
    pub groups_found: usize,
    pub deleted: u64,
    /// Ids that a dry run would have deleted.
    pub would_delete: usize,
}

/// A stored pairwise interaction row, joined with its protein
/// accessions. Used by the read side and the round-trip tests.
#[derive(Debug, sqlx::FromRow)]
pub struct StoredInteraction {
    pub id: i64,
    pub bait_accession: String,
    pub prey_accession: String,
    pub primary_score: f64,
    pub contact_count: Option<i32>,
    pub interface_confidence: Option<f64>,
    pub auxiliary_score: Option<f64>,
    pub aux_pae_cutoff: Option<f64>,
    pub tool_generation: String,
    pub schema_version: String,
    pub source_origin: String,
    pub confidence_tier: Option<String>,
    pub aux_tier: Option<String>,
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS proteins (
        id            BIGSERIAL PRIMARY KEY,
        accession     TEXT NOT NULL UNIQUE,
        display_name  TEXT,
        organism      TEXT,
        created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS interactions (
        id                   BIGSERIAL PRIMARY KEY,
        bait_id              BIGINT NOT NULL REFERENCES proteins(id),
        prey_id              BIGINT NOT NULL REFERENCES proteins(id),
        primary_score        DOUBLE PRECISION NOT NULL,
        contact_count        INTEGER,
        interface_confidence DOUBLE PRECISION,
        auxiliary_score      DOUBLE PRECISION,
        aux_pae_cutoff       DOUBLE PRECISION,
        tool_generation      TEXT NOT NULL,
        schema_version       TEXT NOT NULL,
        source_origin        TEXT NOT NULL,
        confidence_tier      TEXT,
        aux_tier             TEXT,
        created_at           TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at           TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        UNIQUE (bait_id, prey_id, source_origin)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS complexes (
        id            BIGSERIAL PRIMARY KEY,
        complex_key   TEXT NOT NULL UNIQUE,
        variant_tag   TEXT NOT NULL DEFAULT 'FL',
        display_label TEXT,
        created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS complex_members (
        complex_id   BIGINT NOT NULL REFERENCES complexes(id),
        protein_id   BIGINT NOT NULL REFERENCES proteins(id),
        member_index INTEGER NOT NULL,
        PRIMARY KEY (complex_id, protein_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS complex_interactions (
        id                   BIGSERIAL PRIMARY KEY,
        complex_id           BIGINT NOT NULL REFERENCES complexes(id),
        prey_id              BIGINT NOT NULL REFERENCES proteins(id),
        primary_score        DOUBLE PRECISION NOT NULL,
        contact_count        INTEGER,
        interface_confidence DOUBLE PRECISION,
        auxiliary_score      DOUBLE PRECISION,
        aux_pae_cutoff       DOUBLE PRECISION,
        tool_generation      TEXT NOT NULL,
        schema_version       TEXT NOT NULL,
        source_origin        TEXT NOT NULL,
        confidence_tier      TEXT,
        aux_tier             TEXT,
        created_at           TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at           TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        UNIQUE (complex_id, prey_id, source_origin, tool_generation)
    )
    "#,
];

/// Monotonic schema-version advance shared by both interaction upserts:
/// a stored v4 never regresses, a stored v3 only advances.
const SCHEMA_VERSION_CASE: &str = r#"
    CASE
        WHEN {t}.schema_version = 'v4' THEN 'v4'
        WHEN excluded.schema_version = 'v4' THEN 'v4'
        WHEN {t}.schema_version = 'v3' AND excluded.schema_version <> 'v4' THEN 'v3'
        ELSE excluded.schema_version
    END
"#;

#[derive(Clone)]
pub struct PgReconRepository {
    pool: PgPool,
}

impl PgReconRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create all tables if missing. Idempotent; runs before any load.
    pub async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("schema bootstrap failed")?;
        }
        Ok(())
    }

    // ── Protein identities ───────────────────────────────────────────────────

    /// Get-or-create a protein by accession. A natural-key collision is
    /// "found", never an error; an existing display name is only ever
    /// enriched, not overwritten.
    async fn upsert_protein(
        tx: &mut Transaction<'_, Postgres>,
        protein: &ProteinRef,
    ) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO proteins (accession, display_name)
            VALUES ($1, $2)
            ON CONFLICT (accession) DO UPDATE
                SET display_name = COALESCE(proteins.display_name, excluded.display_name)
            RETURNING id
            "#,
        )
        .bind(&protein.accession)
        .bind(&protein.display_name)
        .fetch_one(&mut **tx)
        .await
        .with_context(|| format!("protein upsert failed for {}", protein.accession))?;
        Ok(id)
    }

    // ── Interactions ─────────────────────────────────────────────────────────

    /// Upsert one pairwise record on its store key. Returns true when
    /// the row is new.
    async fn upsert_interaction(
        tx: &mut Transaction<'_, Postgres>,
        bait_id: i64,
        prey_id: i64,
        record: &PredictionRecord,
    ) -> Result<bool> {
        let sql = format!(
            r#"
            INSERT INTO interactions
                (bait_id, prey_id, primary_score, contact_count, interface_confidence,
                 auxiliary_score, aux_pae_cutoff, tool_generation, schema_version,
                 source_origin, confidence_tier, aux_tier)
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12)
            ON CONFLICT (bait_id, prey_id, source_origin) DO UPDATE SET
                primary_score        = excluded.primary_score,
                contact_count        = excluded.contact_count,
                interface_confidence = excluded.interface_confidence,
                auxiliary_score      = excluded.auxiliary_score,
                aux_pae_cutoff       = excluded.aux_pae_cutoff,
                tool_generation      = excluded.tool_generation,
                confidence_tier      = excluded.confidence_tier,
                aux_tier             = excluded.aux_tier,
                schema_version       = {version_case},
                updated_at           = NOW()
            RETURNING (xmax = 0)
            "#,
            version_case = SCHEMA_VERSION_CASE.replace("{t}", "interactions"),
        );

        let inserted: bool = sqlx::query_scalar(&sql)
            .bind(bait_id)
            .bind(prey_id)
            .bind(record.primary_score)
            .bind(record.contact_count)
            .bind(record.interface_confidence)
            .bind(record.auxiliary_score)
            .bind(record.aux_pae_cutoff)
            .bind(record.tool_generation.as_str())
            .bind(record.schema_version.as_str())
            .bind(&record.source_origin)
            .bind(record.stored_tier())
            .bind(record.aux_tier.map(|t| t.as_str()))
            .fetch_one(&mut **tx)
            .await
            .context("interaction upsert failed")?;
        Ok(inserted)
    }

    // ── Complexes ────────────────────────────────────────────────────────────

    /// Idempotent complex creation. Membership is immutable; the display
    /// label is a recomputable view and is refreshed on every touch so
    /// member-name enrichment propagates.
    async fn upsert_complex(
        tx: &mut Transaction<'_, Postgres>,
        group: &ComplexGroup,
    ) -> Result<(i64, bool)> {
        let definition = &group.definition;
        let (complex_id, created): (i64, bool) = sqlx::query_as(
            r#"
            INSERT INTO complexes (complex_key, variant_tag, display_label)
            VALUES ($1, $2, $3)
            ON CONFLICT (complex_key) DO UPDATE
                SET display_label = excluded.display_label
            RETURNING id, (xmax = 0)
            "#,
        )
        .bind(&definition.key)
        .bind(&definition.variant_tag)
        .bind(definition.display_label())
        .fetch_one(&mut **tx)
        .await
        .with_context(|| format!("complex upsert failed for {}", definition.key))?;

        for (index, member) in definition.members.iter().enumerate() {
            let protein_id = Self::upsert_protein(tx, member).await?;
            sqlx::query(
                r#"
                INSERT INTO complex_members (complex_id, protein_id, member_index)
                VALUES ($1, $2, $3)
                ON CONFLICT (complex_id, protein_id) DO NOTHING
                "#,
            )
            .bind(complex_id)
            .bind(protein_id)
            .bind(index as i32)
            .execute(&mut **tx)
            .await
            .context("complex member insert failed")?;
        }

        Ok((complex_id, created))
    }

    async fn upsert_complex_interaction(
        tx: &mut Transaction<'_, Postgres>,
        complex_id: i64,
        prey_id: i64,
        record: &PredictionRecord,
    ) -> Result<bool> {
        let sql = format!(
            r#"
            INSERT INTO complex_interactions
                (complex_id, prey_id, primary_score, contact_count, interface_confidence,
                 auxiliary_score, aux_pae_cutoff, tool_generation, schema_version,
                 source_origin, confidence_tier, aux_tier)
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12)
            ON CONFLICT (complex_id, prey_id, source_origin, tool_generation) DO UPDATE SET
                primary_score        = excluded.primary_score,
                contact_count        = excluded.contact_count,
                interface_confidence = excluded.interface_confidence,
                auxiliary_score      = excluded.auxiliary_score,
                aux_pae_cutoff       = excluded.aux_pae_cutoff,
                confidence_tier      = excluded.confidence_tier,
                aux_tier             = excluded.aux_tier,
                schema_version       = {version_case},
                updated_at           = NOW()
            RETURNING (xmax = 0)
            "#,
            version_case = SCHEMA_VERSION_CASE.replace("{t}", "complex_interactions"),
        );

        let inserted: bool = sqlx::query_scalar(&sql)
            .bind(complex_id)
            .bind(prey_id)
            .bind(record.primary_score)
            .bind(record.contact_count)
            .bind(record.interface_confidence)
            .bind(record.auxiliary_score)
            .bind(record.aux_pae_cutoff)
            .bind(record.tool_generation.as_str())
            .bind(record.schema_version.as_str())
            .bind(&record.source_origin)
            .bind(record.stored_tier())
            .bind(record.aux_tier.map(|t| t.as_str()))
            .fetch_one(&mut **tx)
            .await
            .context("complex interaction upsert failed")?;
        Ok(inserted)
    }

    // ── Per-file commit unit ─────────────────────────────────────────────────

    /// Commit one parsed file as a single atomic unit. A failure here
    /// rolls back this file only; earlier files stay committed.
    pub async fn commit_file(&self, batch: &FileBatch) -> Result<FileCounts> {
        let mut tx = self.pool.begin().await?;
        let mut counts = FileCounts::default();

        for record in &batch.pairwise {
            let BaitRef::Protein(bait) = &record.bait else {
                // The assembler routes complex baits elsewhere.
                continue;
            };
            let bait_id = Self::upsert_protein(&mut tx, bait).await?;
            let prey_id = Self::upsert_protein(&mut tx, &record.prey).await?;
            if Self::upsert_interaction(&mut tx, bait_id, prey_id, record).await? {
                counts.new += 1;
            } else {
                counts.updated += 1;
            }
        }

        for group in &batch.complexes {
            let (complex_id, created) = Self::upsert_complex(&mut tx, group).await?;
            if created {
                counts.complexes_created += 1;
            }
            for record in &group.records {
                let prey_id = Self::upsert_protein(&mut tx, &record.prey).await?;
                if Self::upsert_complex_interaction(&mut tx, complex_id, prey_id, record).await? {
                    counts.new += 1;
                } else {
                    counts.updated += 1;
                }
            }
        }

        tx.commit().await?;
        tracing::debug!(
            new = counts.new,
            updated = counts.updated,
            complexes = counts.complexes_created,
            "file unit committed"
        );
        Ok(counts)
    }

    // ── Duplicate resolution ─────────────────────────────────────────────────

    /// Resolve duplicate-equivalence classes in the pairwise table.
    /// With `apply` false the deletions are reported, not executed.
    pub async fn dedup_pairwise(&self, apply: bool) -> Result<DedupReport> {
        let candidates = self
            .fetch_duplicate_candidates(
                "interactions",
                "bait_id",
            )
            .await?;
        self.resolve_and_delete("interactions", candidates, apply).await
    }

    /// Resolve duplicate-equivalence classes in the complex-interaction
    /// table; the complex id stands in for the bait.
    pub async fn dedup_complexes(&self, apply: bool) -> Result<DedupReport> {
        let candidates = self
            .fetch_duplicate_candidates(
                "complex_interactions",
                "complex_id",
            )
            .await?;
        self.resolve_and_delete("complex_interactions", candidates, apply).await
    }

    async fn fetch_duplicate_candidates(
        &self,
        table: &str,
        subject_column: &str,
    ) -> Result<Vec<DedupCandidate>> {
        let sql = format!(
            r#"
            SELECT i.id, i.{subject} AS subject_id, i.prey_id,
                   i.primary_score, i.contact_count, i.schema_version
            FROM {table} i
            JOIN (
                SELECT {subject} AS subject_id, prey_id, primary_score,
                       COALESCE(contact_count, 0) AS contacts
                FROM {table}
                GROUP BY {subject}, prey_id, primary_score, COALESCE(contact_count, 0)
                HAVING COUNT(*) > 1
            ) d ON d.subject_id = i.{subject}
               AND d.prey_id = i.prey_id
               AND d.primary_score = i.primary_score
               AND d.contacts = COALESCE(i.contact_count, 0)
            "#,
            table = table,
            subject = subject_column,
        );

        let rows: Vec<(i64, i64, i64, f64, Option<i32>, String)> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("duplicate candidate fetch failed for {table}"))?;

        Ok(rows
            .into_iter()
            .map(|(id, subject_id, prey_id, primary_score, contact_count, version)| {
                DedupCandidate {
                    id,
                    subject_id,
                    prey_id,
                    primary_score,
                    contact_count,
                    schema_version: SchemaVersion::parse(&version),
                }
            })
            .collect())
    }

    async fn resolve_and_delete(
        &self,
        table: &str,
        candidates: Vec<DedupCandidate>,
        apply: bool,
    ) -> Result<DedupReport> {
        let outcome = dedup::resolve(candidates);
        let mut report = DedupReport {
            groups_found: outcome.groups_found,
            ..Default::default()
        };

        if !apply {
            report.would_delete = outcome.delete_ids.len();
            return Ok(report);
        }

        report.deleted = self.delete_batched(table, &outcome.delete_ids).await?;
        Ok(report)
    }

    /// Delete rows in bounded batches. Absent ids are a no-op, so the
    /// whole pass is idempotent.
    async fn delete_batched(&self, table: &str, ids: &[i64]) -> Result<u64> {
        let sql = format!("DELETE FROM {table} WHERE id = ANY($1)");
        let mut deleted = 0u64;
        for chunk in delete_batches(ids) {
            let result = sqlx::query(&sql)
                .bind(chunk)
                .execute(&self.pool)
                .await
                .with_context(|| format!("batched delete failed for {table}"))?;
            deleted += result.rows_affected();
        }
        Ok(deleted)
    }

    // ── Read side ────────────────────────────────────────────────────────────

    pub async fn interaction_count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM interactions")
            .fetch_one(&self.pool)
            .await
            .context("interaction_count failed")
    }

    pub async fn complex_interaction_count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM complex_interactions")
            .fetch_one(&self.pool)
            .await
            .context("complex_interaction_count failed")
    }

    /// Fetch one stored pairwise interaction by its store key.
    pub async fn fetch_interaction(
        &self,
        bait_accession: &str,
        prey_accession: &str,
        source_origin: &str,
    ) -> Result<Option<StoredInteraction>> {
        let row = sqlx::query_as::<_, StoredInteraction>(
            r#"
            SELECT i.id, b.accession AS bait_accession, p.accession AS prey_accession,
                   i.primary_score, i.contact_count, i.interface_confidence,
                   i.auxiliary_score, i.aux_pae_cutoff, i.tool_generation,
                   i.schema_version, i.source_origin, i.confidence_tier, i.aux_tier
            FROM interactions i
            JOIN proteins b ON b.id = i.bait_id
            JOIN proteins p ON p.id = i.prey_id
            WHERE b.accession = $1 AND p.accession = $2 AND i.source_origin = $3
            "#,
        )
        .bind(bait_accession)
        .bind(prey_accession)
        .bind(source_origin)
        .fetch_optional(&self.pool)
        .await
        .context("fetch_interaction failed")?;
        Ok(row)
    }
}

/// Bounded id batches for the deletion statements. Every id appears in
/// exactly one batch and no batch exceeds `DELETE_BATCH_SIZE`.
fn delete_batches(ids: &[i64]) -> std::slice::Chunks<'_, i64> {
    ids.chunks(DELETE_BATCH_SIZE)
}
