//! Plexfold reconciliation CLI
//!
//! Run with: cargo run -p plexfold-cli -- <paths> [--dry-run]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use plexfold_ingestion::pg_repository::PgReconRepository;
use plexfold_ingestion::pipeline::{run_reconciliation, ReconcileJob};

/// Reconcile structural-prediction result files into the interaction store.
#[derive(Parser, Debug)]
#[command(name = "plexfold", version, about)]
struct Cli {
    /// Base directories to scan for result files (default: current directory)
    paths: Vec<PathBuf>,

    /// Parse and report without writing or deleting anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    // Fail before touching anything if the store is not configured.
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set (e.g. in .env)")?;

    let explicit_paths = !cli.paths.is_empty();
    let base_paths = if explicit_paths {
        cli.paths.clone()
    } else {
        vec![PathBuf::from(".")]
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to database")?;

    let repository = Arc::new(PgReconRepository::new(pool));
    repository.ensure_schema().await?;

    let job = ReconcileJob {
        base_paths,
        dry_run: cli.dry_run,
    };
    let result = run_reconciliation(job, repository).await?;

    // An explicitly named path that yields nothing is an operator
    // mistake; a bare default scan finding nothing is a clean no-op.
    if explicit_paths && result.files_discovered == 0 {
        bail!("no result files found under the given paths");
    }

    info!(
        run_id = %result.run_id,
        files_discovered = result.files_discovered,
        files_processed = result.files_processed,
        files_failed = result.files_failed,
        records_parsed = result.counters.records_parsed,
        skipped_malformed = result.counters.skipped_malformed,
        skipped_unresolved = result.counters.skipped_unresolved,
        filtered_low_band = result.counters.filtered_low_band,
        "run summary"
    );
    if cli.dry_run {
        info!(
            suppressed_writes = result.suppressed_writes,
            would_delete = result.would_delete,
            "dry run, store untouched"
        );
    } else {
        info!(
            new = result.new_records,
            updated = result.updated_records,
            complexes_created = result.complexes_created,
            duplicate_groups = result.duplicate_groups,
            deleted = result.deleted_records,
            "store updated"
        );
    }
    for error in &result.errors {
        tracing::warn!(error = %error, "file error");
    }

    if result.files_failed > 0 && result.files_processed == 0 && result.files_discovered > 0 {
        bail!("every discovered file failed");
    }

    Ok(())
}
