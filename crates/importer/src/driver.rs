//! Batching import driver.
//!
//! Coerces each incoming row, discards rows without a usable name, and
//! hands fixed-size batches to a [`BatchSink`]. Each batch is its own unit
//! of atomicity: a failing batch aborts the run, batches flushed before it
//! stay committed.

use std::future::Future;

use figures_core::coercion::{coerce_row, CandidateRecord, RawRow};
use figures_core::fields::FigureField;
use figures_core::types::DEFAULT_BATCH_SIZE;
use figures_core::upsert::UpsertOutcome;
use figures_db::repositories::FigureRepo;
use figures_db::DbPool;

use crate::error::ImportError;

/// Destination for coerced batches.
pub trait BatchSink: Send + Sync {
    /// Commit one batch atomically.
    fn upsert_batch(
        &self,
        batch: Vec<CandidateRecord>,
    ) -> impl Future<Output = Result<UpsertOutcome, ImportError>> + Send;
}

/// [`BatchSink`] backed by the `figures` table.
#[derive(Clone)]
pub struct PgBatchSink {
    pool: DbPool,
}

impl PgBatchSink {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl BatchSink for PgBatchSink {
    async fn upsert_batch(&self, batch: Vec<CandidateRecord>) -> Result<UpsertOutcome, ImportError> {
        Ok(FigureRepo::upsert_batch(&self.pool, batch).await?)
    }
}

/// Running totals reported after every flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportProgress {
    /// Rows read from the source.
    pub rows_read: u64,
    /// Rows discarded for a blank or missing name.
    pub skipped: u64,
    /// Batches committed so far.
    pub batches: u64,
    /// Cumulative inserted/updated counts.
    pub outcome: UpsertOutcome,
    /// Set on the last report of a run.
    pub finished: bool,
    /// Whether the run ended by flushing a partial batch.
    pub remainder_flushed: bool,
}

impl ImportProgress {
    /// Rows written (inserted or updated) so far.
    pub fn committed(&self) -> u64 {
        self.outcome.total()
    }
}

/// Streams rows through coercion into batched upserts.
pub struct ImportDriver<S> {
    sink: S,
    batch_size: usize,
    allowed: Vec<FigureField>,
}

impl<S: BatchSink> ImportDriver<S> {
    /// Create a driver with the default batch size and the full column set.
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            batch_size: DEFAULT_BATCH_SIZE,
            allowed: FigureField::ALL.to_vec(),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Result<Self, ImportError> {
        if batch_size == 0 {
            return Err(ImportError::InvalidBatchSize(batch_size));
        }
        self.batch_size = batch_size;
        Ok(self)
    }

    /// Restrict the columns accepted from the source.
    pub fn with_allowed_fields(mut self, allowed: &[FigureField]) -> Self {
        self.allowed = allowed.to_vec();
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Import every row, calling `on_progress` after each flush and once
    /// more at the end with `finished` set.
    pub async fn run<I, F>(&self, rows: I, mut on_progress: F) -> Result<ImportProgress, ImportError>
    where
        I: IntoIterator<Item = Result<RawRow, ImportError>>,
        F: FnMut(&ImportProgress),
    {
        let mut progress = ImportProgress::default();
        let mut buffer: Vec<CandidateRecord> = Vec::with_capacity(self.batch_size);

        for row in rows {
            let row = row?;
            progress.rows_read += 1;

            let candidate = coerce_row(&row, &self.allowed);
            if !candidate.has_name() {
                progress.skipped += 1;
                tracing::debug!(row = progress.rows_read, "Skipping row without a name");
                continue;
            }

            buffer.push(candidate);
            if buffer.len() >= self.batch_size {
                self.flush(&mut buffer, &mut progress).await?;
                on_progress(&progress);
            }
        }

        if !buffer.is_empty() {
            self.flush(&mut buffer, &mut progress).await?;
            progress.remainder_flushed = true;
        }

        progress.finished = true;
        tracing::info!(
            rows_read = progress.rows_read,
            skipped = progress.skipped,
            inserted = progress.outcome.inserted,
            updated = progress.outcome.updated,
            batches = progress.batches,
            "Import finished"
        );
        on_progress(&progress);

        Ok(progress)
    }

    async fn flush(
        &self,
        buffer: &mut Vec<CandidateRecord>,
        progress: &mut ImportProgress,
    ) -> Result<(), ImportError> {
        let batch = std::mem::replace(buffer, Vec::with_capacity(self.batch_size));
        let size = batch.len();

        let outcome = self.sink.upsert_batch(batch).await.inspect_err(|e| {
            tracing::error!(
                error = %e,
                batch = progress.batches + 1,
                committed = progress.committed(),
                "Batch failed, aborting import"
            );
        })?;

        progress.outcome += outcome;
        progress.batches += 1;
        tracing::info!(
            batch = progress.batches,
            size,
            committed = progress.committed(),
            "Flushed batch"
        );
        Ok(())
    }
}
