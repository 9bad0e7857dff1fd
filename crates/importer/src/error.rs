use std::path::PathBuf;

use crate::sheets::SheetError;

/// Errors that abort an import run.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The source file does not exist. Raised before any batch runs.
    #[error("CSV file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// The CSV file could not be opened or a record could not be decoded.
    #[error("Failed to read CSV {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Batch size must be at least one row.
    #[error("Batch size must be at least 1, got {0}")]
    InvalidBatchSize(usize),

    /// A batch failed to commit. Earlier batches stay committed.
    #[error("Batch upsert failed: {0}")]
    Store(#[from] sqlx::Error),

    /// The spreadsheet source could not be read.
    #[error(transparent)]
    Sheet(#[from] SheetError),
}
