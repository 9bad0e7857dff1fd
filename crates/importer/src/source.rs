//! Row sources for the import driver.

use std::fs::File;
use std::path::{Path, PathBuf};

use figures_core::coercion::RawRow;

use crate::error::ImportError;

/// Streams rows from a delimited file whose first line is the header.
///
/// Records shorter than the header leave their trailing columns unset;
/// surplus cells past the header are ignored.
pub struct CsvRowSource {
    path: PathBuf,
    headers: Vec<String>,
    records: csv::StringRecordsIntoIter<File>,
}

impl CsvRowSource {
    /// Open `path` and read its header line.
    ///
    /// Fails with [`ImportError::SourceNotFound`] before reading anything if
    /// the file does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ImportError> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(ImportError::SourceNotFound(path));
        }

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&path)
            .map_err(|source| ImportError::Csv {
                path: path.clone(),
                source,
            })?;

        let headers = reader
            .headers()
            .map_err(|source| ImportError::Csv {
                path: path.clone(),
                source,
            })?
            .iter()
            .map(str::to_string)
            .collect();

        Ok(Self {
            path,
            headers,
            records: reader.into_records(),
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Iterator for CsvRowSource {
    type Item = Result<RawRow, ImportError>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        Some(match record {
            Ok(record) => Ok(zip_row(&self.headers, &record)),
            Err(source) => Err(ImportError::Csv {
                path: self.path.clone(),
                source,
            }),
        })
    }
}

fn zip_row(headers: &[String], record: &csv::StringRecord) -> RawRow {
    headers
        .iter()
        .enumerate()
        .map(|(i, header)| (header.clone(), record.get(i).map(str::to_string)))
        .collect()
}
