//! Offline batch import of historical figures.
//!
//! Rows come from a CSV file ([`source::CsvRowSource`]) or a spreadsheet
//! ([`sheets::SheetsClient`]), are coerced into candidate records, and are
//! upserted in fixed-size transactional batches by [`driver::ImportDriver`].

pub mod driver;
pub mod error;
pub mod sheets;
pub mod source;

pub use driver::{BatchSink, ImportDriver, ImportProgress, PgBatchSink};
pub use error::ImportError;
