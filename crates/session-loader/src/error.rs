//! Error types for the record loader.

use crate::loader::LoadReport;
use thiserror::Error;

/// Errors that can occur while loading records.
#[derive(Error, Debug)]
pub enum LoadError {
    /// At least one record could not be encoded or written. The report
    /// still carries the successes.
    #[error("{} of {} records failed to load", .0.failed, .0.attempted())]
    BatchFailed(LoadReport),
}

impl LoadError {
    /// The report of the failed batch.
    pub fn report(&self) -> &LoadReport {
        match self {
            LoadError::BatchFailed(report) => report,
        }
    }
}
