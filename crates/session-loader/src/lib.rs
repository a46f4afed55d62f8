//! Writes generated sessions to a [`DocumentStore`](document_store::DocumentStore).
//!
//! Every record is encoded, addressed by its full tenant/user/session key and
//! upserted, so re-running a load with the same ids never duplicates records.
//! A failing record is counted and skipped; the batch as a whole fails when
//! any record failed.

mod encoder;
mod error;
mod loader;

pub use encoder::{EncodeError, JsonEncoder, SessionEncoder};
pub use error::LoadError;
pub use loader::{
    FailureStage, LoadReport, RecordFailure, RecordLoader, DEFAULT_CONCURRENCY, PROGRESS_INTERVAL,
};
