//! Record loader.

use crate::encoder::{JsonEncoder, SessionEncoder};
use crate::error::LoadError;
use document_store::{ContainerHandle, DocumentStore, RetryPolicy, WriteResponse};
use futures::stream::{self, StreamExt};
use hpk_core::UserSession;
use session_generator::SessionGenerator;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Progress is logged after this many records, and at completion.
pub const PROGRESS_INTERVAL: u64 = 10;
/// Records in flight at once unless configured otherwise.
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Where a record failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    Encode,
    Key,
    Write,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureStage::Encode => write!(f, "encode"),
            FailureStage::Key => write!(f, "key"),
            FailureStage::Write => write!(f, "write"),
        }
    }
}

/// One record that was not loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordFailure {
    pub id: String,
    pub stage: FailureStage,
    pub message: String,
}

impl RecordFailure {
    fn new(id: &str, stage: FailureStage, err: impl fmt::Display) -> Self {
        Self {
            id: id.to_string(),
            stage,
            message: err.to_string(),
        }
    }
}

/// Outcome of a load.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Records written.
    pub succeeded: u64,
    /// Records skipped because they failed.
    pub failed: u64,
    /// Details of each failed record.
    pub failures: Vec<RecordFailure>,
    /// Total time taken.
    pub total_duration: Duration,
    /// Sum of the store's request charges for successful writes.
    pub request_charge: f64,
}

impl LoadReport {
    pub fn attempted(&self) -> u64 {
        self.succeeded + self.failed
    }

    /// Calculate rows per second.
    pub fn rows_per_second(&self) -> f64 {
        if self.total_duration.as_secs_f64() > 0.0 {
            self.succeeded as f64 / self.total_duration.as_secs_f64()
        } else {
            0.0
        }
    }

    fn record(&mut self, result: Result<WriteResponse, RecordFailure>) {
        match result {
            Ok(write) => {
                self.succeeded += 1;
                self.request_charge += write.request_charge;
            }
            Err(failure) => {
                error!(
                    "Failed to load session '{}' ({} stage): {}",
                    failure.id, failure.stage, failure.message
                );
                self.failed += 1;
                self.failures.push(failure);
            }
        }
    }
}

/// Encodes sessions and upserts them under their full partition key.
///
/// # Example
///
/// ```ignore
/// let loader = RecordLoader::new(&store, handle).with_concurrency(8);
/// let report = loader.load(&mut generator, 1000).await?;
/// ```
pub struct RecordLoader<'a, S: DocumentStore + ?Sized, E: SessionEncoder = JsonEncoder> {
    store: &'a S,
    handle: ContainerHandle,
    encoder: E,
    retry: RetryPolicy,
    concurrency: usize,
    progress_interval: u64,
}

impl<'a, S: DocumentStore + ?Sized> RecordLoader<'a, S, JsonEncoder> {
    pub fn new(store: &'a S, handle: ContainerHandle) -> Self {
        Self {
            store,
            handle,
            encoder: JsonEncoder,
            retry: RetryPolicy::default(),
            concurrency: DEFAULT_CONCURRENCY,
            progress_interval: PROGRESS_INTERVAL,
        }
    }
}

impl<'a, S: DocumentStore + ?Sized, E: SessionEncoder> RecordLoader<'a, S, E> {
    /// Replace the document encoder.
    pub fn with_encoder<E2: SessionEncoder>(self, encoder: E2) -> RecordLoader<'a, S, E2> {
        RecordLoader {
            store: self.store,
            handle: self.handle,
            encoder,
            retry: self.retry,
            concurrency: self.concurrency,
            progress_interval: self.progress_interval,
        }
    }

    /// Set the retry policy applied to each upsert.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set how many records may be written concurrently (at least 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Set the progress log cadence (at least 1).
    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval.max(1);
        self
    }

    /// Generate and load `count` sessions.
    pub async fn load(
        &self,
        generator: &mut SessionGenerator,
        count: u64,
    ) -> Result<LoadReport, LoadError> {
        info!(
            "Loading {} sessions into '{}' (concurrency: {})",
            count, self.handle.container, self.concurrency
        );
        self.load_records(generator.sessions(count)).await
    }

    /// Load already generated sessions.
    ///
    /// Every record is attempted. Returns `LoadError::BatchFailed` carrying
    /// the full report when any record failed.
    pub async fn load_records<I>(&self, sessions: I) -> Result<LoadReport, LoadError>
    where
        I: IntoIterator<Item = UserSession>,
    {
        let start_time = Instant::now();
        let mut report = LoadReport::default();

        let mut writes = stream::iter(sessions)
            .map(|session| async move { self.write_one(&session).await })
            .buffer_unordered(self.concurrency);

        while let Some(result) = writes.next().await {
            report.record(result);

            let done = report.attempted();
            if done % self.progress_interval == 0 {
                info!(
                    "Progress: {} records processed ({} succeeded, {} failed)",
                    done, report.succeeded, report.failed
                );
            }
        }

        report.total_duration = start_time.elapsed();
        info!(
            "Load complete: {} succeeded, {} failed in {:?} ({:.1} rows/sec, {:.2} RU)",
            report.succeeded,
            report.failed,
            report.total_duration,
            report.rows_per_second(),
            report.request_charge
        );

        if report.failed > 0 {
            Err(LoadError::BatchFailed(report))
        } else {
            Ok(report)
        }
    }

    async fn write_one(&self, session: &UserSession) -> Result<WriteResponse, RecordFailure> {
        let document = self
            .encoder
            .encode(session)
            .map_err(|e| RecordFailure::new(&session.id, FailureStage::Encode, e))?;

        let key = session
            .partition_key()
            .map_err(|e| RecordFailure::new(&session.id, FailureStage::Key, e))?;

        let response = self
            .retry
            .run("upsert", || self.store.upsert(&self.handle, &key, &document))
            .await
            .map_err(|e| RecordFailure::new(&session.id, FailureStage::Write, e))?;

        debug!("Upserted session '{}' into partition {}", session.id, key);
        Ok(response)
    }
}
