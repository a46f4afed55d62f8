//! Load command handler.

use crate::{CosmosOpts, GeneratorOpts};
use anyhow::Context;
use clap::Args;
use document_store::{ContainerSpec, DocumentStore, Provisioned, RetryPolicy};
use session_generator::SessionGenerator;
use session_loader::{LoadError, LoadReport, RecordLoader, DEFAULT_CONCURRENCY};

/// Failures listed individually in the summary
const MAX_LISTED_FAILURES: usize = 10;

/// Arguments for the load command.
#[derive(Args, Clone, Debug)]
pub struct LoadArgs {
    #[command(flatten)]
    pub cosmos: CosmosOpts,

    #[command(flatten)]
    pub generator: GeneratorOpts,

    /// Number of sessions to generate and load
    #[arg(long, default_value = "100")]
    pub row_count: u64,

    /// Sessions written concurrently
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,
}

/// Run the load command against Cosmos DB.
pub async fn run_load(args: LoadArgs) -> anyhow::Result<()> {
    let store = args.cosmos.connect()?;
    let mut generator = args.generator.generator()?;

    let report = load_sessions(
        &store,
        &args.cosmos.container_spec(),
        &mut generator,
        args.row_count,
        args.concurrency,
        args.cosmos.retry_policy(),
    )
    .await?;

    println!("{}", summary(&report));
    Ok(())
}

/// Provision the container, then generate and load `count` sessions.
///
/// Provisioning failures abort before any record is written. A batch with
/// failed records is returned as an error after its summary is printed.
pub async fn load_sessions<S: DocumentStore + ?Sized>(
    store: &S,
    spec: &ContainerSpec,
    generator: &mut SessionGenerator,
    count: u64,
    concurrency: usize,
    retry: RetryPolicy,
) -> anyhow::Result<LoadReport> {
    let (handle, provisioned) = retry
        .run("ensure_container", || store.ensure_container(spec))
        .await
        .with_context(|| {
            format!(
                "Failed to provision container '{}' in database '{}'",
                spec.name, spec.database
            )
        })?;
    match provisioned {
        Provisioned::Created => tracing::info!("Created container '{}'", spec.name),
        Provisioned::AlreadyExists => tracing::info!("Using existing container '{}'", spec.name),
    }

    let loader = RecordLoader::new(store, handle)
        .with_retry(retry)
        .with_concurrency(concurrency);

    match loader.load(generator, count).await {
        Ok(report) => Ok(report),
        Err(LoadError::BatchFailed(report)) => {
            eprintln!("{}", summary(&report));
            for failure in report.failures.iter().take(MAX_LISTED_FAILURES) {
                eprintln!("  {} ({}): {}", failure.id, failure.stage, failure.message);
            }
            if report.failures.len() > MAX_LISTED_FAILURES {
                eprintln!("  ... and {} more", report.failures.len() - MAX_LISTED_FAILURES);
            }
            Err(LoadError::BatchFailed(report).into())
        }
    }
}

/// One-line human readable report.
pub fn summary(report: &LoadReport) -> String {
    format!(
        "Loaded {} of {} sessions ({} failed) in {:.2?}, {:.1} rows/sec, {:.2} RU",
        report.succeeded,
        report.attempted(),
        report.failed,
        report.total_duration,
        report.rows_per_second(),
        report.request_charge
    )
}
