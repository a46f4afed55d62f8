//! Demo command handler.
//!
//! Loads generated sessions into an in-memory store and runs every query
//! pattern against key values taken from a loaded record.

use crate::commands::load::{load_sessions, summary};
use crate::commands::query::{execute, QuerySummary};
use crate::GeneratorOpts;
use anyhow::Context;
use chrono::Utc;
use clap::Args;
use document_store::{ContainerSpec, DocumentStore, MemoryStore, RetryPolicy};
use hpk_core::KeyField;
use session_loader::{LoadReport, RecordLoader};
use session_query::{QueryDispatcher, QueryPattern};

/// Arguments for the demo command.
#[derive(Args, Clone, Debug)]
pub struct DemoArgs {
    #[command(flatten)]
    pub generator: GeneratorOpts,

    /// Number of random sessions to load
    #[arg(long, default_value = "200")]
    pub row_count: u64,

    /// Sessions written concurrently
    #[arg(long, default_value = "4")]
    pub concurrency: usize,

    /// Items per query page
    #[arg(long, default_value = "25")]
    pub page_size: usize,
}

/// What the demo did.
#[derive(Debug, Clone)]
pub struct DemoReport {
    pub load: LoadReport,
    /// Records written for the sample user's history
    pub history: u64,
    /// Pattern description and its totals, in execution order
    pub queries: Vec<(String, QuerySummary)>,
    /// The single-field request on a non-key field, rejected before the store
    pub rejected: String,
}

/// Run the demo against a fresh in-memory store.
pub async fn run_demo(args: DemoArgs) -> anyhow::Result<()> {
    let store = MemoryStore::new().with_page_size(args.page_size);
    let report = demo(&store, &args).await?;

    println!("{}", summary(&report.load));
    println!("Loaded {} more sessions for the sample user", report.history);
    for (pattern, totals) in &report.queries {
        println!("{pattern}: {totals}");
    }
    println!("Rejected: {}", report.rejected);
    println!("Store calls: {}", store.request_count());
    Ok(())
}

/// Load, then query with every pattern.
pub async fn demo<S: DocumentStore + ?Sized>(
    store: &S,
    args: &DemoArgs,
) -> anyhow::Result<DemoReport> {
    let spec = ContainerSpec::hierarchical("hpk-demo", "sessions");
    let mut generator = args.generator.generator()?;

    let load = load_sessions(
        store,
        &spec,
        &mut generator,
        args.row_count,
        args.concurrency,
        RetryPolicy::default(),
    )
    .await?;

    // A user with a full history, so the prefix query has something to find.
    let profile = generator
        .catalog()
        .iter()
        .next()
        .cloned()
        .context("Tenant catalog is empty")?;
    let history = generator.user_activity(&profile.name, profile.user_count_min, Utc::now())?;
    let sample = history
        .first()
        .cloned()
        .context("Sample user has no sessions")?;

    let history_report = RecordLoader::new(store, spec.handle())
        .with_concurrency(args.concurrency)
        .load_records(history)
        .await?;

    let patterns = vec![
        QueryPattern::point_read(
            &sample.tenant_id,
            &sample.user_id,
            &sample.session_id,
            &sample.id,
        )?,
        QueryPattern::full_key(&sample.tenant_id, &sample.user_id, &sample.session_id)?,
        QueryPattern::tenant_and_user(&sample.tenant_id, &sample.user_id)?,
        QueryPattern::single_field(KeyField::TenantId.as_str(), &sample.tenant_id)?,
        QueryPattern::single_field(KeyField::UserId.as_str(), &sample.user_id)?,
        QueryPattern::single_field(KeyField::SessionId.as_str(), &sample.session_id)?,
    ];

    let dispatcher = QueryDispatcher::new(store, spec.handle());
    let mut queries = Vec::with_capacity(patterns.len());
    for pattern in &patterns {
        let totals = execute(&dispatcher, pattern, None, |_| Ok(())).await?;
        queries.push((pattern.to_string(), totals));
    }

    let rejected = match QueryPattern::single_field("activity", &sample.activity) {
        Ok(pattern) => anyhow::bail!("non-key field was accepted: {pattern}"),
        Err(e) => e.to_string(),
    };

    Ok(DemoReport {
        load,
        history: history_report.succeeded,
        queries,
        rejected,
    })
}
