//! Query command handler.

use crate::CosmosOpts;
use anyhow::Context;
use clap::Subcommand;
use document_store::DocumentStore;
use futures::StreamExt;
use hpk_core::UserSession;
use session_query::{KeyFilter, QueryDispatcher, QueryError, QueryPattern};
use std::io::Write;

/// Query patterns, cheapest first.
#[derive(Subcommand, Clone, Debug)]
pub enum PatternCommand {
    /// Read one session by id within its full partition key
    Point {
        #[arg(long)]
        tenant_id: String,
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        session_id: String,
        /// Record id
        #[arg(long)]
        id: String,
    },

    /// Query one partition by its full key
    Full {
        #[arg(long)]
        tenant_id: String,
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        session_id: String,
    },

    /// Query every session of one user (key prefix)
    TenantUser {
        #[arg(long)]
        tenant_id: String,
        #[arg(long)]
        user_id: String,
    },

    /// Cross-partition query on a single key field
    Field {
        /// tenantId, userId or sessionId
        #[arg(long)]
        field: String,
        #[arg(long)]
        value: String,
    },

    /// Pick the pattern from whichever key fields are given
    Auto {
        #[arg(long)]
        tenant_id: Option<String>,
        #[arg(long)]
        user_id: Option<String>,
        #[arg(long)]
        session_id: Option<String>,
        #[arg(long)]
        id: Option<String>,
    },
}

impl PatternCommand {
    /// Validate the arguments into a pattern.
    pub fn pattern(&self) -> Result<QueryPattern, QueryError> {
        match self {
            PatternCommand::Point {
                tenant_id,
                user_id,
                session_id,
                id,
            } => QueryPattern::point_read(tenant_id, user_id, session_id, id),
            PatternCommand::Full {
                tenant_id,
                user_id,
                session_id,
            } => QueryPattern::full_key(tenant_id, user_id, session_id),
            PatternCommand::TenantUser { tenant_id, user_id } => {
                QueryPattern::tenant_and_user(tenant_id, user_id)
            }
            PatternCommand::Field { field, value } => QueryPattern::single_field(field, value),
            PatternCommand::Auto {
                tenant_id,
                user_id,
                session_id,
                id,
            } => QueryPattern::select(&KeyFilter {
                tenant_id: tenant_id.clone(),
                user_id: user_id.clone(),
                session_id: session_id.clone(),
                id: id.clone(),
            }),
        }
    }
}

/// Totals for one executed pattern.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySummary {
    pub records: u64,
    pub decode_failures: u64,
    pub pages: u64,
    pub request_charge: f64,
}

impl std::fmt::Display for QuerySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} records, {} pages, {:.2} RU",
            self.records, self.pages, self.request_charge
        )?;
        if self.decode_failures > 0 {
            write!(f, ", {} undecodable", self.decode_failures)?;
        }
        Ok(())
    }
}

/// Run the query command against Cosmos DB, printing records as JSON lines.
pub async fn run_query(
    cosmos: CosmosOpts,
    command: PatternCommand,
    limit: Option<u64>,
) -> anyhow::Result<()> {
    // Reject bad requests before connecting
    let pattern = command.pattern().context("Invalid query")?;

    let store = cosmos.connect()?;
    let dispatcher = QueryDispatcher::new(&store, cosmos.container_spec().handle())
        .with_retry(cosmos.retry_policy());

    let mut stdout = std::io::stdout().lock();
    let summary = execute(&dispatcher, &pattern, limit, |session| {
        writeln!(stdout, "{}", serde_json::to_string(session)?)?;
        Ok(())
    })
    .await?;

    eprintln!("{pattern}: {summary}");
    Ok(())
}

/// Execute a pattern, handing each decoded record to `on_record`.
///
/// Undecodable records are logged and counted. A page that cannot be
/// fetched, or a failed point read, ends the query with an error.
pub async fn execute<S, F>(
    dispatcher: &QueryDispatcher<'_, S>,
    pattern: &QueryPattern,
    limit: Option<u64>,
    mut on_record: F,
) -> anyhow::Result<QuerySummary>
where
    S: DocumentStore + ?Sized,
    F: FnMut(&UserSession) -> anyhow::Result<()>,
{
    let mut summary = QuerySummary::default();
    let mut pages = dispatcher.dispatch_pages(pattern);

    'pages: while let Some(page) = pages.next().await {
        let page = page.with_context(|| format!("{} query failed", pattern.name()))?;
        summary.pages += 1;
        summary.request_charge += page.request_charge;

        for record in page.records {
            match record {
                Ok(session) => {
                    on_record(&session)?;
                    summary.records += 1;
                    if limit.is_some_and(|limit| summary.records >= limit) {
                        break 'pages;
                    }
                }
                Err(e) => {
                    tracing::warn!("Skipping record on page {}: {}", page.number, e);
                    summary.decode_failures += 1;
                }
            }
        }
    }

    tracing::info!("{}: {}", pattern, summary);
    Ok(summary)
}
