//! Command-line interface for hpk-sessions
//!
//! # Usage Examples
//!
//! ## Load
//! ```bash
//! export COSMOS_DB_ENDPOINT=https://localhost:8081/
//! export COSMOS_DB_KEY=...
//! hpk-sessions load --database sessions-db --container sessions --row-count 1000 --concurrency 8
//! ```
//!
//! ## Query
//! ```bash
//! hpk-sessions query --database sessions-db --container sessions \
//!   full --tenant-id MidMarket-Inc --user-id user-192 --session-id session-5af6ab47
//!
//! hpk-sessions query --database sessions-db --container sessions \
//!   auto --tenant-id LocalShops-SME --user-id user-42
//! ```
//!
//! ## Without a database
//! ```bash
//! hpk-sessions generate --count 5 --seed 42
//! hpk-sessions demo --row-count 500
//! ```

use clap::{Parser, Subcommand};
use hpk_sessions::commands::demo::{run_demo, DemoArgs};
use hpk_sessions::commands::generate::{run_generate, GenerateArgs};
use hpk_sessions::commands::load::{run_load, LoadArgs};
use hpk_sessions::commands::query::{run_query, PatternCommand};
use hpk_sessions::CosmosOpts;

#[derive(Parser)]
#[command(name = "hpk-sessions")]
#[command(about = "Multi-tenant session activity on hierarchical partition keys")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate sessions and upsert them into a Cosmos DB container
    Load {
        #[command(flatten)]
        args: LoadArgs,
    },

    /// Read sessions back with one of the query patterns
    Query {
        #[command(flatten)]
        cosmos: CosmosOpts,

        /// Stop after this many records
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        limit: Option<u64>,

        #[command(subcommand)]
        pattern: PatternCommand,
    },

    /// Print generated sessions as JSON lines
    Generate {
        #[command(flatten)]
        args: GenerateArgs,
    },

    /// Load and query an in-memory store end to end
    Demo {
        #[command(flatten)]
        args: DemoArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Load { args } => run_load(args).await?,
        Commands::Query {
            cosmos,
            limit,
            pattern,
        } => run_query(cosmos, pattern, limit).await?,
        Commands::Generate { args } => run_generate(args)?,
        Commands::Demo { args } => run_demo(args).await?,
    }

    Ok(())
}
