//! Generate command handler.

use crate::GeneratorOpts;
use chrono::Utc;
use clap::Args;
use session_generator::SessionGenerator;
use std::io::Write;

/// Arguments for the generate command.
#[derive(Args, Clone, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub generator: GeneratorOpts,

    /// Number of sessions to generate
    #[arg(long, default_value = "10")]
    pub count: u64,

    /// Generate the full history of one user of this tenant instead
    #[arg(long, requires = "user_number")]
    pub tenant: Option<String>,

    /// User number within the tenant's range (user-<n>)
    #[arg(long, requires = "tenant")]
    pub user_number: Option<u32>,
}

/// Run the generate command, writing JSON lines to stdout.
pub fn run_generate(args: GenerateArgs) -> anyhow::Result<()> {
    let mut generator = args.generator.generator()?;
    let mut stdout = std::io::stdout().lock();
    let written = write_sessions(&mut generator, &args, &mut stdout)?;
    tracing::info!("Generated {} sessions", written);
    Ok(())
}

/// Write sessions as JSON lines, returning how many were written.
pub fn write_sessions<W: Write>(
    generator: &mut SessionGenerator,
    args: &GenerateArgs,
    out: &mut W,
) -> anyhow::Result<u64> {
    let mut written = 0;

    if let (Some(tenant), Some(user_number)) = (&args.tenant, args.user_number) {
        for session in generator.user_activity(tenant, user_number, Utc::now())? {
            writeln!(out, "{}", serde_json::to_string(&session)?)?;
            written += 1;
        }
        return Ok(written);
    }

    for session in generator.sessions(args.count) {
        writeln!(out, "{}", serde_json::to_string(&session)?)?;
        written += 1;
    }
    Ok(written)
}
