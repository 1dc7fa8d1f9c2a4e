use anyhow::Result;
use clap::Parser;
use fleetdesk::cli::Cli;
use fleetdesk::config::LOG_ENV;
use tracing_subscriber::EnvFilter;

/// Log to stderr so table, JSON and CSV output on stdout stays clean.
///
/// `FLEETDESK_LOG=debug` overrides the level; otherwise warnings only,
/// or info with `--verbose`.
fn init_tracing(verbose: bool) {
    let fallback = if verbose { "info,sqlx=warn" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    cli.run().await
}
