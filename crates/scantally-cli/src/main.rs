//! scantally CLI - terminal scanner client
//!
//! Scans land in a local log first and are pushed to the server whenever it
//! can be reached.

mod cli;
mod commands;
mod error;

#[cfg(test)]
mod tests;

use std::time::Duration;

use clap::Parser;

use cli::{Cli, Commands};
use commands::common::{resolve_db_path, ServerOptions};
use commands::completions::run_completions;
use commands::discard::run_discard;
use commands::list::run_list;
use commands::remote::run_remote;
use commands::scan::run_scan;
use commands::session::run_session;
use commands::status::run_status;
use commands::summary::run_summary;
use commands::sync::run_sync;
use error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let directive = "scantally=warn"
        .parse()
        .map_err(|error| CliError::Config(format!("invalid log directive: {error}")))?;
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive))
        .init();

    let cli = Cli::parse();
    let server = ServerOptions::new(cli.server, cli.timeout_secs);

    match cli.command {
        Commands::Scan {
            sku,
            count,
            offline,
        } => {
            let db_path = resolve_db_path(cli.db_path)?;
            run_scan(&sku, count, offline, &db_path, &server).await?;
        }
        Commands::Session { delay_ms, offline } => {
            let db_path = resolve_db_path(cli.db_path)?;
            run_session(Duration::from_millis(delay_ms), offline, &db_path, &server).await?;
        }
        Commands::List { unsynced, json } => {
            run_list(unsynced, json, &resolve_db_path(cli.db_path)?).await?;
        }
        Commands::Summary { json } => run_summary(json, &resolve_db_path(cli.db_path)?).await?,
        Commands::Status => run_status(&resolve_db_path(cli.db_path)?, &server).await?,
        Commands::Sync => run_sync(&resolve_db_path(cli.db_path)?, &server).await?,
        Commands::Discard { id, all } => {
            run_discard(id, all, &resolve_db_path(cli.db_path)?).await?;
        }
        Commands::Remote {
            limit,
            summary,
            json,
        } => run_remote(limit, summary, json, &server).await?,
        Commands::Completions { shell, output } => run_completions(shell, output.as_deref())?,
    }

    Ok(())
}
