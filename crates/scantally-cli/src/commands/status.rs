use std::path::Path;

use crate::commands::common::{build_transport, open_log, ServerOptions};
use crate::error::CliError;

pub async fn run_status(db_path: &Path, server: &ServerOptions) -> Result<(), CliError> {
    let log = open_log(db_path).await?;
    let total = log.list_events().await?.len();
    let pending = log.pending_count().await?;

    println!("Local log:  {}", db_path.display());
    println!("Scans:      {total} ({pending} pending)");

    let transport = build_transport(server)?;
    match transport.health().await {
        Ok(health) => println!("Server:     {} ({})", transport.base_url(), health.status),
        Err(error) => {
            tracing::debug!("Health check failed: {error}");
            println!("Server:     {} (unreachable)", transport.base_url());
        }
    }
    Ok(())
}
