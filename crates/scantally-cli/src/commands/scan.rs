use std::path::Path;

use scantally_core::util::unix_millis_now;
use scantally_core::SyncState;

use crate::commands::common::{normalize_scan_input, open_engine, ServerOptions};
use crate::error::CliError;

pub async fn run_scan(
    sku: &str,
    count: i64,
    offline: bool,
    db_path: &Path,
    server: &ServerOptions,
) -> Result<(), CliError> {
    let sku = normalize_scan_input(sku, count)?;
    let engine = open_engine(db_path, server).await?;
    if offline {
        engine.set_online(false);
    }

    let local_id = engine.record_scan(&sku, count, unix_millis_now()).await?;
    println!("{local_id}");

    let state = engine.state();
    if state != SyncState::Synced {
        let pending = engine.log().pending_count().await?;
        eprintln!("Scan queued locally ({}; {pending} pending)", state.label());
    }
    Ok(())
}
