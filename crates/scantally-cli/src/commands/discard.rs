use std::path::Path;

use scantally_core::LocalId;

use crate::commands::common::open_log;
use crate::error::CliError;

pub async fn run_discard(id: Option<i64>, all: bool, db_path: &Path) -> Result<(), CliError> {
    let log = open_log(db_path).await?;

    if all {
        let removed = log.clear_unsynced().await?;
        println!("Discarded {removed} unsynced scans");
        return Ok(());
    }

    let id = id
        .map(LocalId::new)
        .ok_or_else(|| CliError::Config("pass a scan id or --all".to_string()))?;
    if !log.discard_unsynced(id).await? {
        return Err(CliError::NotDiscardable(id));
    }
    println!("{id}");
    Ok(())
}
