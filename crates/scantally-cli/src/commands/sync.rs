use std::path::Path;

use crate::commands::common::{describe_report, open_engine, ServerOptions};
use crate::error::CliError;

pub async fn run_sync(db_path: &Path, server: &ServerOptions) -> Result<(), CliError> {
    let engine = open_engine(db_path, server).await?;
    let report = engine.push_now().await?;
    println!("{}", describe_report(&report));
    Ok(())
}
