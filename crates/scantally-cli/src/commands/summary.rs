use std::path::Path;

use crate::commands::common::{format_summary_lines, open_log, summary_to_item, SummaryItem};
use crate::error::CliError;

pub async fn run_summary(as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let log = open_log(db_path).await?;
    let summaries = log.summarize().await?;

    if as_json {
        let json_items = summaries
            .iter()
            .map(summary_to_item)
            .collect::<Vec<SummaryItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if summaries.is_empty() {
        println!("No scans recorded.");
        return Ok(());
    }

    for line in format_summary_lines(&summaries) {
        println!("{line}");
    }
    Ok(())
}
