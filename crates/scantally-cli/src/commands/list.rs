use std::path::Path;

use chrono::Utc;

use crate::commands::common::{event_to_list_item, format_event_lines, open_log, ScanListItem};
use crate::error::CliError;

pub async fn run_list(unsynced: bool, as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let log = open_log(db_path).await?;
    let events = if unsynced {
        log.unsynced_events().await?
    } else {
        log.list_events().await?
    };

    if as_json {
        let now_ms = Utc::now().timestamp_millis();
        let json_items = events
            .iter()
            .map(|event| event_to_list_item(event, now_ms))
            .collect::<Vec<ScanListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if events.is_empty() {
        println!("No scans recorded.");
        return Ok(());
    }

    for line in format_event_lines(&events) {
        println!("{line}");
    }
    Ok(())
}
