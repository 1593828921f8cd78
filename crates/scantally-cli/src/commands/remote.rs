use crate::commands::common::{
    build_transport, format_recent_lines, format_remote_summary_lines, ServerOptions,
};
use crate::error::CliError;

pub async fn run_remote(
    limit: usize,
    summary: bool,
    as_json: bool,
    server: &ServerOptions,
) -> Result<(), CliError> {
    let transport = build_transport(server)?;

    if summary {
        let totals = transport.fetch_summary().await?;
        if as_json {
            println!("{}", serde_json::to_string_pretty(&totals)?);
        } else if totals.is_empty() {
            println!("No scans stored on {}.", transport.base_url());
        } else {
            for line in format_remote_summary_lines(&totals) {
                println!("{line}");
            }
        }
        return Ok(());
    }

    let scans = transport.fetch_recent(limit).await?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&scans)?);
    } else if scans.is_empty() {
        println!("No scans stored on {}.", transport.base_url());
    } else {
        for line in format_recent_lines(&scans) {
            println!("{line}");
        }
    }
    Ok(())
}
