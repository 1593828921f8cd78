use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use scantally_core::models::{normalize_sku, MAX_SCAN_COUNT};
use scantally_core::protocol::{RecentScan, SkuTotal};
use scantally_core::services::EventLogService;
use scantally_core::sync::{HttpSyncTransport, SyncEngine, SyncReport};
use scantally_core::{ScanEvent, SkuSummary};
use serde::Serialize;

use crate::error::CliError;

/// Where the server lives and how long to wait on it
#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub base_url: String,
    pub timeout: Duration,
}

impl ServerOptions {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ScanListItem {
    pub id: i64,
    pub sku: String,
    pub count: i64,
    pub observed_at: String,
    pub relative_time: String,
    pub synced: bool,
}

#[derive(Debug, Serialize)]
pub struct SummaryItem {
    pub sku: String,
    pub total_count: i64,
    pub last_scanned: String,
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    match cli_db_path {
        Some(path) => Ok(path),
        None => default_db_path(),
    }
}

pub fn default_db_path() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join("scantally").join("scantally.db"))
        .ok_or_else(|| CliError::Config("failed to resolve a data directory".to_string()))
}

pub async fn open_log(db_path: &Path) -> Result<EventLogService, CliError> {
    Ok(EventLogService::open_path(db_path).await?)
}

pub fn build_transport(server: &ServerOptions) -> Result<HttpSyncTransport, CliError> {
    Ok(HttpSyncTransport::new(&server.base_url, server.timeout)?)
}

pub async fn open_engine(
    db_path: &Path,
    server: &ServerOptions,
) -> Result<SyncEngine<HttpSyncTransport>, CliError> {
    let log = open_log(db_path).await?;
    let transport = build_transport(server)?;
    Ok(SyncEngine::new(log, transport))
}

pub fn normalize_scan_input(sku: &str, count: i64) -> Result<String, CliError> {
    if !(1..=MAX_SCAN_COUNT).contains(&count) {
        return Err(CliError::InvalidCount);
    }
    normalize_sku(sku).ok_or(CliError::EmptySku)
}

pub fn event_to_list_item(event: &ScanEvent, now_ms: i64) -> ScanListItem {
    ScanListItem {
        id: event.local_id.get(),
        sku: event.sku.clone(),
        count: event.count,
        observed_at: format_iso_timestamp(event.observed_at),
        relative_time: format_relative_time(event.observed_at, now_ms),
        synced: event.synced,
    }
}

pub fn summary_to_item(summary: &SkuSummary) -> SummaryItem {
    SummaryItem {
        sku: summary.sku.clone(),
        total_count: summary.total_count,
        last_scanned: format_iso_timestamp(summary.last_scanned),
    }
}

pub fn format_event_lines(events: &[ScanEvent]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    events
        .iter()
        .map(|event| {
            let marker = if event.synced { "synced" } else { "pending" };
            let relative_time = format_relative_time(event.observed_at, now_ms);
            format!(
                "{:>6}  {:<24}  x{:<5}  {:<8}  {relative_time}",
                event.local_id.get(),
                truncate(&event.sku, 24),
                event.count,
                marker
            )
        })
        .collect()
}

pub fn format_summary_lines(summaries: &[SkuSummary]) -> Vec<String> {
    summaries
        .iter()
        .map(|summary| {
            format!(
                "{:<24}  {:>7}  {}",
                truncate(&summary.sku, 24),
                summary.total_count,
                format_timestamp(summary.last_scanned)
            )
        })
        .collect()
}

pub fn format_recent_lines(scans: &[RecentScan]) -> Vec<String> {
    scans
        .iter()
        .map(|scan| {
            format!(
                "{:<24}  x{:<5}  {}",
                truncate(&scan.sku, 24),
                scan.count,
                scan.timestamp
            )
        })
        .collect()
}

pub fn format_remote_summary_lines(totals: &[SkuTotal]) -> Vec<String> {
    totals
        .iter()
        .map(|total| {
            format!(
                "{:<24}  {:>7}  {}",
                truncate(&total.sku, 24),
                total.total_count,
                total.last_scanned
            )
        })
        .collect()
}

pub fn describe_report(report: &SyncReport) -> String {
    match report {
        SyncReport::NothingToSync => "Nothing to sync".to_string(),
        SyncReport::Pushed {
            sent,
            acknowledged,
            remaining: 0,
        } => format!("Synced {acknowledged} of {sent} scans"),
        SyncReport::Pushed {
            sent,
            acknowledged,
            remaining,
        } => format!("Synced {acknowledged} of {sent} scans; {remaining} still pending"),
    }
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_iso_timestamp(timestamp_ms: i64) -> String {
    scantally_core::util::millis_to_rfc3339(timestamp_ms)
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else {
        format!("{}w ago", diff / week)
    }
}

fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        value.to_string()
    } else {
        let mut truncated = value
            .chars()
            .take(max_chars.saturating_sub(3))
            .collect::<String>();
        truncated.push_str("...");
        truncated
    }
}
