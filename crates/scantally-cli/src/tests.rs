use std::time::Duration;

use clap::Parser;
use pretty_assertions::assert_eq;
use scantally_core::models::MAX_SCAN_COUNT;
use scantally_core::services::EventLogService;
use scantally_core::sync::{HttpSyncTransport, SyncEngine, SyncReport};
use scantally_core::{LocalId, ScanEvent, SkuSummary};
use tempfile::tempdir;
use tokio::io::{AsyncWriteExt, BufReader};

use crate::cli::{Cli, Commands, CompletionShell, DEFAULT_SERVER_URL};
use crate::commands::common::{
    describe_report, event_to_list_item, format_event_lines, format_relative_time,
    format_summary_lines, format_timestamp, normalize_scan_input, resolve_db_path,
};
use crate::commands::completions::{render_completions, run_completions};
use crate::commands::discard::run_discard;
use crate::commands::session::read_scans;
use crate::error::CliError;

fn event(id: i64, sku: &str, synced: bool) -> ScanEvent {
    ScanEvent {
        local_id: LocalId::new(id),
        sku: sku.to_string(),
        count: 2,
        observed_at: 1_704_067_200_000,
        synced,
    }
}

async fn offline_engine() -> SyncEngine<HttpSyncTransport> {
    let log = EventLogService::open_in_memory().await.unwrap();
    let transport = HttpSyncTransport::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
    let engine = SyncEngine::new(log, transport);
    engine.set_online(false);
    engine
}

#[test]
fn cli_parses_scan_with_defaults() {
    let cli = Cli::try_parse_from(["scantally", "scan", "ABC123"]).unwrap();
    assert_eq!(cli.server, DEFAULT_SERVER_URL);
    assert_eq!(cli.timeout_secs, 10);
    match cli.command {
        Commands::Scan {
            sku,
            count,
            offline,
        } => {
            assert_eq!(sku, "ABC123");
            assert_eq!(count, 1);
            assert!(!offline);
        }
        _ => panic!("expected scan command"),
    }
}

#[test]
fn cli_discard_requires_id_or_all() {
    assert!(Cli::try_parse_from(["scantally", "discard"]).is_err());
    assert!(Cli::try_parse_from(["scantally", "discard", "3", "--all"]).is_err());
    assert!(Cli::try_parse_from(["scantally", "discard", "--all"]).is_ok());
}

#[test]
fn normalize_scan_input_rejects_bad_values() {
    assert_eq!(normalize_scan_input("  ABC  ", 1).unwrap(), "ABC");
    assert!(matches!(
        normalize_scan_input("   ", 1),
        Err(CliError::EmptySku)
    ));
    assert!(matches!(
        normalize_scan_input("ABC", 0),
        Err(CliError::InvalidCount)
    ));
    assert!(matches!(
        normalize_scan_input("ABC", i64::MAX),
        Err(CliError::InvalidCount)
    ));
    assert_eq!(normalize_scan_input("ABC", MAX_SCAN_COUNT).unwrap(), "ABC");
}

#[test]
fn resolve_db_path_prefers_explicit_path() {
    let explicit = std::path::PathBuf::from("/tmp/scans.db");
    assert_eq!(resolve_db_path(Some(explicit.clone())).unwrap(), explicit);
}

#[test]
fn format_relative_time_units() {
    let now = 10_000_000;
    assert_eq!(format_relative_time(now - 30_000, now), "just now");
    assert_eq!(format_relative_time(now - 120_000, now), "2m ago");
    assert_eq!(format_relative_time(now - 2 * 60 * 60_000, now), "2h ago");
}

#[test]
fn format_timestamp_renders_utc() {
    assert_eq!(format_timestamp(1_704_067_200_000), "2024-01-01 00:00:00 UTC");
}

#[test]
fn event_list_item_marks_sync_state() {
    let item = event_to_list_item(&event(7, "ABC", true), 1_704_067_200_000);
    assert_eq!(item.id, 7);
    assert_eq!(item.observed_at, "2024-01-01T00:00:00.000Z");
    assert_eq!(item.relative_time, "just now");
    assert!(item.synced);
}

#[test]
fn event_lines_show_pending_marker() {
    let lines = format_event_lines(&[event(1, "ABC", false), event(2, "XYZ", true)]);
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("ABC") && lines[0].contains("pending"));
    assert!(lines[1].contains("XYZ") && lines[1].contains("synced"));
}

#[test]
fn summary_lines_include_totals() {
    let lines = format_summary_lines(&[SkuSummary {
        sku: "ABC".to_string(),
        total_count: 12,
        last_scanned: 1_704_067_200_000,
    }]);
    assert!(lines[0].starts_with("ABC"));
    assert!(lines[0].contains("12"));
}

#[test]
fn describe_report_mentions_remaining() {
    assert_eq!(describe_report(&SyncReport::NothingToSync), "Nothing to sync");
    assert_eq!(
        describe_report(&SyncReport::Pushed {
            sent: 3,
            acknowledged: 3,
            remaining: 0,
        }),
        "Synced 3 of 3 scans"
    );
    assert_eq!(
        describe_report(&SyncReport::Pushed {
            sent: 3,
            acknowledged: 1,
            remaining: 2,
        }),
        "Synced 1 of 3 scans; 2 still pending"
    );
}

#[test]
fn completions_use_binary_name() {
    for shell in [
        CompletionShell::Bash,
        CompletionShell::Zsh,
        CompletionShell::Fish,
        CompletionShell::PowerShell,
    ] {
        let script = String::from_utf8(render_completions(shell)).unwrap();
        assert!(script.contains("scantally"), "{shell:?}");
    }
}

#[test]
fn completions_write_to_nested_output_path() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("completions").join("scantally.fish");

    run_completions(CompletionShell::Fish, Some(&path)).unwrap();
    let script = std::fs::read_to_string(&path).unwrap();
    assert!(script.contains("complete -c scantally"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_read_scans_records_one_event_per_line() {
    let engine = offline_engine().await;
    let input: &[u8] = b"ABC123\n\n   \n  XYZ  \nABC123\n";

    let mut recorded = 0;
    read_scans(&engine, input, &mut recorded).await.unwrap();
    assert_eq!(recorded, 3);

    let skus: Vec<String> = engine
        .log()
        .list_events()
        .await
        .unwrap()
        .into_iter()
        .map(|event| event.sku)
        .collect();
    assert_eq!(skus, vec!["ABC123", "XYZ", "ABC123"]);

    let summary = engine.log().summarize().await.unwrap();
    let abc = summary.iter().find(|entry| entry.sku == "ABC123").unwrap();
    assert_eq!(abc.total_count, 2);
    assert_eq!(engine.log().pending_count().await.unwrap(), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_read_scans_count_survives_interruption() {
    let engine = offline_engine().await;
    let (mut writer, reader) = tokio::io::duplex(256);
    writer.write_all(b"ABC\nXYZ\n").await.unwrap();

    // The writer stays open, so reading only ends when it is interrupted.
    let mut recorded = 0;
    tokio::select! {
        result = read_scans(&engine, BufReader::new(reader), &mut recorded) => {
            panic!("reader ended early: {result:?}");
        }
        () = tokio::time::sleep(Duration::from_millis(200)) => {}
    }

    assert_eq!(recorded, 2);
    assert_eq!(engine.log().pending_count().await.unwrap(), 2);
    drop(writer);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_discard_refuses_synced_scans() {
    let tmp = tempdir().unwrap();
    let db_path = tmp.path().join("scans.db");

    let log = EventLogService::open_path(&db_path).await.unwrap();
    let synced = log.append("A", 1, 0).await.unwrap();
    let pending = log.append("B", 1, 0).await.unwrap();
    log.mark_synced(&[synced].into_iter().collect()).await.unwrap();
    drop(log);

    let error = run_discard(Some(synced.get()), false, &db_path)
        .await
        .unwrap_err();
    assert!(matches!(error, CliError::NotDiscardable(id) if id == synced));

    run_discard(Some(pending.get()), false, &db_path)
        .await
        .unwrap();

    let log = EventLogService::open_path(&db_path).await.unwrap();
    let remaining: Vec<LocalId> = log
        .list_events()
        .await
        .unwrap()
        .iter()
        .map(|event| event.local_id)
        .collect();
    assert_eq!(remaining, vec![synced]);
}
