//! Shared local event log service used by clients.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::db::{Database, EventLog, LibSqlEventLog, Schema};
use crate::models::{LocalId, ScanEvent, SkuSummary};
use crate::Result;

/// Thread-safe handle to the device-local scan log.
///
/// Each call takes the lock only for its own query, so a sync in flight never
/// blocks new scans from being appended.
#[derive(Clone)]
pub struct EventLogService {
    db: Arc<Mutex<Database>>,
    db_path: Option<PathBuf>,
}

impl EventLogService {
    /// Open the event log at the given filesystem path.
    pub async fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = match Database::open(&db_path, Schema::EventLog).await {
            Ok(db) => db,
            Err(error) if Self::is_corrupted_db_error(&error) => {
                tracing::warn!(
                    "Local scan log at {} is unreadable: {}. Moving it aside and starting fresh.",
                    db_path.display(),
                    error
                );
                Self::quarantine_db_file(&db_path)?;
                Database::open(&db_path, Schema::EventLog).await?
            }
            Err(error) => return Err(error),
        };

        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: Some(db_path),
        })
    }

    /// Open an in-memory event log (primarily for tests).
    pub async fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory(Schema::EventLog).await?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: None,
        })
    }

    /// Filesystem location, when the log is file-backed.
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn is_corrupted_db_error(error: &crate::Error) -> bool {
        error
            .to_string()
            .to_ascii_lowercase()
            .contains("file is not a database")
    }

    fn quarantine_db_file(db_path: &Path) -> Result<()> {
        if db_path.exists() {
            let timestamp = chrono::Utc::now().timestamp_millis();
            let file_name = db_path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("scantally.db");
            let backup_path = db_path.with_file_name(format!("{file_name}.corrupt-{timestamp}"));

            std::fs::rename(db_path, &backup_path)?;
            tracing::warn!(
                "Moved unreadable scan log from {} to {}",
                db_path.display(),
                backup_path.display()
            );
        }
        Ok(())
    }

    /// Append an unsynced scan.
    pub async fn append(&self, sku: &str, count: i64, observed_at: i64) -> Result<LocalId> {
        let db = self.db.lock().await;
        LibSqlEventLog::new(db.connection())
            .append(sku, count, observed_at)
            .await
    }

    /// Every event in the log.
    pub async fn list_events(&self) -> Result<Vec<ScanEvent>> {
        let db = self.db.lock().await;
        LibSqlEventLog::new(db.connection()).list_all(false).await
    }

    /// Events not yet acknowledged by the server.
    pub async fn unsynced_events(&self) -> Result<Vec<ScanEvent>> {
        let db = self.db.lock().await;
        LibSqlEventLog::new(db.connection()).list_all(true).await
    }

    /// Mark acknowledged events as synced.
    pub async fn mark_synced(&self, ids: &BTreeSet<LocalId>) -> Result<u64> {
        let db = self.db.lock().await;
        LibSqlEventLog::new(db.connection()).mark_synced(ids).await
    }

    /// Discard every unsynced event.
    pub async fn clear_unsynced(&self) -> Result<u64> {
        let db = self.db.lock().await;
        LibSqlEventLog::new(db.connection()).clear_unsynced().await
    }

    /// Discard one unsynced event.
    pub async fn discard_unsynced(&self, id: LocalId) -> Result<bool> {
        let db = self.db.lock().await;
        LibSqlEventLog::new(db.connection())
            .discard_unsynced(id)
            .await
    }

    /// Number of unsynced events.
    pub async fn pending_count(&self) -> Result<u64> {
        let db = self.db.lock().await;
        LibSqlEventLog::new(db.connection()).pending_count().await
    }

    /// Per-SKU totals over the whole log.
    pub async fn summarize(&self) -> Result<Vec<SkuSummary>> {
        let db = self.db.lock().await;
        LibSqlEventLog::new(db.connection()).summarize().await
    }
}
