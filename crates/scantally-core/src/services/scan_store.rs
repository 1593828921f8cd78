//! Shared aggregate store service used by the API server.

use std::sync::Arc;

use serde_json::Value;

use crate::db::{Database, DatabaseLocation, LibSqlScanStore, ScanStore, Schema};
use crate::models::{PersistedScan, SkuSummary};
use crate::Result;

/// Handle to the server's durable scan table.
///
/// Holds no mutable state of its own: every call opens a fresh connection,
/// so each request runs its own transaction against the shared store.
#[derive(Clone)]
pub struct ScanStoreService {
    db: Arc<Database>,
}

impl ScanStoreService {
    /// Open (and migrate) the store at `location`.
    pub async fn open(location: &DatabaseLocation) -> Result<Self> {
        if let DatabaseLocation::Local(path) = location {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Database::open_location(location, Schema::AggregateStore).await?;
        match location {
            DatabaseLocation::Local(path) => {
                tracing::info!("Using embedded scan store at {}", path.display());
            }
            DatabaseLocation::Remote { url, .. } => {
                tracing::info!("Using remote scan store at {url}");
            }
        }

        Ok(Self { db: Arc::new(db) })
    }

    /// Validate and persist one sync batch atomically.
    pub async fn submit_batch(&self, items: &[Value], now_ms: i64) -> Result<Vec<Value>> {
        let conn = self.db.connect().await?;
        LibSqlScanStore::new(&conn)
            .submit_batch(items, now_ms)
            .await
    }

    /// Most recent scans first.
    pub async fn list_recent(&self, limit: usize) -> Result<Vec<PersistedScan>> {
        let conn = self.db.connect().await?;
        LibSqlScanStore::new(&conn).list_recent(limit).await
    }

    /// Per-SKU totals.
    pub async fn summarize(&self) -> Result<Vec<SkuSummary>> {
        let conn = self.db.connect().await?;
        LibSqlScanStore::new(&conn).summarize().await
    }
}
