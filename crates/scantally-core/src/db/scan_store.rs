//! Aggregate store repository (server side)

#![allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)] // SQLite uses i64 for LIMIT; TOTAL() is a float

use crate::error::{Error, Result};
use crate::models::{PersistedScan, ScanId, SkuSummary};
use crate::protocol::{normalize_item, PendingScan, MAX_RECENT_SCANS};
use libsql::{params, Connection};
use serde_json::Value;

/// Trait for append-only scan storage operations (async)
#[allow(async_fn_in_trait)]
pub trait ScanStore {
    /// Validate and persist a sync batch in one transaction.
    ///
    /// Returns the client ids of the persisted items. On any persistence
    /// failure nothing is stored and nothing is acknowledged.
    async fn submit_batch(&self, items: &[Value], now_ms: i64) -> Result<Vec<Value>>;

    /// Persist already-validated scans in one transaction
    async fn insert_batch(&self, scans: &[PendingScan]) -> Result<Vec<PersistedScan>>;

    /// Most recent scans first, at most `limit` (clamped to 1..=500)
    async fn list_recent(&self, limit: usize) -> Result<Vec<PersistedScan>>;

    /// Per-SKU totals over every stored row
    async fn summarize(&self) -> Result<Vec<SkuSummary>>;
}

/// libSQL implementation of `ScanStore`
pub struct LibSqlScanStore<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlScanStore<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse a persisted scan from a database row
    fn parse_scan(row: &libsql::Row) -> Result<PersistedScan> {
        let id: String = row.get(0)?;
        Ok(PersistedScan {
            server_id: id
                .parse()
                .map_err(|_| Error::Database(format!("Invalid scan id in store: {id}")))?,
            sku: row.get(1)?,
            count: row.get(2)?,
            recorded_at: row.get(3)?,
        })
    }

    async fn insert_all(&self, scans: &[PendingScan]) -> Result<Vec<PersistedScan>> {
        let mut persisted = Vec::with_capacity(scans.len());
        for scan in scans {
            let row = PersistedScan {
                server_id: ScanId::new(),
                sku: scan.sku.clone(),
                count: scan.count,
                recorded_at: scan.recorded_at,
            };
            self.conn
                .execute(
                    "INSERT INTO scans (id, sku, count, recorded_at) VALUES (?, ?, ?, ?)",
                    params![
                        row.server_id.as_str(),
                        row.sku.as_str(),
                        row.count,
                        row.recorded_at
                    ],
                )
                .await?;
            persisted.push(row);
        }
        Ok(persisted)
    }
}

impl ScanStore for LibSqlScanStore<'_> {
    async fn submit_batch(&self, items: &[Value], now_ms: i64) -> Result<Vec<Value>> {
        let pending: Vec<PendingScan> = items
            .iter()
            .filter_map(|item| normalize_item(item, now_ms))
            .collect();

        let skipped = items.len() - pending.len();
        if skipped > 0 {
            tracing::debug!(skipped, "Skipped batch items without a SKU");
        }

        self.insert_batch(&pending).await?;

        Ok(pending.into_iter().filter_map(|scan| scan.ack_id).collect())
    }

    async fn insert_batch(&self, scans: &[PendingScan]) -> Result<Vec<PersistedScan>> {
        if scans.is_empty() {
            return Ok(Vec::new());
        }

        self.conn.execute("BEGIN TRANSACTION", ()).await?;

        let persisted = match self.insert_all(scans).await {
            Ok(persisted) => persisted,
            Err(e) => {
                self.conn.execute("ROLLBACK", ()).await.ok();
                return Err(e);
            }
        };

        if let Err(e) = self.conn.execute("COMMIT", ()).await {
            self.conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }

        tracing::debug!(rows = persisted.len(), "Committed scan batch");
        Ok(persisted)
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<PersistedScan>> {
        let limit = limit.clamp(1, MAX_RECENT_SCANS);
        let mut rows = self
            .conn
            .query(
                "SELECT id, sku, count, recorded_at
                 FROM scans
                 ORDER BY recorded_at DESC, id DESC
                 LIMIT ?",
                [limit as i64],
            )
            .await?;

        let mut scans = Vec::new();
        while let Some(row) = rows.next().await? {
            scans.push(Self::parse_scan(&row)?);
        }
        Ok(scans)
    }

    async fn summarize(&self) -> Result<Vec<SkuSummary>> {
        let mut rows = self
            .conn
            .query(
                "SELECT sku, TOTAL(count), MAX(recorded_at)
                 FROM scans
                 GROUP BY sku
                 ORDER BY MAX(recorded_at) DESC, sku ASC",
                (),
            )
            .await?;

        let mut summaries = Vec::new();
        while let Some(row) = rows.next().await? {
            // TOTAL() never overflows; the cast saturates at i64::MAX.
            let total: f64 = row.get(1)?;
            summaries.push(SkuSummary {
                sku: row.get(0)?,
                total_count: total as i64,
                last_scanned: row.get(2)?,
            });
        }
        Ok(summaries)
    }
}
