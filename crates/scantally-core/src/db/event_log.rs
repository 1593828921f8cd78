//! Local event log repository

use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::models::{
    normalize_sku, summarize_events, LocalId, ScanEvent, SkuSummary, MAX_SCAN_COUNT,
};
use libsql::{params, Connection};

/// Trait for the device-local, append-only scan log (async)
#[allow(async_fn_in_trait)]
pub trait EventLog {
    /// Append an unsynced event and return its new local id
    async fn append(&self, sku: &str, count: i64, observed_at: i64) -> Result<LocalId>;

    /// List events ordered by local id, optionally only the unsynced ones
    async fn list_all(&self, only_unsynced: bool) -> Result<Vec<ScanEvent>>;

    /// Flip the given events to synced; unknown or already-synced ids are ignored.
    ///
    /// Returns how many events changed state.
    async fn mark_synced(&self, ids: &BTreeSet<LocalId>) -> Result<u64>;

    /// Delete every unsynced event, leaving synced ones untouched
    async fn clear_unsynced(&self) -> Result<u64>;

    /// Delete one event if it is still unsynced
    async fn discard_unsynced(&self, id: LocalId) -> Result<bool>;

    /// Number of unsynced events
    async fn pending_count(&self) -> Result<u64>;

    /// Per-SKU totals over the whole log, recomputed on every call
    async fn summarize(&self) -> Result<Vec<SkuSummary>>;
}

/// libSQL implementation of `EventLog`
pub struct LibSqlEventLog<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlEventLog<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse a scan event from a database row
    fn parse_event(row: &libsql::Row) -> Result<ScanEvent> {
        Ok(ScanEvent {
            local_id: LocalId::new(row.get(0)?),
            sku: row.get(1)?,
            count: row.get(2)?,
            observed_at: row.get(3)?,
            synced: row.get::<i32>(4)? != 0,
        })
    }
}

impl EventLog for LibSqlEventLog<'_> {
    async fn append(&self, sku: &str, count: i64, observed_at: i64) -> Result<LocalId> {
        let sku = normalize_sku(sku)
            .ok_or_else(|| Error::InvalidInput("SKU cannot be empty".into()))?;
        if !(1..=MAX_SCAN_COUNT).contains(&count) {
            return Err(Error::InvalidInput(format!(
                "Scan count must be between 1 and {MAX_SCAN_COUNT}, got {count}"
            )));
        }

        self.conn
            .execute(
                "INSERT INTO scan_events (sku, count, observed_at, synced) VALUES (?, ?, ?, 0)",
                params![sku.as_str(), count, observed_at],
            )
            .await
            .map_err(Error::from_write_failure)?;

        let local_id = LocalId::new(self.conn.last_insert_rowid());
        tracing::debug!(%local_id, sku = %sku, count, "Appended scan event");
        Ok(local_id)
    }

    async fn list_all(&self, only_unsynced: bool) -> Result<Vec<ScanEvent>> {
        let sql = if only_unsynced {
            "SELECT local_id, sku, count, observed_at, synced
             FROM scan_events
             WHERE synced = 0
             ORDER BY local_id ASC"
        } else {
            "SELECT local_id, sku, count, observed_at, synced
             FROM scan_events
             ORDER BY local_id ASC"
        };

        let mut rows = self.conn.query(sql, ()).await?;
        let mut events = Vec::new();
        while let Some(row) = rows.next().await? {
            events.push(Self::parse_event(&row)?);
        }
        Ok(events)
    }

    async fn mark_synced(&self, ids: &BTreeSet<LocalId>) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        self.conn.execute("BEGIN TRANSACTION", ()).await?;

        let mut changed = 0;
        for id in ids {
            match self
                .conn
                .execute(
                    "UPDATE scan_events SET synced = 1 WHERE local_id = ? AND synced = 0",
                    [id.get()],
                )
                .await
            {
                Ok(rows) => changed += rows,
                Err(e) => {
                    self.conn.execute("ROLLBACK", ()).await.ok();
                    return Err(e.into());
                }
            }
        }

        if let Err(e) = self.conn.execute("COMMIT", ()).await {
            self.conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }

        Ok(changed)
    }

    async fn clear_unsynced(&self) -> Result<u64> {
        let removed = self
            .conn
            .execute("DELETE FROM scan_events WHERE synced = 0", ())
            .await?;
        tracing::info!(removed, "Discarded unsynced scan events");
        Ok(removed)
    }

    async fn discard_unsynced(&self, id: LocalId) -> Result<bool> {
        let removed = self
            .conn
            .execute(
                "DELETE FROM scan_events WHERE local_id = ? AND synced = 0",
                [id.get()],
            )
            .await?;
        Ok(removed > 0)
    }

    async fn pending_count(&self) -> Result<u64> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM scan_events WHERE synced = 0", ())
            .await?;
        let count = match rows.next().await? {
            Some(row) => row.get::<i64>(0)?,
            None => 0,
        };
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn summarize(&self) -> Result<Vec<SkuSummary>> {
        let events = self.list_all(false).await?;
        Ok(summarize_events(&events))
    }
}
