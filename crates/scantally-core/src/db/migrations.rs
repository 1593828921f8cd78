//! Database migrations

use crate::error::Result;
use libsql::Connection;

/// Which table set a database carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    /// Client-side local event log
    EventLog,
    /// Server-side append-only scan table
    AggregateStore,
}

impl Schema {
    /// Ordered migration steps; step `n` (1-based) brings the schema to version `n`.
    const fn steps(self) -> &'static [&'static [&'static str]] {
        match self {
            Self::EventLog => EVENT_LOG_STEPS,
            Self::AggregateStore => AGGREGATE_STORE_STEPS,
        }
    }

    /// Latest version of this schema
    pub const fn current_version(self) -> i32 {
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let version = self.steps().len() as i32;
        version
    }
}

const EVENT_LOG_STEPS: &[&[&str]] = &[&[
    // AUTOINCREMENT keeps local ids strictly increasing even after discards
    "CREATE TABLE IF NOT EXISTS scan_events (
        local_id INTEGER PRIMARY KEY AUTOINCREMENT,
        sku TEXT NOT NULL,
        count INTEGER NOT NULL CHECK (count >= 1),
        observed_at INTEGER NOT NULL,
        synced INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE INDEX IF NOT EXISTS idx_scan_events_sku ON scan_events(sku)",
    "CREATE INDEX IF NOT EXISTS idx_scan_events_synced ON scan_events(synced)",
]];

const AGGREGATE_STORE_STEPS: &[&[&str]] = &[&[
    "CREATE TABLE IF NOT EXISTS scans (
        id TEXT PRIMARY KEY,
        sku TEXT NOT NULL,
        count INTEGER NOT NULL,
        recorded_at INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_scans_recorded ON scans(recorded_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_scans_sku ON scans(sku)",
]];

/// Run all pending migrations for `schema`
pub async fn run(conn: &Connection, schema: Schema) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        (),
    )
    .await?;

    let version = get_version(conn).await?;

    for (index, statements) in schema.steps().iter().enumerate() {
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let target = index as i32 + 1;
        if version < target {
            apply_step(conn, target, statements).await?;
        }
    }

    Ok(())
}

/// Get the current schema version
async fn get_version(conn: &Connection) -> Result<i32> {
    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_version", ())
        .await?;

    let version: i32 = if let Some(row) = rows.next().await? {
        row.get(0)?
    } else {
        0
    };

    Ok(version)
}

/// Apply one migration step atomically and record its version
async fn apply_step(conn: &Connection, version: i32, statements: &[&str]) -> Result<()> {
    // libsql doesn't have execute_batch, so we run each statement separately
    conn.execute("BEGIN TRANSACTION", ()).await?;

    for stmt in statements {
        if let Err(e) = conn.execute(stmt, ()).await {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }
    }

    if let Err(e) = conn
        .execute("INSERT INTO schema_version (version) VALUES (?)", [version])
        .await
    {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(e.into());
    }

    if let Err(e) = conn.execute("COMMIT", ()).await {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(e.into());
    }

    tracing::info!("Migrated database to version {version}");
    Ok(())
}
