//! Database connection management

use crate::error::{Error, Result};
use libsql::{Builder, Connection, Database as LibSqlDatabase};
use std::path::Path;
use std::time::Duration;

use super::migrations::{self, Schema};

/// How long a connection waits on a locked database file before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Where a database lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    /// Embedded single-file store
    Local(std::path::PathBuf),
    /// Remote libSQL server (e.g., `libsql://your-db.turso.io`)
    Remote { url: String, auth_token: String },
}

/// Database wrapper for libSQL connections
pub struct Database {
    db: LibSqlDatabase,
    conn: Connection,
    remote: bool,
}

impl Database {
    /// Open the database at `location`, creating it if needed, and migrate `schema`.
    pub async fn open_location(location: &DatabaseLocation, schema: Schema) -> Result<Self> {
        match location {
            DatabaseLocation::Local(path) => Self::open(path, schema).await,
            DatabaseLocation::Remote { url, auth_token } => {
                Self::open_remote(url, auth_token, schema).await
            }
        }
    }

    /// Open a local database at the given path, creating it if it doesn't exist
    ///
    /// Runs migrations automatically.
    pub async fn open(path: impl AsRef<Path>, schema: Schema) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let db = Builder::new_local(&path_str).build().await?;
        Self::initialize(db, false, schema).await
    }

    /// Open an in-memory database (useful for testing)
    ///
    /// Only the primary connection sees the data; [`Database::connect`] on an
    /// in-memory database yields an unrelated empty database.
    pub async fn open_in_memory(schema: Schema) -> Result<Self> {
        let db = Builder::new_local(":memory:").build().await?;
        Self::initialize(db, false, schema).await
    }

    /// Open a remote libSQL database over HTTP
    pub async fn open_remote(url: &str, auth_token: &str, schema: Schema) -> Result<Self> {
        if url.trim().is_empty() {
            return Err(Error::InvalidInput("Database URL is required".into()));
        }
        let db = Builder::new_remote(url.to_string(), auth_token.to_string())
            .build()
            .await?;
        tracing::debug!("Connected to remote database");
        Self::initialize(db, true, schema).await
    }

    async fn initialize(db: LibSqlDatabase, remote: bool, schema: Schema) -> Result<Self> {
        let conn = db.connect()?;
        let database = Self { db, conn, remote };
        Self::configure(&database.conn, remote).await?;
        migrations::run(&database.conn, schema).await?;
        Ok(database)
    }

    /// Configure `SQLite` pragmas on a fresh connection
    async fn configure(conn: &Connection, remote: bool) -> Result<()> {
        if remote {
            // Remote servers manage their own journal and locking.
            return Ok(());
        }
        conn.execute("PRAGMA journal_mode = WAL;", ()).await.ok();
        conn.execute("PRAGMA synchronous = NORMAL;", ()).await.ok();
        conn.busy_timeout(BUSY_TIMEOUT).ok();
        conn.execute("PRAGMA foreign_keys = ON;", ()).await?;
        Ok(())
    }

    /// Open an additional, independently configured connection.
    ///
    /// Used for request-scoped access: each caller gets its own connection
    /// and therefore its own transaction lifecycle.
    pub async fn connect(&self) -> Result<Connection> {
        let conn = self.db.connect()?;
        Self::configure(&conn, self.remote).await?;
        Ok(conn)
    }

    /// Whether this database lives on a remote server
    pub const fn is_remote(&self) -> bool {
        self.remote
    }

    /// Get a reference to the primary connection
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_open_in_memory() {
        let db = Database::open_in_memory(Schema::EventLog).await.unwrap();
        assert!(!db.is_remote());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_extra_connections_share_file() {
        let tmp = tempdir().unwrap();
        let location = DatabaseLocation::Local(tmp.path().join("store.db"));
        let db = Database::open_location(&location, Schema::AggregateStore)
            .await
            .unwrap();

        db.connection()
            .execute(
                "INSERT INTO scans (id, sku, count, recorded_at) VALUES ('x', 'A', 1, 0)",
                (),
            )
            .await
            .unwrap();

        let other = db.connect().await.unwrap();
        let mut rows = other.query("SELECT COUNT(*) FROM scans", ()).await.unwrap();
        let count: i64 = rows.next().await.unwrap().unwrap().get(0).unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_remote_requires_url() {
        let result = Database::open_remote("  ", "token", Schema::AggregateStore).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
