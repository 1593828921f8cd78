//! Database layer for scantally

mod connection;
mod event_log;
mod migrations;
mod scan_store;

pub use connection::{Database, DatabaseLocation};
pub use event_log::{EventLog, LibSqlEventLog};
pub use migrations::Schema;
pub use scan_store::{LibSqlScanStore, ScanStore};
