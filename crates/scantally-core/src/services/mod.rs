//! Shared service wrappers over the database layer.

mod event_log;
mod scan_store;

pub use event_log::EventLogService;
pub use scan_store::ScanStoreService;
