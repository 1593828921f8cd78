//! Data models for scantally

mod persisted;
mod scan_event;
mod summary;

pub use persisted::{PersistedScan, ScanId};
pub use scan_event::{normalize_sku, LocalId, ScanEvent, MAX_SCAN_COUNT};
pub use summary::{summarize_events, SkuSummary};
