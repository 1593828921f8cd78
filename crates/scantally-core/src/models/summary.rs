//! Per-SKU aggregate projection

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::{LocalId, ScanEvent};

/// Sum of counts for one SKU, with the most recent scan time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkuSummary {
    pub sku: String,
    pub total_count: i64,
    /// Most recent scan time (Unix ms)
    pub last_scanned: i64,
}

/// Group events by SKU, summing counts and keeping the latest scan time.
///
/// Events are deduplicated by `local_id`, so an event listed twice counts
/// once. Synced and unsynced events contribute alike, and totals saturate
/// rather than wrap. The result is ordered
/// most recently scanned first, ties broken by SKU.
#[must_use]
pub fn summarize_events(events: &[ScanEvent]) -> Vec<SkuSummary> {
    let unique: BTreeMap<LocalId, &ScanEvent> =
        events.iter().map(|event| (event.local_id, event)).collect();

    let mut by_sku: HashMap<&str, SkuSummary> = HashMap::new();
    for event in unique.values() {
        by_sku
            .entry(event.sku.as_str())
            .and_modify(|summary| {
                summary.total_count = summary.total_count.saturating_add(event.count);
                summary.last_scanned = summary.last_scanned.max(event.observed_at);
            })
            .or_insert_with(|| SkuSummary {
                sku: event.sku.clone(),
                total_count: event.count,
                last_scanned: event.observed_at,
            });
    }

    let mut summaries: Vec<SkuSummary> = by_sku.into_values().collect();
    summaries.sort_by(|a, b| {
        b.last_scanned
            .cmp(&a.last_scanned)
            .then_with(|| a.sku.cmp(&b.sku))
    });
    summaries
}
