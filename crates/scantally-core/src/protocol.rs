//! Wire types for the scan sync protocol.
//!
//! The client sends `{"scans": [{"id", "sku", "count", "timestamp"}, ...]}`
//! and receives `{"synced_ids": [...]}`. The server side is deliberately
//! lenient: items are read as loose JSON and coerced, so one malformed item
//! never rejects the rest of its batch.

#![allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)] // f64 counts are checked to be integral and in range

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{LocalId, PersistedScan, ScanEvent, SkuSummary, MAX_SCAN_COUNT};
use crate::util::{millis_to_rfc3339, parse_timestamp_millis};

/// Maximum number of rows `GET /api/scans` returns.
pub const MAX_RECENT_SCANS: usize = 500;

/// One local event as sent to the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingScan {
    pub id: LocalId,
    pub sku: String,
    pub count: i64,
    pub timestamp: String,
}

impl From<&ScanEvent> for OutgoingScan {
    fn from(event: &ScanEvent) -> Self {
        Self {
            id: event.local_id,
            sku: event.sku.clone(),
            count: event.count,
            timestamp: millis_to_rfc3339(event.observed_at),
        }
    }
}

/// Request body of `POST /api/scan` as built by clients
#[derive(Debug, Clone, Serialize)]
pub struct ScanBatch<'a> {
    pub scans: &'a [OutgoingScan],
}

/// Response body of a successful `POST /api/scan`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResponse {
    /// Client ids echoed back exactly as they were submitted
    pub synced_ids: Vec<Value>,
}

impl SyncResponse {
    /// Acknowledged ids that parse as local ids (JSON integers or numeric strings).
    pub fn acknowledged_local_ids(&self) -> BTreeSet<LocalId> {
        self.synced_ids
            .iter()
            .filter_map(|value| match value {
                Value::Number(number) => number.as_i64().map(LocalId::new),
                Value::String(text) => text.parse().ok(),
                _ => None,
            })
            .collect()
    }
}

/// A persisted scan as listed by `GET /api/scans`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentScan {
    pub sku: String,
    pub count: i64,
    pub timestamp: String,
}

impl From<&PersistedScan> for RecentScan {
    fn from(scan: &PersistedScan) -> Self {
        Self {
            sku: scan.sku.clone(),
            count: scan.count,
            timestamp: millis_to_rfc3339(scan.recorded_at),
        }
    }
}

/// A per-SKU total as listed by `GET /api/scans/summary`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkuTotal {
    pub sku: String,
    pub total_count: i64,
    pub last_scanned: String,
}

impl From<&SkuSummary> for SkuTotal {
    fn from(summary: &SkuSummary) -> Self {
        Self {
            sku: summary.sku.clone(),
            total_count: summary.total_count,
            last_scanned: millis_to_rfc3339(summary.last_scanned),
        }
    }
}

/// Body of `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Structured error body returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// A batch body that is not JSON or has no `scans` array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadPayload;

/// Extract the raw `scans` items from a request body.
pub fn parse_batch_body(body: &[u8]) -> Result<Vec<Value>, BadPayload> {
    let value: Value = serde_json::from_slice(body).map_err(|_| BadPayload)?;
    match value.get("scans") {
        Some(Value::Array(items)) => Ok(items.clone()),
        _ => Err(BadPayload),
    }
}

/// A batch item that passed validation and is ready to persist
#[derive(Debug, Clone, PartialEq)]
pub struct PendingScan {
    /// Client id to acknowledge once the batch commits
    pub ack_id: Option<Value>,
    pub sku: String,
    pub count: i64,
    pub recorded_at: i64,
}

/// Validate and coerce one raw batch item.
///
/// Returns `None` when the item has no usable SKU; such items are neither
/// persisted nor acknowledged.
pub fn normalize_item(item: &Value, now_ms: i64) -> Option<PendingScan> {
    let sku = match item.get("sku")? {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        _ => return None,
    };
    if sku.is_empty() {
        return None;
    }

    let ack_id = item.get("id").filter(|id| !id.is_null()).cloned();
    let count = item.get("count").map_or(1, coerce_count);
    let recorded_at = item
        .get("timestamp")
        .and_then(Value::as_str)
        .and_then(parse_timestamp_millis)
        .unwrap_or(now_ms);

    Some(PendingScan {
        ack_id,
        sku,
        count,
        recorded_at,
    })
}

/// Coerce a JSON count to a positive integer, defaulting to 1.
///
/// Counts above `MAX_SCAN_COUNT` are clamped to it.
pub fn coerce_count(value: &Value) -> i64 {
    let parsed = match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|float| float.is_finite() && float.fract() == 0.0)
                .filter(|float| *float <= i64::MAX as f64)
                .map(|float| float as i64)
        }),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed
        .filter(|count| *count >= 1)
        .map_or(1, |count| count.min(MAX_SCAN_COUNT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn batch_body_requires_scans_array() {
        assert_eq!(parse_batch_body(b"not json"), Err(BadPayload));
        assert_eq!(parse_batch_body(br#"{"scans": {"sku": "A"}}"#), Err(BadPayload));
        assert_eq!(parse_batch_body(br#"{"items": []}"#), Err(BadPayload));
        assert_eq!(parse_batch_body(br#"{"scans": []}"#), Ok(Vec::new()));
    }

    #[test]
    fn normalize_item_trims_and_keeps_valid_fields() {
        let item = json!({
            "id": 4,
            "sku": "  ABC123 ",
            "count": 3,
            "timestamp": "2024-01-01T00:00:00.000Z"
        });
        let pending = normalize_item(&item, NOW).unwrap();
        assert_eq!(
            pending,
            PendingScan {
                ack_id: Some(json!(4)),
                sku: "ABC123".to_string(),
                count: 3,
                recorded_at: 1_704_067_200_000,
            }
        );
    }

    #[test]
    fn normalize_item_skips_blank_or_missing_sku() {
        assert!(normalize_item(&json!({"id": 1, "sku": "   "}), NOW).is_none());
        assert!(normalize_item(&json!({"id": 1}), NOW).is_none());
        assert!(normalize_item(&json!({"id": 1, "sku": null}), NOW).is_none());
        assert!(normalize_item(&json!("ABC"), NOW).is_none());
    }

    #[test]
    fn normalize_item_accepts_numeric_sku() {
        let pending = normalize_item(&json!({"sku": 5_901_234_123_457_i64}), NOW).unwrap();
        assert_eq!(pending.sku, "5901234123457");
        assert_eq!(pending.ack_id, None);
    }

    #[test]
    fn normalize_item_defaults_bad_count_and_timestamp() {
        let pending = normalize_item(
            &json!({"id": "a", "sku": "X", "count": "lots", "timestamp": "soon"}),
            NOW,
        )
        .unwrap();
        assert_eq!(pending.count, 1);
        assert_eq!(pending.recorded_at, NOW);
    }

    #[test]
    fn coerce_count_rules() {
        assert_eq!(coerce_count(&json!(5)), 5);
        assert_eq!(coerce_count(&json!("7")), 7);
        assert_eq!(coerce_count(&json!(2.0)), 2);
        assert_eq!(coerce_count(&json!(2.5)), 1);
        assert_eq!(coerce_count(&json!(0)), 1);
        assert_eq!(coerce_count(&json!(-4)), 1);
        assert_eq!(coerce_count(&json!(null)), 1);
        assert_eq!(coerce_count(&json!([3])), 1);
    }

    #[test]
    fn coerce_count_clamps_oversized_values() {
        assert_eq!(coerce_count(&json!(MAX_SCAN_COUNT)), MAX_SCAN_COUNT);
        assert_eq!(coerce_count(&json!(i64::MAX)), MAX_SCAN_COUNT);
        assert_eq!(coerce_count(&json!("9223372036854775807")), MAX_SCAN_COUNT);
        assert_eq!(coerce_count(&json!(1e18)), MAX_SCAN_COUNT);
    }

    #[test]
    fn acknowledged_local_ids_skip_foreign_ids() {
        let response = SyncResponse {
            synced_ids: vec![json!(1), json!("2"), json!("abc"), json!(null), json!(3)],
        };
        let ids: Vec<i64> = response
            .acknowledged_local_ids()
            .into_iter()
            .map(LocalId::get)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn outgoing_scan_serializes_wire_shape() {
        let event = ScanEvent {
            local_id: LocalId::new(9),
            sku: "ABC".to_string(),
            count: 2,
            observed_at: 1_704_067_200_000,
            synced: false,
        };
        let value = serde_json::to_value(OutgoingScan::from(&event)).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 9,
                "sku": "ABC",
                "count": 2,
                "timestamp": "2024-01-01T00:00:00.000Z"
            })
        );
    }
}
