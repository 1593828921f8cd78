//! Client-local scan event model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Device-scoped identifier of a scan event, assigned by the local log.
///
/// Ids are strictly increasing on a device and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalId(i64);

impl LocalId {
    /// Wrap a raw row id
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Get the raw row id
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LocalId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// Largest count a single scan may carry.
///
/// Keeps per-SKU sums far from `i64` overflow no matter how many scans
/// accumulate.
pub const MAX_SCAN_COUNT: i64 = 1_000_000;

/// A scan recorded on this device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanEvent {
    /// Local identifier
    pub local_id: LocalId,
    /// Decoded barcode value or manually entered SKU
    pub sku: String,
    /// Number of units counted by this scan (`1..=MAX_SCAN_COUNT`)
    pub count: i64,
    /// When the scan happened (Unix ms)
    pub observed_at: i64,
    /// Whether the server has acknowledged this event
    pub synced: bool,
}

/// Trim a SKU and reject whitespace-only values.
#[must_use]
pub fn normalize_sku(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
