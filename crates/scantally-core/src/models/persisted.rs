//! Server-side persisted scan model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Server-assigned identifier of a persisted scan, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanId(Uuid);

impl ScanId {
    /// Create a new unique scan ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for ScanId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ScanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ScanId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// An immutable scan row in the aggregate store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedScan {
    /// Server identifier
    pub server_id: ScanId,
    /// Trimmed, non-empty SKU
    pub sku: String,
    /// Positive unit count
    pub count: i64,
    /// Scan time (Unix ms); client timestamp when valid, otherwise server time
    pub recorded_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_id_unique() {
        assert_ne!(ScanId::new(), ScanId::new());
    }

    #[test]
    fn scan_id_parse() {
        let id = ScanId::new();
        let parsed: ScanId = id.as_str().parse().unwrap();
        assert_eq!(id, parsed);
    }
}
