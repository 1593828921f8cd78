//! Sync status indicator shared by clients.

use serde::Serialize;

/// Unified sync state shown to the person scanning.
///
/// Sync failures never surface as errors to the scanner; they only move this
/// indicator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// Network reachability is off, or the last push found no server
    Offline,
    /// Unsynced events exist and a push is scheduled or due
    #[default]
    Pending,
    /// A push is in flight
    Syncing,
    /// Every local event is acknowledged
    Synced,
    /// The server rejected or failed the last batch
    Error,
}

impl SyncState {
    /// Short label for terminal or page status lines
    pub const fn label(self) -> &'static str {
        match self {
            Self::Offline => "offline",
            Self::Pending => "pending",
            Self::Syncing => "syncing",
            Self::Synced => "synced",
            Self::Error => "error",
        }
    }
}
