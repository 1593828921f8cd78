use std::io;

use scantally_core::sync::SyncError;
use scantally_core::LocalId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] scantally_core::Error),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("SKU cannot be empty")]
    EmptySku,
    #[error("Count must be between 1 and {}", scantally_core::models::MAX_SCAN_COUNT)]
    InvalidCount,
    #[error("No unsynced scan with id {0}; synced scans cannot be discarded")]
    NotDiscardable(LocalId),
    #[error("Configuration error: {0}")]
    Config(String),
}
