//! Transport seam between the sync engine and the server.

use crate::protocol::{OutgoingScan, SyncResponse};

use super::error::SyncResult;

/// Delivers one sync batch to the aggregate store.
///
/// Implementations must report "no response" as [`super::SyncError::Transport`]
/// so the engine keeps the whole batch unsynced.
#[allow(async_fn_in_trait)]
pub trait SyncTransport {
    /// Send the batch and return the server's acknowledgment
    async fn push(&self, scans: &[OutgoingScan]) -> SyncResult<SyncResponse>;
}
