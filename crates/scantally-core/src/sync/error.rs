//! Sync error taxonomy.

use thiserror::Error;

/// Result type alias for sync operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Why a sync attempt did not complete
#[derive(Debug, Error)]
pub enum SyncError {
    /// The server refused the request as malformed; retrying unchanged will not help
    #[error("Sync request rejected: {0}")]
    Validation(String),

    /// No response from the server (unreachable, refused, timed out)
    #[error("Sync server unreachable: {0}")]
    Transport(String),

    /// The server failed to persist the batch; nothing was acknowledged
    #[error("Sync server error ({status}): {detail}")]
    Server { status: u16, detail: String },

    /// The server answered with something that is not a sync response
    #[error("Unexpected sync response: {0}")]
    Protocol(String),

    /// Reading or updating the local log failed
    #[error(transparent)]
    Store(#[from] crate::Error),
}

impl SyncError {
    /// Whether a later attempt with the same batch may succeed.
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Server { .. } | Self::Protocol(_)
        )
    }

    /// Whether the failure means the server could not be reached at all.
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
