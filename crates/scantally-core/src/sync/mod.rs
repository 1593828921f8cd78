//! Offline-first delivery of local scan events to the aggregate store.

mod deferred;
mod engine;
mod error;
mod http;
mod transport;

pub use deferred::{ChannelTrigger, DeferredSyncWorker, DeferredTrigger};
pub use engine::{SyncEngine, SyncOutcome, SyncReport};
pub use error::{SyncError, SyncResult};
pub use http::HttpSyncTransport;
pub use transport::SyncTransport;
