//! scantally-core - Core library for scantally
//!
//! This crate contains the scan models, the wire protocol, the libSQL-backed
//! local event log and aggregate store, and the offline-first sync engine
//! shared by the API server and the terminal client.

pub mod db;
pub mod error;
pub mod models;
pub mod protocol;
pub mod services;
pub mod state;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{LocalId, PersistedScan, ScanEvent, ScanId, SkuSummary};
pub use state::SyncState;
