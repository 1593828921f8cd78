//! Client sync engine: pushes unsynced events and reconciles acknowledgments.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

use crate::models::LocalId;
use crate::protocol::OutgoingScan;
use crate::services::EventLogService;
use crate::state::SyncState;

use super::deferred::DeferredTrigger;
use super::error::{SyncError, SyncResult};
use super::transport::SyncTransport;

/// What a completed push did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncReport {
    /// The log had no unsynced events; no request was sent
    NothingToSync,
    /// One batch was sent and acknowledged
    Pushed {
        /// Events in the batch
        sent: usize,
        /// Events flipped to synced by this push
        acknowledged: u64,
        /// Events still unsynced afterwards (unacknowledged or appended mid-flight)
        remaining: u64,
    },
}

/// Result of [`SyncEngine::try_sync`]; failures are absorbed, never raised
#[derive(Debug)]
pub enum SyncOutcome {
    /// A deferred-delivery request was registered instead of sending now
    Deferred,
    /// An immediate push completed
    Completed(SyncReport),
    /// An immediate push failed; unsynced events stay queued
    Failed(SyncError),
    /// The server rejected an earlier batch; only [`SyncEngine::push_now`] retries it
    Held,
}

/// Offline-first sync engine over a local event log.
pub struct SyncEngine<T> {
    log: EventLogService,
    transport: T,
    deferred: Option<Box<dyn DeferredTrigger>>,
    online: AtomicBool,
    held: AtomicBool,
    state: watch::Sender<SyncState>,
}

impl<T: SyncTransport> SyncEngine<T> {
    /// Create an engine that pushes immediately (no deferred delivery).
    pub fn new(log: EventLogService, transport: T) -> Self {
        let (state, _) = watch::channel(SyncState::Pending);
        Self {
            log,
            transport,
            deferred: None,
            online: AtomicBool::new(true),
            held: AtomicBool::new(false),
            state,
        }
    }

    /// Prefer registering with `trigger` over sending immediately.
    #[must_use]
    pub fn with_deferred_trigger(mut self, trigger: impl DeferredTrigger + 'static) -> Self {
        self.deferred = Some(Box::new(trigger));
        self
    }

    /// The local event log this engine reconciles.
    pub const fn log(&self) -> &EventLogService {
        &self.log
    }

    /// The transport used for pushes.
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Current status indicator value.
    pub fn state(&self) -> SyncState {
        *self.state.borrow()
    }

    /// Observe status indicator changes.
    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.state.subscribe()
    }

    /// Whether the network is believed reachable.
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Whether automatic syncs are suspended after a non-retryable failure.
    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::SeqCst)
    }

    /// Update network reachability.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
        if online {
            let resumed = if self.is_held() {
                SyncState::Error
            } else {
                SyncState::Pending
            };
            self.state.send_if_modified(|state| {
                if *state == SyncState::Offline {
                    *state = resumed;
                    true
                } else {
                    false
                }
            });
        } else {
            self.state.send_replace(SyncState::Offline);
        }
    }

    /// Record one scan and, when online, try to sync it.
    ///
    /// Only the append can fail; sync problems are absorbed into the status
    /// indicator and the event stays queued.
    pub async fn record_scan(
        &self,
        sku: &str,
        count: i64,
        observed_at: i64,
    ) -> crate::Result<LocalId> {
        let local_id = self.log.append(sku, count, observed_at).await?;

        if self.is_online() {
            if !self.is_held() {
                self.state.send_replace(SyncState::Pending);
            }
            self.try_sync().await;
        } else {
            tracing::debug!(%local_id, "Offline; scan queued for a later sync");
        }

        Ok(local_id)
    }

    /// Trigger a sync: register a deferred delivery if possible, else push now.
    ///
    /// Does nothing while held after a non-retryable failure.
    pub async fn try_sync(&self) -> SyncOutcome {
        if self.is_held() {
            tracing::debug!("Automatic sync held until a manual push");
            return SyncOutcome::Held;
        }

        if let Some(trigger) = &self.deferred {
            match trigger.register() {
                Ok(()) => {
                    tracing::debug!("Registered deferred sync");
                    self.state.send_replace(SyncState::Pending);
                    return SyncOutcome::Deferred;
                }
                Err(reason) => {
                    tracing::debug!("Deferred sync unavailable ({reason}); pushing now");
                }
            }
        }

        match self.push_now().await {
            Ok(report) => SyncOutcome::Completed(report),
            Err(error) => {
                tracing::warn!("Sync attempt failed; events stay queued: {error}");
                SyncOutcome::Failed(error)
            }
        }
    }

    /// Push every unsynced event as one batch and mark acknowledged ids synced.
    ///
    /// Safe to call at any time, including while another push is in flight;
    /// a resent event may then be stored twice on the server. This is the
    /// manual retry: it lifts a hold, and a non-retryable failure sets one.
    pub async fn push_now(&self) -> SyncResult<SyncReport> {
        self.held.store(false, Ordering::SeqCst);
        let result = self.push_batch().await;

        if let Err(error) = &result {
            if !error.is_retryable() {
                tracing::warn!("Automatic sync held after non-retryable failure: {error}");
                self.held.store(true, Ordering::SeqCst);
            }
        }

        let next_state = match &result {
            Ok(SyncReport::NothingToSync) => SyncState::Synced,
            Ok(SyncReport::Pushed { remaining, .. }) if *remaining == 0 => SyncState::Synced,
            Ok(SyncReport::Pushed { .. }) => SyncState::Pending,
            Err(error) if error.is_transport() => SyncState::Offline,
            Err(_) => SyncState::Error,
        };
        self.state.send_replace(next_state);

        result
    }

    async fn push_batch(&self) -> SyncResult<SyncReport> {
        let batch = self.log.unsynced_events().await?;
        if batch.is_empty() {
            tracing::debug!("Nothing to sync");
            return Ok(SyncReport::NothingToSync);
        }

        self.state.send_replace(SyncState::Syncing);
        let outgoing: Vec<OutgoingScan> = batch.iter().map(OutgoingScan::from).collect();

        let response = self.transport.push(&outgoing).await?;
        let acknowledged_ids = response.acknowledged_local_ids();
        let acknowledged = self.log.mark_synced(&acknowledged_ids).await?;
        let remaining = self.log.pending_count().await?;

        tracing::info!(
            sent = outgoing.len(),
            acknowledged,
            remaining,
            "Pushed scan batch"
        );

        Ok(SyncReport::Pushed {
            sent: outgoing.len(),
            acknowledged,
            remaining,
        })
    }
}
