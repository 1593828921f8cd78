//! Optional deferred-delivery capability.
//!
//! When a trigger is configured, the engine registers a "sync later" request
//! instead of pushing on every scan. A burst of scans then collapses into a
//! single push once the worker's delay elapses.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};

use super::engine::{SyncEngine, SyncReport};
use super::transport::SyncTransport;

/// A platform primitive that schedules a sync for later automatic execution.
pub trait DeferredTrigger: Send + Sync {
    /// Request a deferred sync. An error makes the engine push immediately.
    fn register(&self) -> Result<(), String>;
}

/// Channel-backed trigger paired with a [`DeferredSyncWorker`].
#[derive(Clone)]
pub struct ChannelTrigger {
    sender: mpsc::Sender<()>,
}

impl ChannelTrigger {
    /// Create a trigger and the worker that serves it.
    pub fn channel(delay: Duration) -> (Self, DeferredSyncWorker) {
        // One slot: a registration while one is pending coalesces into it.
        let (sender, receiver) = mpsc::channel(1);
        (Self { sender }, DeferredSyncWorker { receiver, delay })
    }
}

impl DeferredTrigger for ChannelTrigger {
    fn register(&self) -> Result<(), String> {
        match self.sender.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => Ok(()),
            Err(TrySendError::Closed(())) => Err("deferred sync worker has stopped".to_string()),
        }
    }
}

/// Background loop that performs registered syncs.
pub struct DeferredSyncWorker {
    receiver: mpsc::Receiver<()>,
    delay: Duration,
}

impl DeferredSyncWorker {
    /// Serve registrations until `shutdown` resolves or every trigger is dropped.
    ///
    /// Each registration waits `delay` before pushing, so registrations made
    /// during the wait ride along. On exit, a final push flushes anything
    /// still unsynced while the engine is online and not held. Returns the
    /// number of push attempts made.
    pub async fn run<T: SyncTransport>(
        mut self,
        engine: &SyncEngine<T>,
        shutdown: impl Future<Output = ()>,
    ) -> usize {
        tokio::pin!(shutdown);
        let mut attempts = 0;

        loop {
            tokio::select! {
                biased;
                signal = self.receiver.recv() => {
                    if signal.is_none() {
                        break;
                    }
                    // Shutdown cuts the wait short; the flush below still runs.
                    let interrupted = tokio::select! {
                        () = tokio::time::sleep(self.delay) => false,
                        () = &mut shutdown => true,
                    };
                    if interrupted {
                        break;
                    }
                    while self.receiver.try_recv().is_ok() {}
                    if engine.is_held() {
                        tracing::debug!("Deferred sync skipped; engine is held");
                        continue;
                    }
                    Self::push(engine).await;
                    attempts += 1;
                }
                () = &mut shutdown => break,
            }
        }

        self.receiver.close();
        if engine.is_online() && !engine.is_held() {
            Self::push(engine).await;
            attempts += 1;
        }
        attempts
    }

    async fn push<T: SyncTransport>(engine: &SyncEngine<T>) {
        match engine.push_now().await {
            Ok(SyncReport::NothingToSync) => {}
            Ok(SyncReport::Pushed {
                sent,
                acknowledged,
                remaining,
            }) => {
                tracing::debug!(sent, acknowledged, remaining, "Deferred sync completed");
            }
            Err(error) => {
                tracing::warn!("Deferred sync failed; events stay queued: {error}");
            }
        }
    }
}
