//! # Event Correlator
//!
//! Long-lived subscriber that matches relayer completions to pending
//! requests.
//!
//! The notification source is injected at construction, so tests can feed a
//! finite ordered sequence while the runtime feeds the bus subscription.
//! Every notification is handled independently: unknown tags, mismatches and
//! duplicates are logged and counted, and processing continues.

use crate::domain::notification::CompletionNotification;
use crate::domain::registry::{RequestRegistry, Resolution};
use crate::domain::renderer::render;
use crate::error::CorrelatorError;
use crate::metrics;
use futures::{Stream, StreamExt};
use shared_types::ipc::DecryptionCompleted;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Counters for notifications seen by the correlator
#[derive(Debug, Default)]
pub struct CorrelatorStats {
    pub received: AtomicU64,
    pub delivered: AtomicU64,
    pub duplicates: AtomicU64,
    pub buffered: AtomicU64,
    pub discarded: AtomicU64,
    pub malformed: AtomicU64,
    pub mismatched: AtomicU64,
    pub abandoned: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CorrelatorSnapshot {
    pub received: u64,
    pub delivered: u64,
    pub duplicates: u64,
    pub buffered: u64,
    pub discarded: u64,
    pub malformed: u64,
    pub mismatched: u64,
    pub abandoned: u64,
}

impl CorrelatorStats {
    pub fn snapshot(&self) -> CorrelatorSnapshot {
        CorrelatorSnapshot {
            received: self.received.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            buffered: self.buffered.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            mismatched: self.mismatched.load(Ordering::Relaxed),
            abandoned: self.abandoned.load(Ordering::Relaxed),
        }
    }
}

pub struct EventCorrelator<S> {
    registry: Arc<RequestRegistry>,
    source: S,
    stats: Arc<CorrelatorStats>,
}

impl<S> EventCorrelator<S>
where
    S: Stream<Item = DecryptionCompleted> + Send + Unpin + 'static,
{
    pub fn new(registry: Arc<RequestRegistry>, source: S) -> Self {
        Self {
            registry,
            source,
            stats: Arc::new(CorrelatorStats::default()),
        }
    }

    /// Shared counters, readable while the correlator runs.
    pub fn stats(&self) -> Arc<CorrelatorStats> {
        self.stats.clone()
    }

    /// Spawn the correlator on the current runtime.
    pub fn start(self) -> CorrelatorHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let stats = self.stats.clone();
        let join = tokio::spawn(self.run(shutdown_rx));
        info!("Event correlator started");
        CorrelatorHandle {
            shutdown_tx,
            join,
            stats,
        }
    }

    /// Process notifications until the source ends or shutdown is signalled.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> CorrelatorSnapshot {
        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Event correlator shutting down");
                        break;
                    }
                }
                next = self.source.next() => match next {
                    Some(record) => {
                        self.handle(record);
                    }
                    None => {
                        info!("Notification stream ended, stopping correlator");
                        break;
                    }
                },
            }
        }
        self.stats.snapshot()
    }

    /// Apply a single notification to the registry.
    pub fn handle(&self, record: DecryptionCompleted) -> Option<Resolution> {
        self.stats.received.fetch_add(1, Ordering::Relaxed);

        let notification = match CompletionNotification::try_from(record) {
            Ok(notification) => notification,
            Err(err) => {
                self.stats.malformed.fetch_add(1, Ordering::Relaxed);
                metrics::record_notification_malformed();
                warn!(error = %err, "Dropping malformed notification");
                return None;
            }
        };

        // Delivered anyway: the session reports it as a data-integrity error
        if let Err(err) = render(notification.raw_value, notification.kind) {
            self.stats.malformed.fetch_add(1, Ordering::Relaxed);
            metrics::record_notification_malformed();
            warn!(
                request_id = %notification.request_id,
                error = %err,
                "Notification carries an out-of-range value"
            );
        }

        let request_id = notification.request_id;
        let resolution = self.registry.try_resolve(notification);
        let counter = match &resolution {
            Resolution::Delivered => &self.stats.delivered,
            Resolution::Abandoned => &self.stats.abandoned,
            Resolution::Mismatch(_) => &self.stats.mismatched,
            Resolution::Duplicate(_) => &self.stats.duplicates,
            Resolution::Buffered => &self.stats.buffered,
            Resolution::Discarded => &self.stats.discarded,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        debug!(request_id = %request_id, resolution = ?resolution, "Notification handled");

        Some(resolution)
    }
}

/// Owner of a running correlator. Dropping it also stops the task.
pub struct CorrelatorHandle {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<CorrelatorSnapshot>,
    stats: Arc<CorrelatorStats>,
}

impl CorrelatorHandle {
    /// Signal shutdown and wait for the task to finish.
    pub async fn stop(self) -> Result<CorrelatorSnapshot, CorrelatorError> {
        // Err only if the task already exited and dropped its receiver
        let _ = self.shutdown_tx.send(true);
        Ok(self.join.await?)
    }

    /// Wait for the source to end without signalling shutdown.
    pub async fn join(self) -> Result<CorrelatorSnapshot, CorrelatorError> {
        let Self {
            shutdown_tx, join, ..
        } = self;
        let snapshot = join.await?;
        drop(shutdown_tx);
        Ok(snapshot)
    }

    pub fn stats(&self) -> CorrelatorSnapshot {
        self.stats.snapshot()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}
