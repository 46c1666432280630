//! Request Registry - single source of truth for outstanding decryptions.
//!
//! Maps request ids issued by the engine to the session awaiting them.
//!
//! Flow:
//! 1. Session submits to the engine and receives a `RequestId`
//! 2. Session calls `register()` and keeps the returned ticket's receiver
//! 3. Correlator receives a completion and calls `resolve()`
//! 4. Session awaits the receiver or calls `expire()` at its deadline
//!
//! Resolve, expire and cancel of one id are a single atomic transition on the
//! map entry: the first to remove it wins, every later attempt observes the
//! id as retired and does nothing.

use crate::domain::notification::CompletionNotification;
use crate::domain::time_cache::TimeBoundedCache;
use crate::error::{NotificationError, RegistryError};
use crate::metrics;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use shared_types::entities::{DataKind, RequestId, UserId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Notifications held for unknown ids before new ones are discarded.
pub const DEFAULT_UNCLAIMED_CAPACITY: usize = 10_000;

/// Payload handed to the waiting session.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub notification: CompletionNotification,
    /// Time between registration and resolution
    pub latency: Duration,
}

/// A request waiting for its notification
struct PendingRequest {
    subject: UserId,
    kind: DataKind,
    registered_at: Instant,
    deadline: Instant,
    sender: oneshot::Sender<Delivery>,
}

/// Receiving side of a registration.
#[derive(Debug)]
pub struct PendingTicket {
    pub request_id: RequestId,
    pub subject: UserId,
    pub kind: DataKind,
    pub registered_at: Instant,
    pub deadline: Instant,
    pub receiver: oneshot::Receiver<Delivery>,
}

/// How a request id left the pending set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetiredReason {
    Resolved,
    Expired,
    Cancelled,
}

/// Result of applying one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Pending entry completed and the session received the value
    Delivered,
    /// Pending entry completed but its session was already gone
    Abandoned,
    /// Notification does not answer the pending request; entry kept
    Mismatch(NotificationError),
    /// Id already left the pending set
    Duplicate(RetiredReason),
    /// Id not registered yet; held until registration or TTL
    Buffered,
    /// Id not registered yet and the unclaimed buffer is full
    Discarded,
}

impl Resolution {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// Diagnostics view of one outstanding request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSummary {
    pub request_id: RequestId,
    pub subject: UserId,
    pub kind: DataKind,
    pub age: Duration,
    pub remaining: Duration,
}

/// Statistics for the request registry
#[derive(Debug, Default)]
pub struct RegistryStats {
    /// Total requests registered
    pub total_registered: AtomicU64,
    /// Total requests resolved by a notification
    pub total_resolved: AtomicU64,
    /// Total requests expired
    pub total_timeouts: AtomicU64,
    /// Total requests cancelled, or resolved after their session was dropped
    pub total_cancelled: AtomicU64,
    /// Notifications for retired ids
    pub total_duplicates: AtomicU64,
    /// Notifications held for a later registration
    pub total_buffered: AtomicU64,
    /// Notifications that did not match their pending request
    pub total_mismatched: AtomicU64,
    /// Unknown-id notifications dropped because the buffer was full
    pub total_discarded: AtomicU64,
}

/// Plain copy of [`RegistryStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStatsSnapshot {
    pub registered: u64,
    pub resolved: u64,
    pub timeouts: u64,
    pub cancelled: u64,
    pub duplicates: u64,
    pub buffered: u64,
    pub mismatched: u64,
    pub discarded: u64,
}

impl RegistryStats {
    pub fn snapshot(&self) -> RegistryStatsSnapshot {
        RegistryStatsSnapshot {
            registered: self.total_registered.load(Ordering::Relaxed),
            resolved: self.total_resolved.load(Ordering::Relaxed),
            timeouts: self.total_timeouts.load(Ordering::Relaxed),
            cancelled: self.total_cancelled.load(Ordering::Relaxed),
            duplicates: self.total_duplicates.load(Ordering::Relaxed),
            buffered: self.total_buffered.load(Ordering::Relaxed),
            mismatched: self.total_mismatched.load(Ordering::Relaxed),
            discarded: self.total_discarded.load(Ordering::Relaxed),
        }
    }
}

/// Registry of outstanding decryption requests.
///
/// Lock order: `unclaimed`, then a map shard, then `retired`.
pub struct RequestRegistry {
    pending: DashMap<RequestId, PendingRequest>,
    /// Ids that left the pending set, kept for `retention`
    retired: Mutex<TimeBoundedCache<RequestId, RetiredReason>>,
    /// Notifications that arrived before their registration
    unclaimed: Mutex<TimeBoundedCache<RequestId, CompletionNotification>>,
    default_timeout: Duration,
    stats: Arc<RegistryStats>,
}

impl RequestRegistry {
    pub fn new(default_timeout: Duration, retention: Duration) -> Self {
        Self {
            pending: DashMap::new(),
            retired: Mutex::new(TimeBoundedCache::new(retention)),
            unclaimed: Mutex::new(
                TimeBoundedCache::new(retention).with_capacity(DEFAULT_UNCLAIMED_CAPACITY),
            ),
            default_timeout,
            stats: Arc::new(RegistryStats::default()),
        }
    }

    /// Limit how many unknown-id notifications are held at once.
    #[must_use]
    pub fn with_unclaimed_capacity(self, capacity: usize) -> Self {
        {
            let mut unclaimed = self.unclaimed.lock();
            let ttl = unclaimed.ttl();
            *unclaimed = TimeBoundedCache::new(ttl).with_capacity(capacity);
        }
        self
    }

    /// Register a request and get the receiver its notification will arrive on.
    ///
    /// A notification buffered for this id is delivered immediately if it
    /// matches the subject and kind.
    pub fn register(
        &self,
        request_id: RequestId,
        subject: UserId,
        kind: DataKind,
        timeout: Option<Duration>,
    ) -> Result<PendingTicket, RegistryError> {
        let timeout = timeout.unwrap_or(self.default_timeout);
        let registered_at = Instant::now();
        let deadline = registered_at + timeout;
        let (sender, receiver) = oneshot::channel();

        let mut unclaimed = self.unclaimed.lock();

        if self.pending.contains_key(&request_id) {
            return Err(RegistryError::AlreadyPending(request_id));
        }
        if self.retired.lock().contains(&request_id) {
            return Err(RegistryError::Retired(request_id));
        }

        self.stats.total_registered.fetch_add(1, Ordering::Relaxed);
        metrics::record_request_registered();

        let ticket = PendingTicket {
            request_id,
            subject,
            kind,
            registered_at,
            deadline,
            receiver,
        };

        if let Some(early) = unclaimed.take(&request_id) {
            match early.check(subject, kind) {
                Ok(()) => {
                    self.retired.lock().insert(request_id, RetiredReason::Resolved);
                    self.stats.total_resolved.fetch_add(1, Ordering::Relaxed);
                    metrics::record_request_resolved();
                    debug!(
                        request_id = %request_id,
                        subject = %subject,
                        "Claimed notification that arrived before registration"
                    );
                    // Receiver is in the ticket, so the send cannot fail
                    let _ = sender.send(Delivery {
                        notification: early,
                        latency: Duration::ZERO,
                    });
                    return Ok(ticket);
                }
                Err(err) => {
                    self.stats.total_mismatched.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        request_id = %request_id,
                        error = %err,
                        "Discarding early notification that does not match the request"
                    );
                }
            }
        }

        self.pending.insert(
            request_id,
            PendingRequest {
                subject,
                kind,
                registered_at,
                deadline,
                sender,
            },
        );
        metrics::set_pending_requests(self.pending.len());

        debug!(
            request_id = %request_id,
            subject = %subject,
            kind = %kind,
            timeout_ms = timeout.as_millis(),
            "Registered pending request"
        );

        Ok(ticket)
    }

    /// Apply a completion notification.
    pub fn try_resolve(&self, notification: CompletionNotification) -> Resolution {
        if let Some(resolution) = self.deliver(&notification) {
            return resolution;
        }

        // Slow path: serialize with `register` so an id cannot be buffered
        // after its registration has already looked for it.
        let mut unclaimed = self.unclaimed.lock();
        if let Some(resolution) = self.deliver(&notification) {
            return resolution;
        }

        let request_id = notification.request_id;
        let retired = self.retired.lock().get(&request_id).copied();
        if let Some(reason) = retired {
            self.stats.total_duplicates.fetch_add(1, Ordering::Relaxed);
            metrics::record_notification_duplicate();
            debug!(
                request_id = %request_id,
                reason = ?reason,
                "Ignoring notification for retired request"
            );
            return Resolution::Duplicate(reason);
        }

        match unclaimed.try_insert(request_id, notification) {
            Ok(Some(_)) => {
                self.stats.total_duplicates.fetch_add(1, Ordering::Relaxed);
                metrics::record_notification_duplicate();
            }
            Ok(None) => {
                self.stats.total_buffered.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                self.stats.total_discarded.fetch_add(1, Ordering::Relaxed);
                metrics::record_notification_discarded();
                warn!(
                    request_id = %request_id,
                    held = unclaimed.len(),
                    "Unclaimed notification buffer full, discarding notification"
                );
                return Resolution::Discarded;
            }
        }
        debug!(request_id = %request_id, "Buffered notification for unknown request");
        Resolution::Buffered
    }

    /// Complete a pending request.
    ///
    /// Returns true if the request was pending and this call completed it;
    /// false for unknown, retired, or mismatching notifications.
    pub fn resolve(&self, notification: CompletionNotification) -> bool {
        self.try_resolve(notification).is_delivered()
    }

    /// Expire a request whose deadline passed.
    ///
    /// Returns true if it was still pending.
    pub fn expire(&self, request_id: RequestId) -> bool {
        let Some(request) = self.retire(request_id, RetiredReason::Expired) else {
            return false;
        };
        self.stats.total_timeouts.fetch_add(1, Ordering::Relaxed);
        metrics::record_request_timeout();
        warn!(
            request_id = %request_id,
            subject = %request.subject,
            kind = %request.kind,
            elapsed_ms = request.registered_at.elapsed().as_millis(),
            "Decryption request expired without notification"
        );
        true
    }

    /// Cancel a pending request. Returns true if it was still pending.
    pub fn cancel(&self, request_id: RequestId) -> bool {
        if self.retire(request_id, RetiredReason::Cancelled).is_none() {
            return false;
        }
        self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
        metrics::record_request_cancelled();
        debug!(request_id = %request_id, "Cancelled pending request");
        true
    }

    /// Expire every request past its deadline. Returns how many were removed.
    pub fn remove_expired(&self) -> usize {
        let now = Instant::now();
        let overdue: Vec<RequestId> = self
            .pending
            .iter()
            .filter(|entry| entry.deadline <= now)
            .map(|entry| *entry.key())
            .collect();

        overdue.into_iter().filter(|id| self.expire(*id)).count()
    }

    /// Outstanding requests ordered by id.
    pub fn pending_snapshot(&self) -> Vec<PendingSummary> {
        let now = Instant::now();
        let mut summaries: Vec<PendingSummary> = self
            .pending
            .iter()
            .map(|entry| PendingSummary {
                request_id: *entry.key(),
                subject: entry.subject,
                kind: entry.kind,
                age: now.saturating_duration_since(entry.registered_at),
                remaining: entry.deadline.saturating_duration_since(now),
            })
            .collect();
        summaries.sort_by_key(|summary| summary.request_id);
        summaries
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, request_id: &RequestId) -> bool {
        self.pending.contains_key(request_id)
    }

    pub fn is_retired(&self, request_id: &RequestId) -> bool {
        self.retired.lock().contains(request_id)
    }

    /// Why `request_id` left the pending set, while it is still remembered.
    pub fn retired_reason(&self, request_id: &RequestId) -> Option<RetiredReason> {
        self.retired.lock().get(request_id).copied()
    }

    /// Notifications waiting for a registration.
    pub fn unclaimed_count(&self) -> usize {
        self.unclaimed.lock().len()
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    pub fn stats(&self) -> &RegistryStats {
        &self.stats
    }

    /// Complete the pending entry for `notification` if it matches.
    ///
    /// `None` when the id is not pending.
    fn deliver(&self, notification: &CompletionNotification) -> Option<Resolution> {
        let request_id = notification.request_id;
        let entry = match self.pending.entry(request_id) {
            Entry::Occupied(entry) => entry,
            Entry::Vacant(_) => return None,
        };

        if let Err(err) = notification.check(entry.get().subject, entry.get().kind) {
            self.stats.total_mismatched.fetch_add(1, Ordering::Relaxed);
            warn!(
                request_id = %request_id,
                error = %err,
                "Notification does not match pending request, keeping it pending"
            );
            return Some(Resolution::Mismatch(err));
        }

        self.retired.lock().insert(request_id, RetiredReason::Resolved);
        let request = entry.remove();
        metrics::set_pending_requests(self.pending.len());

        let latency = request.registered_at.elapsed();
        let delivery = Delivery {
            notification: notification.clone(),
            latency,
        };

        match request.sender.send(delivery) {
            Ok(()) => {
                self.stats.total_resolved.fetch_add(1, Ordering::Relaxed);
                metrics::record_request_resolved();
                debug!(
                    request_id = %request_id,
                    latency_ms = latency.as_millis(),
                    "Completed pending request"
                );
                Some(Resolution::Delivered)
            }
            Err(_) => {
                // Session dropped its receiver
                self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
                metrics::record_request_cancelled();
                debug!(request_id = %request_id, "Pending request receiver dropped");
                Some(Resolution::Abandoned)
            }
        }
    }

    /// Remove a pending entry and mark its id retired in one step.
    fn retire(&self, request_id: RequestId, reason: RetiredReason) -> Option<PendingRequest> {
        match self.pending.entry(request_id) {
            Entry::Occupied(entry) => {
                self.retired.lock().insert(request_id, reason);
                let request = entry.remove();
                metrics::set_pending_requests(self.pending.len());
                Some(request)
            }
            Entry::Vacant(_) => None,
        }
    }
}

/// Background task that expires overdue requests.
///
/// Covers fire-and-forget sessions that are never awaited.
pub async fn cleanup_task(registry: Arc<RequestRegistry>, interval: Duration) {
    let mut cleanup_interval = tokio::time::interval(interval);
    cleanup_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        cleanup_interval.tick().await;
        let removed = registry.remove_expired();
        if removed > 0 {
            debug!(removed = removed, "Expired overdue pending requests");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::ipc::DecryptionCompleted;

    fn registry() -> RequestRegistry {
        RequestRegistry::new(Duration::from_secs(30), Duration::from_secs(300))
    }

    fn notification(id: u64, subject: u32, kind: DataKind, raw: u64) -> CompletionNotification {
        DecryptionCompleted::new(RequestId::from_u64(id), UserId(subject), kind, raw)
            .try_into()
            .unwrap()
    }

    fn id(n: u64) -> RequestId {
        RequestId::from_u64(n)
    }

    #[tokio::test]
    async fn test_register_and_resolve() {
        let registry = registry();

        let ticket = registry.register(id(1), UserId(7), DataKind::Score, None).unwrap();
        assert!(registry.is_pending(&id(1)));
        assert_eq!(registry.pending_count(), 1);

        assert!(registry.resolve(notification(1, 7, DataKind::Score, 5000)));

        let delivery = ticket.receiver.await.unwrap();
        assert_eq!(delivery.notification.raw_value, 5000);
        assert_eq!(registry.pending_count(), 0);
        assert!(registry.is_retired(&id(1)));
    }

    #[tokio::test]
    async fn test_second_resolve_returns_false() {
        let registry = registry();
        let _ticket = registry.register(id(1), UserId(7), DataKind::Score, None).unwrap();

        assert!(registry.resolve(notification(1, 7, DataKind::Score, 5000)));
        assert_eq!(
            registry.try_resolve(notification(1, 7, DataKind::Score, 1)),
            Resolution::Duplicate(RetiredReason::Resolved)
        );
        assert!(!registry.resolve(notification(1, 7, DataKind::Score, 5000)));
        assert_eq!(registry.stats().snapshot().duplicates, 2);
    }

    #[tokio::test]
    async fn test_exactly_one_of_resolve_and_expire() {
        let registry = registry();

        let _a = registry.register(id(1), UserId(1), DataKind::Score, None).unwrap();
        assert!(registry.expire(id(1)));
        assert!(!registry.resolve(notification(1, 1, DataKind::Score, 10)));

        let _b = registry.register(id(2), UserId(1), DataKind::Score, None).unwrap();
        assert!(registry.resolve(notification(2, 1, DataKind::Score, 10)));
        assert!(!registry.expire(id(2)));
        assert!(!registry.cancel(id(2)));

        let stats = registry.stats().snapshot();
        assert_eq!(stats.resolved, 1);
        assert_eq!(stats.timeouts, 1);
        assert_eq!(stats.cancelled, 0);
    }

    #[tokio::test]
    async fn test_mismatch_keeps_entry_pending() {
        let registry = registry();
        let _ticket = registry
            .register(id(3), UserId(9), DataKind::HealthStatus, None)
            .unwrap();

        assert!(matches!(
            registry.try_resolve(notification(3, 9, DataKind::Score, 5000)),
            Resolution::Mismatch(NotificationError::KindMismatch { .. })
        ));
        assert!(matches!(
            registry.try_resolve(notification(3, 4, DataKind::HealthStatus, 1)),
            Resolution::Mismatch(NotificationError::SubjectMismatch { .. })
        ));
        assert!(registry.is_pending(&id(3)));

        assert!(registry.resolve(notification(3, 9, DataKind::HealthStatus, 1)));
    }

    #[tokio::test]
    async fn test_early_notification_claimed_on_register() {
        let registry = registry();

        assert_eq!(
            registry.try_resolve(notification(5, 2, DataKind::Score, 2500)),
            Resolution::Buffered
        );
        assert_eq!(registry.unclaimed_count(), 1);

        let ticket = registry.register(id(5), UserId(2), DataKind::Score, None).unwrap();
        assert!(!registry.is_pending(&id(5)));
        assert_eq!(registry.unclaimed_count(), 0);

        let delivery = ticket.receiver.await.unwrap();
        assert_eq!(delivery.notification.raw_value, 2500);
        assert_eq!(delivery.latency, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unclaimed_buffer_is_bounded() {
        let registry = registry().with_unclaimed_capacity(2);

        assert_eq!(
            registry.try_resolve(notification(1, 1, DataKind::Score, 1)),
            Resolution::Buffered
        );
        assert_eq!(
            registry.try_resolve(notification(2, 1, DataKind::Score, 1)),
            Resolution::Buffered
        );
        assert_eq!(
            registry.try_resolve(notification(3, 1, DataKind::Score, 1)),
            Resolution::Discarded
        );
        assert_eq!(registry.unclaimed_count(), 2);
        assert_eq!(registry.stats().snapshot().discarded, 1);

        // A discarded id registers normally and waits for a redelivery
        let _ticket = registry.register(id(3), UserId(1), DataKind::Score, None).unwrap();
        assert!(registry.is_pending(&id(3)));

        // Space frees up once buffered entries age out
        tokio::time::advance(Duration::from_secs(300)).await;
        assert_eq!(
            registry.try_resolve(notification(4, 1, DataKind::Score, 1)),
            Resolution::Buffered
        );
        assert_eq!(registry.unclaimed_count(), 1);
    }

    #[tokio::test]
    async fn test_mismatching_early_notification_discarded() {
        let registry = registry();
        registry.try_resolve(notification(6, 2, DataKind::HealthStatus, 1));

        let _ticket = registry.register(id(6), UserId(2), DataKind::Score, None).unwrap();
        assert!(registry.is_pending(&id(6)));
        assert_eq!(registry.stats().snapshot().mismatched, 1);
    }

    #[tokio::test]
    async fn test_request_ids_never_reused() {
        let registry = registry();
        let _ticket = registry.register(id(1), UserId(1), DataKind::Score, None).unwrap();

        assert_eq!(
            registry.register(id(1), UserId(1), DataKind::Score, None).unwrap_err(),
            RegistryError::AlreadyPending(id(1))
        );

        registry.cancel(id(1));
        assert_eq!(
            registry.register(id(1), UserId(1), DataKind::Score, None).unwrap_err(),
            RegistryError::Retired(id(1))
        );
    }

    #[tokio::test]
    async fn test_cancel() {
        let registry = registry();
        let ticket = registry.register(id(1), UserId(1), DataKind::Score, None).unwrap();

        assert!(registry.cancel(id(1)));
        assert!(!registry.cancel(id(1)));
        // Sender dropped with the entry
        assert!(ticket.receiver.await.is_err());
        assert_eq!(
            registry.try_resolve(notification(1, 1, DataKind::Score, 1)),
            Resolution::Duplicate(RetiredReason::Cancelled)
        );
    }

    #[tokio::test]
    async fn test_dropped_receiver_reports_abandoned() {
        let registry = registry();
        let ticket = registry.register(id(1), UserId(1), DataKind::Score, None).unwrap();
        drop(ticket);

        assert_eq!(
            registry.try_resolve(notification(1, 1, DataKind::Score, 1)),
            Resolution::Abandoned
        );
        assert_eq!(registry.stats().snapshot().cancelled, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_expired() {
        let registry = registry();

        let _a = registry
            .register(id(1), UserId(1), DataKind::Score, Some(Duration::from_secs(1)))
            .unwrap();
        let _b = registry
            .register(id(2), UserId(2), DataKind::Score, Some(Duration::from_secs(10)))
            .unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;

        assert_eq!(registry.remove_expired(), 1);
        assert!(!registry.is_pending(&id(1)));
        assert!(registry.is_pending(&id(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_snapshot() {
        let registry = registry();
        let _b = registry
            .register(id(2), UserId(9), DataKind::HealthStatus, Some(Duration::from_secs(10)))
            .unwrap();
        let _a = registry
            .register(id(1), UserId(7), DataKind::Score, Some(Duration::from_secs(10)))
            .unwrap();

        tokio::time::advance(Duration::from_secs(4)).await;

        let snapshot = registry.pending_snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].request_id, id(1));
        assert_eq!(snapshot[0].age, Duration::from_secs(4));
        assert_eq!(snapshot[0].remaining, Duration::from_secs(6));
        assert_eq!(snapshot[1].kind, DataKind::HealthStatus);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_task_expires_entries() {
        let registry = Arc::new(registry());
        let ticket = registry
            .register(id(1), UserId(1), DataKind::Score, Some(Duration::from_secs(1)))
            .unwrap();

        let sweeper = tokio::spawn(cleanup_task(registry.clone(), Duration::from_millis(500)));

        // Sender dropped by the sweep
        assert!(ticket.receiver.await.is_err());
        assert!(registry.is_retired(&id(1)));
        assert_eq!(registry.stats().snapshot().timeouts, 1);

        sweeper.abort();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_resolve_and_expire_single_winner() {
        for n in 0..200u64 {
            let registry = Arc::new(registry());
            let _ticket = registry.register(id(n), UserId(1), DataKind::Score, None).unwrap();

            let resolver = {
                let registry = registry.clone();
                tokio::spawn(async move { registry.resolve(notification(n, 1, DataKind::Score, 1)) })
            };
            let expirer = {
                let registry = registry.clone();
                tokio::spawn(async move { registry.expire(id(n)) })
            };

            let resolved = resolver.await.unwrap();
            let expired = expirer.await.unwrap();
            assert!(resolved ^ expired, "exactly one transition must win");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_cancel_and_resolve_single_winner() {
        for n in 0..200u64 {
            let registry = Arc::new(registry());
            let _ticket = registry.register(id(n), UserId(1), DataKind::Score, None).unwrap();
            let start = Arc::new(tokio::sync::Barrier::new(2));

            let resolver = {
                let registry = registry.clone();
                let start = start.clone();
                tokio::spawn(async move {
                    start.wait().await;
                    registry.resolve(notification(n, 1, DataKind::Score, 1))
                })
            };
            let canceller = {
                let registry = registry.clone();
                let start = start.clone();
                tokio::spawn(async move {
                    start.wait().await;
                    registry.cancel(id(n))
                })
            };

            let resolved = resolver.await.unwrap();
            let cancelled = canceller.await.unwrap();
            assert!(cancelled ^ resolved, "exactly one transition must win");

            let expected = if resolved {
                RetiredReason::Resolved
            } else {
                RetiredReason::Cancelled
            };
            assert_eq!(registry.retired_reason(&id(n)), Some(expected));
            assert_eq!(registry.pending_count(), 0);
        }
    }
}
