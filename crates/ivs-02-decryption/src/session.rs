//! # Decryption Session
//!
//! One submitted request awaiting its correlated notification.
//!
//! ```text
//! Idle ──submit──► Submitted ──register──► AwaitingNotification ──┬──► Resolved
//!   │                                                             ├──► TimedOut
//!   └──rejected──► SubmissionFailed                               └──► Cancelled
//! ```
//!
//! The handle is a single future per request: awaiting [`SessionHandle::outcome`]
//! races the registry delivery against the deadline, and whichever transition
//! the registry accepts first decides the outcome. Dropping an unfinished
//! handle cancels its registry entry, so no listener teardown is needed.

use crate::domain::outcome::DecryptionOutcome;
use crate::domain::registry::{Delivery, PendingTicket, RequestRegistry, RetiredReason};
use crate::domain::renderer::render;
use crate::error::SessionError;
use shared_types::entities::{DataKind, RequestId, UserId};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Submitted,
    AwaitingNotification,
    Resolved,
    TimedOut,
    SubmissionFailed,
    Cancelled,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Resolved | Self::TimedOut | Self::SubmissionFailed | Self::Cancelled
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Cancellable handle to an outstanding decryption request.
pub struct SessionHandle {
    request_id: RequestId,
    subject: UserId,
    kind: DataKind,
    registered_at: Instant,
    deadline: Instant,
    receiver: oneshot::Receiver<Delivery>,
    registry: Arc<RequestRegistry>,
    state: SessionState,
}

impl SessionHandle {
    pub(crate) fn new(ticket: PendingTicket, registry: Arc<RequestRegistry>) -> Self {
        Self {
            request_id: ticket.request_id,
            subject: ticket.subject,
            kind: ticket.kind,
            registered_at: ticket.registered_at,
            deadline: ticket.deadline,
            receiver: ticket.receiver,
            registry,
            state: SessionState::AwaitingNotification,
        }
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    pub fn subject(&self) -> UserId {
        self.subject
    }

    pub fn kind(&self) -> DataKind {
        self.kind
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Wait for the notification or the deadline.
    pub async fn outcome(mut self) -> DecryptionOutcome {
        let delivery = match timeout_at(self.deadline, &mut self.receiver).await {
            Ok(Ok(delivery)) => delivery,
            // Entry removed without delivery by the sweep or a registry cancel
            Ok(Err(_)) => return self.closed_without_delivery(),
            Err(_) => {
                if self.registry.expire(self.request_id) {
                    return self.timed_out();
                }
                // Another transition won; a resolved value is in flight
                match (&mut self.receiver).await {
                    Ok(delivery) => delivery,
                    Err(_) => return self.closed_without_delivery(),
                }
            }
        };
        self.finish(delivery)
    }

    /// Cancel the request.
    ///
    /// Returns `None` if the cancellation won. If a notification was accepted
    /// first, its outcome is returned instead.
    pub async fn cancel(mut self) -> Option<DecryptionOutcome> {
        if self.registry.cancel(self.request_id) {
            self.state = SessionState::Cancelled;
            info!(request_id = %self.request_id, "Decryption session cancelled");
            return None;
        }

        match (&mut self.receiver).await {
            Ok(delivery) => Some(self.finish(delivery)),
            Err(_) => {
                // Already expired by the sweep
                self.state = SessionState::Cancelled;
                None
            }
        }
    }

    fn finish(&mut self, delivery: Delivery) -> DecryptionOutcome {
        let raw_value = delivery.notification.raw_value;
        self.state = SessionState::Resolved;

        match render(raw_value, self.kind) {
            Ok(rendered) => {
                info!(
                    request_id = %self.request_id,
                    subject = %self.subject,
                    kind = %self.kind,
                    result = %rendered,
                    latency_ms = delivery.latency.as_millis(),
                    "Decryption session resolved"
                );
                DecryptionOutcome::Success {
                    raw_value,
                    rendered,
                }
            }
            Err(source) => {
                warn!(
                    request_id = %self.request_id,
                    raw_value,
                    error = %source,
                    "Decrypted value failed validation"
                );
                DecryptionOutcome::EngineError(SessionError::DataIntegrity {
                    request_id: self.request_id,
                    source,
                })
            }
        }
    }

    fn closed_without_delivery(&mut self) -> DecryptionOutcome {
        if self.registry.retired_reason(&self.request_id) != Some(RetiredReason::Cancelled) {
            return self.timed_out();
        }
        self.state = SessionState::Cancelled;
        info!(
            request_id = %self.request_id,
            subject = %self.subject,
            "Decryption request cancelled through the registry"
        );
        DecryptionOutcome::EngineError(SessionError::Cancelled(self.request_id))
    }

    fn timed_out(&mut self) -> DecryptionOutcome {
        self.state = SessionState::TimedOut;
        let waited = Instant::now().saturating_duration_since(self.registered_at);
        warn!(
            request_id = %self.request_id,
            subject = %self.subject,
            waited_ms = waited.as_millis(),
            "Decryption session timed out"
        );
        DecryptionOutcome::Timeout {
            request_id: self.request_id,
            waited,
        }
    }

    /// Time left before the deadline.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("request_id", &self.request_id)
            .field("subject", &self.subject)
            .field("kind", &self.kind)
            .field("state", &self.state)
            .finish()
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        if !self.state.is_terminal() && self.registry.cancel(self.request_id) {
            debug!(request_id = %self.request_id, "Released registry entry of dropped session");
        }
    }
}
