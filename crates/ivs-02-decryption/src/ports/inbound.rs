//! Driving Ports (API - Inbound)

use crate::domain::outcome::DecryptionOutcome;
use crate::domain::registry::PendingSummary;
use crate::error::{EngineResult, SessionResult};
use crate::session::SessionHandle;
use async_trait::async_trait;
use shared_types::entities::{DataKind, UserId};
use std::time::Duration;

/// Operations offered to operators and the CLI.
#[async_trait]
pub trait DecryptionApi: Send + Sync {
    /// Submit and wait for the terminal outcome.
    async fn request_and_await(&self, subject: UserId, kind: DataKind) -> DecryptionOutcome;

    /// Submit and return a cancellable handle with the default deadline.
    async fn submit(&self, subject: UserId, kind: DataKind) -> SessionResult<SessionHandle>;

    /// Submit with an explicit deadline.
    async fn submit_with_timeout(
        &self,
        subject: UserId,
        kind: DataKind,
        timeout: Duration,
    ) -> SessionResult<SessionHandle>;

    /// Decrypt `kind` for every registered subject concurrently.
    ///
    /// Fails only if the subject list itself cannot be read.
    async fn request_all(&self, kind: DataKind) -> EngineResult<Vec<(UserId, DecryptionOutcome)>>;

    /// Outstanding requests, for diagnostics.
    fn pending(&self) -> Vec<PendingSummary>;
}
