//! Decryption Service - session orchestration
//!
//! Submits to the engine, registers the returned id, and hands back a
//! session. Correlation itself happens in the separately owned
//! [`EventCorrelator`](crate::correlator::EventCorrelator), which must share
//! this service's registry.

use crate::config::DecryptionConfig;
use crate::domain::outcome::DecryptionOutcome;
use crate::domain::registry::{PendingSummary, RequestRegistry};
use crate::error::{EngineError, EngineResult, SessionResult};
use crate::ports::inbound::DecryptionApi;
use crate::ports::outbound::DecryptionEngine;
use crate::session::SessionHandle;
use async_trait::async_trait;
use futures::future::join_all;
use shared_types::entities::{DataKind, UserId};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub struct DecryptionService<E> {
    engine: Arc<E>,
    registry: Arc<RequestRegistry>,
    config: DecryptionConfig,
}

impl<E: DecryptionEngine> DecryptionService<E> {
    pub fn new(engine: Arc<E>, registry: Arc<RequestRegistry>, config: DecryptionConfig) -> Self {
        Self {
            engine,
            registry,
            config,
        }
    }

    /// Build with a fresh registry sized from `config`.
    pub fn from_config(engine: Arc<E>, config: DecryptionConfig) -> Self {
        let registry = Arc::new(
            RequestRegistry::new(config.deadline, config.unclaimed_ttl)
                .with_unclaimed_capacity(config.unclaimed_capacity),
        );
        Self::new(engine, registry, config)
    }

    pub fn registry(&self) -> Arc<RequestRegistry> {
        self.registry.clone()
    }

    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    pub fn config(&self) -> &DecryptionConfig {
        &self.config
    }

    async fn open(
        &self,
        subject: UserId,
        kind: DataKind,
        timeout: Duration,
    ) -> SessionResult<SessionHandle> {
        if self.config.preflight_ciphertext_check {
            let handle = self.engine.ciphertext_handle(subject, kind).await?;
            if handle.is_empty() {
                warn!(subject = %subject, kind = %kind, "Nothing to decrypt");
                return Err(EngineError::NothingToDecrypt { subject, kind }.into());
            }
        }

        let request_id = self
            .engine
            .submit_decryption_request(subject, kind)
            .await
            .map_err(|err| {
                warn!(subject = %subject, kind = %kind, error = %err, "Decryption request rejected");
                err
            })?;

        let ticket = self
            .registry
            .register(request_id, subject, kind, Some(timeout))?;

        info!(
            request_id = %request_id,
            subject = %subject,
            kind = %kind,
            timeout_secs = timeout.as_secs(),
            "Decryption request submitted"
        );

        Ok(SessionHandle::new(ticket, self.registry.clone()))
    }
}

#[async_trait]
impl<E: DecryptionEngine> DecryptionApi for DecryptionService<E> {
    async fn request_and_await(&self, subject: UserId, kind: DataKind) -> DecryptionOutcome {
        match self.submit(subject, kind).await {
            Ok(session) => session.outcome().await,
            Err(err) => DecryptionOutcome::EngineError(err),
        }
    }

    async fn submit(&self, subject: UserId, kind: DataKind) -> SessionResult<SessionHandle> {
        self.open(subject, kind, self.config.deadline).await
    }

    async fn submit_with_timeout(
        &self,
        subject: UserId,
        kind: DataKind,
        timeout: Duration,
    ) -> SessionResult<SessionHandle> {
        self.open(subject, kind, timeout).await
    }

    async fn request_all(&self, kind: DataKind) -> EngineResult<Vec<(UserId, DecryptionOutcome)>> {
        let mut subjects = self.engine.registered_subjects().await?;
        subjects.sort_unstable();
        subjects.dedup();

        info!(count = subjects.len(), kind = %kind, "Decrypting for all registered users");

        let outcomes = join_all(
            subjects
                .iter()
                .map(|subject| self.request_and_await(*subject, kind)),
        )
        .await;

        Ok(subjects.into_iter().zip(outcomes).collect())
    }

    fn pending(&self) -> Vec<PendingSummary> {
        self.registry.pending_snapshot()
    }
}
