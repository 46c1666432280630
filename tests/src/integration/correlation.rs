//! # Correlation Scenarios
//!
//! Sessions opened through `DecryptionService`, completions injected by the
//! test in any order and at any time through the correlator's source.
//!
//! ```text
//! test ──submit──→ DecryptionService ──→ ManualEngine (numbers requests only)
//! test ──send────→ mpsc ──→ EventCorrelator ──→ RequestRegistry ──→ SessionHandle
//! ```

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use ivs_02_decryption::{
        CompletionNotification, CorrelatorHandle, DecryptionApi, DecryptionConfig,
        DecryptionEngine, DecryptionService, EngineResult, EventCorrelator, RenderedResult,
        RetiredReason, RiskTier, SessionError,
    };
    use parking_lot::Mutex;
    use shared_types::entities::{
        CiphertextHandle, DataKind, HealthStatus, RequestId, UserId, H256,
    };
    use shared_types::ipc::DecryptionCompleted;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::Instant;
    use tokio_stream::wrappers::UnboundedReceiverStream;

    // =========================================================================
    // FIXTURES
    // =========================================================================

    /// Engine that only hands out sequential request ids.
    #[derive(Default)]
    struct ManualEngine {
        last_id: Mutex<u64>,
    }

    #[async_trait]
    impl DecryptionEngine for ManualEngine {
        async fn submit_decryption_request(
            &self,
            _subject: UserId,
            _kind: DataKind,
        ) -> EngineResult<RequestId> {
            let mut last = self.last_id.lock();
            *last += 1;
            Ok(RequestId::from_u64(*last))
        }

        async fn registered_subjects(&self) -> EngineResult<Vec<UserId>> {
            Ok(Vec::new())
        }

        async fn ciphertext_handle(
            &self,
            subject: UserId,
            _kind: DataKind,
        ) -> EngineResult<CiphertextHandle> {
            Ok(CiphertextHandle(H256::from_low_u64_be(u64::from(subject.get()))))
        }
    }

    struct Harness {
        service: DecryptionService<ManualEngine>,
        relayer: mpsc::UnboundedSender<DecryptionCompleted>,
        correlator: CorrelatorHandle,
    }

    fn harness() -> Harness {
        let service = DecryptionService::from_config(
            Arc::new(ManualEngine::default()),
            DecryptionConfig::default(),
        );
        let (relayer, rx) = mpsc::unbounded_channel();
        let correlator =
            EventCorrelator::new(service.registry(), UnboundedReceiverStream::new(rx)).start();
        Harness {
            service,
            relayer,
            correlator,
        }
    }

    /// Yield long enough for the correlator to drain its source.
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    // =========================================================================
    // ORDERING
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_sessions_resolve_regardless_of_delivery_order() {
        let h = harness();

        let a = h.service.submit(UserId(7), DataKind::Score).await.unwrap();
        let b = h
            .service
            .submit(UserId(9), DataKind::HealthStatus)
            .await
            .unwrap();
        let (a_id, b_id) = (a.request_id(), b.request_id());
        assert_ne!(a_id, b_id);

        let a_task = tokio::spawn(a.outcome());
        let b_task = tokio::spawn(b.outcome());

        // B first, then A
        h.relayer
            .send(DecryptionCompleted::new(
                b_id,
                UserId(9),
                DataKind::HealthStatus,
                1,
            ))
            .unwrap();
        h.relayer
            .send(DecryptionCompleted::new(a_id, UserId(7), DataKind::Score, 2500))
            .unwrap();

        let b_outcome = b_task.await.unwrap();
        let a_outcome = a_task.await.unwrap();

        assert_eq!(
            b_outcome.rendered().and_then(RenderedResult::health),
            Some(HealthStatus::Infected)
        );
        assert_eq!(a_outcome.raw_value(), Some(2500));
        assert_eq!(a_outcome.risk_tier(), Some(RiskTier::Medium));

        let snapshot = h.correlator.stop().await.unwrap();
        assert_eq!(snapshot.delivered, 2);
        assert_eq!(snapshot.mismatched, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_notification_before_registration_is_claimed() {
        let h = harness();

        // The manual engine will issue id 1 for the next submission
        h.relayer
            .send(DecryptionCompleted::new(
                RequestId::from_u64(1),
                UserId(4),
                DataKind::Score,
                1250,
            ))
            .unwrap();
        settle().await;
        assert_eq!(h.service.registry().unclaimed_count(), 1);

        let started = Instant::now();
        let outcome = h.service.request_and_await(UserId(4), DataKind::Score).await;
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(outcome.to_string(), "0.125 (LOW)");

        let snapshot = h.correlator.stop().await.unwrap();
        assert_eq!(snapshot.buffered, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mismatched_notification_keeps_request_pending() {
        let h = harness();
        let session = h.service.submit(UserId(5), DataKind::Score).await.unwrap();
        let id = session.request_id();
        let task = tokio::spawn(session.outcome());

        h.relayer
            .send(DecryptionCompleted::new(id, UserId(6), DataKind::Score, 5000))
            .unwrap();
        settle().await;
        assert_eq!(h.service.pending().len(), 1);

        h.relayer
            .send(DecryptionCompleted::new(id, UserId(5), DataKind::Score, 5000))
            .unwrap();
        assert_eq!(task.await.unwrap().risk_tier(), Some(RiskTier::High));

        let snapshot = h.correlator.stop().await.unwrap();
        assert_eq!(snapshot.mismatched, 1);
        assert_eq!(snapshot.delivered, 1);
    }

    // =========================================================================
    // DEADLINES
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_deadline_yields_timeout_and_late_notification_is_ignored() {
        let h = harness();

        let session = h
            .service
            .submit_with_timeout(UserId(3), DataKind::Score, Duration::from_secs(1))
            .await
            .unwrap();
        let id = session.request_id();
        let started = Instant::now();

        let outcome = session.outcome().await;
        let waited = started.elapsed();
        assert!(outcome.is_timeout());
        assert!(waited >= Duration::from_secs(1) && waited < Duration::from_secs(2));

        tokio::time::sleep_until(started + Duration::from_secs(2)).await;
        h.relayer
            .send(DecryptionCompleted::new(id, UserId(3), DataKind::Score, 5000))
            .unwrap();
        settle().await;

        // Still a timeout, and the late value was recognised as stale
        assert!(outcome.is_timeout());
        assert!(h.service.pending().is_empty());
        assert!(h.service.registry().is_retired(&id));
        assert_eq!(h.service.registry().unclaimed_count(), 0);

        let snapshot = h.correlator.stop().await.unwrap();
        assert_eq!(snapshot.duplicates, 1);
        assert_eq!(snapshot.delivered, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_session_releases_its_entry() {
        let h = harness();
        let session = h
            .service
            .submit(UserId(2), DataKind::HealthStatus)
            .await
            .unwrap();
        let id = session.request_id();
        assert_eq!(h.service.pending().len(), 1);

        drop(session);
        assert!(h.service.pending().is_empty());

        h.relayer
            .send(DecryptionCompleted::new(
                id,
                UserId(2),
                DataKind::HealthStatus,
                0,
            ))
            .unwrap();
        settle().await;

        let snapshot = h.correlator.stop().await.unwrap();
        assert_eq!(snapshot.duplicates, 1);
    }

    // =========================================================================
    // IDEMPOTENCE AND INTEGRITY
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_second_resolve_is_rejected() {
        let h = harness();
        let session = h.service.submit(UserId(8), DataKind::Score).await.unwrap();
        let id = session.request_id();
        let registry = h.service.registry();

        let notification: CompletionNotification =
            DecryptionCompleted::new(id, UserId(8), DataKind::Score, 625)
                .try_into()
                .unwrap();
        assert!(registry.resolve(notification.clone()));
        assert!(!registry.resolve(notification));

        assert_eq!(session.outcome().await.raw_value(), Some(625));
        h.correlator.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_out_of_range_value_is_data_integrity_error() {
        let h = harness();
        let session = h
            .service
            .submit(UserId(1), DataKind::HealthStatus)
            .await
            .unwrap();
        let id = session.request_id();
        h.relayer
            .send(DecryptionCompleted::new(
                id,
                UserId(1),
                DataKind::HealthStatus,
                2,
            ))
            .unwrap();

        let outcome = session.outcome().await;
        assert!(matches!(
            outcome,
            ivs_02_decryption::DecryptionOutcome::EngineError(SessionError::DataIntegrity {
                request_id,
                ..
            }) if request_id == id
        ));
        assert!(!outcome.is_timeout());
        assert_eq!(h.correlator.stop().await.unwrap().malformed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolved_id_cannot_be_registered_again() {
        let h = harness();
        let session = h.service.submit(UserId(8), DataKind::Score).await.unwrap();
        let id = session.request_id();
        h.relayer
            .send(DecryptionCompleted::new(id, UserId(8), DataKind::Score, 0))
            .unwrap();
        assert!(session.outcome().await.is_success());

        let registry = h.service.registry();
        assert!(registry
            .register(id, UserId(8), DataKind::Score, None)
            .is_err());
        assert!(registry.is_retired(&id));

        // Duplicate delivery of a resolved id reports why it was retired
        let correlator = EventCorrelator::new(
            registry.clone(),
            futures::stream::empty::<DecryptionCompleted>(),
        );
        assert_eq!(
            correlator.handle(DecryptionCompleted::new(id, UserId(8), DataKind::Score, 0)),
            Some(ivs_02_decryption::Resolution::Duplicate(
                RetiredReason::Resolved
            ))
        );
        h.correlator.stop().await.unwrap();
    }
}
