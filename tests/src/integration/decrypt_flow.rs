//! # Full Protocol Flow
//!
//! The runtime's wiring end to end: simulated ledger and relayer, shared bus,
//! correlator, expiry sweep and decryption service.
//!
//! Reference scenario: contacts {1-2, 1-3, 2-4, 3-5}, user 1 infected.

#[cfg(test)]
mod tests {
    use ivs_01_score_model::{ScoreParams, SelfScorePolicy};
    use ivs_02_decryption::{
        DecryptionApi, DecryptionOutcome, DecryptionService, EngineError, RiskTier, SessionError,
    };
    use ivs_runtime::{Relay, RuntimeConfig};
    use shared_bus::{EventFilter, EventTopic, IvsEvent};
    use shared_types::entities::{DataKind, HealthStatus, UserId};
    use std::sync::Arc;
    use std::time::Duration;

    fn zero_policy() -> ScoreParams {
        ScoreParams::new(2, SelfScorePolicy::Zero)
    }

    async fn seeded(config: RuntimeConfig) -> Relay {
        let relay = Relay::start(&config);
        relay.seed_reference(zero_policy()).await.unwrap();
        relay
    }

    #[tokio::test(start_paused = true)]
    async fn test_decrypt_all_scores_over_the_bus() {
        let relay = seeded(RuntimeConfig::default()).await;

        let results = relay
            .service()
            .request_all(DataKind::Score)
            .await
            .unwrap();

        let raw: Vec<(UserId, Option<u64>)> = results
            .iter()
            .map(|(user, outcome)| (*user, outcome.raw_value()))
            .collect();
        assert_eq!(
            raw,
            vec![
                (UserId(1), Some(0)),
                (UserId(2), Some(5000)),
                (UserId(3), Some(5000)),
                (UserId(4), Some(2500)),
                (UserId(5), Some(2500)),
            ]
        );
        assert_eq!(results[1].1.risk_tier(), Some(RiskTier::High));
        assert_eq!(results[3].1.risk_tier(), Some(RiskTier::Medium));

        assert!(relay.service().pending().is_empty());
        let snapshot = relay.shutdown().await.unwrap();
        assert_eq!(snapshot.delivered, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_decrypt_health_flags() {
        let relay = seeded(RuntimeConfig::default()).await;

        let results = relay
            .service()
            .request_all(DataKind::HealthStatus)
            .await
            .unwrap();
        let infected: Vec<UserId> = results
            .iter()
            .filter(|(_, outcome)| {
                outcome
                    .rendered()
                    .and_then(|rendered| rendered.health())
                    == Some(HealthStatus::Infected)
            })
            .map(|(user, _)| *user)
            .collect();
        assert_eq!(infected, vec![UserId(1)]);
        assert!(results.iter().all(|(_, outcome)| outcome.is_success()));

        relay.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_request_is_announced_with_a_fresh_id() {
        let relay = seeded(RuntimeConfig::default()).await;
        let mut announcements = relay
            .bus()
            .subscribe(EventFilter::topics(vec![EventTopic::Decryption]));

        let outcome = relay
            .service()
            .request_and_await(UserId(2), DataKind::Score)
            .await;
        assert!(outcome.is_success());
        let again = relay
            .service()
            .request_and_await(UserId(2), DataKind::Score)
            .await;
        assert!(again.is_success());

        let mut requested = Vec::new();
        let mut completed = Vec::new();
        while let Ok(Some(event)) = announcements.try_recv() {
            match event {
                IvsEvent::DecryptionRequested(record) => requested.push(record.request_id),
                IvsEvent::DecryptionCompleted(record) => completed.push(record.request_id),
                _ => {}
            }
        }
        assert_eq!(requested.len(), 2);
        assert_ne!(requested[0], requested[1]);
        assert_eq!(requested, completed);

        relay.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_deliveries_resolve_once() {
        let mut config = RuntimeConfig::default();
        config.engine.duplicate_deliveries = true;
        let relay = seeded(config).await;

        let results = relay
            .service()
            .request_all(DataKind::HealthStatus)
            .await
            .unwrap();
        assert!(results.iter().all(|(_, outcome)| outcome.is_success()));

        // Let the second copies drain
        tokio::time::sleep(Duration::from_secs(1)).await;
        let snapshot = relay.shutdown().await.unwrap();
        assert_eq!(snapshot.delivered, 5);
        assert_eq!(snapshot.duplicates, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_notifications_time_out() {
        let mut config = RuntimeConfig::default();
        config.engine.drop_notifications = true;
        config.decryption.deadline = Duration::from_secs(1);
        let relay = seeded(config).await;

        let results = relay
            .service()
            .request_all(DataKind::Score)
            .await
            .unwrap();
        assert_eq!(results.len(), 5);
        for (user, outcome) in &results {
            assert!(
                matches!(outcome, DecryptionOutcome::Timeout { waited, .. } if *waited >= Duration::from_secs(1)),
                "user {user}: {outcome}"
            );
        }

        assert!(relay.service().pending().is_empty());
        assert_eq!(relay.service().registry().stats().snapshot().timeouts, 5);
        relay.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_admin_is_rejected_not_timed_out() {
        let config = RuntimeConfig::default();
        let relay = seeded(config.clone()).await;

        let bob = DecryptionService::new(
            Arc::new(relay.engine().connect("0xbob")),
            relay.service().registry(),
            config.decryption,
        );
        let outcome = bob.request_and_await(UserId(2), DataKind::Score).await;
        assert_eq!(
            outcome,
            DecryptionOutcome::EngineError(SessionError::SubmissionRejected(
                EngineError::Unauthorized {
                    caller: "0xbob".to_string()
                }
            ))
        );
        assert!(bob.pending().is_empty());

        relay.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_subject_is_engine_error() {
        let relay = seeded(RuntimeConfig::default()).await;

        let outcome = relay
            .service()
            .request_and_await(UserId(42), DataKind::HealthStatus)
            .await;
        assert_eq!(
            outcome,
            DecryptionOutcome::EngineError(SessionError::SubmissionRejected(
                EngineError::UnknownSubject(UserId(42))
            ))
        );

        relay.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_scores_must_be_computed_before_decryption() {
        let relay = Relay::start(&RuntimeConfig::default());
        relay.engine().register_user(UserId(1)).await.unwrap();

        let outcome = relay
            .service()
            .request_and_await(UserId(1), DataKind::Score)
            .await;
        assert_eq!(
            outcome,
            DecryptionOutcome::EngineError(SessionError::SubmissionRejected(
                EngineError::NothingToDecrypt {
                    subject: UserId(1),
                    kind: DataKind::Score,
                }
            ))
        );

        relay.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_excluded_policy_leaves_infected_user_without_score() {
        let relay = Relay::start(&RuntimeConfig::default());
        let sheet = relay
            .seed_reference(ScoreParams::new(2, SelfScorePolicy::Excluded))
            .await
            .unwrap();
        assert_eq!(sheet.len(), 4);

        let outcome = relay
            .service()
            .request_and_await(UserId(1), DataKind::Score)
            .await;
        assert!(matches!(
            outcome,
            DecryptionOutcome::EngineError(SessionError::SubmissionRejected(
                EngineError::NothingToDecrypt { .. }
            ))
        ));

        relay.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_config_publishes_no_score_for_infected_user() {
        let config = RuntimeConfig::default();
        let relay = Relay::start(&config);
        let sheet = relay
            .seed_reference(config.score.params().unwrap())
            .await
            .unwrap();
        assert_eq!(sheet.get(UserId(1)), None);

        let infected = relay
            .service()
            .request_and_await(UserId(1), DataKind::Score)
            .await;
        assert_eq!(
            infected,
            DecryptionOutcome::EngineError(SessionError::SubmissionRejected(
                EngineError::NothingToDecrypt {
                    subject: UserId(1),
                    kind: DataKind::Score,
                }
            ))
        );

        let neighbour = relay
            .service()
            .request_and_await(UserId(2), DataKind::Score)
            .await;
        assert_eq!(neighbour.risk_tier(), Some(RiskTier::High));

        relay.shutdown().await.unwrap();
    }
}
