//! # Simulated Engine
//!
//! In-process stand-in for the IVS ledger and its decryption relayer.
//!
//! Holds the plaintext graph and health flags, computes scores with the
//! reference model, and answers decryption requests asynchronously: the
//! request is acknowledged with a fresh id and a `DecryptionCompleted` event
//! follows on the bus after a random latency. Fault injection can duplicate
//! or drop those events.

use crate::error::{EngineError, EngineResult};
use crate::ports::outbound::DecryptionEngine;
use async_trait::async_trait;
use ivs_01_score_model::{compute_scores, ContactGraph, InfectionSet, ScoreParams, ScoreSheet};
use parking_lot::Mutex;
use rand::Rng;
use shared_bus::{EventPublisher, InMemoryEventBus, IvsEvent};
use shared_types::entities::{
    CiphertextHandle, DataKind, HealthStatus, RequestId, UserId, H256,
};
use shared_types::ipc::{DecryptionCompleted, DecryptionRequested};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedEngineConfig {
    /// Account allowed to compute scores and request decryption
    pub admin: String,
    pub min_latency: Duration,
    pub max_latency: Duration,
    /// Publish every completion twice
    pub duplicate_deliveries: bool,
    /// Never publish completions
    pub drop_notifications: bool,
}

impl Default for SimulatedEngineConfig {
    fn default() -> Self {
        Self {
            admin: "0xadmin".to_string(),
            min_latency: Duration::from_millis(50),
            max_latency: Duration::from_millis(250),
            duplicate_deliveries: false,
            drop_notifications: false,
        }
    }
}

#[derive(Default)]
struct Ledger {
    graph: ContactGraph,
    infected: InfectionSet,
    /// Users with a written health flag
    health_written: BTreeSet<UserId>,
    scores: Option<ScoreSheet>,
    next_request_id: u64,
    in_flight: HashSet<(UserId, DataKind)>,
}

impl Ledger {
    fn stored_value(&self, subject: UserId, kind: DataKind) -> Option<u64> {
        match kind {
            DataKind::Score => self
                .scores
                .as_ref()
                .and_then(|sheet| sheet.get(subject))
                .map(|score| u64::from(score.raw())),
            DataKind::HealthStatus => self
                .health_written
                .contains(&subject)
                .then(|| self.infected.status(subject).as_raw()),
        }
    }
}

/// Simulated ledger plus relayer. Clones made with [`connect`](Self::connect)
/// share state and differ only in the calling account.
#[derive(Clone)]
pub struct SimulatedEngine {
    config: Arc<SimulatedEngineConfig>,
    caller: String,
    ledger: Arc<Mutex<Ledger>>,
    bus: Arc<InMemoryEventBus>,
}

impl SimulatedEngine {
    /// Create an engine connected as the admin account.
    pub fn new(bus: Arc<InMemoryEventBus>, config: SimulatedEngineConfig) -> Self {
        Self {
            caller: config.admin.clone(),
            config: Arc::new(config),
            ledger: Arc::new(Mutex::new(Ledger::default())),
            bus,
        }
    }

    /// Same ledger, different calling account.
    pub fn connect(&self, caller: impl Into<String>) -> Self {
        Self {
            caller: caller.into(),
            ..self.clone()
        }
    }

    pub fn caller(&self) -> &str {
        &self.caller
    }

    pub fn config(&self) -> &SimulatedEngineConfig {
        &self.config
    }

    pub async fn register_user(&self, user: UserId) -> EngineResult<()> {
        self.ledger.lock().graph.register_user(user)?;
        self.bus
            .publish(IvsEvent::UserRegistered { user_id: user })
            .await;
        Ok(())
    }

    /// Returns `false` if the contact already existed.
    pub async fn add_contact(&self, a: UserId, b: UserId) -> EngineResult<bool> {
        let added = self.ledger.lock().graph.add_contact(a, b)?;
        if added {
            self.bus
                .publish(IvsEvent::ContactAdded {
                    user_a: a,
                    user_b: b,
                })
                .await;
        }
        Ok(added)
    }

    pub async fn set_health_status(&self, user: UserId, status: HealthStatus) -> EngineResult<()> {
        {
            let mut ledger = self.ledger.lock();
            if !ledger.graph.contains(user) {
                return Err(EngineError::UnknownSubject(user));
            }
            ledger.infected.set_status(user, status);
            ledger.health_written.insert(user);
        }
        self.bus
            .publish(IvsEvent::HealthStatusSet { user_id: user })
            .await;
        Ok(())
    }

    /// Recompute every score from scratch. Admin only.
    pub async fn compute_scores(&self, params: ScoreParams) -> EngineResult<ScoreSheet> {
        self.require_admin()?;

        let sheet = {
            let mut ledger = self.ledger.lock();
            let sheet = compute_scores(&ledger.graph, &ledger.infected, params)?;
            ledger.scores = Some(sheet.clone());
            sheet
        };

        info!(
            d_max = params.d_max,
            users = sheet.len(),
            "Computed IVS scores"
        );
        self.bus
            .publish(IvsEvent::ScoresComputed {
                d_max: params.d_max,
                users: sheet.len(),
            })
            .await;
        Ok(sheet)
    }

    fn require_admin(&self) -> EngineResult<()> {
        if self.caller == self.config.admin {
            Ok(())
        } else {
            Err(EngineError::Unauthorized {
                caller: self.caller.clone(),
            })
        }
    }

    fn sample_latency(&self) -> Duration {
        let min = self.config.min_latency;
        let max = self.config.max_latency.max(min);
        if min == max {
            return min;
        }
        rand::thread_rng().gen_range(min..=max)
    }

    fn spawn_relayer(&self, record: DecryptionCompleted, kind: DataKind, latency: Duration) {
        let bus = self.bus.clone();
        let ledger = self.ledger.clone();
        let duplicate = self.config.duplicate_deliveries;
        let drop_it = self.config.drop_notifications;

        tokio::spawn(async move {
            tokio::time::sleep(latency).await;
            ledger.lock().in_flight.remove(&(record.user_id, kind));

            if drop_it {
                debug!(request_id = %record.request_id, "Relayer dropped notification");
                return;
            }

            let deliveries = if duplicate { 2 } else { 1 };
            for _ in 0..deliveries {
                bus.publish(IvsEvent::DecryptionCompleted(record.clone()))
                    .await;
            }
            debug!(
                request_id = %record.request_id,
                latency_ms = latency.as_millis(),
                "Relayer published notification"
            );
        });
    }
}

#[async_trait]
impl DecryptionEngine for SimulatedEngine {
    async fn submit_decryption_request(
        &self,
        subject: UserId,
        kind: DataKind,
    ) -> EngineResult<RequestId> {
        self.require_admin()?;

        let (request_id, value) = {
            let mut ledger = self.ledger.lock();
            if !ledger.graph.contains(subject) {
                return Err(EngineError::UnknownSubject(subject));
            }
            let value = ledger
                .stored_value(subject, kind)
                .ok_or(EngineError::NothingToDecrypt { subject, kind })?;
            if !ledger.in_flight.insert((subject, kind)) {
                return Err(EngineError::AlreadyInFlight { subject, kind });
            }
            ledger.next_request_id += 1;
            (RequestId::from_u64(ledger.next_request_id), value)
        };

        self.bus
            .publish(IvsEvent::DecryptionRequested(DecryptionRequested {
                request_id,
                user_id: subject,
                kind,
            }))
            .await;

        let latency = self.sample_latency();
        let record = DecryptionCompleted::new(request_id, subject, kind, value);
        self.spawn_relayer(record, kind, latency);

        Ok(request_id)
    }

    async fn registered_subjects(&self) -> EngineResult<Vec<UserId>> {
        Ok(self.ledger.lock().graph.users().collect())
    }

    async fn ciphertext_handle(
        &self,
        subject: UserId,
        kind: DataKind,
    ) -> EngineResult<CiphertextHandle> {
        let ledger = self.ledger.lock();
        if !ledger.graph.contains(subject) {
            return Err(EngineError::UnknownSubject(subject));
        }
        if ledger.stored_value(subject, kind).is_none() {
            return Ok(CiphertextHandle::empty());
        }
        let tag = match kind {
            DataKind::Score => 1,
            DataKind::HealthStatus => 2,
        };
        Ok(CiphertextHandle(H256::from_low_u64_be(
            (u64::from(subject.get()) << 8) | tag,
        )))
    }
}
