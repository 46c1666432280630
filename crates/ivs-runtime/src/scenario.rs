//! # Relay Wiring
//!
//! Connects the simulated ledger, the event bus, the correlator and the
//! decryption service, in that order.
//!
//! ```text
//! SimulatedEngine ──publish──→ InMemoryEventBus ──completion_stream──→ EventCorrelator
//!        ↑                                                                  │
//!   submit_decryption_request                                          try_resolve
//!        │                                                                  ↓
//! DecryptionService ─────────────register────────────────────────→ RequestRegistry
//! ```

use crate::config::RuntimeConfig;
use anyhow::Result;
use ivs_01_score_model::{ScoreParams, ScoreSheet};
use ivs_02_decryption::{
    cleanup_task, completion_stream, CorrelatorHandle, CorrelatorSnapshot, DecryptionApi,
    DecryptionService, EventCorrelator, PendingSummary, SimulatedEngine,
};
use shared_bus::InMemoryEventBus;
use shared_types::entities::{HealthStatus, UserId};
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Users of the reference scenario are `1..=REFERENCE_USERS`.
pub const REFERENCE_USERS: u32 = 5;

/// Contact edges of the reference scenario.
pub const REFERENCE_CONTACTS: [(u32, u32); 4] = [(1, 2), (1, 3), (2, 4), (3, 5)];

/// Infected users of the reference scenario.
pub const REFERENCE_INFECTED: [u32; 1] = [1];

/// How a command run under [`Relay::run_until`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// The interrupt fired before the work finished
    pub interrupted: bool,
    /// The work finished and reported at least one timeout
    pub timed_out: bool,
    /// Requests still pending when the run ended, captured before any
    /// session was released
    pub outstanding: Vec<PendingSummary>,
}

impl RunReport {
    /// Whether the outstanding-request report should be shown.
    pub fn needs_outstanding_report(&self) -> bool {
        self.interrupted || self.timed_out
    }
}

/// A running relay against the simulated engine.
pub struct Relay {
    bus: Arc<InMemoryEventBus>,
    engine: Arc<SimulatedEngine>,
    service: Arc<DecryptionService<SimulatedEngine>>,
    correlator: CorrelatorHandle,
    cleanup: JoinHandle<()>,
}

impl Relay {
    /// Build and start every component. Must run inside a tokio runtime.
    pub fn start(config: &RuntimeConfig) -> Self {
        let bus = Arc::new(InMemoryEventBus::new());
        let engine = Arc::new(SimulatedEngine::new(
            bus.clone(),
            config.engine.simulated(),
        ));
        let service = Arc::new(DecryptionService::from_config(
            engine.clone(),
            config.decryption.clone(),
        ));

        // Subscribe before the first submission so no completion is missed
        let correlator =
            EventCorrelator::new(service.registry(), completion_stream(bus.as_ref())).start();
        let cleanup = tokio::spawn(cleanup_task(
            service.registry(),
            config.decryption.cleanup_interval,
        ));

        info!(
            contract = %config.engine.contract_address,
            admin = %config.engine.admin,
            deadline_secs = config.decryption.deadline.as_secs(),
            "Decryption relay started"
        );

        Self {
            bus,
            engine,
            service,
            correlator,
            cleanup,
        }
    }

    /// Register the reference users, contacts and health flags, then compute
    /// scores.
    pub async fn seed_reference(&self, params: ScoreParams) -> Result<ScoreSheet> {
        for id in 1..=REFERENCE_USERS {
            self.engine.register_user(UserId(id)).await?;
        }
        for (a, b) in REFERENCE_CONTACTS {
            self.engine.add_contact(UserId(a), UserId(b)).await?;
        }
        for id in 1..=REFERENCE_USERS {
            let status = if REFERENCE_INFECTED.contains(&id) {
                HealthStatus::Infected
            } else {
                HealthStatus::NotInfected
            };
            self.engine.set_health_status(UserId(id), status).await?;
        }

        let sheet = self.engine.compute_scores(params).await?;
        info!(users = sheet.len(), d_max = params.d_max, "Reference scenario seeded");
        Ok(sheet)
    }

    pub fn bus(&self) -> &Arc<InMemoryEventBus> {
        &self.bus
    }

    pub fn engine(&self) -> &Arc<SimulatedEngine> {
        &self.engine
    }

    pub fn service(&self) -> &Arc<DecryptionService<SimulatedEngine>> {
        &self.service
    }

    pub fn correlator_stats(&self) -> CorrelatorSnapshot {
        self.correlator.stats()
    }

    /// Drive `work` until it finishes or `interrupt` fires.
    ///
    /// `work` resolves to whether any session timed out. The pending
    /// snapshot is taken while `work` still owns its sessions, since dropping
    /// them cancels their registry entries.
    pub async fn run_until<W, I>(&self, work: W, interrupt: I) -> Result<RunReport>
    where
        W: Future<Output = Result<bool>>,
        I: Future<Output = ()>,
    {
        let mut work = Box::pin(work);
        let mut interrupt = Box::pin(interrupt);

        let report = tokio::select! {
            finished = &mut work => {
                let timed_out = finished?;
                RunReport {
                    interrupted: false,
                    timed_out,
                    outstanding: self.service.pending(),
                }
            }
            () = &mut interrupt => {
                let outstanding = self.service.pending();
                warn!(
                    outstanding = outstanding.len(),
                    "Interrupted, abandoning outstanding sessions"
                );
                RunReport {
                    interrupted: true,
                    timed_out: false,
                    outstanding,
                }
            }
        };

        drop(work);
        Ok(report)
    }

    /// Stop the sweep and the correlator.
    pub async fn shutdown(self) -> Result<CorrelatorSnapshot> {
        self.cleanup.abort();
        let snapshot = self.correlator.stop().await?;
        info!(
            received = snapshot.received,
            delivered = snapshot.delivered,
            duplicates = snapshot.duplicates,
            "Decryption relay stopped"
        );
        Ok(snapshot)
    }
}
