//! # IVS-02: Decryption Relay
//!
//! Client-side correlation of asynchronous decryption requests.
//!
//! ## Overview
//!
//! Decrypting a score or health flag is a two-step protocol: the engine
//! acknowledges the request with a fresh request id, and the plaintext
//! arrives later as a `DecryptionCompleted` notification carrying that id.
//! This crate provides:
//! - **Request Registry**: pending requests keyed by id, first transition wins
//! - **Event Correlator**: long-lived consumer matching notifications to requests
//! - **Decryption Session**: one awaitable handle per request with a deadline
//! - **Result Renderer**: raw integers to risk tiers and health flags
//!
//! ## Architecture
//!
//! ```text
//! Operator ──request_and_await──→ DecryptionService ──submit──→ Engine
//!                                     │                           │
//!                                 register(id)              DecryptionCompleted
//!                                     ↓                           ↓
//!                              RequestRegistry ←──try_resolve── EventCorrelator
//!                                     │
//!                                  oneshot
//!                                     ↓
//!                               SessionHandle ──render──→ DecryptionOutcome
//! ```
//!
//! ## Outcomes
//!
//! | Outcome | Cause |
//! |---------|-------|
//! | `Success` | Notification delivered before the deadline |
//! | `Timeout` | Deadline reached with no delivery |
//! | `EngineError` | Submission rejected or value not renderable |
//! | `EngineError(Cancelled)` | Entry cancelled through the shared registry |
//!
//! ## Example
//!
//! ```rust,ignore
//! use ivs_02_decryption::{completion_stream, DecryptionService, EventCorrelator};
//! use ivs_02_decryption::ports::inbound::DecryptionApi;
//!
//! let service = DecryptionService::from_config(engine, config);
//! let correlator = EventCorrelator::new(service.registry(), completion_stream(&bus)).start();
//!
//! let outcome = service.request_and_await(UserId(2), DataKind::Score).await;
//! println!("{outcome}");
//! ```

pub mod adapters;
pub mod config;
pub mod correlator;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;
pub mod session;

pub use adapters::{completion_stream, SimulatedEngine, SimulatedEngineConfig};
pub use config::DecryptionConfig;
pub use correlator::{CorrelatorHandle, CorrelatorSnapshot, CorrelatorStats, EventCorrelator};
pub use domain::{
    cleanup_task, render, CompletionNotification, DecryptionOutcome, Delivery, PendingSummary,
    RenderedResult, RequestRegistry, Resolution, RetiredReason, RiskTier,
};
pub use error::{
    ConfigError, CorrelatorError, EngineError, EngineResult, NotificationError, RegistryError,
    RenderError, SessionError, SessionResult,
};
pub use ports::{DecryptionApi, DecryptionEngine};
pub use service::DecryptionService;
pub use session::{SessionHandle, SessionState};
