//! Domain layer: registry state, notifications, rendering and outcomes.

pub mod notification;
pub mod outcome;
pub mod registry;
pub mod renderer;
pub mod time_cache;

pub use notification::CompletionNotification;
pub use outcome::DecryptionOutcome;
pub use registry::{
    cleanup_task, DEFAULT_UNCLAIMED_CAPACITY, Delivery, PendingSummary, PendingTicket, RegistryStats, RegistryStatsSnapshot,
    RequestRegistry, Resolution, RetiredReason,
};
pub use renderer::{render, RenderedResult, RiskTier};
pub use time_cache::TimeBoundedCache;
