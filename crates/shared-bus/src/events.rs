//! # Contract Events
//!
//! Defines all event types that flow through the shared bus.
//! Decryption payloads correspond to the wire records in `shared-types/src/ipc.rs`.

use serde::{Deserialize, Serialize};
use shared_types::entities::UserId;
use shared_types::ipc::{DecryptionCompleted, DecryptionRequested};

/// All events that can be published to the event bus.
///
/// These are the events the IVS contract and its relayer emit; the bus is
/// the in-process stand-in for a ledger log subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IvsEvent {
    // =========================================================================
    // GRAPH MEMBERSHIP
    // =========================================================================
    /// A user was registered in the contact graph.
    UserRegistered { user_id: UserId },

    /// A symmetric contact edge was recorded.
    ContactAdded { user_a: UserId, user_b: UserId },

    /// A user's encrypted health flag was (re)written.
    HealthStatusSet { user_id: UserId },

    // =========================================================================
    // COMPUTE CYCLE
    // =========================================================================
    /// An admin-triggered score computation finished.
    ScoresComputed {
        /// Propagation depth used.
        d_max: u32,
        /// Number of users that received a score.
        users: usize,
    },

    // =========================================================================
    // DECRYPTION (correlated by request id)
    // =========================================================================
    /// The contract accepted a decryption request.
    /// Source: Ledger | Target: Relayer
    DecryptionRequested(DecryptionRequested),

    /// The relayer delivered the plaintext.
    /// Source: Relayer | Target: Event correlator
    DecryptionCompleted(DecryptionCompleted),
}

impl IvsEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::UserRegistered { .. } | Self::ContactAdded { .. } => EventTopic::Membership,
            Self::HealthStatusSet { .. } => EventTopic::Health,
            Self::ScoresComputed { .. } => EventTopic::Compute,
            Self::DecryptionRequested(_) | Self::DecryptionCompleted(_) => EventTopic::Decryption,
        }
    }

    /// Get the party that emitted the event.
    #[must_use]
    pub fn source(&self) -> EventSource {
        match self {
            Self::DecryptionCompleted(_) => EventSource::Relayer,
            _ => EventSource::Ledger,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Registration and contact events.
    Membership,
    /// Health status writes.
    Health,
    /// Score computation cycles.
    Compute,
    /// Decryption requests and completions.
    Decryption,
    /// All events (no filtering).
    All,
}

/// Emitting party of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventSource {
    /// The contract itself.
    Ledger,
    /// The off-chain decryption relayer.
    Relayer,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Sources to include. Empty means all sources.
    pub sources: Vec<EventSource>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            sources: Vec::new(),
        }
    }

    /// Create a filter for events from specific sources.
    #[must_use]
    pub fn from_sources(sources: Vec<EventSource>) -> Self {
        Self {
            topics: Vec::new(),
            sources,
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &IvsEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let source_match = self.sources.is_empty() || self.sources.contains(&event.source());

        topic_match && source_match
    }
}
