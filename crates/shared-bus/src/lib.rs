//! # Shared Bus - Contract Event Stream
//!
//! In-process stand-in for the ledger's event log. The simulated engine
//! publishes contract and relayer events here; the event correlator
//! subscribes to the decryption topic.
//!
//! ## Flow
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────────┐
//! │ Engine /     │                    │ Event Correlator │
//! │ Relayer      │    publish()       │                  │
//! │              │ ──────┐            │                  │
//! └──────────────┘       │            └──────────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! ## Delivery
//!
//! - Broadcast: every subscriber sees every event published after it
//!   subscribed, filtered on the receive side.
//! - Lagging subscribers skip lost events instead of failing; the protocol
//!   above already tolerates missing notifications via deadlines.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{EventFilter, EventSource, EventTopic, IvsEvent};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, EventSubscriber, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before it starts lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
