//! # Decryption Relay Metrics
//!
//! Prometheus metrics for the request registry and event correlator.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! ivs-02-decryption = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `ivs_decrypt_requests_registered_total` - Counter of registered requests
//! - `ivs_decrypt_requests_resolved_total` - Counter of requests resolved by a notification
//! - `ivs_decrypt_requests_timeouts_total` - Counter of requests expired at their deadline
//! - `ivs_decrypt_requests_cancelled_total` - Counter of requests cancelled by the caller
//! - `ivs_decrypt_notifications_malformed_total` - Counter of unusable notifications
//! - `ivs_decrypt_notifications_duplicate_total` - Counter of notifications for retired ids
//! - `ivs_decrypt_notifications_discarded_total` - Counter of unknown-id notifications dropped at capacity
//! - `ivs_decrypt_pending_requests` - Gauge of outstanding requests

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_gauge, IntCounter, IntGauge};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Total requests registered
    pub static ref REQUESTS_REGISTERED: IntCounter = register_int_counter!(
        "ivs_decrypt_requests_registered_total",
        "Total number of decryption requests registered"
    )
    .expect("Failed to create REQUESTS_REGISTERED metric");

    /// Total requests resolved
    pub static ref REQUESTS_RESOLVED: IntCounter = register_int_counter!(
        "ivs_decrypt_requests_resolved_total",
        "Total number of decryption requests resolved by a notification"
    )
    .expect("Failed to create REQUESTS_RESOLVED metric");

    /// Total requests timed out
    pub static ref REQUESTS_TIMEOUTS: IntCounter = register_int_counter!(
        "ivs_decrypt_requests_timeouts_total",
        "Total number of decryption requests expired at their deadline"
    )
    .expect("Failed to create REQUESTS_TIMEOUTS metric");

    /// Total requests cancelled
    pub static ref REQUESTS_CANCELLED: IntCounter = register_int_counter!(
        "ivs_decrypt_requests_cancelled_total",
        "Total number of decryption requests cancelled before resolution"
    )
    .expect("Failed to create REQUESTS_CANCELLED metric");

    /// Total malformed notifications
    pub static ref NOTIFICATIONS_MALFORMED: IntCounter = register_int_counter!(
        "ivs_decrypt_notifications_malformed_total",
        "Total number of notifications with an unknown kind or out-of-range value"
    )
    .expect("Failed to create NOTIFICATIONS_MALFORMED metric");

    /// Total duplicate notifications
    pub static ref NOTIFICATIONS_DUPLICATE: IntCounter = register_int_counter!(
        "ivs_decrypt_notifications_duplicate_total",
        "Total number of notifications for already resolved, expired or cancelled requests"
    )
    .expect("Failed to create NOTIFICATIONS_DUPLICATE metric");

    /// Total notifications dropped from a full unclaimed buffer
    pub static ref NOTIFICATIONS_DISCARDED: IntCounter = register_int_counter!(
        "ivs_decrypt_notifications_discarded_total",
        "Total number of unknown-id notifications dropped because the unclaimed buffer was full"
    )
    .expect("Failed to create NOTIFICATIONS_DISCARDED metric");

    /// Outstanding requests
    pub static ref PENDING_REQUESTS: IntGauge = register_int_gauge!(
        "ivs_decrypt_pending_requests",
        "Number of decryption requests awaiting a notification"
    )
    .expect("Failed to create PENDING_REQUESTS metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

#[cfg(feature = "metrics")]
pub fn record_request_registered() {
    REQUESTS_REGISTERED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_request_resolved() {
    REQUESTS_RESOLVED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_request_timeout() {
    REQUESTS_TIMEOUTS.inc();
}

#[cfg(feature = "metrics")]
pub fn record_request_cancelled() {
    REQUESTS_CANCELLED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_notification_malformed() {
    NOTIFICATIONS_MALFORMED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_notification_duplicate() {
    NOTIFICATIONS_DUPLICATE.inc();
}

#[cfg(feature = "metrics")]
pub fn record_notification_discarded() {
    NOTIFICATIONS_DISCARDED.inc();
}

/// Update outstanding request gauge
#[cfg(feature = "metrics")]
pub fn set_pending_requests(count: usize) {
    PENDING_REQUESTS.set(i64::try_from(count).unwrap_or(i64::MAX));
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_request_registered() {}

#[cfg(not(feature = "metrics"))]
pub fn record_request_resolved() {}

#[cfg(not(feature = "metrics"))]
pub fn record_request_timeout() {}

#[cfg(not(feature = "metrics"))]
pub fn record_request_cancelled() {}

#[cfg(not(feature = "metrics"))]
pub fn record_notification_malformed() {}

#[cfg(not(feature = "metrics"))]
pub fn record_notification_duplicate() {}

#[cfg(not(feature = "metrics"))]
pub fn record_notification_discarded() {}

#[cfg(not(feature = "metrics"))]
pub fn set_pending_requests(_count: usize) {}
