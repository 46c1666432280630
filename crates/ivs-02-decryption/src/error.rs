//! # Decryption Relay Errors
//!
//! Error taxonomy for the request/notification protocol.
//!
//! Only [`EngineError`] and [`SessionError`] ever reach a caller; the
//! notification and registry errors are absorbed by the correlator and
//! logged.

use ivs_01_score_model::ScoreModelError;
use shared_types::entities::{DataKind, RequestId, UserId};
use thiserror::Error;

/// Rejections reported by the external engine at submission time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Caller lacks the role required for the call
    #[error("Caller {caller} is not authorized for this call")]
    Unauthorized { caller: String },

    /// Subject was never registered on the ledger
    #[error("User {0} is not registered")]
    UnknownSubject(UserId),

    /// A request for the same subject and kind is still being processed
    #[error("A {kind} decryption for user {subject} is already in flight")]
    AlreadyInFlight { subject: UserId, kind: DataKind },

    /// No ciphertext stored for the subject and kind
    #[error("No {kind} ciphertext stored for user {subject}")]
    NothingToDecrypt { subject: UserId, kind: DataKind },

    /// Ledger refused a state-changing call
    #[error("Ledger rejected the call: {0}")]
    Ledger(#[from] ScoreModelError),

    /// Engine could not be reached
    #[error("Engine transport failure: {0}")]
    Transport(String),
}

/// Raw value that cannot be rendered for its data kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("Score {0} exceeds the 10000 scale")]
    ScoreOutOfRange(u64),

    #[error("Health flag {0} is neither 0 nor 1")]
    HealthOutOfRange(u64),
}

/// Notification that cannot be applied to a pending request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotificationError {
    #[error("Request {request_id}: unknown data kind tag '{tag}'")]
    UnknownDataKind { request_id: RequestId, tag: String },

    #[error("Request {request_id}: expected {expected} payload, got {actual}")]
    KindMismatch {
        request_id: RequestId,
        expected: DataKind,
        actual: DataKind,
    },

    #[error("Request {request_id}: expected subject {expected}, got {actual}")]
    SubjectMismatch {
        request_id: RequestId,
        expected: UserId,
        actual: UserId,
    },
}

/// Registration failures. Request ids are never reused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Request {0} is already pending")]
    AlreadyPending(RequestId),

    #[error("Request {0} was already resolved, expired or cancelled")]
    Retired(RequestId),
}

/// Terminal failure of a session other than a timeout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Engine refused the request
    #[error("Submission rejected: {0}")]
    SubmissionRejected(#[from] EngineError),

    /// Matched notification carried a value outside its kind's range
    #[error("Request {request_id} returned unusable data: {source}")]
    DataIntegrity {
        request_id: RequestId,
        source: RenderError,
    },

    /// Engine issued a request id the registry refuses
    #[error("Registry refused request: {0}")]
    Registry(#[from] RegistryError),

    /// Another holder of the registry cancelled the request
    #[error("Request {0} was cancelled before a result arrived")]
    Cancelled(RequestId),
}

/// Correlator task did not shut down cleanly.
#[derive(Debug, Error)]
pub enum CorrelatorError {
    #[error("Correlator task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Invalid relay configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid timeout: {0}")]
    InvalidTimeout(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Result type for engine calls
pub type EngineResult<T> = Result<T, EngineError>;
