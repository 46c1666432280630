//! Error types for the score model

use shared_types::entities::UserId;
use thiserror::Error;

/// All errors that can occur while building inputs or computing scores
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreModelError {
    /// User id registered twice
    #[error("User {0} is already registered")]
    UserAlreadyRegistered(UserId),

    /// Operation referenced a user that was never registered
    #[error("User {0} is not registered")]
    UnknownUser(UserId),

    /// Contact edge from a user to itself
    #[error("User {0} cannot be a contact of itself")]
    SelfContact(UserId),

    /// Scaled score outside [0, 10000]
    #[error("Scaled score {0} exceeds 10000")]
    ScoreOutOfRange(u64),

    /// Self-score policy string could not be parsed
    #[error("Invalid self-score policy '{0}': expected zero, excluded, or a fraction in [0, 1]")]
    InvalidSelfScorePolicy(String),
}

/// Result alias for score model operations
pub type ScoreModelResult<T> = Result<T, ScoreModelError>;
