//! # Error Types
//!
//! Errors raised while parsing shared identifiers and tags.

use thiserror::Error;

/// Errors from parsing shared types out of user or wire input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    /// Not a valid unsigned 32-bit user id.
    #[error("Invalid user id: {0:?}")]
    InvalidUserId(String),

    /// Data kind tag is neither score nor health.
    #[error("Unknown data kind: {0:?}")]
    UnknownDataKind(String),
}
