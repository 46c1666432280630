//! # Core Domain Entities
//!
//! Identifiers and tags shared by the score model, the decryption relay,
//! and the engine adapters.
//!
//! ## Clusters
//!
//! - **Subjects**: `UserId`, `HealthStatus`
//! - **Decryption**: `RequestId`, `DataKind`, `CiphertextHandle`
//! - **Scaling**: `SCORE_SCALE`

use crate::errors::TypeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Re-export the ledger-width integers used for ids and handles.
pub use primitive_types::{H256, U256};

/// Fixed-point scale of a transmitted IVS value: `1.0 == 10_000`.
pub const SCORE_SCALE: u32 = 10_000;

// =============================================================================
// SUBJECTS
// =============================================================================

/// Identifier of a registered user in the contact graph.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct UserId(pub u32);

impl UserId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for UserId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl FromStr for UserId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map(Self)
            .map_err(|_| TypeError::InvalidUserId(s.to_string()))
    }
}

/// Plaintext health flag of a user.
///
/// On the wire: `0 = NotInfected`, `1 = Infected`. Nothing else is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthStatus {
    NotInfected,
    Infected,
}

impl HealthStatus {
    /// Decode the raw decrypted flag. Any value other than 0 or 1 is rejected.
    pub fn from_raw(raw: u64) -> Option<Self> {
        match raw {
            0 => Some(Self::NotInfected),
            1 => Some(Self::Infected),
            _ => None,
        }
    }

    pub fn as_raw(self) -> u64 {
        match self {
            Self::NotInfected => 0,
            Self::Infected => 1,
        }
    }

    pub fn is_infected(self) -> bool {
        matches!(self, Self::Infected)
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInfected => f.write_str("NOT_INFECTED"),
            Self::Infected => f.write_str("INFECTED"),
        }
    }
}

// =============================================================================
// DECRYPTION
// =============================================================================

/// Opaque correlation token issued by the engine for one decryption request.
///
/// Mirrors the ledger's `uint256` request counter. Callers must not derive
/// anything from the numeric value; ordering exists for stable listings only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub U256);

impl RequestId {
    pub fn from_u64(value: u64) -> Self {
        Self(U256::from(value))
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RequestId {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

/// Semantic tag of a decrypted payload. Determines how the raw integer is
/// rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DataKind {
    /// IVS value scaled by [`SCORE_SCALE`].
    Score,
    /// Binary infection flag.
    HealthStatus,
}

impl DataKind {
    /// Tag used by the contract's `DecryptionCompleted` event.
    pub fn wire_tag(self) -> &'static str {
        match self {
            Self::Score => "ivs",
            Self::HealthStatus => "health",
        }
    }

    /// Decode a wire tag. Unknown tags yield `None`.
    pub fn from_wire_tag(tag: &str) -> Option<Self> {
        match tag {
            "ivs" => Some(Self::Score),
            "health" => Some(Self::HealthStatus),
            _ => None,
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Score => f.write_str("score"),
            Self::HealthStatus => f.write_str("health"),
        }
    }
}

impl FromStr for DataKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "score" | "ivs" => Ok(Self::Score),
            "health" | "health-status" | "health_status" => Ok(Self::HealthStatus),
            other => Err(TypeError::UnknownDataKind(other.to_string())),
        }
    }
}

/// Opaque handle to an encrypted field held by the engine.
///
/// A zero handle means the field was never written, so there is nothing to
/// decrypt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct CiphertextHandle(pub H256);

impl CiphertextHandle {
    pub fn empty() -> Self {
        Self(H256::zero())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for CiphertextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}
