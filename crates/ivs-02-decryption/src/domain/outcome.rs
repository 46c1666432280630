//! Terminal outcome of a decryption session.

use super::renderer::{RenderedResult, RiskTier};
use crate::error::SessionError;
use shared_types::entities::RequestId;
use std::fmt;
use std::time::Duration;

/// Exactly one of success, timeout or engine error.
///
/// Operators retry timeouts and investigate engine errors, so the two are
/// never merged.
#[derive(Debug, Clone, PartialEq)]
pub enum DecryptionOutcome {
    Success {
        raw_value: u64,
        rendered: RenderedResult,
    },
    Timeout {
        request_id: RequestId,
        waited: Duration,
    },
    EngineError(SessionError),
}

impl DecryptionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub fn is_engine_error(&self) -> bool {
        matches!(self, Self::EngineError(_))
    }

    pub fn rendered(&self) -> Option<&RenderedResult> {
        match self {
            Self::Success { rendered, .. } => Some(rendered),
            _ => None,
        }
    }

    pub fn risk_tier(&self) -> Option<RiskTier> {
        self.rendered().and_then(RenderedResult::tier)
    }

    pub fn raw_value(&self) -> Option<u64> {
        match self {
            Self::Success { raw_value, .. } => Some(*raw_value),
            _ => None,
        }
    }
}

impl fmt::Display for DecryptionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success { rendered, .. } => write!(f, "{rendered}"),
            Self::Timeout { request_id, waited } => write!(
                f,
                "TIMEOUT (request {request_id}, waited {}s)",
                waited.as_secs()
            ),
            Self::EngineError(err) => write!(f, "ERROR: {err}"),
        }
    }
}
